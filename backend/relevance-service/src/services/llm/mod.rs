// ============================================
// LLM Suggestion Boundary (大模型推薦介面)
// ============================================
//
// Variant of the engine that delegates the suggestion decision to an
// external model behind `SuggestionProvider`:
// 1. Append the user message to the session
// 2. Ask the provider, bounded by a timeout
// 3. Confident answer with an item → suggestion, otherwise a fixed fallback
// 4. Append the assistant reply to the session
//
// Provider failures and timeouts surface as `LlmError`; no synthetic reply
// is produced in their place.

use crate::config::EngineConfig;
use crate::models::{EngineStats, Item, Message, RankedSuggestion, UserProfile};
use crate::services::catalog::Catalog;
use crate::services::session::SessionStore;
use crate::utils::is_blank;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};

pub const NO_SUGGESTION_REPLY: &str = "I don't have ad suggestions for this product right now. Try asking about technology, fashion, travel, food, fitness, or beauty products! 💡";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upstream provider error: {0}")]
    Upstream(String),

    #[error("Provider timed out after {0:?}")]
    Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, LlmError>;

/// Context handed to the provider for one turn
#[derive(Debug, Clone)]
pub struct SuggestionRequest {
    pub conversation_id: String,
    pub user_id: String,
    pub message: String,
    /// Full history including the current message, oldest first
    pub history: Vec<Message>,
    pub profile: UserProfile,
    /// Active catalog items the provider may choose from
    pub candidates: Vec<Arc<Item>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSuggestion {
    pub item: Option<Arc<Item>>,
    pub response: String,
    /// Provider confidence (0.0 - 1.0)
    pub confidence: f64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    async fn suggest(&self, request: SuggestionRequest) -> Result<ProviderSuggestion>;
}

pub struct LlmRelevanceEngine {
    provider: Arc<dyn SuggestionProvider>,
    sessions: SessionStore,
    catalog: Catalog,
    timeout: Duration,
    min_confidence: f64,
}

impl LlmRelevanceEngine {
    pub fn new(provider: Arc<dyn SuggestionProvider>, config: &EngineConfig) -> Self {
        Self::with_catalog(provider, config, Catalog::with_default_items())
    }

    pub fn with_catalog(
        provider: Arc<dyn SuggestionProvider>,
        config: &EngineConfig,
        catalog: Catalog,
    ) -> Self {
        Self {
            provider,
            sessions: SessionStore::new(),
            catalog,
            timeout: config.llm_timeout(),
            min_confidence: config.llm_min_confidence,
        }
    }

    pub async fn process_message(
        &self,
        conversation_id: &str,
        user_id: &str,
        text: &str,
    ) -> Result<RankedSuggestion> {
        for (value, field) in [
            (conversation_id, "conversation_id"),
            (user_id, "user_id"),
            (text, "message"),
        ] {
            if is_blank(value) {
                return Err(LlmError::InvalidInput(format!("{} must not be blank", field)));
            }
        }

        let started = Instant::now();
        let session = self.sessions.get_or_create_session(conversation_id, user_id);
        let (owner_id, history) = {
            let mut session = session.write();
            session.append(Message::user(text, user_id));
            (session.user_id.clone(), session.messages.clone())
        };
        let profile = self.sessions.get_or_create_profile(&owner_id).read().clone();

        let request = SuggestionRequest {
            conversation_id: conversation_id.to_string(),
            user_id: user_id.to_string(),
            message: text.to_string(),
            history,
            profile,
            candidates: self
                .catalog
                .snapshot()
                .into_iter()
                .filter(|item| item.active)
                .collect(),
        };

        let answer = match tokio::time::timeout(self.timeout, self.provider.suggest(request)).await {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                warn!(conversation_id = conversation_id, error = %e, "Suggestion provider failed");
                return Err(e);
            }
            Err(_) => {
                warn!(
                    conversation_id = conversation_id,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Suggestion provider timed out"
                );
                return Err(LlmError::Timeout(self.timeout));
            }
        };

        let suggestion = match answer.item {
            Some(item) if answer.confidence >= self.min_confidence => {
                let response = if is_blank(&answer.response) {
                    item.template.clone()
                } else {
                    answer.response
                };
                RankedSuggestion {
                    item: Some(item),
                    response,
                    score: answer.confidence.clamp(0.0, 1.0),
                }
            }
            _ => RankedSuggestion::fallback(NO_SUGGESTION_REPLY),
        };

        session.write().append(Message::bot(suggestion.response.clone()));

        info!(
            conversation_id = conversation_id,
            item_id = suggestion.item_id().unwrap_or("none"),
            confidence = answer.confidence,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Provider suggestion processed"
        );

        Ok(suggestion)
    }

    /// Overwrite preferences and the suggestions-enabled flag
    pub fn update_preferences(
        &self,
        user_id: &str,
        interests: Vec<String>,
        blocked_categories: Vec<String>,
        suggestions_enabled: bool,
    ) -> Result<()> {
        if is_blank(user_id) {
            return Err(LlmError::InvalidInput("user_id must not be blank".to_string()));
        }

        let profile = self.sessions.get_or_create_profile(user_id);
        let mut profile = profile.write();
        profile.interests = interests;
        profile.blocked_categories = blocked_categories;
        profile.suggestions_enabled = suggestions_enabled;

        info!(user_id = user_id, suggestions_enabled, "User preferences updated");
        Ok(())
    }

    pub fn get_stats(&self) -> EngineStats {
        EngineStats {
            active_sessions: self.sessions.session_count(),
            catalog_size: self.catalog.len(),
            total_users: self.sessions.profile_count(),
            cached_suggestions: 0,
        }
    }

    pub fn session_messages(&self, conversation_id: &str) -> Vec<Message> {
        self.sessions
            .get_session(conversation_id)
            .map(|session| session.read().messages.clone())
            .unwrap_or_default()
    }

    pub fn profile_snapshot(&self, user_id: &str) -> Option<UserProfile> {
        self.sessions
            .get_profile(user_id)
            .map(|profile| profile.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageType;
    use crate::services::catalog::default_items;

    fn config() -> EngineConfig {
        EngineConfig {
            llm_timeout_ms: 50,
            ..EngineConfig::default()
        }
    }

    fn tech_item() -> Arc<Item> {
        Arc::new(
            default_items()
                .into_iter()
                .find(|item| item.id == "tech_001")
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_confident_suggestion_is_returned() {
        let mut provider = MockSuggestionProvider::new();
        provider
            .expect_suggest()
            .withf(|request| {
                request.message == "I need a phone"
                    && request.history.len() == 1
                    && request.candidates.len() == 6
            })
            .times(1)
            .returning(|_| {
                Ok(ProviderSuggestion {
                    item: Some(tech_item()),
                    response: "Check out the latest smartphone! 📱".to_string(),
                    confidence: 0.9,
                })
            });

        let engine = LlmRelevanceEngine::new(Arc::new(provider), &config());
        let suggestion = engine
            .process_message("conv-1", "user-1", "I need a phone")
            .await
            .unwrap();

        assert_eq!(suggestion.item_id(), Some("tech_001"));
        assert_eq!(suggestion.score, 0.9);

        let messages = engine.session_messages("conv-1");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].message_type, MessageType::BotResponse);
        assert_eq!(messages[1].content, suggestion.response);
    }

    #[tokio::test]
    async fn test_low_confidence_falls_back() {
        let mut provider = MockSuggestionProvider::new();
        provider.expect_suggest().returning(|_| {
            Ok(ProviderSuggestion {
                item: Some(tech_item()),
                response: "maybe a phone?".to_string(),
                confidence: 0.2,
            })
        });

        let engine = LlmRelevanceEngine::new(Arc::new(provider), &config());
        let suggestion = engine
            .process_message("conv-1", "user-1", "hmm")
            .await
            .unwrap();

        assert!(suggestion.item.is_none());
        assert_eq!(suggestion.response, NO_SUGGESTION_REPLY);
        assert_eq!(suggestion.score, 0.0);
    }

    #[tokio::test]
    async fn test_blank_response_uses_item_template() {
        let mut provider = MockSuggestionProvider::new();
        provider.expect_suggest().returning(|_| {
            Ok(ProviderSuggestion {
                item: Some(tech_item()),
                response: String::new(),
                confidence: 0.3,
            })
        });

        let engine = LlmRelevanceEngine::new(Arc::new(provider), &config());
        let suggestion = engine
            .process_message("conv-1", "user-1", "phones")
            .await
            .unwrap();

        assert_eq!(suggestion.response, tech_item().template);
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let mut provider = MockSuggestionProvider::new();
        provider
            .expect_suggest()
            .returning(|_| Err(LlmError::Upstream("503 Service Unavailable".to_string())));

        let engine = LlmRelevanceEngine::new(Arc::new(provider), &config());
        let result = engine.process_message("conv-1", "user-1", "hello").await;

        assert!(matches!(result, Err(LlmError::Upstream(_))));
        // The user message stays, no assistant reply is recorded
        assert_eq!(engine.session_messages("conv-1").len(), 1);
    }

    struct SlowProvider;

    #[async_trait]
    impl SuggestionProvider for SlowProvider {
        async fn suggest(&self, _request: SuggestionRequest) -> Result<ProviderSuggestion> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(ProviderSuggestion {
                item: None,
                response: String::new(),
                confidence: 0.0,
            })
        }
    }

    #[tokio::test]
    async fn test_provider_timeout() {
        let engine = LlmRelevanceEngine::new(Arc::new(SlowProvider), &config());
        let result = engine.process_message("conv-1", "user-1", "hello").await;

        assert!(matches!(result, Err(LlmError::Timeout(d)) if d == Duration::from_millis(50)));
    }

    #[tokio::test]
    async fn test_blank_message_rejected_without_provider_call() {
        let mut provider = MockSuggestionProvider::new();
        provider.expect_suggest().never();

        let engine = LlmRelevanceEngine::new(Arc::new(provider), &config());
        assert!(matches!(
            engine.process_message("conv-1", "user-1", "   ").await,
            Err(LlmError::InvalidInput(_))
        ));
        assert_eq!(engine.get_stats().active_sessions, 0);
    }

    #[test]
    fn test_update_preferences_sets_flag() {
        let engine = LlmRelevanceEngine::new(Arc::new(MockSuggestionProvider::new()), &config());
        engine
            .update_preferences("user-1", vec!["travel".to_string()], vec![], false)
            .unwrap();

        let profile = engine.profile_snapshot("user-1").unwrap();
        assert!(!profile.suggestions_enabled);
        assert_eq!(profile.interests, vec!["travel".to_string()]);
    }
}
