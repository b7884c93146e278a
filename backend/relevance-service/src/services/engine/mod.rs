// ============================================
// Relevance Engine (對話推薦引擎)
// ============================================
//
// Per-message pipeline:
// 1. Replay cache lookup (conversation, user, message hash)
// 2. Session get-or-create, append the user message
// 3. Signal extraction over the message tail, fold signals into the session
//    owner's profile
// 4. Rank the catalog, compose a reply for the best item
// 5. Cache and return
//
// Locking: the session lock and the profile lock are never held together.
// Ranking reads the session under its lock with a cloned profile.
// Every step that ranks uses the session owner's profile, so a follow-up
// sees the same ranking the suggestion came from.

use crate::config::EngineConfig;
use crate::models::{
    ConversationAnalytics, EngineStats, Item, Message, RankedSuggestion, Session, Signals,
    UserProfile,
};
use crate::services::cache::{CacheKey, CacheStats, SuggestionCache};
use crate::services::catalog::{Catalog, CatalogError};
use crate::services::ranking::Ranker;
use crate::services::response::ResponseComposer;
use crate::services::session::SessionStore;
use crate::services::signals::SignalExtractor;
use crate::utils::is_blank;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

pub const NEUTRAL_FALLBACK: &str = "I'm here to help! What are you interested in today? 🤔";
pub const UNKNOWN_CONVERSATION_REPLY: &str =
    "I'm not sure what you're referring to. Let's start a new conversation! 😊";
pub const UNKNOWN_ITEM_REPLY: &str =
    "I can't find that specific ad, but I'd love to help you find something else! 🤔";

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

pub type Result<T> = std::result::Result<T, EngineError>;

fn require(value: &str, field: &str) -> Result<()> {
    if is_blank(value) {
        return Err(EngineError::InvalidInput(format!("{} must not be blank", field)));
    }
    Ok(())
}

pub struct RelevanceEngine {
    config: EngineConfig,
    catalog: Catalog,
    sessions: SessionStore,
    extractor: SignalExtractor,
    ranker: Ranker,
    composer: ResponseComposer,
    cache: SuggestionCache,
}

impl Default for RelevanceEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl RelevanceEngine {
    /// Engine over the built-in catalog
    pub fn new(config: EngineConfig) -> Self {
        Self::with_catalog(config, Catalog::with_default_items())
    }

    pub fn with_catalog(config: EngineConfig, catalog: Catalog) -> Self {
        info!(
            catalog_size = catalog.len(),
            cache_ttl_secs = config.cache_ttl_secs,
            min_relevance = config.min_relevance,
            "Initializing relevance engine"
        );

        Self {
            extractor: SignalExtractor::new(config.history_window),
            ranker: Ranker::new(config.min_relevance)
                .with_blocked_categories(config.honor_blocked_categories),
            composer: ResponseComposer::new(config.response_seed),
            cache: SuggestionCache::new(config.cache_ttl(), config.cache_max_entries),
            sessions: SessionStore::new(),
            catalog,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Suggest the best matching item for this turn of the conversation
    pub fn process_message(
        &self,
        conversation_id: &str,
        user_id: &str,
        text: &str,
    ) -> Result<RankedSuggestion> {
        require(conversation_id, "conversation_id")?;
        require(user_id, "user_id")?;
        require(text, "message")?;

        let started = Instant::now();
        let key = CacheKey::new(conversation_id, user_id, text);
        if let Some(cached) = self.cache.get(&key) {
            debug!(conversation_id = conversation_id, "Returning cached suggestion");
            return Ok(cached);
        }
        let generation = self.cache.generation();

        let session = self.sessions.get_or_create_session(conversation_id, user_id);

        let (owner_id, signals) = {
            let mut session = session.write();
            session.append(Message::user(text, user_id));
            let signals = self
                .extractor
                .analyze(session.recent_messages(self.extractor.history_window()));
            session.apply_signals(signals.clone());
            (session.user_id.clone(), signals)
        };

        let profile = self.sessions.get_or_create_profile(&owner_id);

        let profile_snapshot = {
            let mut profile = profile.write();
            learn_from_signals(&mut profile, &signals);
            profile.record_search(text);
            profile.clone()
        };

        let items = self.catalog.snapshot();
        let suggestion = {
            let session = session.read();
            let ranked = self.ranker.rank(
                &items,
                Some(&*session),
                Some(&profile_snapshot),
                self.config.suggestion_limit,
            );

            match ranked.into_iter().next() {
                Some(top) => RankedSuggestion {
                    response: self
                        .composer
                        .compose(&top.item, &session, Some(&profile_snapshot)),
                    item: Some(top.item),
                    score: top.score,
                },
                None => RankedSuggestion::fallback(NEUTRAL_FALLBACK),
            }
        };

        self.cache.insert_at(key, suggestion.clone(), generation);

        info!(
            conversation_id = conversation_id,
            user_id = user_id,
            owner_id = %owner_id,
            item_id = suggestion.item_id().unwrap_or("none"),
            score = suggestion.score,
            mood = signals.mood.as_str(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Suggestion computed"
        );

        Ok(suggestion)
    }

    /// Reply to the user's reaction to a suggested item
    pub fn process_item_response(
        &self,
        conversation_id: &str,
        item_id: &str,
        reply: &str,
    ) -> Result<String> {
        require(conversation_id, "conversation_id")?;
        require(item_id, "item_id")?;
        require(reply, "reply")?;

        let Some(session) = self.sessions.get_session(conversation_id) else {
            debug!(conversation_id = conversation_id, "Follow-up for unknown conversation");
            return Ok(UNKNOWN_CONVERSATION_REPLY.to_string());
        };

        let user_id = session.read().user_id.clone();
        let profile_snapshot = self
            .sessions
            .get_profile(&user_id)
            .map(|profile| profile.read().clone());

        let items = self.catalog.snapshot();
        let item = {
            let session = session.read();
            self.ranker
                .rank(
                    &items,
                    Some(&*session),
                    profile_snapshot.as_ref(),
                    self.config.follow_up_limit,
                )
                .into_iter()
                .find(|scored| scored.item.id == item_id)
                .map(|scored| scored.item)
        };

        let Some(item) = item else {
            debug!(
                conversation_id = conversation_id,
                item_id = item_id,
                "Follow-up for item outside the current ranking"
            );
            return Ok(UNKNOWN_ITEM_REPLY.to_string());
        };

        let interactions = self
            .sessions
            .get_or_create_profile(&user_id)
            .write()
            .record_interaction(&item.id);

        let response = self.composer.compose_follow_up(&item, reply);
        session.write().append(Message::bot(response.clone()));

        info!(
            conversation_id = conversation_id,
            item_id = item_id,
            interactions,
            "Item response recorded"
        );

        Ok(response)
    }

    /// Overwrite the user's interests and blocked categories
    pub fn update_preferences(
        &self,
        user_id: &str,
        interests: Vec<String>,
        blocked_categories: Vec<String>,
    ) -> Result<()> {
        require(user_id, "user_id")?;

        {
            let profile = self.sessions.get_or_create_profile(user_id);
            let mut profile = profile.write();
            profile.interests = interests;
            profile.blocked_categories = blocked_categories;
        }
        self.cache.invalidate_all();

        info!(user_id = user_id, "User preferences updated");
        Ok(())
    }

    pub fn add_item(&self, item: Item) -> Result<Arc<Item>> {
        let item = self.catalog.add(item)?;
        self.cache.invalidate_all();
        Ok(item)
    }

    pub fn deactivate_item(&self, item_id: &str) -> Result<()> {
        require(item_id, "item_id")?;
        self.catalog.set_active(item_id, false)?;
        self.cache.invalidate_all();
        Ok(())
    }

    pub fn get_analytics(&self, conversation_id: &str) -> Option<ConversationAnalytics> {
        let session = self.sessions.get_session(conversation_id)?;
        let session = session.read();

        Some(ConversationAnalytics {
            conversation_id: session.conversation_id.clone(),
            message_count: session.message_count(),
            mood: session.mood,
            intents: session.intents.clone(),
            topic_weights: session.topic_weights.clone(),
        })
    }

    pub fn get_stats(&self) -> EngineStats {
        EngineStats {
            active_sessions: self.sessions.session_count(),
            catalog_size: self.catalog.len(),
            total_users: self.sessions.profile_count(),
            cached_suggestions: self.cache.len(),
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop the session and its cached suggestions. Returns true when a
    /// session existed.
    pub fn clear_conversation(&self, conversation_id: &str) -> bool {
        let removed = self.sessions.clear_session(conversation_id);
        self.cache.invalidate_conversation(conversation_id);
        removed
    }

    pub fn session_snapshot(&self, conversation_id: &str) -> Option<Session> {
        self.sessions
            .get_session(conversation_id)
            .map(|session| session.read().clone())
    }

    pub fn profile_snapshot(&self, user_id: &str) -> Option<UserProfile> {
        self.sessions
            .get_profile(user_id)
            .map(|profile| profile.read().clone())
    }
}

/// Carry the conversation mood onto the profile and remember new intents
pub(crate) fn learn_from_signals(profile: &mut UserProfile, signals: &Signals) {
    profile.current_mood = Some(signals.mood.to_user_mood());
    for intent in &signals.intents {
        profile.add_interest(intent);
    }
}
