use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Profiles keep only the most recent searches
pub const MAX_RECENT_SEARCHES: usize = 10;

// ============================================
// Moods
// ============================================

/// Mood of a conversation, detected from message text.
///
/// Declaration order matters: it is the tie-break order used by signal extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationMood {
    Positive,
    Negative,
    #[default]
    Neutral,
    Excited,
    Frustrated,
    Curious,
    Formal,
    Casual,
    Humorous,
    Serious,
}

impl ConversationMood {
    pub const ALL: [ConversationMood; 10] = [
        ConversationMood::Positive,
        ConversationMood::Negative,
        ConversationMood::Neutral,
        ConversationMood::Excited,
        ConversationMood::Frustrated,
        ConversationMood::Curious,
        ConversationMood::Formal,
        ConversationMood::Casual,
        ConversationMood::Humorous,
        ConversationMood::Serious,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationMood::Positive => "positive",
            ConversationMood::Negative => "negative",
            ConversationMood::Neutral => "neutral",
            ConversationMood::Excited => "excited",
            ConversationMood::Frustrated => "frustrated",
            ConversationMood::Curious => "curious",
            ConversationMood::Formal => "formal",
            ConversationMood::Casual => "casual",
            ConversationMood::Humorous => "humorous",
            ConversationMood::Serious => "serious",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            ConversationMood::Positive => "😊",
            ConversationMood::Excited => "🎉",
            ConversationMood::Humorous => "😄",
            ConversationMood::Curious => "🤔",
            ConversationMood::Frustrated => "😤",
            ConversationMood::Negative => "😔",
            _ => "✨",
        }
    }

    /// Project the conversation mood onto the user's mood
    pub fn to_user_mood(&self) -> UserMood {
        match self {
            ConversationMood::Positive => UserMood::Happy,
            ConversationMood::Excited => UserMood::Excited,
            ConversationMood::Negative => UserMood::Frustrated,
            ConversationMood::Frustrated => UserMood::Frustrated,
            ConversationMood::Curious => UserMood::Curious,
            ConversationMood::Humorous => UserMood::Happy,
            ConversationMood::Serious => UserMood::Neutral,
            _ => UserMood::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserMood {
    Happy,
    Excited,
    Calm,
    Neutral,
    Anxious,
    Frustrated,
    Sad,
    Angry,
    Curious,
    Surprised,
}

impl UserMood {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserMood::Happy => "happy",
            UserMood::Excited => "excited",
            UserMood::Calm => "calm",
            UserMood::Neutral => "neutral",
            UserMood::Anxious => "anxious",
            UserMood::Frustrated => "frustrated",
            UserMood::Sad => "sad",
            UserMood::Angry => "angry",
            UserMood::Curious => "curious",
            UserMood::Surprised => "surprised",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            UserMood::Happy => "😊",
            UserMood::Excited => "🎉",
            UserMood::Curious => "🤔",
            UserMood::Frustrated => "😤",
            UserMood::Sad => "😔",
            UserMood::Angry => "😠",
            _ => "✨",
        }
    }
}

// ============================================
// Catalog Items
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    ProductPromotion,
    BrandAwareness,
    SpecialOffer,
    Educational,
    Entertainment,
    Recommendation,
    Comparison,
    Testimonial,
    EventPromotion,
    Seasonal,
}

/// Promotable catalog entry with its targeting metadata.
///
/// Items are shared as `Arc<Item>` once they enter the catalog and are never
/// mutated in place; relevance scores travel next to the item, not on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub title: String,
    pub description: String,
    pub brand: String,
    pub call_to_action: String,
    pub categories: Vec<String>,
    pub keywords: Vec<String>,
    pub target_audience: Vec<String>,
    /// topic -> relevance (0.0 - 1.0)
    pub topic_relevance: HashMap<String, f64>,
    /// user mood -> relevance (0.0 - 1.0)
    pub mood_relevance: HashMap<UserMood, f64>,
    pub template: String,
    pub item_type: Option<ItemType>,
    pub active: bool,
}

impl Item {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        brand: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            brand: brand.into(),
            call_to_action: String::new(),
            categories: Vec::new(),
            keywords: Vec::new(),
            target_audience: Vec::new(),
            topic_relevance: HashMap::new(),
            mood_relevance: HashMap::new(),
            template: String::new(),
            item_type: None,
            active: true,
        }
    }

    pub fn with_call_to_action(mut self, call_to_action: impl Into<String>) -> Self {
        self.call_to_action = call_to_action.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        push_unique(&mut self.categories, category.into());
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        push_unique(&mut self.keywords, keyword.into());
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for keyword in keywords {
            push_unique(&mut self.keywords, keyword.into());
        }
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        push_unique(&mut self.target_audience, audience.into());
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>, relevance: f64) -> Self {
        self.topic_relevance.insert(topic.into(), relevance);
        self
    }

    pub fn with_mood(mut self, mood: UserMood, relevance: f64) -> Self {
        self.mood_relevance.insert(mood, relevance);
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn with_type(mut self, item_type: ItemType) -> Self {
        self.item_type = Some(item_type);
        self
    }

    pub fn primary_category(&self) -> Option<&str> {
        self.categories.first().map(String::as_str)
    }

    /// Whether a label names one of the item's categories, keywords or audience tags
    pub fn matches_label(&self, label: &str) -> bool {
        self.categories.iter().any(|c| c == label)
            || self.keywords.iter().any(|k| k == label)
            || self.target_audience.iter().any(|a| a == label)
    }
}

fn push_unique(values: &mut Vec<String>, value: String) {
    if !values.contains(&value) {
        values.push(value);
    }
}

// ============================================
// Messages & Sessions
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    UserMessage,
    BotResponse,
    ItemSuggestion,
    SystemMessage,
    ErrorMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub content: String,
    pub sender_id: String,
    pub message_type: MessageType,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(content: impl Into<String>, sender_id: impl Into<String>, message_type: MessageType) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            sender_id: sender_id.into(),
            message_type,
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self::new(content, user_id, MessageType::UserMessage)
    }

    pub fn bot(content: impl Into<String>) -> Self {
        Self::new(content, "bot", MessageType::BotResponse)
    }
}

/// Signals derived from the recent message tail
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Signals {
    pub mood: ConversationMood,
    pub intents: Vec<String>,
    /// Missing topic means zero weight
    pub topic_weights: HashMap<String, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No messages yet
    New,
    /// Messages appended since the last analysis
    Active,
    /// Signals reflect the latest message
    Analyzed,
}

/// Per-conversation state: message history plus the latest signals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub conversation_id: String,
    pub user_id: String,
    pub messages: Vec<Message>,
    pub mood: ConversationMood,
    pub intents: Vec<String>,
    pub topic_weights: HashMap<String, f64>,
    pub state: SessionState,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    pub fn new(conversation_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            conversation_id: conversation_id.into(),
            user_id: user_id.into(),
            messages: Vec::new(),
            mood: ConversationMood::Neutral,
            intents: Vec::new(),
            topic_weights: HashMap::new(),
            state: SessionState::New,
            created_at: now,
            last_activity: now,
        }
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
        self.state = SessionState::Active;
        self.last_activity = Utc::now();
    }

    /// Replace the signals of the previous pass; history is untouched
    pub fn apply_signals(&mut self, signals: Signals) {
        self.mood = signals.mood;
        self.intents = signals.intents;
        self.topic_weights = signals.topic_weights;
        self.state = SessionState::Analyzed;
    }

    /// Last `count` messages, oldest first
    pub fn recent_messages(&self, count: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(count);
        &self.messages[start..]
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

// ============================================
// User Profiles
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub interests: Vec<String>,
    pub blocked_categories: Vec<String>,
    pub current_mood: Option<UserMood>,
    /// item id -> number of recorded interactions
    pub interaction_counts: HashMap<String, u32>,
    pub suggestions_enabled: bool,
    pub recent_searches: Vec<String>,
}

impl UserProfile {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            interests: Vec::new(),
            blocked_categories: Vec::new(),
            current_mood: None,
            interaction_counts: HashMap::new(),
            suggestions_enabled: true,
            recent_searches: Vec::new(),
        }
    }

    pub fn interactions_for(&self, item_id: &str) -> u32 {
        self.interaction_counts.get(item_id).copied().unwrap_or(0)
    }

    pub fn record_interaction(&mut self, item_id: &str) -> u32 {
        let count = self.interaction_counts.entry(item_id.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    /// Returns false when the interest was already present
    pub fn add_interest(&mut self, interest: &str) -> bool {
        if self.interests.iter().any(|i| i == interest) {
            return false;
        }
        self.interests.push(interest.to_string());
        true
    }

    pub fn record_search(&mut self, query: &str) {
        self.recent_searches.push(query.to_string());
        if self.recent_searches.len() > MAX_RECENT_SEARCHES {
            let overflow = self.recent_searches.len() - MAX_RECENT_SEARCHES;
            self.recent_searches.drain(..overflow);
        }
    }

    pub fn is_blocked(&self, item: &Item) -> bool {
        item.categories
            .iter()
            .any(|c| self.blocked_categories.contains(c))
    }
}

// ============================================
// Results
// ============================================

/// Outcome of one `process_message` call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedSuggestion {
    pub item: Option<Arc<Item>>,
    pub response: String,
    /// Relevance in [0, 1]; 0.0 when no item qualified
    pub score: f64,
}

impl RankedSuggestion {
    pub fn fallback(response: impl Into<String>) -> Self {
        Self {
            item: None,
            response: response.into(),
            score: 0.0,
        }
    }

    pub fn item_id(&self) -> Option<&str> {
        self.item.as_deref().map(|item| item.id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationAnalytics {
    pub conversation_id: String,
    pub message_count: usize,
    pub mood: ConversationMood,
    pub intents: Vec<String>,
    pub topic_weights: HashMap<String, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub active_sessions: usize,
    pub catalog_size: usize,
    pub total_users: usize,
    pub cached_suggestions: usize,
}
