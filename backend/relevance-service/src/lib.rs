pub mod config;
pub mod models;
pub mod services;
pub mod utils;

pub use config::{Config, EngineConfig};
pub use models::{
    ConversationAnalytics, ConversationMood, EngineStats, Item, ItemType, Message, MessageType,
    RankedSuggestion, Session, SessionState, UserMood, UserProfile,
};
pub use services::{
    Catalog, CatalogError, EngineError, LlmError, LlmRelevanceEngine, ProviderSuggestion, Ranker,
    RelevanceEngine, ResponseComposer, ScoredItem, SessionStore, SignalExtractor, SuggestionCache,
    SuggestionProvider, SuggestionRequest,
};
