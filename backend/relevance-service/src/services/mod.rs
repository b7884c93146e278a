pub mod cache;
pub mod catalog;
pub mod engine;
pub mod llm;
pub mod ranking;
pub mod response;
pub mod session;
pub mod signals;

pub use cache::{CacheKey, CacheStats, SuggestionCache};
pub use catalog::{Catalog, CatalogError};
pub use engine::{EngineError, RelevanceEngine};
pub use llm::{
    LlmError, LlmRelevanceEngine, ProviderSuggestion, SuggestionProvider, SuggestionRequest,
};
pub use ranking::{Ranker, RankerWeights, ScoredItem};
pub use response::ResponseComposer;
pub use session::SessionStore;
pub use signals::SignalExtractor;
