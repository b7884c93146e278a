/// Ranking Module
///
/// Scores every active catalog item against the conversation signals and the
/// user's profile, then keeps the top results.
///
/// # Workflow
/// 1. Extract relevance features (topic, mood, intent, preference)
/// 2. Weighted sum → relevance score in [0, 1]
/// 3. Drop inactive or low-relevance items
/// 4. Stable descending sort, truncate to the requested size
pub mod scorer;

pub use scorer::{RankerWeights, RelevanceFeatures};

use crate::models::{Item, Session, UserProfile};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Default relevance floor; items must score strictly above it
pub const DEFAULT_MIN_RELEVANCE: f64 = 0.1;

/// Item paired with the score of one ranking pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredItem {
    pub item: Arc<Item>,
    pub score: f64,
}

pub struct Ranker {
    weights: RankerWeights,
    min_relevance: f64,
    honor_blocked_categories: bool,
}

impl Default for Ranker {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_RELEVANCE)
    }
}

impl Ranker {
    pub fn new(min_relevance: f64) -> Self {
        Self {
            weights: RankerWeights::default(),
            min_relevance,
            honor_blocked_categories: false,
        }
    }

    pub fn with_weights(mut self, weights: RankerWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Skip items in the user's blocked categories
    pub fn with_blocked_categories(mut self, honor: bool) -> Self {
        self.honor_blocked_categories = honor;
        self
    }

    pub fn score(&self, item: &Item, session: &Session, profile: Option<&UserProfile>) -> f64 {
        self.weights
            .combine(&RelevanceFeatures::extract(item, session, profile))
    }

    /// Rank items for a conversation. Without a session nothing is eligible.
    ///
    /// Ties keep catalog order.
    pub fn rank(
        &self,
        items: &[Arc<Item>],
        session: Option<&Session>,
        profile: Option<&UserProfile>,
        max_results: usize,
    ) -> Vec<ScoredItem> {
        let Some(session) = session else {
            return Vec::new();
        };

        let mut ranked: Vec<ScoredItem> = items
            .iter()
            .filter(|item| item.active)
            .filter(|item| !self.is_blocked(item, profile))
            .filter_map(|item| {
                let score = self.score(item, session, profile);
                (score > self.min_relevance).then(|| ScoredItem {
                    item: Arc::clone(item),
                    score,
                })
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(max_results);

        debug!(
            conversation_id = %session.conversation_id,
            candidates = items.len(),
            eligible = ranked.len(),
            top_score = ranked.first().map(|s| s.score),
            "Ranking pass complete"
        );

        ranked
    }

    fn is_blocked(&self, item: &Item, profile: Option<&UserProfile>) -> bool {
        self.honor_blocked_categories && profile.map_or(false, |p| p.is_blocked(item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserMood;
    use crate::services::catalog::default_items;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn catalog() -> Vec<Arc<Item>> {
        default_items().into_iter().map(Arc::new).collect()
    }

    fn smartphone_session() -> Session {
        let mut session = Session::new("conv-1", "user-1");
        session.intents = vec!["technology".to_string()];
        session.topic_weights.insert("electronics".to_string(), 1.0);
        session
    }

    #[test]
    fn test_no_session_no_results() {
        let ranker = Ranker::default();
        assert!(ranker.rank(&catalog(), None, None, 3).is_empty());
    }

    #[test]
    fn test_smartphone_ranks_tech_first() {
        let ranker = Ranker::default();
        let mut profile = UserProfile::new("user-1");
        profile.interests = vec!["technology".to_string()];

        let ranked = ranker.rank(&catalog(), Some(&smartphone_session()), Some(&profile), 3);

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].item.id, "tech_001");
        // 0.4 * 0.95 + 0.2 * 0.8 + 0.1 * 0.3
        assert!((ranked[0].score - 0.57).abs() < 1e-9);
    }

    #[test]
    fn test_mood_comes_from_profile_not_session() {
        let ranker = Ranker::new(0.0);
        let item = Arc::new(
            Item::new("calm", "Calm", "calm", "CalmCo").with_mood(UserMood::Calm, 1.0),
        );

        let mut session = Session::new("c", "u");
        session.mood = crate::models::ConversationMood::Positive;

        let mut profile = UserProfile::new("u");
        assert!(ranker
            .rank(&[Arc::clone(&item)], Some(&session), Some(&profile), 1)
            .is_empty());

        profile.current_mood = Some(UserMood::Calm);
        let ranked = ranker.rank(&[item], Some(&session), Some(&profile), 1);
        assert!((ranked[0].score - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_relevance_floor_is_strict() {
        // mood only: 0.3 * 0.5 = 0.15
        let session = Session::new("c", "u");
        let mut profile = UserProfile::new("u");
        profile.current_mood = Some(UserMood::Calm);
        let items = vec![Arc::new(
            Item::new("t", "T", "t", "B").with_mood(UserMood::Calm, 0.5),
        )];

        assert_eq!(
            Ranker::new(0.1)
                .rank(&items, Some(&session), Some(&profile), 3)
                .len(),
            1
        );
        assert!(Ranker::new(0.15)
            .rank(&items, Some(&session), Some(&profile), 3)
            .is_empty());
    }

    #[test]
    fn test_inactive_items_skipped() {
        let ranker = Ranker::default();
        let mut inactive = Item::new("t", "T", "t", "B").with_category("travel");
        inactive.active = false;

        let mut session = Session::new("c", "u");
        session.intents = vec!["travel".to_string()];

        assert!(ranker
            .rank(&[Arc::new(inactive)], Some(&session), None, 3)
            .is_empty());
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let ranker = Ranker::default();
        let items: Vec<Arc<Item>> = ["a", "b", "c", "d"]
            .iter()
            .map(|id| Arc::new(Item::new(*id, "T", "t", "B").with_category("travel")))
            .collect();

        let mut session = Session::new("c", "u");
        session.intents = vec!["travel".to_string()];

        let ranked = ranker.rank(&items, Some(&session), None, 3);
        let ids: Vec<&str> = ranked.iter().map(|s| s.item.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_blocked_categories_opt_in() {
        let mut profile = UserProfile::new("u");
        profile.blocked_categories = vec!["technology".to_string()];
        let session = smartphone_session();

        let default_ranker = Ranker::default();
        assert_eq!(
            default_ranker.rank(&catalog(), Some(&session), Some(&profile), 3)[0]
                .item
                .id,
            "tech_001"
        );

        let honoring = Ranker::default().with_blocked_categories(true);
        assert!(honoring
            .rank(&catalog(), Some(&session), Some(&profile), 3)
            .iter()
            .all(|s| s.item.id != "tech_001"));
    }

    #[test]
    fn test_scores_bounded_on_random_inputs() {
        let mut rng = StdRng::seed_from_u64(7);
        let ranker = Ranker::new(-1.0);
        let topics = ["fashion", "electronics", "travel", "food", "sports"];
        let moods = [UserMood::Happy, UserMood::Excited, UserMood::Curious, UserMood::Calm];

        for round in 0..200 {
            let items: Vec<Arc<Item>> = (0..8)
                .map(|i| {
                    let mut item = Item::new(format!("item-{}", i), "T", "t", "B")
                        .with_category(topics[rng.gen_range(0..topics.len())]);
                    for topic in topics {
                        item = item.with_topic(topic, rng.gen_range(0.0..=1.0));
                    }
                    for mood in moods {
                        item = item.with_mood(mood, rng.gen_range(0.0..=1.0));
                    }
                    Arc::new(item)
                })
                .collect();

            let mut session = Session::new("c", "u");
            for topic in topics {
                session
                    .topic_weights
                    .insert(topic.to_string(), f64::from(rng.gen_range(0..6u8)));
            }
            session.intents = vec![topics[rng.gen_range(0..topics.len())].to_string()];

            let mut profile = UserProfile::new("u");
            profile.current_mood = Some(moods[rng.gen_range(0..moods.len())]);
            profile.interests = topics.iter().map(|t| t.to_string()).collect();
            for _ in 0..rng.gen_range(0..20) {
                profile.record_interaction(&format!("item-{}", rng.gen_range(0..8)));
            }

            let ranked = ranker.rank(&items, Some(&session), Some(&profile), items.len());
            assert_eq!(ranked.len(), items.len(), "round {}", round);
            for scored in &ranked {
                assert!((0.0..=1.0).contains(&scored.score), "round {}", round);
            }
            assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
        }
    }

    #[test]
    fn test_ranking_is_deterministic() {
        let ranker = Ranker::default();
        let mut profile = UserProfile::new("user-1");
        profile.interests = vec!["technology".to_string()];
        profile.current_mood = Some(UserMood::Excited);
        let session = smartphone_session();

        let first = ranker.rank(&catalog(), Some(&session), Some(&profile), 6);
        for _ in 0..10 {
            assert_eq!(ranker.rank(&catalog(), Some(&session), Some(&profile), 6), first);
        }
    }
}
