/// Relevance Scoring
///
/// Per-item feature extraction and the linear weighting that turns
/// features into a relevance score.
use crate::models::{Item, Session, UserProfile};

/// Score of a binary intent match
const INTENT_MATCH_SCORE: f64 = 0.8;
/// Preference boost per category the user is interested in
const INTEREST_BOOST: f64 = 0.3;
/// Preference boost per recorded interaction, capped at `MAX_INTERACTION_BOOST`
const INTERACTION_BOOST: f64 = 0.1;
const MAX_INTERACTION_BOOST: f64 = 0.4;

/// Relevance features for one (item, session, profile) triple
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RelevanceFeatures {
    pub topic: f64,
    pub mood: f64,
    pub intent: f64,
    pub preference: f64,
}

impl RelevanceFeatures {
    pub fn extract(item: &Item, session: &Session, profile: Option<&UserProfile>) -> Self {
        Self {
            topic: topic_score(item, session),
            mood: mood_score(item, profile),
            intent: intent_score(item, session),
            preference: preference_score(item, profile),
        }
    }
}

/// Linear weights over the relevance features
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankerWeights {
    pub topic: f64,
    pub mood: f64,
    pub intent: f64,
    pub preference: f64,
}

impl Default for RankerWeights {
    fn default() -> Self {
        Self {
            topic: 0.4,
            mood: 0.3,
            intent: 0.2,
            preference: 0.1,
        }
    }
}

impl RankerWeights {
    /// Weighted sum, clamped to [0, 1]
    pub fn combine(&self, features: &RelevanceFeatures) -> f64 {
        let score = features.topic * self.topic
            + features.mood * self.mood
            + features.intent * self.intent
            + features.preference * self.preference;

        score.clamp(0.0, 1.0)
    }
}

/// Best session-topic weight times the item's weight for that topic
fn topic_score(item: &Item, session: &Session) -> f64 {
    session
        .topic_weights
        .iter()
        .filter_map(|(topic, weight)| {
            item.topic_relevance
                .get(topic)
                .map(|relevance| weight * relevance)
        })
        .fold(0.0, f64::max)
}

/// Uses the profile's mood, not the conversation mood
fn mood_score(item: &Item, profile: Option<&UserProfile>) -> f64 {
    profile
        .and_then(|p| p.current_mood)
        .and_then(|mood| item.mood_relevance.get(&mood).copied())
        .unwrap_or(0.0)
}

fn intent_score(item: &Item, session: &Session) -> f64 {
    if session.intents.iter().any(|intent| item.matches_label(intent)) {
        INTENT_MATCH_SCORE
    } else {
        0.0
    }
}

fn preference_score(item: &Item, profile: Option<&UserProfile>) -> f64 {
    let Some(profile) = profile else {
        return 0.0;
    };

    let interest_hits = item
        .categories
        .iter()
        .filter(|category| profile.interests.contains(category))
        .count() as f64;

    let interaction_boost = (INTERACTION_BOOST * f64::from(profile.interactions_for(&item.id)))
        .min(MAX_INTERACTION_BOOST);

    (interest_hits * INTEREST_BOOST + interaction_boost).min(1.0)
}
