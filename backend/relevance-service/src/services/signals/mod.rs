// ============================================
// Signal Extractor (對話信號提取)
// ============================================
//
// Derives conversation signals from the recent message tail:
// 1. Intents: labels whose keyword appears anywhere in the text
// 2. Mood: the label with the most keyword hits, Neutral on no evidence
// 3. Topics: per-topic hit counts, zero-hit topics omitted
//
// Matching is lower-cased substring search, the same cheap keyword pass the
// content classifier uses for channel tagging.

use crate::models::{ConversationMood, Message, Signals};
use std::collections::HashMap;
use tracing::debug;

/// Number of trailing messages analyzed per pass
pub const DEFAULT_HISTORY_WINDOW: usize = 5;

type KeywordTable<L> = Vec<(L, Vec<&'static str>)>;

pub struct SignalExtractor {
    history_window: usize,
    intents: KeywordTable<&'static str>,
    moods: KeywordTable<ConversationMood>,
    topics: KeywordTable<&'static str>,
}

impl Default for SignalExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_WINDOW)
    }
}

impl SignalExtractor {
    pub fn new(history_window: usize) -> Self {
        Self {
            history_window: history_window.max(1),
            intents: vec![
                ("shopping", vec!["buy", "purchase", "shop", "order", "shopping", "store"]),
                ("research", vec!["research", "compare", "review", "information", "details"]),
                (
                    "entertainment",
                    vec!["watch", "movie", "game", "music", "fun", "entertainment"],
                ),
                ("travel", vec!["travel", "trip", "vacation", "hotel", "flight", "destination"]),
                ("food", vec!["food", "restaurant", "cook", "recipe", "dining", "meal"]),
                ("health", vec!["health", "fitness", "exercise", "wellness", "medical"]),
                ("technology", vec!["tech", "computer", "phone", "software", "app", "device"]),
            ],
            moods: vec![
                (
                    ConversationMood::Positive,
                    vec!["great", "awesome", "amazing", "love", "happy", "excited"],
                ),
                (
                    ConversationMood::Negative,
                    vec!["bad", "terrible", "hate", "angry", "frustrated", "disappointed"],
                ),
                (
                    ConversationMood::Excited,
                    vec!["wow", "incredible", "fantastic", "thrilled", "excited"],
                ),
                (
                    ConversationMood::Frustrated,
                    vec!["annoying", "frustrating", "difficult", "problem", "issue"],
                ),
                (
                    ConversationMood::Curious,
                    vec!["wonder", "curious", "interesting", "tell me", "how"],
                ),
                (
                    ConversationMood::Humorous,
                    vec!["funny", "joke", "hilarious", "lol", "haha"],
                ),
                (
                    ConversationMood::Serious,
                    vec!["important", "serious", "critical", "urgent", "necessary"],
                ),
            ],
            topics: vec![
                ("fashion", vec!["clothes", "fashion", "style", "outfit", "dress", "shoes"]),
                (
                    "electronics",
                    vec!["phone", "computer", "laptop", "tablet", "electronics"],
                ),
                (
                    "automotive",
                    vec!["car", "vehicle", "automotive", "driving", "transport"],
                ),
                ("home", vec!["home", "house", "furniture", "decor", "kitchen"]),
                ("sports", vec!["sports", "fitness", "exercise", "gym", "athletic"]),
                (
                    "beauty",
                    vec!["beauty", "cosmetics", "skincare", "makeup", "personal care"],
                ),
                ("finance", vec!["money", "finance", "banking", "investment", "budget"]),
            ],
        }
    }

    pub fn history_window(&self) -> usize {
        self.history_window
    }

    /// Analyze the tail of a conversation. Only the last `history_window`
    /// messages are considered, oldest first.
    pub fn analyze(&self, messages: &[Message]) -> Signals {
        let start = messages.len().saturating_sub(self.history_window);
        let text = messages[start..]
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        if text.trim().is_empty() {
            return Signals::default();
        }

        let signals = Signals {
            mood: self.detect_mood(&text),
            intents: self.detect_intents(&text),
            topic_weights: self.detect_topics(&text),
        };

        debug!(
            window = messages.len() - start,
            mood = signals.mood.as_str(),
            intents = ?signals.intents,
            topic_count = signals.topic_weights.len(),
            "Signals extracted"
        );

        signals
    }

    fn detect_intents(&self, text: &str) -> Vec<String> {
        self.intents
            .iter()
            .filter(|(_, keywords)| keywords.iter().any(|k| text.contains(*k)))
            .map(|(label, _)| label.to_string())
            .collect()
    }

    fn detect_mood(&self, text: &str) -> ConversationMood {
        let mut best = ConversationMood::Neutral;
        let mut best_hits = 0usize;

        for mood in ConversationMood::ALL {
            let hits = self
                .moods
                .iter()
                .find(|(label, _)| *label == mood)
                .map(|(_, keywords)| count_hits(text, keywords))
                .unwrap_or(0);

            if hits > best_hits {
                best = mood;
                best_hits = hits;
            }
        }

        best
    }

    fn detect_topics(&self, text: &str) -> HashMap<String, f64> {
        self.topics
            .iter()
            .filter_map(|(topic, keywords)| {
                let hits = count_hits(text, keywords);
                (hits > 0).then(|| (topic.to_string(), hits as f64))
            })
            .collect()
    }
}

fn count_hits(text: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|k| text.contains(**k)).count()
}
