// ============================================
// Response Composer (對話回覆生成)
// ============================================
//
// Turns the top-ranked item into a conversational reply:
// 1. The item's own template, personalized with the user's mood emoji
// 2. A template for the conversation mood
// 3. A template for the first detected intent that has one
// 4. A generic template
//
// Template choice is random. The generator is seeded from entropy in
// production and from a fixed seed in tests and replays.

use crate::models::{ConversationMood, Item, Session, UserProfile};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

const POSITIVE_TEMPLATES: &[&str] = &[
    "You seem to be in a great mood! Perfect time to check out {brand}! 😊",
    "Your positive energy is contagious! You'll love {title}! ✨",
    "Love your vibe! {brand} has something amazing for you! 🌟",
];

const EXCITED_TEMPLATES: &[&str] = &[
    "Your excitement is infectious! Wait till you see {title}! 🎉",
    "I can feel your energy! {brand} is going to blow your mind! 🚀",
    "You're pumped up! Perfect timing for {title}! 💪",
];

const CURIOUS_TEMPLATES: &[&str] = &[
    "I sense your curiosity! Let me tell you about {title}... 🤔",
    "Your inquisitive mind will love discovering {brand}! 🔍",
    "Since you're curious, you should definitely check out {title}! 💡",
];

const HUMOROUS_TEMPLATES: &[&str] = &[
    "You're hilarious! {brand} has a sense of humor too! 😄",
    "Love your jokes! {title} is no joke though - it's amazing! 😂",
    "Your wit is sharp! {brand} is pretty sharp too! 😎",
];

const FRUSTRATED_TEMPLATES: &[&str] = &[
    "I hear you're frustrated. Maybe {title} can help turn things around? 💪",
    "When things get tough, {brand} has your back! 💪",
    "Don't let frustration get you down! {title} might be the solution! ✨",
];

const SHOPPING_TEMPLATES: &[&str] = &[
    "Since you're in shopping mode, you have to see {title}! 🛍️",
    "Shopping spree? Don't forget to check out {brand}! 💳",
    "Your shopping list needs {title}! 📝",
];

const RESEARCH_TEMPLATES: &[&str] = &[
    "Doing some research? {brand} has all the details you need! 🔍",
    "Research mode activated! {title} is worth investigating! 📊",
    "Since you're researching, {brand} should be on your list! 📋",
];

const ENTERTAINMENT_TEMPLATES: &[&str] = &[
    "Looking for entertainment? {title} is pure fun! 🎮",
    "Entertainment time! {brand} knows how to keep you entertained! 🎬",
    "Fun seeker alert! {title} is your next entertainment fix! 🎉",
];

const TRAVEL_TEMPLATES: &[&str] = &[
    "Planning a trip? {brand} has amazing travel deals! ✈️",
    "Wanderlust calling? {title} is your travel companion! 🌍",
    "Adventure awaits with {brand}! 🗺️",
];

const FOOD_TEMPLATES: &[&str] = &[
    "Foodie alert! {title} is a culinary delight! 🍽️",
    "Hungry for something new? {brand} has you covered! 🍕",
    "Your taste buds will thank you for {title}! 👨‍🍳",
];

const GENERIC_TEMPLATES: &[&str] = &[
    "Hey! I think you might love {brand} - {title}!",
    "Speaking of {category}, have you checked out {brand}?",
    "I came across {title} and thought of you!",
    "You know what's awesome? {title} from {brand}!",
    "Just discovered {brand} and it's pretty amazing!",
];

const AFFIRMATIVE_WORDS: &[&str] = &["yes", "love", "great"];
const NEGATIVE_WORDS: &[&str] = &["no", "not", "don't"];
const HESITANT_WORDS: &[&str] = &["maybe", "think"];

pub const NEGATIVE_FOLLOW_UP: &str = "No worries! Maybe next time. What else are you interested in? 🤔";
pub const GENERIC_FOLLOW_UP: &str = "Interesting! Tell me more about what you're looking for! 💬";

fn mood_templates(mood: ConversationMood) -> &'static [&'static str] {
    match mood {
        ConversationMood::Positive => POSITIVE_TEMPLATES,
        ConversationMood::Excited => EXCITED_TEMPLATES,
        ConversationMood::Curious => CURIOUS_TEMPLATES,
        ConversationMood::Humorous => HUMOROUS_TEMPLATES,
        ConversationMood::Frustrated => FRUSTRATED_TEMPLATES,
        _ => &[],
    }
}

fn intent_templates(intent: &str) -> &'static [&'static str] {
    match intent {
        "shopping" => SHOPPING_TEMPLATES,
        "research" => RESEARCH_TEMPLATES,
        "entertainment" => ENTERTAINMENT_TEMPLATES,
        "travel" => TRAVEL_TEMPLATES,
        "food" => FOOD_TEMPLATES,
        _ => &[],
    }
}

pub struct ResponseComposer {
    rng: Mutex<StdRng>,
}

impl Default for ResponseComposer {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ResponseComposer {
    /// `None` seeds from OS entropy
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng: Mutex::new(rng),
        }
    }

    pub fn compose(&self, item: &Item, session: &Session, profile: Option<&UserProfile>) -> String {
        if !item.template.is_empty() {
            return personalize_template(item, profile);
        }

        let mood_pick = self.pick(mood_templates(session.mood));
        let template = mood_pick
            .or_else(|| {
                session
                    .intents
                    .iter()
                    .map(|intent| intent_templates(intent))
                    .find(|templates| !templates.is_empty())
                    .and_then(|templates| self.pick(templates))
            })
            .or_else(|| self.pick(GENERIC_TEMPLATES))
            .unwrap_or(GENERIC_TEMPLATES[0]);

        fill_template(template, item, session.mood)
    }

    /// Reply to the user's reaction to a suggested item
    pub fn compose_follow_up(&self, item: &Item, reply: &str) -> String {
        let reply = reply.to_lowercase();
        let mentions = |words: &[&str]| words.iter().any(|w| reply.contains(*w));

        if mentions(AFFIRMATIVE_WORDS) {
            if item.call_to_action.is_empty() {
                format!("Awesome! I knew you'd love {}! 🎉", item.brand)
            } else {
                format!(
                    "Awesome! I knew you'd love {}! {} 🎉",
                    item.brand, item.call_to_action
                )
            }
        } else if mentions(NEGATIVE_WORDS) {
            NEGATIVE_FOLLOW_UP.to_string()
        } else if mentions(HESITANT_WORDS) {
            format!("Take your time! {} will be here when you're ready! 😊", item.title)
        } else {
            GENERIC_FOLLOW_UP.to_string()
        }
    }

    fn pick(&self, templates: &'static [&'static str]) -> Option<&'static str> {
        templates.choose(&mut *self.rng.lock()).copied()
    }
}

fn personalize_template(item: &Item, profile: Option<&UserProfile>) -> String {
    let mut text = item.template.clone();

    if let Some(mood) = profile.and_then(|p| p.current_mood) {
        text = text.replace("{mood_emoji}", mood.emoji());
    }
    if !text.contains('!') && !text.contains('?') {
        text.push('!');
    }

    text
}

fn fill_template(template: &str, item: &Item, mood: ConversationMood) -> String {
    let mut text = template
        .replace("{brand}", &item.brand)
        .replace("{title}", &item.title)
        .replace("{description}", &item.description);

    if let Some(category) = item.primary_category() {
        text = text.replace("{category}", category);
    }
    if !text.contains('!') {
        text.push(' ');
        text.push_str(mood.emoji());
    }

    text
}
