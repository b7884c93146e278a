// ============================================
// Item Catalog (推廣目錄)
// ============================================
//
// Append-only inventory of promotable items:
// 1. Seeded at startup (default inventory or provider-supplied)
// 2. Items appended at runtime, never deleted
// 3. Deactivation replaces the shared item, readers keep their snapshot
//
// Ranking reads a snapshot of `Arc<Item>` handles, so a concurrent append
// never blocks or tears an in-flight ranking pass.

use crate::models::{Item, ItemType, UserMood};
use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Duplicate item id: {0}")]
    DuplicateId(String),

    #[error("Invalid item: {0}")]
    InvalidItem(String),

    #[error("Item not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

pub struct Catalog {
    /// Insertion order is the ranking tie-break order
    items: RwLock<Vec<Arc<Item>>>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::with_default_items()
    }
}

impl Catalog {
    /// Build a catalog from provider-supplied items
    pub fn new(items: Vec<Item>) -> Result<Self> {
        let catalog = Self::empty();
        for item in items {
            catalog.add(item)?;
        }
        Ok(catalog)
    }

    pub fn empty() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
        }
    }

    /// Catalog seeded with the built-in inventory
    pub fn with_default_items() -> Self {
        let items: Vec<Arc<Item>> = default_items().into_iter().map(Arc::new).collect();
        info!(item_count = items.len(), "Initialized default item catalog");
        Self {
            items: RwLock::new(items),
        }
    }

    /// Append an item; ids must be unique and weights within [0, 1]
    pub fn add(&self, item: Item) -> Result<Arc<Item>> {
        validate(&item)?;

        let mut items = self.items.write();
        if items.iter().any(|existing| existing.id == item.id) {
            return Err(CatalogError::DuplicateId(item.id));
        }

        let item = Arc::new(item);
        items.push(Arc::clone(&item));

        info!(item_id = %item.id, catalog_size = items.len(), "Item added to catalog");
        Ok(item)
    }

    /// Flip the active flag. The item keeps its catalog position.
    pub fn set_active(&self, item_id: &str, active: bool) -> Result<()> {
        let mut items = self.items.write();
        let slot = items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or_else(|| CatalogError::NotFound(item_id.to_string()))?;

        if slot.active != active {
            let mut updated = Item::clone(slot);
            updated.active = active;
            *slot = Arc::new(updated);
            info!(item_id = item_id, active, "Item activation changed");
        }

        Ok(())
    }

    pub fn get(&self, item_id: &str) -> Option<Arc<Item>> {
        self.items
            .read()
            .iter()
            .find(|item| item.id == item_id)
            .cloned()
    }

    /// Point-in-time view of the inventory in insertion order
    pub fn snapshot(&self) -> Vec<Arc<Item>> {
        self.items.read().clone()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

fn validate(item: &Item) -> Result<()> {
    if item.id.trim().is_empty() {
        return Err(CatalogError::InvalidItem("item id must not be empty".to_string()));
    }

    let in_range = |w: f64| (0.0..=1.0).contains(&w);

    if let Some((topic, weight)) = item.topic_relevance.iter().find(|(_, w)| !in_range(**w)) {
        return Err(CatalogError::InvalidItem(format!(
            "{}: topic weight for '{}' out of range: {}",
            item.id, topic, weight
        )));
    }

    if let Some((mood, weight)) = item.mood_relevance.iter().find(|(_, w)| !in_range(**w)) {
        return Err(CatalogError::InvalidItem(format!(
            "{}: mood weight for '{}' out of range: {}",
            item.id,
            mood.as_str(),
            weight
        )));
    }

    Ok(())
}

/// Built-in inventory used when no provider supplies items
pub fn default_items() -> Vec<Item> {
    vec![
        Item::new(
            "fashion_001",
            "Summer Collection",
            "Discover the latest summer fashion trends",
            "FashionBrand",
        )
        .with_call_to_action("Shop Now")
        .with_category("fashion")
        .with_keywords([
            "style", "trendy", "fashion", "clothes", "outfit", "dress", "shoes", "bag",
            "accessories",
        ])
        .with_topic("fashion", 0.9)
        .with_mood(UserMood::Happy, 0.8)
        .with_mood(UserMood::Excited, 0.7)
        .with_template(
            "Hey! I noticed you're into style. Our new summer collection is absolutely stunning! 🌸 Shop Now: https://fashionbrand.com/summer-collection",
        )
        .with_type(ItemType::ProductPromotion),
        Item::new(
            "tech_001",
            "Latest Smartphone",
            "Experience cutting-edge technology",
            "TechCorp",
        )
        .with_call_to_action("Learn More")
        .with_category("electronics")
        .with_category("technology")
        .with_keywords([
            "smartphone", "phone", "mobile", "tech", "technology", "innovation", "device",
        ])
        .with_topic("electronics", 0.95)
        .with_topic("technology", 0.9)
        .with_mood(UserMood::Curious, 0.8)
        .with_mood(UserMood::Excited, 0.9)
        .with_template(
            "Speaking of tech, have you seen the latest smartphone? It's pretty amazing! 📱 Learn More: https://techcorp.com/latest-smartphone",
        )
        .with_type(ItemType::ProductPromotion),
        Item::new(
            "travel_001",
            "Dream Vacation",
            "Plan your perfect getaway",
            "TravelAgency",
        )
        .with_call_to_action("Book Now")
        .with_category("travel")
        .with_keywords(["vacation", "trip", "travel", "destination", "getaway", "holiday"])
        .with_topic("travel", 0.9)
        .with_mood(UserMood::Excited, 0.9)
        .with_mood(UserMood::Happy, 0.7)
        .with_template(
            "Dreaming of a vacation? I know the perfect place for your next adventure! ✈️ Book Now: https://travelagency.com/dream-vacation",
        )
        .with_type(ItemType::SpecialOffer),
        Item::new(
            "food_001",
            "Delicious Recipes",
            "Cook like a chef at home",
            "FoodNetwork",
        )
        .with_call_to_action("Get Recipes")
        .with_category("food")
        .with_keywords(["cooking", "recipes"])
        .with_topic("food", 0.9)
        .with_mood(UserMood::Happy, 0.6)
        .with_mood(UserMood::Curious, 0.7)
        .with_template(
            "Love cooking? I've got some amazing recipes that'll make you look like a pro chef! 👨‍🍳 Get Recipes: https://foodnetwork.com/delicious-recipes",
        )
        .with_type(ItemType::Educational),
        Item::new(
            "fitness_001",
            "Get Fit Fast",
            "Transform your body in 30 days",
            "FitLife",
        )
        .with_call_to_action("Start Today")
        .with_category("health")
        .with_category("sports")
        .with_keywords(["fitness", "workout"])
        .with_topic("sports", 0.9)
        .with_topic("health", 0.8)
        .with_mood(UserMood::Excited, 0.8)
        .with_mood(UserMood::Curious, 0.6)
        .with_template(
            "Ready to crush your fitness goals? This program is a game-changer! 💪 Start Today: https://fitlife.com/get-fit-fast",
        )
        .with_type(ItemType::ProductPromotion),
        Item::new(
            "beauty_001",
            "Natural Skincare",
            "Glow from within",
            "BeautyBrand",
        )
        .with_call_to_action("Shop Collection")
        .with_category("beauty")
        .with_keywords(["skincare", "natural"])
        .with_topic("beauty", 0.9)
        .with_mood(UserMood::Happy, 0.7)
        .with_mood(UserMood::Calm, 0.8)
        .with_template(
            "Want that natural glow? This skincare line is absolutely magical! ✨ Shop Collection: https://beautybrand.com/natural-skincare",
        )
        .with_type(ItemType::BrandAwareness),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_contents() {
        let catalog = Catalog::with_default_items();
        assert_eq!(catalog.len(), 6);

        let ids: Vec<String> = catalog.snapshot().iter().map(|i| i.id.clone()).collect();
        assert_eq!(
            ids,
            vec![
                "fashion_001",
                "tech_001",
                "travel_001",
                "food_001",
                "fitness_001",
                "beauty_001"
            ]
        );
    }

    #[test]
    fn test_default_items_are_valid() {
        for item in default_items() {
            assert!(validate(&item).is_ok(), "{} should be valid", item.id);
        }
    }

    #[test]
    fn test_add_rejects_duplicate_id() {
        let catalog = Catalog::with_default_items();
        let result = catalog.add(Item::new("tech_001", "Dup", "dup", "Dup"));
        assert!(matches!(result, Err(CatalogError::DuplicateId(id)) if id == "tech_001"));
        assert_eq!(catalog.len(), 6);
    }

    #[test]
    fn test_add_rejects_out_of_range_weights() {
        let catalog = Catalog::empty();

        let bad_topic = Item::new("bad_1", "Bad", "bad", "Bad").with_topic("travel", 1.5);
        assert!(matches!(
            catalog.add(bad_topic),
            Err(CatalogError::InvalidItem(_))
        ));

        let bad_mood = Item::new("bad_2", "Bad", "bad", "Bad").with_mood(UserMood::Calm, -0.1);
        assert!(matches!(
            catalog.add(bad_mood),
            Err(CatalogError::InvalidItem(_))
        ));

        let blank_id = Item::new("  ", "Bad", "bad", "Bad");
        assert!(matches!(
            catalog.add(blank_id),
            Err(CatalogError::InvalidItem(_))
        ));

        assert!(catalog.is_empty());
    }

    #[test]
    fn test_set_active_keeps_position_and_old_snapshots() {
        let catalog = Catalog::with_default_items();
        let before = catalog.snapshot();

        catalog.set_active("travel_001", false).unwrap();

        let after = catalog.snapshot();
        assert_eq!(after[2].id, "travel_001");
        assert!(!after[2].active);
        // Earlier snapshot still sees the old value
        assert!(before[2].active);

        assert!(matches!(
            catalog.set_active("missing", false),
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn test_new_from_provider_items() {
        let catalog = Catalog::new(vec![
            Item::new("a", "A", "a", "BrandA"),
            Item::new("b", "B", "b", "BrandB"),
        ])
        .unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("b").map(|i| i.brand.clone()), Some("BrandB".to_string()));
        assert!(catalog.get("c").is_none());
    }
}
