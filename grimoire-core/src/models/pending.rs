use serde::{Deserialize, Serialize};

use super::recipe::Recipe;

/// One locally recorded mutation that has not yet been confirmed delivered
/// to the backend.
///
/// The queue keeps every change in enqueue order with no deduplication; the
/// backend applies them idempotently with the last one winning. The wire
/// shape is `{"action": "add", "recipe": {...}, "timestamp": ...}` with
/// deletes carrying `recipeId` only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum PendingChange {
    Add {
        recipe: Recipe,
        timestamp: i64,
    },
    Update {
        recipe: Recipe,
        timestamp: i64,
    },
    Delete {
        #[serde(rename = "recipeId")]
        recipe_id: String,
        timestamp: i64,
    },
}

impl PendingChange {
    pub fn add(recipe: Recipe, timestamp: i64) -> Self {
        Self::Add { recipe, timestamp }
    }

    pub fn update(recipe: Recipe, timestamp: i64) -> Self {
        Self::Update { recipe, timestamp }
    }

    pub fn delete(recipe_id: impl Into<String>, timestamp: i64) -> Self {
        Self::Delete {
            recipe_id: recipe_id.into(),
            timestamp,
        }
    }

    /// The action name as it appears on the wire.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }

    /// Enqueue time in epoch milliseconds.
    pub fn timestamp(&self) -> i64 {
        match self {
            Self::Add { timestamp, .. }
            | Self::Update { timestamp, .. }
            | Self::Delete { timestamp, .. } => *timestamp,
        }
    }

    /// Id of the recipe this change targets.
    pub fn recipe_id(&self) -> &str {
        match self {
            Self::Add { recipe, .. } | Self::Update { recipe, .. } => &recipe.id,
            Self::Delete { recipe_id, .. } => recipe_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names() {
        let recipe = Recipe::new("Test", "Potion");
        assert_eq!(PendingChange::add(recipe.clone(), 1).action(), "add");
        assert_eq!(PendingChange::update(recipe, 2).action(), "update");
        assert_eq!(PendingChange::delete("x", 3).action(), "delete");
    }

    #[test]
    fn test_delete_wire_shape() {
        let change = PendingChange::delete("abc123", 1705270000000);
        let json = serde_json::to_string(&change).unwrap();
        assert!(json.contains("\"action\":\"delete\""));
        assert!(json.contains("\"recipeId\":\"abc123\""));

        let parsed: PendingChange = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.recipe_id(), "abc123");
        assert_eq!(parsed.timestamp(), 1705270000000);
    }

    #[test]
    fn test_add_carries_full_recipe() {
        let recipe = Recipe::new("Moon Milk", "Elixir");
        let change = PendingChange::add(recipe.clone(), 99);
        let json = serde_json::to_string(&change).unwrap();
        let parsed: PendingChange = serde_json::from_str(&json).unwrap();
        match parsed {
            PendingChange::Add { recipe: r, .. } => assert_eq!(r, recipe),
            other => panic!("expected add, got {}", other.action()),
        }
    }
}
