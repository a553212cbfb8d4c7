use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::ingredient::Ingredient;

/// A catalog entry in the grimoire.
///
/// Field names serialize in camelCase because the sync backend speaks the
/// same JSON shape (`imageUrl`, `createdAt`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub notes: String,
    /// Epoch milliseconds. Immutable once assigned; used as the merge
    /// tie-breaker and the newest-first display order.
    pub created_at: i64,
}

impl Recipe {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            category: category.into(),
            description: String::new(),
            image_url: String::new(),
            ingredients: Vec::new(),
            steps: Vec::new(),
            notes: String::new(),
            created_at: Utc::now().timestamp_millis(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = image_url.into();
        self
    }

    pub fn with_ingredients(mut self, ingredients: Vec<Ingredient>) -> Self {
        self.ingredients = ingredients;
        self
    }

    pub fn with_steps(mut self, steps: Vec<String>) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "{}", "=".repeat(self.name.len()))?;
        writeln!(f, "Category: {}", self.category)?;

        if !self.description.is_empty() {
            writeln!(f, "\n{}", self.description)?;
        }

        if !self.ingredients.is_empty() {
            writeln!(f, "\nIngredients:")?;
            for ingredient in &self.ingredients {
                writeln!(f, "  - {}", ingredient)?;
            }
        }

        if !self.steps.is_empty() {
            writeln!(f, "\nSteps:")?;
            for (i, step) in self.steps.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, step)?;
            }
        }

        if !self.notes.is_empty() {
            writeln!(f, "\nNotes: {}", self.notes)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipe_new() {
        let recipe = Recipe::new("Dragon Fire Latte", "Potion");
        assert_eq!(recipe.name, "Dragon Fire Latte");
        assert_eq!(recipe.category, "Potion");
        assert!(!recipe.id.is_empty());
        assert!(recipe.created_at > 0);
        assert!(recipe.ingredients.is_empty());
        assert!(recipe.steps.is_empty());
    }

    #[test]
    fn test_recipe_builder() {
        let recipe = Recipe::new("Elven Forest Tea", "Nectar")
            .with_description("Fresh and revitalizing.")
            .with_ingredients(vec![
                Ingredient::new("Green Tea Leaves", "5g"),
                Ingredient::new("Honey", "1 tsp"),
            ])
            .with_steps(vec!["Brew.".into(), "Strain.".into()])
            .with_notes("Best enjoyed with a thick tome.");

        assert_eq!(recipe.ingredients.len(), 2);
        assert_eq!(recipe.steps.len(), 2);
        assert_eq!(recipe.notes, "Best enjoyed with a thick tome.");
    }

    #[test]
    fn test_recipe_unique_ids() {
        let a = Recipe::new("A", "Potion");
        let b = Recipe::new("B", "Potion");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_recipe_json_camel_case() {
        let recipe = Recipe::new("Test", "Brew").with_image_url("https://example.com/x.jpg");
        let json = serde_json::to_string(&recipe).unwrap();
        assert!(json.contains("\"imageUrl\""));
        assert!(json.contains("\"createdAt\""));
        assert!(!json.contains("image_url"));

        let parsed: Recipe = serde_json::from_str(&json).unwrap();
        assert_eq!(recipe, parsed);
    }

    #[test]
    fn test_recipe_json_missing_optional_fields() {
        // Records written by older devices may omit empty fields.
        let json = r#"{"id":"1","name":"Bare","category":"Brew","createdAt":42}"#;
        let parsed: Recipe = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.created_at, 42);
        assert!(parsed.description.is_empty());
        assert!(parsed.ingredients.is_empty());
    }

    #[test]
    fn test_recipe_display() {
        let recipe = Recipe::new("Test Brew", "Elixir")
            .with_ingredients(vec![Ingredient::new("Water", "300ml")])
            .with_steps(vec!["Boil the water.".into()]);

        let output = format!("{}", recipe);
        assert!(output.contains("Test Brew"));
        assert!(output.contains("Category: Elixir"));
        assert!(output.contains("300ml of Water"));
        assert!(output.contains("1. Boil the water."));
    }
}
