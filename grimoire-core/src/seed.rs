//! Default seed collection for a fresh grimoire.
//!
//! Written on first access and whenever the stored collection is
//! unreadable.

use chrono::Utc;

use crate::models::{Ingredient, Recipe};

/// Builds the two starter recipes every new device begins with.
///
/// Ids "1" and "2" are fixed so all devices converge on the same seed
/// records; timestamps are relative to creation time (the tea predates the
/// latte by 100 seconds) so the display order is stable.
pub fn seed_recipes() -> Vec<Recipe> {
    let now = Utc::now().timestamp_millis();

    vec![
        Recipe {
            id: "1".to_string(),
            name: "Dragon Fire Latte".to_string(),
            category: "Potion".to_string(),
            description: "A spicy, warming concoction that grants the drinker the courage \
                          of a knight. Infused with cinnamon and chili flakes."
                .to_string(),
            image_url: "https://picsum.photos/id/431/800/600".to_string(),
            ingredients: vec![
                Ingredient::new("Espresso", "2 shots"),
                Ingredient::new("Milk", "200ml"),
                Ingredient::new("Cinnamon Syrup", "15ml"),
                Ingredient::new("Chili Flakes", "1 pinch"),
            ],
            steps: vec![
                "Extract 2 shots of espresso into a goblet.".to_string(),
                "Mix in the cinnamon syrup thoroughly.".to_string(),
                "Steam milk until velvety foam forms.".to_string(),
                "Pour milk over espresso.".to_string(),
                "Garnish with a pinch of chili flakes.".to_string(),
            ],
            notes: "Serve in a copper mug for maximum effect.".to_string(),
            created_at: now,
        },
        Recipe {
            id: "2".to_string(),
            name: "Elven Forest Tea".to_string(),
            category: "Nectar".to_string(),
            description: "Fresh and revitalizing. Gathered from the deepest leaves of the \
                          Whispering Woods."
                .to_string(),
            image_url: "https://picsum.photos/id/102/800/600".to_string(),
            ingredients: vec![
                Ingredient::new("Green Tea Leaves", "5g"),
                Ingredient::new("Honey", "1 tsp"),
                Ingredient::new("Mint Leaves", "3 leaves"),
                Ingredient::new("Hot Water", "300ml"),
            ],
            steps: vec![
                "Brew tea leaves in 80°C water for 3 minutes.".to_string(),
                "Strain into a ceramic vessel.".to_string(),
                "Stir in honey while chanting softly.".to_string(),
                "Top with fresh mint.".to_string(),
            ],
            notes: "Best enjoyed while reading a thick tome.".to_string(),
            created_at: now - 100_000,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_has_two_recipes() {
        let seeds = seed_recipes();
        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0].id, "1");
        assert_eq!(seeds[1].id, "2");
    }

    #[test]
    fn test_seed_newest_first() {
        let seeds = seed_recipes();
        assert!(seeds[0].created_at > seeds[1].created_at);
        assert_eq!(seeds[0].created_at - seeds[1].created_at, 100_000);
    }
}
