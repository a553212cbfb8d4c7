use clap::{Args, Subcommand, ValueEnum};

use crate::config::Config;
use crate::enhance::enhance_description;
use grimoire_core::{Ingredient, Recipe, RecipeRepository};

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct RecipeCommand {
    #[command(subcommand)]
    pub command: RecipeSubcommand,
}

#[derive(Subcommand)]
pub enum RecipeSubcommand {
    /// Add a new recipe
    Add {
        /// Name of the recipe
        name: String,

        /// Category (free text, e.g. "Potion" or "Dragon's Breath")
        #[arg(long, default_value = "Potion")]
        category: String,

        /// Description; generated when omitted and --describe is set
        #[arg(long)]
        description: Option<String>,

        /// Ingredient as "name:amount" (can be repeated)
        #[arg(long = "ingredient", value_name = "NAME:AMOUNT")]
        ingredients: Vec<String>,

        /// Preparation step (can be repeated, in order)
        #[arg(long = "step", value_name = "STEP")]
        steps: Vec<String>,

        /// Notes
        #[arg(long)]
        notes: Option<String>,

        /// Image URL
        #[arg(long)]
        image_url: Option<String>,

        /// Ask the enhancement service for a description
        #[arg(long)]
        describe: bool,
    },

    /// List all recipes, newest first
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Filter by category
        #[arg(long)]
        category: Option<String>,
    },

    /// Show a recipe's details
    Show {
        /// Recipe id or name
        identifier: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Edit an existing recipe
    Edit {
        /// Recipe id or name
        identifier: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New category
        #[arg(long)]
        category: Option<String>,

        /// New description
        #[arg(long)]
        description: Option<String>,

        /// Replace the ingredient list (can be repeated)
        #[arg(long = "ingredient", value_name = "NAME:AMOUNT")]
        ingredients: Vec<String>,

        /// Replace the step list (can be repeated, in order)
        #[arg(long = "step", value_name = "STEP")]
        steps: Vec<String>,

        /// New notes
        #[arg(long)]
        notes: Option<String>,

        /// New image URL
        #[arg(long)]
        image_url: Option<String>,
    },

    /// Delete a recipe
    Delete {
        /// Recipe id or name
        identifier: String,
    },
}

impl RecipeCommand {
    /// True for subcommands that only read local state.
    pub fn is_read(&self) -> bool {
        matches!(
            self.command,
            RecipeSubcommand::List { .. } | RecipeSubcommand::Show { .. }
        )
    }

    pub async fn run(
        &self,
        repo: &RecipeRepository,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            RecipeSubcommand::Add {
                name,
                category,
                description,
                ingredients,
                steps,
                notes,
                image_url,
                describe,
            } => {
                let ingredients = parse_ingredients(ingredients)?;

                let description = match (description, describe) {
                    (Some(text), _) => text.clone(),
                    (None, true) => {
                        let names: Vec<String> =
                            ingredients.iter().map(|i| i.name.clone()).collect();
                        enhance_description(config.enhance.api_url.as_deref(), name, &names).await
                    }
                    (None, false) => String::new(),
                };

                let mut recipe = Recipe::new(name.as_str(), category.as_str())
                    .with_description(description)
                    .with_ingredients(ingredients)
                    .with_steps(steps.clone());
                if let Some(notes) = notes {
                    recipe = recipe.with_notes(notes.as_str());
                }
                if let Some(url) = image_url {
                    recipe = recipe.with_image_url(url.as_str());
                }

                let saved = repo.save(recipe)?;
                println!("Added '{}' ({})", saved.name, saved.id);
                Ok(())
            }

            RecipeSubcommand::List { format, category } => {
                let mut recipes = repo.list()?;
                if let Some(category) = category {
                    recipes.retain(|r| r.category.eq_ignore_ascii_case(category));
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&recipes)?);
                    }
                    OutputFormat::Text => {
                        if recipes.is_empty() {
                            println!("The grimoire is empty.");
                        }
                        for recipe in &recipes {
                            println!("{}  {} [{}]", recipe.id, recipe.name, recipe.category);
                        }
                    }
                }
                Ok(())
            }

            RecipeSubcommand::Show { identifier, format } => {
                let recipe = find_recipe(repo, identifier)?;
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&recipe)?);
                    }
                    OutputFormat::Text => {
                        print!("{}", recipe);
                    }
                }
                Ok(())
            }

            RecipeSubcommand::Edit {
                identifier,
                name,
                category,
                description,
                ingredients,
                steps,
                notes,
                image_url,
            } => {
                let mut recipe = find_recipe(repo, identifier)?;

                if let Some(name) = name {
                    recipe.name = name.clone();
                }
                if let Some(category) = category {
                    recipe.category = category.clone();
                }
                if let Some(description) = description {
                    recipe.description = description.clone();
                }
                if !ingredients.is_empty() {
                    recipe.ingredients = parse_ingredients(ingredients)?;
                }
                if !steps.is_empty() {
                    recipe.steps = steps.clone();
                }
                if let Some(notes) = notes {
                    recipe.notes = notes.clone();
                }
                if let Some(url) = image_url {
                    recipe.image_url = url.clone();
                }

                let saved = repo.save(recipe)?;
                println!("Updated '{}' ({})", saved.name, saved.id);
                Ok(())
            }

            RecipeSubcommand::Delete { identifier } => {
                let recipe = find_recipe(repo, identifier)?;
                repo.delete(&recipe.id)?;
                println!("Deleted '{}' ({})", recipe.name, recipe.id);
                Ok(())
            }
        }
    }
}

/// Looks a recipe up by exact id, then by case-insensitive name.
fn find_recipe(
    repo: &RecipeRepository,
    identifier: &str,
) -> Result<Recipe, Box<dyn std::error::Error>> {
    let recipes = repo.list()?;

    if let Some(recipe) = recipes.iter().find(|r| r.id == identifier) {
        return Ok(recipe.clone());
    }
    if let Some(recipe) = recipes
        .iter()
        .find(|r| r.name.eq_ignore_ascii_case(identifier))
    {
        return Ok(recipe.clone());
    }

    Err(format!("No recipe found matching '{}'", identifier).into())
}

/// Parses "name:amount" pairs; a bare "name" gets an empty amount.
fn parse_ingredients(raw: &[String]) -> Result<Vec<Ingredient>, Box<dyn std::error::Error>> {
    raw.iter()
        .map(|entry| {
            let entry = entry.trim();
            if entry.is_empty() {
                return Err("Ingredient must not be empty".into());
            }
            Ok(match entry.split_once(':') {
                Some((name, amount)) => Ingredient::new(name.trim(), amount.trim()),
                None => Ingredient::new(entry, ""),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ingredient_with_amount() {
        let parsed = parse_ingredients(&["Espresso: 2 shots".to_string()]).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name, "Espresso");
        assert_eq!(parsed[0].amount, "2 shots");
    }

    #[test]
    fn test_parse_ingredient_without_amount() {
        let parsed = parse_ingredients(&["Stardust".to_string()]).unwrap();
        assert_eq!(parsed[0].name, "Stardust");
        assert!(parsed[0].amount.is_empty());
    }

    #[test]
    fn test_parse_ingredient_rejects_empty() {
        assert!(parse_ingredients(&["  ".to_string()]).is_err());
    }
}
