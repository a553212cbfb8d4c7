//! Reconciliation of two recipe collections.
//!
//! Merge rules:
//! - id present only locally or only remotely: keep it
//! - id present in both: the strictly greater `created_at` wins; on equal
//!   timestamps the local copy is kept
//!
//! The merge is idempotent, commutative up to the timestamp tie-break, and
//! deterministic for identical inputs.

use std::collections::HashMap;

use crate::models::Recipe;

/// Merges `remote` into `local` and returns the canonical collection,
/// ordered newest first (ties broken by id so the output is stable).
pub fn merge_recipes(local: &[Recipe], remote: &[Recipe]) -> Vec<Recipe> {
    let mut by_id: HashMap<&str, &Recipe> =
        local.iter().map(|r| (r.id.as_str(), r)).collect();

    for recipe in remote {
        match by_id.get(recipe.id.as_str()) {
            Some(existing) if recipe.created_at <= existing.created_at => {}
            _ => {
                by_id.insert(recipe.id.as_str(), recipe);
            }
        }
    }

    let mut merged: Vec<Recipe> = by_id.into_values().cloned().collect();
    merged.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    merged
}
