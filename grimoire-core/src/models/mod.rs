mod ingredient;
mod pending;
mod recipe;

pub use ingredient::Ingredient;
pub use pending::PendingChange;
pub use recipe::Recipe;
