pub mod api;
pub mod config;
pub mod source;

// Re-export common types
pub use api::mealdb::{IngredientMeasure, MealDbClient, Recipe, RecipeDetail, CATEGORIES};
pub use config::RecipeConfig;
pub use source::RecipeSource;
