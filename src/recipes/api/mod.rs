pub mod mealdb;

// Re-export common types
pub use mealdb::MealDbClient;
