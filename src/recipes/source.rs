use async_trait::async_trait;

use super::api::mealdb::{Recipe, RecipeDetail};

/// Anything the command layer can browse recipes from.
#[async_trait]
pub trait RecipeSource: Send + Sync {
    /// Full listing across all categories. Failures degrade to an empty list.
    async fn list_all(&self) -> Vec<Recipe>;

    /// Full record for one recipe, or `None` if missing or unreachable.
    async fn get_by_id(&self, id: &str) -> Option<RecipeDetail>;
}
