use std::sync::Arc;

use crate::classifier::IngredientClassifier;
use crate::recipes::{Recipe, RecipeSource};
use crate::store::PreferenceStore;

mod detect;
mod recipes;
mod saved;
mod system;

pub struct CommandHandler {
    source: Box<dyn RecipeSource>,
    store: Arc<PreferenceStore>,
    classifier: Arc<IngredientClassifier>,
    // Listing cache the search and like commands work against.
    recipes: Vec<Recipe>,
}

impl CommandHandler {
    pub fn new(
        source: Box<dyn RecipeSource>,
        store: Arc<PreferenceStore>,
        classifier: Arc<IngredientClassifier>,
    ) -> Self {
        Self {
            source,
            store,
            classifier,
            recipes: Vec::new(),
        }
    }

    /// Fetches the full recipe listing and caches it. Returns how many
    /// recipes are available afterwards.
    pub async fn load_recipes(&mut self) -> usize {
        self.recipes = self.source.list_all().await;
        self.recipes.len()
    }

    pub async fn handle_command(&mut self, input: &str) -> Result<(), String> {
        if input.is_empty() {
            return Ok(());
        }

        let input = input.trim();

        // Handle single-word commands first
        match input.to_lowercase().as_str() {
            "help" | "exit" | "quit" => return system::handle_command(input),
            "recipes" | "all" => return recipes::list(&self.recipes, &self.store).await,
            "saved" | "likes" => return saved::list(&self.store).await,
            "reload" => {
                let count = self.load_recipes().await;
                println!("Loaded {} recipes", count);
                return Ok(());
            }
            _ => {}
        }

        // Handle command prefixes
        if input.starts_with("search ") {
            let query = input.trim_start_matches("search ").trim();
            return recipes::search(&self.recipes, &self.store, query).await;
        }

        if input.starts_with("view ") {
            let id = input.trim_start_matches("view ").trim();
            return recipes::view(self.source.as_ref(), &self.store, id).await;
        }

        if input.starts_with("like ") {
            let id = input.trim_start_matches("like ").trim();
            return saved::toggle(&self.recipes, &self.store, id).await;
        }

        if input.starts_with("rate ") {
            return saved::rate(&self.store, input).await;
        }

        if input.starts_with("detect ") {
            let path = input.trim_start_matches("detect ").trim();
            return detect::handle_command(&self.classifier, &self.recipes, path).await;
        }

        // Anything else is treated as a title search, like typing into
        // the search box.
        recipes::search(&self.recipes, &self.store, input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ClassifierConfig;
    use crate::recipes::RecipeDetail;
    use async_trait::async_trait;

    struct FixedSource {
        recipes: Vec<Recipe>,
    }

    #[async_trait]
    impl RecipeSource for FixedSource {
        async fn list_all(&self) -> Vec<Recipe> {
            self.recipes.clone()
        }

        async fn get_by_id(&self, _id: &str) -> Option<RecipeDetail> {
            None
        }
    }

    fn recipe(id: &str, title: &str) -> Recipe {
        Recipe {
            id: id.to_string(),
            title: title.to_string(),
            thumbnail: String::new(),
            category: "Pasta".to_string(),
            servings: 2,
            time_minutes: 20,
        }
    }

    async fn handler_with(recipes: Vec<Recipe>) -> CommandHandler {
        let store = Arc::new(PreferenceStore::in_memory().await.unwrap());
        let classifier = Arc::new(IngredientClassifier::new(
            ClassifierConfig::from_env(),
            "target/test-models",
        ));
        CommandHandler::new(Box::new(FixedSource { recipes }), store, classifier)
    }

    #[tokio::test]
    async fn test_load_recipes_caches_listing() {
        let mut handler = handler_with(vec![
            recipe("1", "Lasagne"),
            recipe("2", "Carbonara"),
        ])
        .await;

        assert_eq!(handler.load_recipes().await, 2);
        assert_eq!(handler.recipes.len(), 2);
    }

    #[tokio::test]
    async fn test_like_command_round_trips_through_store() {
        let mut handler = handler_with(vec![recipe("1", "Lasagne")]).await;
        handler.load_recipes().await;

        handler.handle_command("like 1").await.unwrap();
        assert!(handler.store.is_liked("1").await.unwrap());

        handler.handle_command("like 1").await.unwrap();
        assert!(!handler.store.is_liked("1").await.unwrap());
    }

    #[tokio::test]
    async fn test_rate_command_persists_rating() {
        let mut handler = handler_with(vec![recipe("1", "Lasagne")]).await;
        handler.load_recipes().await;

        handler.handle_command("rate 1 4").await.unwrap();
        assert_eq!(handler.store.rating("1").await.unwrap(), Some(4));

        // Malformed values fall back to a usage message, not an error
        handler.handle_command("rate 1 nine").await.unwrap();
        assert_eq!(handler.store.rating("1").await.unwrap(), Some(4));
    }

    #[tokio::test]
    async fn test_free_text_falls_through_to_search() {
        let mut handler = handler_with(vec![recipe("1", "Lasagne")]).await;
        handler.load_recipes().await;

        assert!(handler.handle_command("lasagne").await.is_ok());
        assert!(handler.handle_command("").await.is_ok());
    }
}
