use std::env;

#[derive(Debug, Clone)]
pub struct RecipeConfig {
    pub api_base_url: String,
}

impl RecipeConfig {
    pub fn from_env() -> Self {
        Self {
            api_base_url: env::var("MEALDB_API_URL")
                .unwrap_or_else(|_| "https://www.themealdb.com/api/json/v1/1".to_string()),
        }
    }
}

impl Default for RecipeConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
