use std::num::NonZeroUsize;

use async_trait::async_trait;
use futures::future::join_all;
use lru::LruCache;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::super::config::RecipeConfig;
use super::super::source::RecipeSource;

/// The fixed category set the listing is aggregated from.
pub const CATEGORIES: [&str; 7] = [
    "Beef",
    "Chicken",
    "Dessert",
    "Lamb",
    "Pasta",
    "Seafood",
    "Vegetarian",
];

const DETAIL_CACHE_SIZE: usize = 64;

/// Lightweight recipe record as returned by the category listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub title: String,
    pub thumbnail: String,
    pub category: String,
    pub servings: u8,
    pub time_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientMeasure {
    pub ingredient: String,
    pub measure: String,
}

/// Full recipe record as returned by the by-id lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeDetail {
    pub id: String,
    pub title: String,
    pub thumbnail: String,
    pub category: String,
    pub servings: u8,
    pub time_minutes: u32,
    pub ingredients: Vec<IngredientMeasure>,
    pub instructions: String,
    pub youtube: Option<String>,
}

impl RecipeDetail {
    /// Instruction text split into displayable steps.
    pub fn instruction_steps(&self) -> Vec<String> {
        self.instructions
            .split(". ")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.trim_end_matches('.').to_string())
            .collect()
    }
}

pub struct MealDbClient {
    base_url: String,
    detail_cache: Mutex<LruCache<String, RecipeDetail>>,
}

impl MealDbClient {
    pub fn new(config: RecipeConfig) -> Self {
        let cache_size = NonZeroUsize::new(DETAIL_CACHE_SIZE).expect("cache size is nonzero");
        Self {
            base_url: config.api_base_url,
            detail_cache: Mutex::new(LruCache::new(cache_size)),
        }
    }

    /// Aggregates every category listing into one flat list. Any failed
    /// request or unparseable payload empties the whole listing.
    pub async fn list_all(&self) -> Vec<Recipe> {
        let fetches = CATEGORIES.iter().map(|category| self.fetch_category(category));

        let mut all = Vec::new();
        for result in join_all(fetches).await {
            match result {
                Ok(batch) => all.extend(batch),
                Err(e) => {
                    log::warn!("Error fetching recipes: {}", e);
                    return Vec::new();
                }
            }
        }
        all
    }

    async fn fetch_category(&self, category: &str) -> Result<Vec<Recipe>, String> {
        let client = reqwest::Client::new();
        let url = format!("{}/filter.php", self.base_url);

        let response = client
            .get(&url)
            .query(&[("c", category)])
            .send()
            .await
            .map_err(|e| format!("Failed to send request: {}", e))?;

        if !response.status().is_success() {
            return Err(format!(
                "API request failed with status: {}",
                response.status()
            ));
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse response: {}", e))?;

        Ok(parse_category_listing(&data, category))
    }

    /// Looks up one recipe by id, answering from the detail cache when the
    /// same recipe was viewed before. Errors and misses both come back as
    /// `None`.
    pub async fn get_by_id(&self, id: &str) -> Option<RecipeDetail> {
        if let Some(detail) = self.detail_cache.lock().await.get(id) {
            return Some(detail.clone());
        }

        match self.fetch_by_id(id).await {
            Ok(Some(detail)) => {
                self.detail_cache
                    .lock()
                    .await
                    .put(id.to_string(), detail.clone());
                Some(detail)
            }
            Ok(None) => None,
            Err(e) => {
                log::warn!("Error fetching recipe details: {}", e);
                None
            }
        }
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Option<RecipeDetail>, String> {
        let client = reqwest::Client::new();
        let url = format!("{}/lookup.php", self.base_url);

        let response = client
            .get(&url)
            .query(&[("i", id)])
            .send()
            .await
            .map_err(|e| format!("Failed to send request: {}", e))?;

        if !response.status().is_success() {
            return Err(format!(
                "API request failed with status: {}",
                response.status()
            ));
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse response: {}", e))?;

        let detail = data
            .get("meals")
            .and_then(|m| m.as_array())
            .and_then(|meals| meals.first())
            .and_then(parse_detail);

        Ok(detail)
    }
}

#[async_trait]
impl RecipeSource for MealDbClient {
    async fn list_all(&self) -> Vec<Recipe> {
        MealDbClient::list_all(self).await
    }

    async fn get_by_id(&self, id: &str) -> Option<RecipeDetail> {
        MealDbClient::get_by_id(self, id).await
    }
}

fn parse_category_listing(data: &serde_json::Value, category: &str) -> Vec<Recipe> {
    let Some(meals) = data.get("meals").and_then(|m| m.as_array()) else {
        return Vec::new();
    };

    meals
        .iter()
        .filter_map(|meal| {
            let id = meal.get("idMeal").and_then(|v| v.as_str())?;
            let title = meal.get("strMeal").and_then(|v| v.as_str())?;
            let thumbnail = meal
                .get("strMealThumb")
                .and_then(|v| v.as_str())
                .unwrap_or_default();

            Some(Recipe {
                id: id.to_string(),
                title: title.to_string(),
                thumbnail: thumbnail.to_string(),
                category: category.to_string(),
                servings: estimated_servings(),
                time_minutes: estimated_time_minutes(),
            })
        })
        .collect()
}

fn parse_detail(meal: &serde_json::Value) -> Option<RecipeDetail> {
    let id = meal.get("idMeal").and_then(|v| v.as_str())?;
    let title = meal.get("strMeal").and_then(|v| v.as_str())?;
    let thumbnail = meal
        .get("strMealThumb")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    let category = meal
        .get("strCategory")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    let instructions = meal
        .get("strInstructions")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    let youtube = meal
        .get("strYoutube")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);

    Some(RecipeDetail {
        id: id.to_string(),
        title: title.to_string(),
        thumbnail: thumbnail.to_string(),
        category: category.to_string(),
        servings: estimated_servings(),
        time_minutes: estimated_time_minutes(),
        ingredients: parse_ingredients(meal),
        instructions: instructions.to_string(),
        youtube,
    })
}

/// The API spreads ingredients over 20 numbered optional field pairs.
/// Collect the non-empty ones into ordered (ingredient, measure) pairs.
fn parse_ingredients(meal: &serde_json::Value) -> Vec<IngredientMeasure> {
    (1..=20)
        .filter_map(|n| {
            let ingredient = meal
                .get(format!("strIngredient{}", n))
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())?;
            let measure = meal
                .get(format!("strMeasure{}", n))
                .and_then(|v| v.as_str())
                .map(str::trim)
                .unwrap_or_default();

            Some(IngredientMeasure {
                ingredient: ingredient.to_string(),
                measure: measure.to_string(),
            })
        })
        .collect()
}

// Servings and cooking time are not part of the API payload; the listing
// decorates each record with rough estimates (1-4 servings, 15-45 min).
fn estimated_servings() -> u8 {
    rand::thread_rng().gen_range(1..=4)
}

fn estimated_time_minutes() -> u32 {
    15 + rand::thread_rng().gen_range(0..30)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_category_listing() {
        let data = serde_json::json!({
            "meals": [
                {
                    "idMeal": "52772",
                    "strMeal": "Teriyaki Chicken Casserole",
                    "strMealThumb": "https://www.themealdb.com/images/media/meals/wvpsxx1468256321.jpg"
                },
                {
                    "idMeal": "52959",
                    "strMeal": "Baked salmon with fennel & tomatoes",
                    "strMealThumb": "https://www.themealdb.com/images/media/meals/1548772327.jpg"
                }
            ]
        });

        let recipes = parse_category_listing(&data, "Chicken");
        assert_eq!(recipes.len(), 2);
        assert_eq!(recipes[0].id, "52772");
        assert_eq!(recipes[0].title, "Teriyaki Chicken Casserole");
        assert_eq!(recipes[0].category, "Chicken");
        assert!((1..=4).contains(&recipes[0].servings));
        assert!((15..45).contains(&recipes[0].time_minutes));
    }

    #[test]
    fn test_parse_category_listing_null_meals() {
        let data = serde_json::json!({ "meals": null });
        assert!(parse_category_listing(&data, "Beef").is_empty());
    }

    #[test]
    fn test_parse_detail_collects_numbered_ingredients() {
        let meal = serde_json::json!({
            "idMeal": "52940",
            "strMeal": "Brown Stew Chicken",
            "strMealThumb": "https://www.themealdb.com/images/media/meals/sypxpx1515365095.jpg",
            "strCategory": "Chicken",
            "strInstructions": "Squeeze lime over chicken. Rub well. Drain and pat dry.",
            "strYoutube": "https://www.youtube.com/watch?v=_gFB1fkNhXs",
            "strIngredient1": "Chicken",
            "strMeasure1": "1 whole",
            "strIngredient2": "Tomato",
            "strMeasure2": "1 chopped",
            "strIngredient3": "",
            "strMeasure3": " ",
            "strIngredient4": null,
            "strMeasure4": null
        });

        let detail = parse_detail(&meal).expect("detail should parse");
        assert_eq!(detail.id, "52940");
        assert_eq!(detail.ingredients.len(), 2);
        assert_eq!(detail.ingredients[0].ingredient, "Chicken");
        assert_eq!(detail.ingredients[0].measure, "1 whole");
        assert_eq!(detail.ingredients[1].ingredient, "Tomato");
        assert_eq!(detail.youtube.as_deref(), Some("https://www.youtube.com/watch?v=_gFB1fkNhXs"));
    }

    #[test]
    fn test_parse_detail_missing_id_is_none() {
        let meal = serde_json::json!({ "strMeal": "Mystery Dish" });
        assert!(parse_detail(&meal).is_none());
    }

    #[tokio::test]
    async fn test_unreachable_api_yields_empty_results() {
        let client = MealDbClient::new(RecipeConfig {
            api_base_url: "http://127.0.0.1:9".to_string(),
        });

        assert!(client.list_all().await.is_empty());
        assert!(client.get_by_id("52772").await.is_none());
    }

    #[test]
    fn test_instruction_steps_split() {
        let detail = RecipeDetail {
            id: "1".to_string(),
            title: "Test".to_string(),
            thumbnail: String::new(),
            category: "Beef".to_string(),
            servings: 2,
            time_minutes: 30,
            ingredients: Vec::new(),
            instructions: "Chop the onions. Brown the beef.  Simmer for an hour.".to_string(),
            youtube: None,
        };

        let steps = detail.instruction_steps();
        assert_eq!(steps, vec!["Chop the onions", "Brown the beef", "Simmer for an hour"]);
    }
}
