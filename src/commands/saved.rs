use colored::Colorize;

use super::recipes::stars_display;
use crate::recipes::Recipe;
use crate::store::{PreferenceStore, StoreError};

pub async fn toggle(recipes: &[Recipe], store: &PreferenceStore, id: &str) -> Result<(), String> {
    if id.is_empty() {
        println!("Usage: like <recipe-id>");
        return Ok(());
    }

    let Some(recipe) = recipes.iter().find(|recipe| recipe.id == id) else {
        println!(
            "No recipe with id \"{}\" in the current listing. Try 'recipes' first.",
            id
        );
        return Ok(());
    };

    let now_liked = store.toggle_like(recipe).await.map_err(|e| e.to_string())?;
    if now_liked {
        println!("{}", "Recipe saved!".green());
    } else {
        println!("Recipe removed from saved!");
    }
    Ok(())
}

pub async fn list(store: &PreferenceStore) -> Result<(), String> {
    let liked = store.liked_recipes().await.map_err(|e| e.to_string())?;
    if liked.is_empty() {
        println!("Please save a recipe first!");
        return Ok(());
    }

    let ratings = store.ratings().await.map_err(|e| e.to_string())?;

    println!("{} Saved recipes ({}):", "♥".red(), liked.len());
    for recipe in &liked {
        let stars = ratings
            .get(&recipe.id)
            .map(|stars| format!("  {}", stars_display(*stars).yellow()))
            .unwrap_or_default();
        println!(
            "  {}  {} ({}){}",
            recipe.id.cyan(),
            recipe.title,
            recipe.category,
            stars
        );
    }
    Ok(())
}

pub async fn rate(store: &PreferenceStore, input: &str) -> Result<(), String> {
    let parts: Vec<&str> = input.split_whitespace().collect();
    if parts.len() != 3 {
        println!("Usage: rate <recipe-id> <1-5>");
        return Ok(());
    }

    let id = parts[1];
    let stars: u8 = match parts[2].parse() {
        Ok(value) => value,
        Err(_) => {
            println!("Usage: rate <recipe-id> <1-5>");
            return Ok(());
        }
    };

    match store.set_rating(id, stars).await {
        Ok(()) => {
            println!("Rated {} {}", id.cyan(), stars_display(stars).yellow());
            Ok(())
        }
        Err(StoreError::InvalidRating(value)) => {
            println!("Rating must be between 1 and 5, got {}", value);
            Ok(())
        }
        Err(e) => Err(e.to_string()),
    }
}
