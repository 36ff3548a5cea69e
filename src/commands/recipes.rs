use colored::Colorize;

use crate::recipes::{Recipe, RecipeDetail, RecipeSource};
use crate::search;
use crate::store::PreferenceStore;

pub async fn list(recipes: &[Recipe], store: &PreferenceStore) -> Result<(), String> {
    if recipes.is_empty() {
        println!("Sorry, no recipes found. Try 'reload' to fetch the listing again.");
        return Ok(());
    }

    let all: Vec<&Recipe> = recipes.iter().collect();
    print_recipe_rows(&all, store).await
}

pub async fn search(recipes: &[Recipe], store: &PreferenceStore, query: &str) -> Result<(), String> {
    if query.trim().is_empty() {
        println!("Usage: search <text>");
        return Ok(());
    }

    let matched = search::filter_by_query(recipes, query);
    if matched.is_empty() {
        println!("Sorry, no recipes found for \"{}\"", query);
        return Ok(());
    }

    println!("{} recipe(s) for \"{}\":", matched.len(), query);
    print_recipe_rows(&matched, store).await
}

pub async fn view(
    source: &dyn RecipeSource,
    store: &PreferenceStore,
    id: &str,
) -> Result<(), String> {
    if id.is_empty() {
        println!("Usage: view <recipe-id>");
        return Ok(());
    }

    let Some(detail) = source.get_by_id(id).await else {
        println!("Sorry, no recipe found for id \"{}\"", id);
        return Ok(());
    };

    print_detail(&detail, store).await
}

async fn print_recipe_rows(rows: &[&Recipe], store: &PreferenceStore) -> Result<(), String> {
    let liked = store.liked_recipes().await.map_err(|e| e.to_string())?;
    let ratings = store.ratings().await.map_err(|e| e.to_string())?;

    for recipe in rows {
        let heart = if liked.iter().any(|item| item.id == recipe.id) {
            "♥".red().to_string()
        } else {
            " ".to_string()
        };
        let stars = ratings
            .get(&recipe.id)
            .map(|stars| format!("  {}", stars_display(*stars).yellow()))
            .unwrap_or_default();

        println!(
            "{} {}  {} ({}) - {} servings, {} min{}",
            heart,
            recipe.id.cyan(),
            recipe.title,
            recipe.category,
            recipe.servings,
            recipe.time_minutes,
            stars
        );
    }
    Ok(())
}

async fn print_detail(detail: &RecipeDetail, store: &PreferenceStore) -> Result<(), String> {
    println!("\n{}", detail.title.bold());
    println!("Category: {}", detail.category);
    println!("Servings: {}", detail.servings);
    println!("Cooking Time: {} min", detail.time_minutes);
    if !detail.thumbnail.is_empty() {
        println!("Photo: {}", detail.thumbnail);
    }

    println!("\nIngredients:");
    if detail.ingredients.is_empty() {
        println!("  Not available");
    }
    for pair in &detail.ingredients {
        if pair.measure.is_empty() {
            println!("  - {}", pair.ingredient);
        } else {
            println!("  - {} {}", pair.measure, pair.ingredient);
        }
    }

    println!("\nInstructions:");
    let steps = detail.instruction_steps();
    if steps.is_empty() {
        println!("  Not available");
    }
    for (index, step) in steps.iter().enumerate() {
        println!("  {}. {}.", index + 1, step);
    }

    if let Some(url) = &detail.youtube {
        println!("\n▶ Watch on YouTube: {}", url);
    }

    match store.rating(&detail.id).await.map_err(|e| e.to_string())? {
        Some(stars) => println!("\nYour rating: {}", stars_display(stars).yellow()),
        None => println!("\nNot rated yet. Rate it with: rate {} <1-5>", detail.id),
    }

    Ok(())
}

pub fn stars_display(stars: u8) -> String {
    let filled = "★".repeat(stars.min(5) as usize);
    let empty = "☆".repeat(5usize.saturating_sub(stars as usize));
    format!("{}{}", filled, empty)
}
