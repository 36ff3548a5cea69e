use std::path::Path;
use std::time::Duration;

use colored::Colorize;
use indicatif::ProgressBar;

use crate::classifier::{ClassifierError, IngredientClassifier};
use crate::recipes::Recipe;
use crate::search;

pub async fn handle_command(
    classifier: &IngredientClassifier,
    recipes: &[Recipe],
    path: &str,
) -> Result<(), String> {
    if path.is_empty() {
        println!("Usage: detect <image-path>");
        return Ok(());
    }
    if !Path::new(path).exists() {
        println!("No file found at \"{}\"", path);
        return Ok(());
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Processing image, please wait...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = classifier.classify(Path::new(path)).await;
    spinner.finish_and_clear();

    let predictions = match result {
        Ok(predictions) => predictions,
        Err(ClassifierError::Busy) => {
            println!("Still processing the previous image, try again in a moment.");
            return Ok(());
        }
        Err(e) => {
            log::warn!("Classification failed: {}", e);
            println!("{}", "Error in image classification.".red());
            return Ok(());
        }
    };

    if predictions.is_empty() {
        println!("Sorry, no recipe found for this ingredient.");
        return Ok(());
    }

    println!("Detected:");
    for prediction in &predictions {
        println!(
            "  {} ({:.0}%)",
            prediction.label,
            prediction.confidence * 100.0
        );
    }

    let labels: Vec<String> = predictions
        .iter()
        .flat_map(|prediction| prediction.terms())
        .collect();
    let matched = search::match_labels(recipes, &labels);

    if matched.is_empty() {
        println!("Sorry, no recipe found for this ingredient.");
        return Ok(());
    }

    println!("{}", format!("Found {} recipe(s)!", matched.len()).green());
    for recipe in &matched {
        println!(
            "  {}  {} ({})",
            recipe.id.cyan(),
            recipe.title,
            recipe.category
        );
    }
    Ok(())
}
