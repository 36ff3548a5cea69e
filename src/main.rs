use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use dotenv::dotenv;
use indicatif::ProgressBar;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;

use what_to_cook::classifier::{ClassifierConfig, IngredientClassifier};
use what_to_cook::commands::CommandHandler;
use what_to_cook::recipes::{MealDbClient, RecipeConfig, CATEGORIES};
use what_to_cook::store::{PreferenceEvent, PreferenceStore};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the preference database and cached model files
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    std::fs::create_dir_all(&args.data_dir)?;

    let store = Arc::new(PreferenceStore::new(args.data_dir.join("preferences.db")).await?);
    let classifier = Arc::new(IngredientClassifier::new(
        ClassifierConfig::from_env(),
        args.data_dir.join("models"),
    ));
    let client = MealDbClient::new(RecipeConfig::from_env());

    let mut handler = CommandHandler::new(Box::new(client), store.clone(), classifier);

    // Every surface sharing the store hears about likes and ratings
    // through this channel.
    let mut events = store.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                PreferenceEvent::LikesChanged { count } => {
                    log::info!("Saved recipes updated ({} total)", count);
                }
                PreferenceEvent::RatingChanged { id, stars } => {
                    log::info!("Rating updated for {}: {} star(s)", id, stars);
                }
            }
        }
    });

    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Loading recipes...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    let count = handler.load_recipes().await;
    spinner.finish_and_clear();

    if count == 0 {
        println!(
            "{}",
            "Sorry, no recipes found. Check your connection and try 'reload'.".yellow()
        );
    } else {
        println!(
            "Loaded {} recipes across {} categories",
            count.to_string().cyan(),
            CATEGORIES.len()
        );
    }

    // Show initial help menu
    if let Err(e) = handler.handle_command("help").await {
        println!("{}", e.red());
    }

    // Initialize rustyline editor
    let mut rl = Editor::<(), DefaultHistory>::new()?;

    // Main input loop
    loop {
        match rl.readline("🍳 ") {
            Ok(line) => {
                let input = line.trim();
                let _ = rl.add_history_entry(input);

                if let Err(e) = handler.handle_command(input).await {
                    println!("{}", e.red());
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }
    Ok(())
}
