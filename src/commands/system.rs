use colored::Colorize;

pub fn handle_command(input: &str) -> Result<(), String> {
    match input.to_lowercase().as_str() {
        "help" => {
            println!("\n🍳 Recipe Commands:");
            println!("  recipes           - List every fetched recipe");
            println!("  search <text>     - Search recipes by title");
            println!("  view <id>         - Show the full recipe (ingredients, steps, video)");
            println!("  reload            - Fetch the recipe listing again");
            println!("  Bare text also searches: try typing just 'chicken'");
            println!();

            println!("{} Saved Commands:", "♥".red());
            println!("  like <id>         - Save a recipe (or remove it again)");
            println!("  saved             - List your saved recipes");
            println!("  rate <id> <1-5>   - Rate a recipe");
            println!();

            println!("📷 Image Commands:");
            println!("  detect <path>     - Detect ingredients on a photo and match recipes");
            println!();

            println!("⚙️ System Commands:");
            println!("  help  - Show this help menu");
            println!("  exit  - Exit the program");
            println!();
            Ok(())
        }
        "exit" | "quit" => {
            println!("👋 Goodbye!");
            std::process::exit(0);
        }
        _ => Err("Unknown system command. Type 'help' for available commands.".to_string()),
    }
}
