mod api;
mod commands;
mod config;

use std::process;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::api::ApiClient;
use crate::commands::{
    cmd_list, cmd_login, cmd_search, cmd_shop_add, cmd_shop_check, cmd_shop_clear, cmd_shop_list,
    cmd_shop_remove, cmd_show, cmd_star, cmd_starred, cmd_sync, cmd_tag,
};
use crate::config::Config;
use ladle_core::credentials::CredentialsStore;
use ladle_core::service::RecipeService;

#[derive(Parser)]
#[command(
    name = "ladle",
    version,
    about = "A recipe box in your terminal",
    long_about = "\n\n   _           _ _\n  | | __ _  __| | | ___\n  | |/ _` |/ _` | |/ _ \\\n  | | (_| | (_| | |  __/\n  |_|\\__,_|\\__,_|_|\\___|\n     your recipes, synced.\n"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store login credentials and open a session with the recipe server
    Login {
        /// Account name (the server calls this an email address)
        username: String,
        /// Password (prompted on stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Fetch new and updated recipes from the server
    Sync {
        /// Re-fetch every recipe regardless of timestamps
        #[arg(long)]
        force: bool,
        /// Fetch a single recipe by id, unconditionally
        #[arg(long)]
        recipe: Option<i64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all locally cached recipes
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one recipe in full
    Show {
        /// Recipe id
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search cached recipes by title, ingredient, or tag
    Search {
        /// Search query (substring match)
        query: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List recipes carrying a tag
    Tag {
        /// Tag to filter by (exact match)
        tag: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List starred recipes
    Starred {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Star a recipe
    Star {
        /// Recipe id
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a star
    Unstar {
        /// Recipe id
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage the shopping list
    Shop {
        #[command(subcommand)]
        command: ShopCommands,
    },
}

#[derive(Subcommand)]
enum ShopCommands {
    /// Add an item (a name already on the list is left alone)
    Add {
        /// Item name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the shopping list
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark an item as bought
    Check {
        /// Item id
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Unmark an item
    Uncheck {
        /// Item id
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove an item
    Remove {
        /// Item id
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Empty the list
    Clear {
        /// Only remove checked items
        #[arg(long)]
        checked: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let credentials = Arc::new(CredentialsStore::open(&config.credentials_path)?);
    let service = RecipeService::new(&config.db_path)?;

    match cli.command {
        Commands::Login { username, password } => {
            let client = ApiClient::new(&config.api_url, Arc::clone(&credentials));
            cmd_login(&credentials, &client, &username, password).await
        }
        Commands::Sync {
            force,
            recipe,
            json,
        } => {
            let client = Arc::new(ApiClient::new(&config.api_url, Arc::clone(&credentials)));
            cmd_sync(service, client, recipe, force, json).await
        }
        Commands::List { json } => cmd_list(&service, json),
        Commands::Show { id, json } => cmd_show(&service, id, json),
        Commands::Search { query, json } => cmd_search(&service, &query, json),
        Commands::Tag { tag, json } => cmd_tag(&service, &tag, json),
        Commands::Starred { json } => cmd_starred(&service, json),
        Commands::Star { id, json } => cmd_star(&service, id, true, json),
        Commands::Unstar { id, json } => cmd_star(&service, id, false, json),
        Commands::Shop { command } => match command {
            ShopCommands::Add { name, json } => cmd_shop_add(&service, &name, json),
            ShopCommands::List { json } => cmd_shop_list(&service, json),
            ShopCommands::Check { id, json } => cmd_shop_check(&service, id, true, json),
            ShopCommands::Uncheck { id, json } => cmd_shop_check(&service, id, false, json),
            ShopCommands::Remove { id, json } => cmd_shop_remove(&service, id, json),
            ShopCommands::Clear { checked, json } => cmd_shop_clear(&service, checked, json),
        },
    }
}
