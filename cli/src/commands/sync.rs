use std::sync::Arc;

use anyhow::Result;

use ladle_core::models::{Recipe, SyncReport};
use ladle_core::service::RecipeService;

use crate::api::ApiClient;

enum SyncOutcome {
    All(SyncReport),
    One(Recipe),
}

pub(crate) async fn cmd_sync(
    service: RecipeService,
    client: Arc<ApiClient>,
    recipe_id: Option<i64>,
    force: bool,
    json: bool,
) -> Result<()> {
    // The blocking RemoteRecipes impl drives the async client with
    // block_on, so the whole sync runs on a blocking thread.
    let outcome = tokio::task::spawn_blocking(move || match recipe_id {
        Some(id) => service.sync_one(client.as_ref(), id).map(SyncOutcome::One),
        None => service.sync_all(client.as_ref(), force).map(SyncOutcome::All),
    })
    .await??;

    match outcome {
        SyncOutcome::All(report) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{report}");
                for failure in &report.failed {
                    let id = failure.id;
                    let message = &failure.message;
                    eprintln!("  recipe {id}: {message}");
                }
            }
        }
        SyncOutcome::One(recipe) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&recipe)?);
            } else {
                let title = &recipe.title;
                println!("Fetched recipe: {title}");
            }
        }
    }

    Ok(())
}
