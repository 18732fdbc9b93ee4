use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::watch;

use crate::db::Database;
use crate::error::ApiError;
use crate::models::{
    Recipe, RecipeSummary, ShoppingListItem, SyncFailure, SyncReport, needs_update,
};

/// Remote recipe source.
///
/// The CLI implements this with reqwest; tests use an in-memory mock.
/// Called synchronously — async callers should drive `RecipeService`
/// methods from a blocking task.
pub trait RemoteRecipes: Send + Sync {
    fn fetch_index(&self) -> Result<Vec<RecipeSummary>, ApiError>;
    fn fetch_details(&self, id: i64) -> Result<Recipe, ApiError>;
}

pub struct RecipeService {
    db: Database,
    recipes_tx: watch::Sender<Vec<Recipe>>,
    items_tx: watch::Sender<Vec<ShoppingListItem>>,
}

impl RecipeService {
    pub fn new(db_path: &Path) -> Result<Self> {
        Self::with_database(Database::open(db_path)?)
    }

    pub fn new_in_memory() -> Result<Self> {
        Self::with_database(Database::open_in_memory()?)
    }

    fn with_database(db: Database) -> Result<Self> {
        let (recipes_tx, _) = watch::channel(db.list_recipes()?);
        let (items_tx, _) = watch::channel(db.list_items()?);
        Ok(Self {
            db,
            recipes_tx,
            items_tx,
        })
    }

    // --- Recipes ---

    pub fn list_recipes(&self) -> Result<Vec<Recipe>> {
        self.db.list_recipes()
    }

    pub fn get_recipe(&self, id: i64) -> Result<Option<Recipe>> {
        self.db.get_recipe(id)
    }

    pub fn search_recipes(&self, query: &str) -> Result<Vec<Recipe>> {
        self.db.search_recipes(query)
    }

    pub fn recipes_with_tag(&self, tag: &str) -> Result<Vec<Recipe>> {
        self.db.recipes_with_tag(tag)
    }

    pub fn starred_recipes(&self) -> Result<Vec<Recipe>> {
        self.db.starred_recipes()
    }

    pub fn set_starred(&self, id: i64, starred: bool) -> Result<bool> {
        let found = self.db.set_starred(id, starred)?;
        if found {
            self.publish_recipes()?;
        }
        Ok(found)
    }

    /// Live view of the full recipe list; a new value is published after
    /// every write, including the synchronizer's.
    pub fn observe_recipes(&self) -> watch::Receiver<Vec<Recipe>> {
        self.recipes_tx.subscribe()
    }

    // --- Sync ---

    /// Reconcile the local store against the remote index.
    ///
    /// A recipe is re-fetched when `force` is set, when there is no local
    /// copy or local timestamp, or when the remote copy is strictly newer
    /// (equal timestamps are a no-op). The index fetch failing aborts the
    /// batch; a single recipe failing does not — it is recorded in the
    /// report and the batch continues.
    pub fn sync_all(&self, remote: &dyn RemoteRecipes, force: bool) -> Result<SyncReport> {
        let index = remote
            .fetch_index()
            .context("Failed to fetch recipe index")?;
        let local = self.db.local_sync_timestamps()?;

        let mut report = SyncReport::new(index.len());
        for summary in &index {
            let local_ts = local.get(&summary.id).copied().flatten();
            let absent = !local.contains_key(&summary.id);
            if !absent && !needs_update(local_ts, summary.updated_at_remote, force) {
                continue;
            }
            match self.fetch_and_store(remote, summary.id) {
                Ok(()) => report.updated += 1,
                Err(e) => report.failed.push(SyncFailure {
                    id: summary.id,
                    message: e.to_string(),
                }),
            }
        }

        if report.updated > 0 {
            self.publish_recipes()?;
        }
        Ok(report)
    }

    /// Fetch one recipe unconditionally and store it.
    pub fn sync_one(&self, remote: &dyn RemoteRecipes, id: i64) -> Result<Recipe> {
        self.fetch_and_store(remote, id)?;
        self.publish_recipes()?;
        Ok(self
            .db
            .get_recipe(id)?
            .context("Recipe missing after upsert")?)
    }

    fn fetch_and_store(&self, remote: &dyn RemoteRecipes, id: i64) -> Result<()> {
        let mut recipe = remote.fetch_details(id)?;
        recipe.updated_at_local = Some(Utc::now());
        self.db.upsert_recipe(&recipe)?;
        Ok(())
    }

    // --- Shopping list ---

    pub fn shopping_list(&self) -> Result<Vec<ShoppingListItem>> {
        self.db.list_items()
    }

    /// Returns `None` when an item with that name already exists.
    pub fn add_shopping_item(&self, name: &str) -> Result<Option<ShoppingListItem>> {
        let added = self.db.add_item(name)?;
        if added.is_some() {
            self.publish_items()?;
        }
        Ok(added)
    }

    pub fn upsert_shopping_item(&self, item: &ShoppingListItem) -> Result<ShoppingListItem> {
        let stored = self.db.upsert_item(item)?;
        self.publish_items()?;
        Ok(stored)
    }

    pub fn set_item_checked(&self, id: i64, checked: bool) -> Result<bool> {
        let found = self.db.set_item_checked(id, checked)?;
        if found {
            self.publish_items()?;
        }
        Ok(found)
    }

    pub fn delete_shopping_item(&self, id: i64) -> Result<bool> {
        let found = self.db.delete_item(id)?;
        if found {
            self.publish_items()?;
        }
        Ok(found)
    }

    pub fn delete_checked_items(&self) -> Result<usize> {
        let deleted = self.db.delete_checked_items()?;
        if deleted > 0 {
            self.publish_items()?;
        }
        Ok(deleted)
    }

    pub fn clear_shopping_list(&self) -> Result<usize> {
        let deleted = self.db.clear_items()?;
        if deleted > 0 {
            self.publish_items()?;
        }
        Ok(deleted)
    }

    pub fn observe_shopping_list(&self) -> watch::Receiver<Vec<ShoppingListItem>> {
        self.items_tx.subscribe()
    }

    fn publish_recipes(&self) -> Result<()> {
        self.recipes_tx.send_replace(self.db.list_recipes()?);
        Ok(())
    }

    fn publish_items(&self) -> Result<()> {
        self.items_tx.send_replace(self.db.list_items()?);
        Ok(())
    }
}
