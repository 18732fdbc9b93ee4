use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};

use crate::models::{Recipe, ShoppingListItem};

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS recipes (
                    id INTEGER PRIMARY KEY,
                    title TEXT NOT NULL,
                    ingredients TEXT NOT NULL,
                    directions TEXT NOT NULL,
                    tags TEXT NOT NULL,
                    image_url TEXT,
                    language TEXT,
                    starred INTEGER NOT NULL DEFAULT 0,
                    updated_at_remote TEXT,
                    updated_at_local TEXT
                );

                CREATE TABLE IF NOT EXISTS shopping_list (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    checked INTEGER NOT NULL DEFAULT 0
                );

                CREATE INDEX IF NOT EXISTS idx_recipes_title ON recipes(title);
                CREATE INDEX IF NOT EXISTS idx_shopping_list_name ON shopping_list(name);

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    // --- Row mapping helpers ---

    fn recipe_from_row(row: &rusqlite::Row) -> rusqlite::Result<Recipe> {
        let ingredients: String = row.get(2)?;
        let directions: String = row.get(3)?;
        let tags: String = row.get(4)?;
        Ok(Recipe {
            id: row.get(0)?,
            title: row.get(1)?,
            ingredients: serde_json::from_str(&ingredients).unwrap_or_default(),
            directions: serde_json::from_str(&directions).unwrap_or_default(),
            tags: serde_json::from_str(&tags).unwrap_or_default(),
            image_url: row.get(5)?,
            language: row.get(6)?,
            starred: row.get(7)?,
            updated_at_remote: parse_timestamp(row.get::<_, Option<String>>(8)?),
            updated_at_local: parse_timestamp(row.get::<_, Option<String>>(9)?),
        })
    }

    fn item_from_row(row: &rusqlite::Row) -> rusqlite::Result<ShoppingListItem> {
        Ok(ShoppingListItem {
            id: row.get(0)?,
            name: row.get(1)?,
            checked: row.get(2)?,
        })
    }

    // --- Recipes ---

    /// Insert or replace a recipe by its remote id.
    ///
    /// `starred` is locally owned: a replace keeps the existing row's value,
    /// so syncing a recipe the user starred does not unstar it.
    pub fn upsert_recipe(&self, recipe: &Recipe) -> Result<()> {
        self.conn.execute(
            "INSERT INTO recipes (id, title, ingredients, directions, tags, image_url, language, starred, updated_at_remote, updated_at_local)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(id) DO UPDATE SET
                 title = excluded.title,
                 ingredients = excluded.ingredients,
                 directions = excluded.directions,
                 tags = excluded.tags,
                 image_url = excluded.image_url,
                 language = excluded.language,
                 updated_at_remote = excluded.updated_at_remote,
                 updated_at_local = excluded.updated_at_local",
            params![
                recipe.id,
                recipe.title,
                serde_json::to_string(&recipe.ingredients)?,
                serde_json::to_string(&recipe.directions)?,
                serde_json::to_string(&recipe.tags)?,
                recipe.image_url,
                recipe.language,
                recipe.starred,
                recipe.updated_at_remote.map(|t| t.to_rfc3339()),
                recipe.updated_at_local.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    pub fn get_recipe(&self, id: i64) -> Result<Option<Recipe>> {
        let mut stmt = self.conn.prepare("SELECT * FROM recipes WHERE id = ?1")?;
        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::recipe_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn list_recipes(&self) -> Result<Vec<Recipe>> {
        let mut stmt = self.conn.prepare("SELECT * FROM recipes ORDER BY title")?;
        let recipes = stmt
            .query_map([], Self::recipe_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(recipes)
    }

    /// Substring search over title, ingredients, and tags.
    pub fn search_recipes(&self, query: &str) -> Result<Vec<Recipe>> {
        let pattern = like_pattern(query);
        let mut stmt = self.conn.prepare(
            "SELECT * FROM recipes
             WHERE title LIKE ?1 ESCAPE '\\'
                OR ingredients LIKE ?1 ESCAPE '\\'
                OR tags LIKE ?1 ESCAPE '\\'
             ORDER BY title",
        )?;
        let recipes = stmt
            .query_map(params![pattern], Self::recipe_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(recipes)
    }

    /// Recipes carrying exactly the given tag. Tags are stored as a JSON
    /// array, so the match is against the quoted form: "veg" does not
    /// match "vegan".
    pub fn recipes_with_tag(&self, tag: &str) -> Result<Vec<Recipe>> {
        let escaped = escape_like(tag);
        let pattern = format!("%\"{escaped}\"%");
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM recipes WHERE tags LIKE ?1 ESCAPE '\\' ORDER BY title")?;
        let recipes = stmt
            .query_map(params![pattern], Self::recipe_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(recipes)
    }

    pub fn starred_recipes(&self) -> Result<Vec<Recipe>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM recipes WHERE starred = 1 ORDER BY title")?;
        let recipes = stmt
            .query_map([], Self::recipe_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(recipes)
    }

    pub fn set_starred(&self, id: i64, starred: bool) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE recipes SET starred = ?1 WHERE id = ?2",
            params![starred, id],
        )?;
        Ok(rows > 0)
    }

    /// Local sync timestamps keyed by recipe id, for the needs-update check.
    pub fn local_sync_timestamps(&self) -> Result<HashMap<i64, Option<DateTime<Utc>>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, updated_at_local FROM recipes")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                parse_timestamp(row.get::<_, Option<String>>(1)?),
            ))
        })?;
        let mut map = HashMap::new();
        for row in rows {
            let (id, ts) = row?;
            map.insert(id, ts);
        }
        Ok(map)
    }

    // --- Shopping list ---

    pub fn upsert_item(&self, item: &ShoppingListItem) -> Result<ShoppingListItem> {
        if item.id == 0 {
            self.conn.execute(
                "INSERT INTO shopping_list (name, checked) VALUES (?1, ?2)",
                params![item.name, item.checked],
            )?;
            let id = self.conn.last_insert_rowid();
            return Ok(ShoppingListItem { id, ..item.clone() });
        }
        self.conn.execute(
            "INSERT OR REPLACE INTO shopping_list (id, name, checked) VALUES (?1, ?2, ?3)",
            params![item.id, item.name, item.checked],
        )?;
        Ok(item.clone())
    }

    /// Add an item by name. Returns `None` when an item with that exact
    /// name already exists (adds are deduplicated).
    pub fn add_item(&self, name: &str) -> Result<Option<ShoppingListItem>> {
        if self.get_item_by_name(name)?.is_some() {
            return Ok(None);
        }
        Ok(Some(self.upsert_item(&ShoppingListItem::new(name))?))
    }

    pub fn get_item(&self, id: i64) -> Result<Option<ShoppingListItem>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM shopping_list WHERE id = ?1")?;
        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::item_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn get_item_by_name(&self, name: &str) -> Result<Option<ShoppingListItem>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM shopping_list WHERE name = ?1")?;
        let mut rows = stmt.query(params![name])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::item_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn set_item_checked(&self, id: i64, checked: bool) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE shopping_list SET checked = ?1 WHERE id = ?2",
            params![checked, id],
        )?;
        Ok(rows > 0)
    }

    pub fn delete_item(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM shopping_list WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    pub fn delete_checked_items(&self) -> Result<usize> {
        let rows = self
            .conn
            .execute("DELETE FROM shopping_list WHERE checked = 1", [])?;
        Ok(rows)
    }

    pub fn clear_items(&self) -> Result<usize> {
        let rows = self.conn.execute("DELETE FROM shopping_list", [])?;
        Ok(rows)
    }

    pub fn list_items(&self) -> Result<Vec<ShoppingListItem>> {
        let mut stmt = self.conn.prepare("SELECT * FROM shopping_list ORDER BY id")?;
        let items = stmt
            .query_map([], Self::item_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }
}

fn parse_timestamp(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn escape_like(query: &str) -> String {
    query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn like_pattern(query: &str) -> String {
    let escaped = escape_like(query);
    format!("%{escaped}%")
}
