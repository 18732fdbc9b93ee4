use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Default API base. Override with `LADLE_API_URL` (no trailing slash).
const DEFAULT_API_URL: &str = "https://recipes.example.org/api/v1";

pub struct Config {
    pub db_path: PathBuf,
    pub credentials_path: PathBuf,
    pub api_url: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "ladle").context("Could not determine home directory")?;

        let data_dir = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let api_url = std::env::var("LADLE_API_URL")
            .ok()
            .filter(|v| !v.is_empty())
            .map_or_else(|| DEFAULT_API_URL.to_string(), |v| v.trim_end_matches('/').to_string());

        Ok(Config {
            db_path: data_dir.join("ladle.db"),
            credentials_path: data_dir.join("credentials.json"),
            api_url,
        })
    }
}
