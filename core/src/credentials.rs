use std::path::{Path, PathBuf};
use std::sync::RwLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// The persisted credential record. Created with empty defaults on first
/// run, mutated in place, never deleted. Token staleness is not tracked
/// here — it is discovered by a request failing with 401.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub access_token: String,
}

/// File-backed credential store, shared by the CLI and the request
/// authenticator. Every write is a read-modify-write under the lock
/// followed by a single whole-record file write, so partial updates can
/// never be observed half-applied; `update_session` keeps the access and
/// refresh tokens a matched pair. Lock sections contain no await points.
pub struct CredentialsStore {
    path: PathBuf,
    state: RwLock<Credentials>,
}

impl CredentialsStore {
    pub fn open(path: &Path) -> Result<Self> {
        let creds = if path.exists() {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read credentials: {}", path.display()))?;
            serde_json::from_str(&data)
                .with_context(|| format!("Unreadable credentials file: {}", path.display()))?
        } else {
            Credentials::default()
        };
        Ok(Self {
            path: path.to_path_buf(),
            state: RwLock::new(creds),
        })
    }

    // --- Reads ---

    pub fn username(&self) -> String {
        self.read().username
    }

    pub fn login_data(&self) -> (String, String) {
        let creds = self.read();
        (creds.username, creds.password)
    }

    pub fn access_token(&self) -> String {
        self.read().access_token
    }

    pub fn refresh_token(&self) -> String {
        self.read().refresh_token
    }

    pub fn snapshot(&self) -> Credentials {
        self.read()
    }

    // --- Writes ---

    pub fn update_login_data(&self, username: &str, password: &str) -> Result<()> {
        self.mutate(|creds| {
            creds.username = username.to_string();
            creds.password = password.to_string();
        })
    }

    pub fn update_access_token(&self, token: &str) -> Result<()> {
        self.mutate(|creds| creds.access_token = token.to_string())
    }

    pub fn update_refresh_token(&self, token: &str) -> Result<()> {
        self.mutate(|creds| creds.refresh_token = token.to_string())
    }

    /// Store a fresh token pair in one write. An observer never sees a new
    /// access token alongside the old refresh token.
    pub fn update_session(&self, access_token: &str, refresh_token: &str) -> Result<()> {
        self.mutate(|creds| {
            creds.access_token = access_token.to_string();
            creds.refresh_token = refresh_token.to_string();
        })
    }

    fn read(&self) -> Credentials {
        self.state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn mutate(&self, apply: impl FnOnce(&mut Credentials)) -> Result<()> {
        let mut guard = self
            .state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        apply(&mut guard);
        self.persist(&guard)
    }

    fn persist(&self, creds: &Credentials) -> Result<()> {
        let data = serde_json::to_string_pretty(creds)?;
        std::fs::write(&self.path, data).with_context(|| {
            format!("Failed to write credentials: {}", self.path.display())
        })?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .context("Failed to set credentials file permissions")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> CredentialsStore {
        CredentialsStore::open(&dir.path().join("credentials.json")).unwrap()
    }

    #[test]
    fn test_missing_file_yields_empty_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.snapshot(), Credentials::default());
    }

    #[test]
    fn test_partial_updates_preserve_other_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.update_login_data("kat", "secret").unwrap();
        store.update_access_token("a-1").unwrap();
        store.update_refresh_token("r-1").unwrap();

        let creds = store.snapshot();
        assert_eq!(creds.username, "kat");
        assert_eq!(creds.password, "secret");
        assert_eq!(creds.access_token, "a-1");
        assert_eq!(creds.refresh_token, "r-1");

        // Updating the login data must not touch the tokens
        store.update_login_data("kat2", "secret2").unwrap();
        let creds = store.snapshot();
        assert_eq!(creds.username, "kat2");
        assert_eq!(creds.access_token, "a-1");
        assert_eq!(creds.refresh_token, "r-1");
    }

    #[test]
    fn test_update_session_replaces_pair() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.update_login_data("kat", "secret").unwrap();

        store.update_session("a-2", "r-2").unwrap();
        let creds = store.snapshot();
        assert_eq!(creds.access_token, "a-2");
        assert_eq!(creds.refresh_token, "r-2");
        assert_eq!(creds.username, "kat");
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        let store = CredentialsStore::open(&path).unwrap();
        store.update_login_data("kat", "secret").unwrap();
        store.update_session("a-1", "r-1").unwrap();
        drop(store);

        let reopened = CredentialsStore::open(&path).unwrap();
        let creds = reopened.snapshot();
        assert_eq!(creds.username, "kat");
        assert_eq!(creds.password, "secret");
        assert_eq!(creds.access_token, "a-1");
        assert_eq!(creds.refresh_token, "r-1");
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(CredentialsStore::open(&path).is_err());
    }

    #[test]
    fn test_unknown_fields_are_tolerated() {
        // Older credential files carried extra flags; reading one must work.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(
            &path,
            r#"{"username": "kat", "password": "pw", "refresh_token": "", "access_token": "", "is_encrypted": false}"#,
        )
        .unwrap();

        let store = CredentialsStore::open(&path).unwrap();
        assert_eq!(store.username(), "kat");
    }
}
