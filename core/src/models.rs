use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub title: String,
    pub ingredients: Vec<String>,
    pub directions: Vec<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub starred: bool,
    /// Server-side modification time, as reported by the recipe index.
    pub updated_at_remote: Option<DateTime<Utc>>,
    /// When this row was last written by a sync. Locally owned.
    pub updated_at_local: Option<DateTime<Utc>>,
}

/// Lightweight entry from the remote recipe index (`GET /recipes`).
#[derive(Debug, Clone, Serialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub title: String,
    pub updated_at_remote: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingListItem {
    pub id: i64,
    pub name: String,
    pub checked: bool,
}

impl ShoppingListItem {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            checked: false,
        }
    }
}

/// Decide whether a locally cached recipe must be re-fetched.
///
/// A recipe needs updating when there is no local copy, when either side's
/// timestamp is unknown, or when the remote copy is strictly newer. Equal
/// timestamps are NOT an update: re-running a sync against an unchanged
/// remote must be a no-op.
#[must_use]
pub fn needs_update(
    local: Option<DateTime<Utc>>,
    remote: Option<DateTime<Utc>>,
    force: bool,
) -> bool {
    if force {
        return true;
    }
    match (local, remote) {
        (Some(local), Some(remote)) => local < remote,
        _ => true,
    }
}

/// Outcome of a batch sync. Per-recipe fetch failures do not abort the
/// batch; they are collected here and reported alongside the update count.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub updated: usize,
    pub total: usize,
    pub failed: Vec<SyncFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncFailure {
    pub id: i64,
    pub message: String,
}

impl SyncReport {
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            updated: 0,
            total,
            failed: Vec::new(),
        }
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Updated {} of {} recipes", self.updated, self.total)?;
        if !self.failed.is_empty() {
            let ids: Vec<String> = self.failed.iter().map(|e| e.id.to_string()).collect();
            write!(f, ", {} failed (ids: {})", self.failed.len(), ids.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_needs_update_remote_newer() {
        assert!(needs_update(
            Some(ts("2024-01-01T00:00:00Z")),
            Some(ts("2024-02-01T00:00:00Z")),
            false,
        ));
    }

    #[test]
    fn test_needs_update_remote_older() {
        assert!(!needs_update(
            Some(ts("2024-02-01T00:00:00Z")),
            Some(ts("2024-01-01T00:00:00Z")),
            false,
        ));
    }

    #[test]
    fn test_needs_update_equal_timestamps_is_noop() {
        let t = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        assert!(!needs_update(Some(t), Some(t), false));
    }

    #[test]
    fn test_needs_update_missing_local_timestamp() {
        assert!(needs_update(None, Some(ts("2024-01-01T00:00:00Z")), false));
    }

    #[test]
    fn test_needs_update_missing_remote_timestamp() {
        assert!(needs_update(Some(ts("2024-01-01T00:00:00Z")), None, false));
    }

    #[test]
    fn test_needs_update_force_overrides_timestamps() {
        let t = ts("2024-06-15T12:00:00Z");
        assert!(needs_update(Some(t), Some(t), true));
        assert!(needs_update(
            Some(ts("2024-02-01T00:00:00Z")),
            Some(ts("2024-01-01T00:00:00Z")),
            true,
        ));
    }

    #[test]
    fn test_sync_report_display_counts() {
        let mut report = SyncReport::new(3);
        report.updated = 1;
        assert_eq!(report.to_string(), "Updated 1 of 3 recipes");
    }

    #[test]
    fn test_sync_report_display_failures() {
        let mut report = SyncReport::new(5);
        report.updated = 2;
        report.failed.push(SyncFailure {
            id: 4,
            message: "network error: timeout".to_string(),
        });
        report.failed.push(SyncFailure {
            id: 7,
            message: "recipe 7 not found".to_string(),
        });
        assert_eq!(
            report.to_string(),
            "Updated 2 of 5 recipes, 2 failed (ids: 4, 7)"
        );
    }
}
