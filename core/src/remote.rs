use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Recipe, RecipeSummary};

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    #[serde(rename = "email_address")]
    pub username: String,
    pub password: String,
}

/// Token pair returned by both `POST /login` and `POST /refresh`.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct RecipeListItem {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecipeDetails {
    pub id: i64,
    pub name: String,
    pub directions: Vec<String>,
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub picture_path: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Parse a server timestamp. Absent or unparseable values map to `None`,
/// which the sync rule treats as "needs update" — the safe direction.
fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[must_use]
pub fn summary_from_list_item(item: RecipeListItem) -> RecipeSummary {
    RecipeSummary {
        id: item.id,
        title: item.name,
        updated_at_remote: parse_timestamp(item.updated_at.as_deref()),
    }
}

/// Map a detail response onto the domain model. Locally owned fields
/// (`starred`, `updated_at_local`) start at their defaults; the store's
/// upsert keeps any existing local values.
#[must_use]
pub fn recipe_from_details(details: RecipeDetails) -> Recipe {
    Recipe {
        id: details.id,
        title: details.name,
        ingredients: details.ingredients,
        directions: details.directions,
        tags: details.tags,
        image_url: details.picture_path.filter(|p| !p.is_empty()),
        language: details.language.filter(|l| !l.is_empty()),
        starred: false,
        updated_at_remote: parse_timestamp(details.updated_at.as_deref()),
        updated_at_local: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_details() -> RecipeDetails {
        RecipeDetails {
            id: 42,
            name: "Shakshuka".to_string(),
            directions: vec!["Simmer sauce".to_string(), "Poach eggs".to_string()],
            ingredients: vec!["tomatoes".to_string(), "eggs".to_string()],
            tags: vec!["breakfast".to_string(), "vegetarian".to_string()],
            picture_path: Some("/images/shakshuka.jpg".to_string()),
            language: Some("en".to_string()),
            updated_at: Some("2024-02-01T08:30:00Z".to_string()),
        }
    }

    #[test]
    fn test_recipe_from_details_complete() {
        let recipe = recipe_from_details(full_details());
        assert_eq!(recipe.id, 42);
        assert_eq!(recipe.title, "Shakshuka");
        assert_eq!(recipe.ingredients.len(), 2);
        assert_eq!(recipe.directions.len(), 2);
        assert_eq!(recipe.tags, vec!["breakfast", "vegetarian"]);
        assert_eq!(recipe.image_url.as_deref(), Some("/images/shakshuka.jpg"));
        assert_eq!(recipe.language.as_deref(), Some("en"));
        assert!(!recipe.starred);
        assert!(recipe.updated_at_remote.is_some());
        assert!(recipe.updated_at_local.is_none());
    }

    #[test]
    fn test_recipe_from_details_empty_picture_path() {
        let mut d = full_details();
        d.picture_path = Some(String::new());
        assert!(recipe_from_details(d).image_url.is_none());

        let mut d2 = full_details();
        d2.picture_path = None;
        assert!(recipe_from_details(d2).image_url.is_none());
    }

    #[test]
    fn test_recipe_from_details_missing_timestamp() {
        let mut d = full_details();
        d.updated_at = None;
        assert!(recipe_from_details(d).updated_at_remote.is_none());
    }

    #[test]
    fn test_recipe_from_details_invalid_timestamp() {
        let mut d = full_details();
        d.updated_at = Some("not-a-date".to_string());
        assert!(recipe_from_details(d).updated_at_remote.is_none());
    }

    #[test]
    fn test_summary_from_list_item() {
        let summary = summary_from_list_item(RecipeListItem {
            id: 7,
            name: "Dal".to_string(),
            updated_at: Some("2024-01-15T00:00:00Z".to_string()),
        });
        assert_eq!(summary.id, 7);
        assert_eq!(summary.title, "Dal");
        assert_eq!(
            summary.updated_at_remote.unwrap().to_rfc3339(),
            "2024-01-15T00:00:00+00:00"
        );
    }

    #[test]
    fn test_login_request_wire_field_names() {
        let body = serde_json::to_value(&LoginRequest {
            username: "kat".to_string(),
            password: "secret".to_string(),
        })
        .unwrap();
        assert_eq!(body["email_address"], "kat");
        assert_eq!(body["password"], "secret");
    }

    #[test]
    fn test_session_tokens_deserialization() {
        let tokens: SessionTokens = serde_json::from_str(
            r#"{"access_token": "a-1", "refresh_token": "r-1"}"#,
        )
        .unwrap();
        assert_eq!(tokens.access_token, "a-1");
        assert_eq!(tokens.refresh_token, "r-1");
    }
}
