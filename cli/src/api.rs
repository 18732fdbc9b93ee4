use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;

use ladle_core::credentials::CredentialsStore;
use ladle_core::error::ApiError;
use ladle_core::models::{Recipe, RecipeSummary};
use ladle_core::remote::{
    LoginRequest, RecipeDetails, RecipeListItem, SessionTokens, recipe_from_details,
    summary_from_list_item,
};
use ladle_core::service::RemoteRecipes;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the recipe server.
///
/// Carries the credential store and a client-wide re-authentication lock:
/// when a request comes back 401, the client refreshes the session (or falls
/// back to a full login) and resubmits the request exactly once. All
/// requests share one `ApiClient`, so concurrent 401s funnel through one
/// lock and at most one refresh call goes out.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<CredentialsStore>,
    auth_lock: tokio::sync::Mutex<()>,
    rt: tokio::runtime::Handle,
}

impl ApiClient {
    pub fn new(base_url: &str, credentials: Arc<CredentialsStore>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(format!("ladle/{} (recipe box)", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            auth_lock: tokio::sync::Mutex::new(()),
            rt: tokio::runtime::Handle::current(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    // --- Auth gateway ---

    /// Log in and persist the returned session pair.
    pub async fn login_async(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let session = self.request_login(username, password).await?;
        self.persist_session(&session)
    }

    async fn request_login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<SessionTokens, ApiError> {
        let resp = self
            .http
            .post(self.url("/login"))
            .json(&LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .send()
            .await
            .map_err(ApiError::network)?;
        if resp.status() == StatusCode::UNAUTHORIZED || resp.status() == StatusCode::FORBIDDEN {
            return Err(ApiError::Auth);
        }
        json_body(check_status(resp)?).await
    }

    /// The refresh token rides in the Authorization header, not the body.
    async fn request_refresh(&self, refresh_token: &str) -> Result<SessionTokens, ApiError> {
        let resp = self
            .http
            .post(self.url("/refresh"))
            .bearer_auth(refresh_token)
            .send()
            .await
            .map_err(ApiError::network)?;
        if resp.status() == StatusCode::UNAUTHORIZED || resp.status() == StatusCode::FORBIDDEN {
            return Err(ApiError::Auth);
        }
        json_body(check_status(resp)?).await
    }

    fn persist_session(&self, session: &SessionTokens) -> Result<(), ApiError> {
        self.credentials
            .update_session(&session.access_token, &session.refresh_token)
            .map_err(|e| ApiError::Store(e.to_string()))
    }

    // --- Request authenticator ---

    async fn send_authed(&self, path: &str) -> Result<reqwest::Response, ApiError> {
        let snapshot = self.credentials.access_token();
        let resp = self
            .http
            .get(self.url(path))
            .bearer_auth(&snapshot)
            .send()
            .await
            .map_err(ApiError::network)?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return Ok(resp);
        }

        let token = self
            .reauthenticate(&snapshot)
            .await?
            .ok_or(ApiError::Auth)?;
        // Resubmit the original request exactly once with the fresh token.
        self.http
            .get(self.url(path))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(ApiError::network)
    }

    /// Obtain a usable access token after a 401, or `None` when refresh and
    /// login are both exhausted.
    ///
    /// `stale_token` is the token the failed request carried. If the stored
    /// token differs by the time the lock is held, a concurrent caller
    /// already re-authenticated and its token is reused without touching
    /// the network.
    async fn reauthenticate(&self, stale_token: &str) -> Result<Option<String>, ApiError> {
        let _guard = self.auth_lock.lock().await;

        let current = self.credentials.access_token();
        if current != stale_token {
            return Ok(Some(current));
        }

        let refresh_token = self.credentials.refresh_token();
        if let Ok(session) = self.request_refresh(&refresh_token).await {
            // No await between receiving the pair and persisting it: a
            // cancelled caller cannot leave the store half-written.
            self.persist_session(&session)?;
            return Ok(Some(session.access_token));
        }

        let (username, password) = self.credentials.login_data();
        if username.is_empty() {
            return Ok(None);
        }
        match self.request_login(&username, &password).await {
            Ok(session) => {
                self.persist_session(&session)?;
                Ok(Some(session.access_token))
            }
            Err(_) => Ok(None),
        }
    }

    // --- Recipes ---

    pub async fn fetch_index_async(&self) -> Result<Vec<RecipeSummary>, ApiError> {
        let resp = check_status(self.send_authed("/recipes").await?)?;
        let items: Vec<RecipeListItem> = json_body(resp).await?;
        Ok(items.into_iter().map(summary_from_list_item).collect())
    }

    pub async fn fetch_details_async(&self, id: i64) -> Result<Recipe, ApiError> {
        let resp = self.send_authed(&format!("/recipes/{id}")).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(id));
        }
        let details: RecipeDetails = json_body(check_status(resp)?).await?;
        Ok(recipe_from_details(details))
    }
}

impl RemoteRecipes for ApiClient {
    fn fetch_index(&self) -> Result<Vec<RecipeSummary>, ApiError> {
        self.rt.block_on(self.fetch_index_async())
    }

    fn fetch_details(&self, id: i64) -> Result<Recipe, ApiError> {
        self.rt.block_on(self.fetch_details_async(id))
    }
}

fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    if resp.status().is_success() {
        Ok(resp)
    } else {
        Err(ApiError::Network(format!(
            "server returned {}",
            resp.status()
        )))
    }
}

async fn json_body<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
    resp.json().await.map_err(|e| {
        if e.is_decode() {
            ApiError::deserialize(e)
        } else {
            ApiError::network(e)
        }
    })
}
