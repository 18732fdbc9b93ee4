use anyhow::{Context, Result};

use ladle_core::credentials::CredentialsStore;

use crate::api::ApiClient;

use super::helpers::prompt_password;

pub(crate) async fn cmd_login(
    credentials: &CredentialsStore,
    client: &ApiClient,
    username: &str,
    password: Option<String>,
) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => prompt_password()?,
    };

    // Stored before the network call: even when the server is unreachable
    // the next authenticated request can fall back to these credentials.
    credentials.update_login_data(username, &password)?;

    client
        .login_async(username, &password)
        .await
        .context("Credentials stored, but opening a session failed")?;

    println!("Logged in as {username}");
    Ok(())
}
