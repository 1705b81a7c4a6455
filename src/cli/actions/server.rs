use crate::api;
use crate::api::handlers::auth::{token::TokenKeys, AuthConfig, AuthState};
use crate::cli::{actions::Action, globals::GlobalArgs};
use crate::files::FileStore;
use anyhow::{Context, Result};
use secrecy::ExposeSecret;
use std::sync::Arc;

/// Handle the server action
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    match action {
        Action::Server { port, dsn } => {
            let previous: Vec<&str> = globals
                .token_previous_keys
                .iter()
                .map(ExposeSecret::expose_secret)
                .collect();
            let keys = TokenKeys::from_base64(globals.token_key.expose_secret(), &previous)
                .context("Invalid token signing key")?;

            let config = AuthConfig::new().with_token_ttl_days(globals.token_ttl_days);
            let auth_state = Arc::new(AuthState::new(config, keys));

            let file_store = Arc::new(FileStore::new(&globals.avatar_dir).await?);

            api::new(port, dsn, auth_state, file_store).await?;
        }
    }

    Ok(())
}
