//! Auth configuration and shared state.

use super::token::TokenKeys;

const DEFAULT_TOKEN_TTL_DAYS: u64 = 7;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    token_ttl_days: u64,
}

impl AuthConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            token_ttl_days: DEFAULT_TOKEN_TTL_DAYS,
        }
    }

    #[must_use]
    pub const fn with_token_ttl_days(mut self, days: u64) -> Self {
        self.token_ttl_days = days;
        self
    }

    #[must_use]
    pub const fn token_ttl_days(&self) -> u64 {
        self.token_ttl_days
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable per-process auth state injected into handlers as an extension.
pub struct AuthState {
    config: AuthConfig,
    keys: TokenKeys,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, keys: TokenKeys) -> Self {
        Self { config, keys }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn keys(&self) -> &TokenKeys {
        &self.keys
    }
}
