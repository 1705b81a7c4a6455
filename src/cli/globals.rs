use secrecy::SecretString;
use std::path::PathBuf;

/// Configuration shared across actions. Signing keys stay wrapped in
/// [`SecretString`] until the token key set is built.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub token_key: SecretString,
    pub token_previous_keys: Vec<SecretString>,
    pub token_ttl_days: u64,
    pub avatar_dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn secrets_are_redacted_in_debug() {
        let args = GlobalArgs {
            token_key: SecretString::from("super-secret".to_string()),
            token_previous_keys: Vec::new(),
            token_ttl_days: 7,
            avatar_dir: PathBuf::from("avatars"),
        };
        let debug = format!("{args:?}");
        assert!(!debug.contains("super-secret"));
        assert_eq!(args.token_key.expose_secret(), "super-secret");
    }
}
