use crate::cli::{actions::Action, globals::GlobalArgs};
use anyhow::Result;
use secrecy::SecretString;
use std::path::PathBuf;

pub fn handler(matches: &clap::ArgMatches) -> Result<(Action, GlobalArgs)> {
    let action = Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
        dsn: matches
            .get_one("dsn")
            .map(|s: &String| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --dsn"))?,
    };

    let token_key = matches
        .get_one("token-key")
        .map(|s: &String| SecretString::from(s.to_string()))
        .ok_or_else(|| anyhow::anyhow!("missing required argument: --token-key"))?;

    let token_previous_keys = matches
        .get_many::<String>("token-previous-key")
        .map(|keys| {
            keys.map(|key| SecretString::from(key.to_string()))
                .collect()
        })
        .unwrap_or_default();

    let globals = GlobalArgs {
        token_key,
        token_previous_keys,
        token_ttl_days: matches.get_one::<u64>("token-ttl-days").copied().unwrap_or(7),
        avatar_dir: matches
            .get_one::<String>("avatar-dir")
            .map_or_else(|| PathBuf::from("avatars"), PathBuf::from),
    };

    Ok((action, globals))
}
