use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ArgAction, ColorChoice, Command,
};

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("tribuna")
        .about("User accounts, roles and session tokens")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("TRIBUNA_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("dsn")
                .short('d')
                .long("dsn")
                .help("Database connection string")
                .env("TRIBUNA_DSN")
                .required(true),
        )
        .arg(
            Arg::new("token-key")
                .short('k')
                .long("token-key")
                .help("Base64-encoded 256-bit key used to sign session tokens")
                .env("TRIBUNA_TOKEN_KEY")
                .required(true),
        )
        .arg(
            Arg::new("token-previous-key")
                .long("token-previous-key")
                .help("Base64-encoded retired signing key, still accepted for verification (repeatable)")
                .env("TRIBUNA_TOKEN_PREVIOUS_KEY")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("token-ttl-days")
                .long("token-ttl-days")
                .help("Session token lifetime in days")
                .default_value("7")
                .env("TRIBUNA_TOKEN_TTL_DAYS")
                .value_parser(clap::value_parser!(u64).range(1..=365)),
        )
        .arg(
            Arg::new("avatar-dir")
                .long("avatar-dir")
                .help("Directory where uploaded avatars are stored")
                .default_value("avatars")
                .env("TRIBUNA_AVATAR_DIR"),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, -v WARN, -vv INFO, -vvv DEBUG, -vvvv TRACE")
                .action(ArgAction::Count),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches_for(args: &[&str]) -> clap::ArgMatches {
        new().try_get_matches_from(args).expect("args should parse")
    }

    #[test]
    fn defaults_are_applied() {
        let matches = matches_for(&[
            "tribuna",
            "--dsn",
            "postgres://localhost/tribuna",
            "--token-key",
            "dGVzdC1rZXk=",
        ]);
        assert_eq!(matches.get_one::<u16>("port"), Some(&8080));
        assert_eq!(matches.get_one::<u64>("token-ttl-days"), Some(&7));
        assert_eq!(
            matches.get_one::<String>("avatar-dir").map(String::as_str),
            Some("avatars")
        );
    }

    #[test]
    fn token_key_is_required() {
        let result = new().try_get_matches_from(["tribuna", "--dsn", "postgres://localhost/x"]);
        assert!(result.is_err());
    }

    #[test]
    fn previous_keys_accumulate() {
        let matches = matches_for(&[
            "tribuna",
            "--dsn",
            "postgres://localhost/tribuna",
            "--token-key",
            "a",
            "--token-previous-key",
            "b",
            "--token-previous-key",
            "c",
        ]);
        let previous: Vec<&String> = matches
            .get_many::<String>("token-previous-key")
            .expect("previous keys present")
            .collect();
        assert_eq!(previous, [&"b".to_string(), &"c".to_string()]);
    }

    #[test]
    fn ttl_must_be_positive() {
        let result = new().try_get_matches_from([
            "tribuna",
            "--dsn",
            "postgres://localhost/x",
            "--token-key",
            "a",
            "--token-ttl-days",
            "0",
        ]);
        assert!(result.is_err());
    }
}
