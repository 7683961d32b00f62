use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("authkeep")
        .about("Sign in to the API and keep the session between runs")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .help("Base URL of the auth API, example: https://api.example.com")
                .env("AUTHKEEP_API_BASE_URL")
                .global(true),
        )
        .arg(
            Arg::new("store")
                .long("store")
                .help("Where to keep the session between runs")
                .value_parser(["file", "keyring"])
                .global(true),
        )
        .subcommand(
            Command::new("login")
                .about("Log in with email or mobile and password")
                .arg(
                    Arg::new("identifier")
                        .short('u')
                        .long("identifier")
                        .help("Email or mobile number"),
                )
                .arg(
                    Arg::new("next")
                        .long("next")
                        .help("Path to continue at after login"),
                ),
        )
        .subcommand(Command::new("logout").about("Log out, clearing the local session"))
        .subcommand(Command::new("whoami").about("Fetch the signed-in user's profile"))
        .subcommand(Command::new("status").about("Show the stored session"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_is_valid() {
        new().debug_assert();
    }

    #[test]
    fn test_login_args() {
        let matches = new()
            .try_get_matches_from(["authkeep", "--store", "keyring", "login", "-u", "a@b.com", "--next", "/x"])
            .unwrap();
        assert_eq!(matches.get_one::<String>("store").map(String::as_str), Some("keyring"));
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "login");
        assert_eq!(sub.get_one::<String>("identifier").map(String::as_str), Some("a@b.com"));
        assert_eq!(sub.get_one::<String>("next").map(String::as_str), Some("/x"));
    }

    #[test]
    fn test_rejects_unknown_store() {
        assert!(new()
            .try_get_matches_from(["authkeep", "--store", "redis", "status"])
            .is_err());
    }
}
