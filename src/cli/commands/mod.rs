use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("pasporto")
        .about("Identity gateway")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("PASPORTO_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("project-id")
                .long("project-id")
                .help("Identity provider project identifier")
                .env("PASPORTO_PROJECT_ID")
                .required(true),
        )
        .arg(
            Arg::new("api-key")
                .long("api-key")
                .help("Identity provider public API key")
                .env("PASPORTO_API_KEY")
                .required(true),
        )
        .arg(
            Arg::new("service-account-id")
                .long("service-account-id")
                .help("Service account id used for admin operations")
                .env("PASPORTO_SERVICE_ACCOUNT_ID")
                .required(true),
        )
        .arg(
            Arg::new("service-account-secret")
                .long("service-account-secret")
                .help("Service account secret used for admin operations")
                .env("PASPORTO_SERVICE_ACCOUNT_SECRET")
                .required(true),
        )
        .arg(
            Arg::new("provider-url")
                .long("provider-url")
                .help("Identity provider base URL, example: https://identitytoolkit.googleapis.com")
                .default_value("https://identitytoolkit.googleapis.com")
                .env("PASPORTO_PROVIDER_URL"),
        )
        .arg(
            Arg::new("verify-redirect-url")
                .long("verify-redirect-url")
                .help("Optional URL the verification link redirects to")
                .env("PASPORTO_VERIFY_REDIRECT_URL"),
        )
        .arg(
            Arg::new("env")
                .long("env")
                .help("Runtime environment, production strips provider details from error responses")
                .default_value("development")
                .env("PASPORTO_ENV")
                .value_parser(["development", "production"]),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("PASPORTO_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}
