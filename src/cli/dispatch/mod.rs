use crate::cli::actions::{server::Args, Action};
use anyhow::{Context, Result};
use secrecy::SecretString;
use url::Url;

/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);

    let project_id = matches
        .get_one::<String>("project-id")
        .cloned()
        .context("missing required argument: --project-id")?;

    let api_key = matches
        .get_one::<String>("api-key")
        .cloned()
        .context("missing required argument: --api-key")?;

    let service_account_id = matches
        .get_one::<String>("service-account-id")
        .cloned()
        .context("missing required argument: --service-account-id")?;

    let service_account_secret = matches
        .get_one::<String>("service-account-secret")
        .cloned()
        .context("missing required argument: --service-account-secret")?;

    let provider_url = matches
        .get_one::<String>("provider-url")
        .cloned()
        .context("missing required argument: --provider-url")?;

    Url::parse(&provider_url).context("invalid --provider-url")?;

    let verify_redirect_url = matches.get_one::<String>("verify-redirect-url").cloned();
    if let Some(url) = &verify_redirect_url {
        Url::parse(url).context("invalid --verify-redirect-url")?;
    }

    let environment = matches
        .get_one::<String>("env")
        .cloned()
        .unwrap_or_else(|| "development".to_string());

    Ok(Action::Server(Args {
        port,
        project_id,
        api_key: SecretString::from(api_key),
        service_account_id,
        service_account_secret: SecretString::from(service_account_secret),
        provider_url,
        verify_redirect_url,
        environment,
    }))
}
