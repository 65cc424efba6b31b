use crate::{cli::globals::GlobalArgs, gateway};
use anyhow::Result;
use secrecy::SecretString;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub project_id: String,
    pub api_key: SecretString,
    pub service_account_id: String,
    pub service_account_secret: SecretString,
    pub provider_url: String,
    pub verify_redirect_url: Option<String>,
    pub environment: String,
}

/// Execute the server action.
///
/// # Errors
/// Returns an error if the gateway fails to start.
pub async fn execute(args: Args) -> Result<()> {
    info!(
        project_id = %args.project_id,
        provider_url = %args.provider_url,
        service_account_id = %args.service_account_id,
        verify_redirect_url = %args.verify_redirect_url.as_deref().unwrap_or("none"),
        environment = %args.environment,
        "Starting gateway"
    );

    // Error responses check PASPORTO_ENV, keep it in sync with --env
    if args.environment == "production" {
        std::env::set_var("PASPORTO_ENV", "production");
    }

    let mut globals = GlobalArgs::new(&args.project_id, &args.provider_url);
    globals.set_api_key(args.api_key);
    globals.set_service_account(args.service_account_id, args.service_account_secret);
    globals.set_verify_redirect_url(args.verify_redirect_url);

    gateway::new(args.port, globals).await
}
