use secrecy::SecretString;

#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub project_id: String,
    pub provider_url: String,
    pub api_key: SecretString,
    pub service_account_id: String,
    pub service_account_secret: SecretString,
    pub verify_redirect_url: Option<String>,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(project_id: &str, provider_url: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            provider_url: provider_url.to_string(),
            api_key: SecretString::default(),
            service_account_id: String::new(),
            service_account_secret: SecretString::default(),
            verify_redirect_url: None,
        }
    }

    pub fn set_api_key(&mut self, api_key: SecretString) {
        self.api_key = api_key;
    }

    pub fn set_service_account(&mut self, id: String, secret: SecretString) {
        self.service_account_id = id;
        self.service_account_secret = secret;
    }

    pub fn set_verify_redirect_url(&mut self, url: Option<String>) {
        self.verify_redirect_url = url;
    }
}
