//! REST client for the identity provider HTTP API.
//!
//! Public endpoints (sign-up, password sign-in) authenticate with the project
//! API key, admin endpoints (lookup, update, verification links) with the
//! service-account bearer credential. One long-lived client is shared by all
//! requests; per-call timeouts are explicit and nothing is retried.

use crate::provider::{Account, IdentityProvider, ProviderError, SessionTokens};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct RestProvider {
    client: Client,
    base_url: String,
    api_key: SecretString,
    admin_token: SecretString,
    redirect_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUser {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

impl From<RawUser> for Account {
    fn from(raw: RawUser) -> Self {
        Self {
            id: raw.local_id,
            email: raw.email,
            email_verified: raw.email_verified,
            display_name: raw.display_name,
            created_at: raw.created_at,
        }
    }
}

impl RestProvider {
    /// Build the provider client.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        user_agent: &str,
        base_url: &str,
        api_key: SecretString,
        admin_token: SecretString,
        redirect_url: Option<String>,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            admin_token,
            redirect_url,
        })
    }

    fn endpoint(&self, operation: &str) -> String {
        format!("{}/v1/accounts:{operation}", self.base_url)
    }

    async fn post(
        &self,
        operation: &str,
        admin: bool,
        payload: Value,
    ) -> Result<Value, ProviderError> {
        let url = self.endpoint(operation);

        debug!("provider request: {}", operation);

        let mut request = self.client.post(&url).json(&payload);
        if admin {
            request = request.bearer_auth(self.admin_token.expose_secret());
        } else {
            request = request.query(&[("key", self.api_key.expose_secret())]);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Network(format!("timeout calling {operation}"))
            } else {
                ProviderError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or_default();
            let code = body["error"]["message"]
                .as_str()
                .unwrap_or("UNKNOWN")
                .to_string();

            return Err(ProviderError::Api {
                code,
                status: Some(status.as_u16()),
            });
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }

    async fn lookup(&self, payload: Value) -> Result<Option<Account>, ProviderError> {
        let body = match self.post("lookup", true, payload).await {
            Ok(body) => body,
            // The provider reports missing accounts as an error signal on
            // lookups, normalize it to None.
            Err(ProviderError::Api { code, .. }) if code.contains("USER_NOT_FOUND") => {
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let Some(users) = body.get("users").and_then(Value::as_array) else {
            return Ok(None);
        };

        match users.first() {
            Some(user) => {
                let raw: RawUser = serde_json::from_value(user.clone())
                    .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
                Ok(Some(raw.into()))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl IdentityProvider for RestProvider {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, ProviderError> {
        self.lookup(json!({ "email": [email] })).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, ProviderError> {
        self.lookup(json!({ "localId": [id] })).await
    }

    async fn create_account(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<Account, ProviderError> {
        let body = self
            .post(
                "signUp",
                false,
                json!({
                    "email": email,
                    "password": password,
                    "displayName": display_name,
                    "returnSecureToken": false,
                }),
            )
            .await?;

        let id = body["localId"]
            .as_str()
            .ok_or_else(|| ProviderError::InvalidResponse("no localId in response".to_string()))?;

        // Re-read so the caller gets the authoritative record.
        self.find_by_id(id).await?.ok_or_else(|| {
            ProviderError::InvalidResponse(format!("created account {id} not found on lookup"))
        })
    }

    async fn set_email_verified(&self, id: &str) -> Result<(), ProviderError> {
        self.post(
            "update",
            true,
            json!({ "localId": id, "emailVerified": true }),
        )
        .await?;

        Ok(())
    }

    async fn verification_link(&self, email: &str) -> Result<String, ProviderError> {
        let mut payload = json!({
            "requestType": "VERIFY_EMAIL",
            "email": email,
            "returnOobLink": true,
        });

        if let Some(url) = &self.redirect_url {
            payload["continueUrl"] = json!(url);
        }

        let body = self.post("sendOobCode", true, payload).await?;

        body["oobLink"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::InvalidResponse("no oobLink in response".to_string()))
    }

    async fn password_sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionTokens, ProviderError> {
        let body = self
            .post(
                "signInWithPassword",
                false,
                json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;

        let access_token = body["idToken"]
            .as_str()
            .ok_or_else(|| ProviderError::InvalidResponse("no idToken in response".to_string()))?;
        let refresh_token = body["refreshToken"].as_str().unwrap_or_default();

        Ok(SessionTokens {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
        })
    }
}
