//! Provider adapter: the four authentication operations.
//!
//! Wraps the raw [`IdentityProvider`] surface with the error taxonomy and
//! consistent event logging. Every failure is classified here, nothing is
//! retried, and logging never alters control flow.

use crate::{
    error::AuthError,
    events::{EventContext, EventLog},
    provider::{token, Account, IdentityProvider, ProviderError},
};
use axum::http::StatusCode;
use std::sync::Arc;

/// Outcome of requesting a verification link. Already-verified is a terminal
/// non-error state, distinct from failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationLink {
    Link(String),
    AlreadyVerified,
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub account: Account,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct AuthService {
    provider: Arc<dyn IdentityProvider>,
    events: EventLog,
    project_id: String,
}

impl AuthService {
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>, events: EventLog, project_id: &str) -> Self {
        Self {
            provider,
            events,
            project_id: project_id.to_string(),
        }
    }

    /// Register a new account with the provider.
    ///
    /// Existence is probed first so a duplicate email fails without a
    /// creation round trip.
    ///
    /// # Errors
    /// `UserExists` when the email is taken, `ProviderFailure` otherwise.
    pub async fn create_account(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<Account, AuthError> {
        self.events.registration_attempt(email);

        match self.provider.find_by_email(email).await {
            Ok(Some(_)) => {
                self.events.registration_failure(email, "user already exists");
                return Err(AuthError::user_exists(email));
            }
            Ok(None) => {}
            Err(e) => {
                self.events.registration_failure(email, &e.to_string());
                return Err(self.provider_failure(&e));
            }
        }

        match self.provider.create_account(email, password, display_name).await {
            Ok(account) => {
                self.events.registration_success(&account.id, email);
                Ok(account)
            }
            Err(e) => {
                self.events.registration_failure(email, &e.to_string());
                Err(self.provider_failure(&e))
            }
        }
    }

    /// Issue an email verification link for the account.
    ///
    /// # Errors
    /// `UserNotFound` for a missing account, `ProviderFailure` (400) for an
    /// account without an email address.
    pub async fn send_verification_link(
        &self,
        identifier: &str,
    ) -> Result<VerificationLink, AuthError> {
        let account = self.fetch_by_id(identifier).await?;

        let Some(email) = account.email.clone() else {
            return Err(AuthError::provider_failure("Account has no email address")
                .with_status(StatusCode::BAD_REQUEST));
        };

        if account.email_verified {
            return Ok(VerificationLink::AlreadyVerified);
        }

        match self.provider.verification_link(&email).await {
            Ok(link) => {
                self.events.email_verification_sent(&account.id, &email);
                Ok(VerificationLink::Link(link))
            }
            Err(e) => Err(self.provider_failure(&e)),
        }
    }

    /// Mark the account's email as verified.
    ///
    /// Idempotent: an already-verified account is returned unchanged without
    /// issuing a provider mutation.
    ///
    /// # Errors
    /// `UserNotFound` for a missing account, `ProviderFailure` otherwise.
    pub async fn verify_by_identifier(&self, identifier: &str) -> Result<Account, AuthError> {
        let account = self.fetch_by_id(identifier).await?;

        if account.email_verified {
            return Ok(account);
        }

        self.provider
            .set_email_verified(identifier)
            .await
            .map_err(|e| self.provider_failure(&e))?;

        // Re-read for the authoritative post-state
        let updated = match self.provider.find_by_id(identifier).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                return Err(AuthError::provider_failure(
                    "Account missing after verification update",
                ));
            }
            Err(e) => return Err(self.provider_failure(&e)),
        };

        self.events.email_verified(identifier);

        Ok(updated)
    }

    /// Password-grant login.
    ///
    /// The provider's textual error signals are classified by family; a
    /// missing user deliberately maps to `InvalidCredentials` so responses do
    /// not reveal account existence. The returned access token is validated
    /// and the canonical record re-fetched by the token subject rather than
    /// trusted from the login response.
    ///
    /// # Errors
    /// `InvalidCredentials`, `EmailNotVerified`, `InvalidToken`, or
    /// `ProviderFailure`.
    pub async fn password_login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<LoginOutcome, AuthError> {
        let tokens = match self.provider.password_sign_in(email, password).await {
            Ok(tokens) => tokens,
            Err(ProviderError::Api { code, .. }) => {
                let err = classify_sign_in_signal(&code, email);
                self.events.login_failure(email, err.message());
                self.events.failed_auth_attempt(
                    EventContext::new().email(email).with("signal", code.clone()),
                );
                return Err(err);
            }
            Err(e) => {
                self.events.login_failure(email, &e.to_string());
                return Err(self.provider_failure(&e));
            }
        };

        let claims =
            token::verify_claims(&tokens.access_token, &self.project_id).map_err(|e| {
                self.events.failed_auth_attempt(
                    EventContext::new().email(email).with("reason", e.to_string()),
                );
                AuthError::invalid_token(&e.to_string())
            })?;

        let account = match self.provider.find_by_id(&claims.sub).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                self.events.failed_auth_attempt(
                    EventContext::new().email(email).with("reason", "unknown token subject"),
                );
                return Err(AuthError::invalid_token("unknown subject"));
            }
            Err(e) => return Err(self.provider_failure(&e)),
        };

        if !account.email_verified {
            self.events.login_failure(email, "email not verified");
            return Err(AuthError::email_not_verified(email));
        }

        self.events.login_success(&account.id, email);

        Ok(LoginOutcome {
            account,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        })
    }

    async fn fetch_by_id(&self, identifier: &str) -> Result<Account, AuthError> {
        match self.provider.find_by_id(identifier).await {
            Ok(Some(account)) => Ok(account),
            Ok(None) => Err(AuthError::user_not_found(identifier)),
            Err(e) => Err(self.provider_failure(&e)),
        }
    }

    fn provider_failure(&self, err: &ProviderError) -> AuthError {
        match err {
            ProviderError::Api { code, .. } => {
                self.events.api_error("provider", code);
                AuthError::provider_failure("Authentication provider error")
                    .with_provider_code(code.clone())
            }
            ProviderError::Network(reason) => {
                self.events.api_error("provider", reason);
                AuthError::provider_failure("Authentication provider unreachable")
                    .with_provider_code("network")
            }
            ProviderError::InvalidResponse(reason) => {
                self.events.api_error("provider", reason);
                AuthError::provider_failure("Unexpected provider response")
            }
        }
    }
}

/// Map a sign-in error signal to a taxonomy error by substring family.
///
/// Known fragility: the provider's signal vocabulary is matched textually,
/// the integration tests pin the families we rely on.
fn classify_sign_in_signal(signal: &str, email: &str) -> AuthError {
    let upper = signal.to_ascii_uppercase();

    if upper.contains("INVALID_PASSWORD")
        || upper.contains("INVALID_EMAIL")
        || upper.contains("INVALID_LOGIN_CREDENTIALS")
    {
        return AuthError::invalid_credentials();
    }

    // Missing accounts map to invalid credentials on purpose: a 404 here
    // would reveal account existence.
    if upper.contains("EMAIL_NOT_FOUND") || upper.contains("USER_NOT_FOUND") {
        return AuthError::invalid_credentials();
    }

    if upper.contains("EMAIL_NOT_VERIFIED") || upper.contains("UNVERIFIED_EMAIL") {
        return AuthError::email_not_verified(email);
    }

    AuthError::provider_failure("Authentication provider error").with_provider_code(signal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthErrorKind;
    use crate::provider::SessionTokens;
    use async_trait::async_trait;
    use base64ct::{Base64UrlUnpadded, Encoding};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const PROJECT: &str = "test-project";

    fn fake_token(subject: &str) -> String {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64;
        let header = Base64UrlUnpadded::encode_string(br#"{"alg":"RS256","typ":"JWT"}"#);
        let claims = json!({
            "iss": format!("https://securetoken.example.com/{PROJECT}"),
            "aud": PROJECT,
            "sub": subject,
            "exp": now + 3600,
            "iat": now,
        });
        let payload = Base64UrlUnpadded::encode_string(claims.to_string().as_bytes());
        format!("{header}.{payload}.c2ln")
    }

    #[derive(Default)]
    struct FakeProvider {
        accounts: Mutex<Vec<Account>>,
        passwords: Mutex<HashMap<String, String>>,
        writes: AtomicUsize,
        fail_all: bool,
        sign_in_signal: Option<String>,
    }

    impl FakeProvider {
        fn with_account(self, account: Account, password: &str) -> Self {
            if let Some(email) = &account.email {
                self.passwords
                    .lock()
                    .unwrap()
                    .insert(email.clone(), password.to_string());
            }
            self.accounts.lock().unwrap().push(account);
            self
        }

        fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }
    }

    fn account(id: &str, email: Option<&str>, verified: bool) -> Account {
        Account {
            id: id.to_string(),
            email: email.map(str::to_string),
            email_verified: verified,
            display_name: None,
            created_at: Some("1700000000000".to_string()),
        }
    }

    #[async_trait]
    impl IdentityProvider for FakeProvider {
        async fn find_by_email(&self, email: &str) -> Result<Option<Account>, ProviderError> {
            if self.fail_all {
                return Err(ProviderError::Network("connection refused".to_string()));
            }
            Ok(self
                .accounts
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.email.as_deref() == Some(email))
                .cloned())
        }

        async fn find_by_id(&self, id: &str) -> Result<Option<Account>, ProviderError> {
            if self.fail_all {
                return Err(ProviderError::Network("connection refused".to_string()));
            }
            Ok(self
                .accounts
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.id == id)
                .cloned())
        }

        async fn create_account(
            &self,
            email: &str,
            password: &str,
            display_name: Option<&str>,
        ) -> Result<Account, ProviderError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            let created = Account {
                id: format!("id-{email}"),
                email: Some(email.to_string()),
                email_verified: false,
                display_name: display_name.map(str::to_string),
                created_at: Some("1700000000000".to_string()),
            };
            self.passwords
                .lock()
                .unwrap()
                .insert(email.to_string(), password.to_string());
            self.accounts.lock().unwrap().push(created.clone());
            Ok(created)
        }

        async fn set_email_verified(&self, id: &str) -> Result<(), ProviderError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            let mut accounts = self.accounts.lock().unwrap();
            match accounts.iter_mut().find(|a| a.id == id) {
                Some(account) => {
                    account.email_verified = true;
                    Ok(())
                }
                None => Err(ProviderError::Api {
                    code: "USER_NOT_FOUND".to_string(),
                    status: Some(400),
                }),
            }
        }

        async fn verification_link(&self, email: &str) -> Result<String, ProviderError> {
            Ok(format!("https://verify.example.com/?email={email}"))
        }

        async fn password_sign_in(
            &self,
            email: &str,
            password: &str,
        ) -> Result<SessionTokens, ProviderError> {
            if let Some(signal) = &self.sign_in_signal {
                return Err(ProviderError::Api {
                    code: signal.clone(),
                    status: Some(400),
                });
            }

            let stored = self.passwords.lock().unwrap().get(email).cloned();
            match stored {
                None => Err(ProviderError::Api {
                    code: "EMAIL_NOT_FOUND".to_string(),
                    status: Some(400),
                }),
                Some(stored) if stored != password => Err(ProviderError::Api {
                    code: "INVALID_PASSWORD".to_string(),
                    status: Some(400),
                }),
                Some(_) => {
                    let id = self
                        .accounts
                        .lock()
                        .unwrap()
                        .iter()
                        .find(|a| a.email.as_deref() == Some(email))
                        .map(|a| a.id.clone())
                        .unwrap();
                    Ok(SessionTokens {
                        access_token: fake_token(&id),
                        refresh_token: "refresh-1".to_string(),
                    })
                }
            }
        }
    }

    fn service(provider: FakeProvider) -> (AuthService, Arc<FakeProvider>) {
        let provider = Arc::new(provider);
        let service = AuthService::new(provider.clone(), EventLog::new(), PROJECT);
        (service, provider)
    }

    #[tokio::test]
    async fn test_create_existing_email_fails_without_write() {
        let (service, provider) = service(
            FakeProvider::default().with_account(account("u-1", Some("a@b.com"), true), "pw"),
        );

        let err = service
            .create_account("a@b.com", "secret123", None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), AuthErrorKind::UserExists);
        assert_eq!(provider.writes(), 0);
    }

    #[tokio::test]
    async fn test_create_new_account_is_unverified() {
        let (service, provider) = service(FakeProvider::default());

        let created = service
            .create_account("new@b.com", "secret123", Some("New User"))
            .await
            .unwrap();

        assert!(!created.email_verified);
        assert_eq!(created.email.as_deref(), Some("new@b.com"));
        assert_eq!(provider.writes(), 1);
    }

    #[tokio::test]
    async fn test_create_account_probe_failure_propagates() {
        let provider = FakeProvider {
            fail_all: true,
            ..Default::default()
        };
        let (service, _) = service(provider);

        let err = service
            .create_account("a@b.com", "secret123", None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), AuthErrorKind::ProviderFailure);
        assert_eq!(err.provider_code(), Some("network"));
    }

    #[tokio::test]
    async fn test_verify_is_idempotent() {
        let (service, provider) = service(
            FakeProvider::default().with_account(account("u-1", Some("a@b.com"), false), "pw"),
        );

        let first = service.verify_by_identifier("u-1").await.unwrap();
        assert!(first.email_verified);
        assert_eq!(provider.writes(), 1);

        let second = service.verify_by_identifier("u-1").await.unwrap();
        assert!(second.email_verified);
        // no mutating write on the second call
        assert_eq!(provider.writes(), 1);
    }

    #[tokio::test]
    async fn test_verify_missing_user() {
        let (service, _) = service(FakeProvider::default());

        let err = service.verify_by_identifier("nonexistent").await.unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::UserNotFound);
        assert_eq!(err.message(), "User not found: nonexistent");
    }

    #[tokio::test]
    async fn test_send_link_already_verified_sentinel() {
        let (service, _) = service(
            FakeProvider::default().with_account(account("u-1", Some("a@b.com"), true), "pw"),
        );

        let outcome = service.send_verification_link("u-1").await.unwrap();
        assert_eq!(outcome, VerificationLink::AlreadyVerified);
    }

    #[tokio::test]
    async fn test_send_link_unverified_returns_link() {
        let (service, _) = service(
            FakeProvider::default().with_account(account("u-1", Some("a@b.com"), false), "pw"),
        );

        match service.send_verification_link("u-1").await.unwrap() {
            VerificationLink::Link(link) => assert!(link.contains("a@b.com")),
            VerificationLink::AlreadyVerified => panic!("expected a link"),
        }
    }

    #[tokio::test]
    async fn test_send_link_account_without_email() {
        let (service, _) =
            service(FakeProvider::default().with_account(account("u-1", None, false), "pw"));

        let err = service.send_verification_link("u-1").await.unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::ProviderFailure);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_success() {
        let (service, _) = service(
            FakeProvider::default().with_account(account("u-1", Some("a@b.com"), true), "pw"),
        );

        let outcome = service.password_login("a@b.com", "pw").await.unwrap();
        assert_eq!(outcome.account.id, "u-1");
        assert!(!outcome.access_token.is_empty());
        assert_eq!(outcome.refresh_token, "refresh-1");
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let (service, _) = service(
            FakeProvider::default().with_account(account("u-1", Some("a@b.com"), true), "pw"),
        );

        let err = service.password_login("a@b.com", "wrong").await.unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::InvalidCredentials);
        assert_eq!(err.message(), "Invalid email or password");
    }

    #[tokio::test]
    async fn test_login_unknown_email_is_invalid_credentials() {
        let (service, _) = service(FakeProvider::default());

        let err = service.password_login("x@y.com", "pw").await.unwrap_err();
        // never UserNotFound, that would reveal account existence
        assert_eq!(err.kind(), AuthErrorKind::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_login_unverified_email() {
        let (service, _) = service(
            FakeProvider::default().with_account(account("u-1", Some("a@b.com"), false), "pw"),
        );

        let err = service.password_login("a@b.com", "pw").await.unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::EmailNotVerified);
    }

    #[tokio::test]
    async fn test_login_unrecognized_signal_keeps_raw_code() {
        let provider = FakeProvider {
            sign_in_signal: Some("TOO_MANY_ATTEMPTS_TRY_LATER".to_string()),
            ..Default::default()
        };
        let (service, _) = service(provider);

        let err = service.password_login("a@b.com", "pw").await.unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::ProviderFailure);
        assert_eq!(err.provider_code(), Some("TOO_MANY_ATTEMPTS_TRY_LATER"));
    }

    #[tokio::test]
    async fn test_login_network_failure() {
        let provider = FakeProvider {
            fail_all: true,
            ..Default::default()
        };
        // sign-in itself succeeds per fake wiring only when passwords match;
        // fail_all only affects lookups, so install a password first
        let provider =
            provider.with_account(account("u-1", Some("a@b.com"), true), "pw");
        let (service, _) = service(provider);

        let err = service.password_login("a@b.com", "pw").await.unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::ProviderFailure);
        assert_eq!(err.provider_code(), Some("network"));
    }

    #[test]
    fn test_signal_families() {
        assert_eq!(
            classify_sign_in_signal("INVALID_PASSWORD", "a@b.com").kind(),
            AuthErrorKind::InvalidCredentials
        );
        assert_eq!(
            classify_sign_in_signal("INVALID_LOGIN_CREDENTIALS", "a@b.com").kind(),
            AuthErrorKind::InvalidCredentials
        );
        assert_eq!(
            classify_sign_in_signal("EMAIL_NOT_FOUND", "a@b.com").kind(),
            AuthErrorKind::InvalidCredentials
        );
        assert_eq!(
            classify_sign_in_signal("EMAIL_NOT_VERIFIED", "a@b.com").kind(),
            AuthErrorKind::EmailNotVerified
        );
        let unknown = classify_sign_in_signal("QUOTA_EXCEEDED", "a@b.com");
        assert_eq!(unknown.kind(), AuthErrorKind::ProviderFailure);
        assert_eq!(unknown.provider_code(), Some("QUOTA_EXCEEDED"));
    }
}
