//! Authentication error taxonomy.
//!
//! Every failure surfaced by the provider adapter is one of a closed set of
//! kinds, each with a fixed HTTP status and a stable symbolic code. Raw
//! provider error strings are kept in `provider_code` for diagnostics and are
//! never sent to clients in production.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    UserExists,
    InvalidCredentials,
    EmailNotVerified,
    UserNotFound,
    InvalidToken,
    ProviderFailure,
}

impl AuthErrorKind {
    /// Stable symbolic code exposed to clients.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::UserExists => "auth/user-exists",
            Self::InvalidCredentials => "auth/invalid-credentials",
            Self::EmailNotVerified => "auth/email-not-verified",
            Self::UserNotFound => "auth/user-not-found",
            Self::InvalidToken => "auth/invalid-token",
            Self::ProviderFailure => "auth/provider-failure",
        }
    }

    /// HTTP status derived from the kind, ProviderFailure defaults to 500.
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::UserExists => StatusCode::CONFLICT,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::EmailNotVerified => StatusCode::FORBIDDEN,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::InvalidToken => StatusCode::BAD_REQUEST,
            Self::ProviderFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct AuthError {
    kind: AuthErrorKind,
    message: String,
    status: StatusCode,
    provider_code: Option<String>,
}

impl AuthError {
    fn new(kind: AuthErrorKind, message: String) -> Self {
        Self {
            kind,
            message,
            status: kind.status(),
            provider_code: None,
        }
    }

    #[must_use]
    pub fn user_exists(email: &str) -> Self {
        Self::new(
            AuthErrorKind::UserExists,
            format!("User already exists: {email}"),
        )
    }

    #[must_use]
    pub fn invalid_credentials() -> Self {
        Self::new(
            AuthErrorKind::InvalidCredentials,
            "Invalid email or password".to_string(),
        )
    }

    #[must_use]
    pub fn email_not_verified(email: &str) -> Self {
        Self::new(
            AuthErrorKind::EmailNotVerified,
            format!("Email not verified: {email}"),
        )
    }

    #[must_use]
    pub fn user_not_found(identifier: &str) -> Self {
        Self::new(
            AuthErrorKind::UserNotFound,
            format!("User not found: {identifier}"),
        )
    }

    #[must_use]
    pub fn invalid_token(reason: &str) -> Self {
        Self::new(
            AuthErrorKind::InvalidToken,
            format!("Invalid token: {reason}"),
        )
    }

    #[must_use]
    pub fn provider_failure(message: &str) -> Self {
        Self::new(AuthErrorKind::ProviderFailure, message.to_string())
    }

    /// Override the status, only meaningful for ProviderFailure.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Keep the raw upstream code for diagnostics.
    #[must_use]
    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    #[must_use]
    pub const fn kind(&self) -> AuthErrorKind {
        self.kind
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn provider_code(&self) -> Option<&str> {
        self.provider_code.as_deref()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

/// True when PASPORTO_ENV=production, cached for the process lifetime.
pub fn production() -> bool {
    static PRODUCTION: OnceLock<bool> = OnceLock::new();
    *PRODUCTION.get_or_init(|| {
        std::env::var("PASPORTO_ENV").is_ok_and(|env| env.eq_ignore_ascii_case("production"))
    })
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let detail = if production() {
            None
        } else {
            self.provider_code.clone()
        };

        let body = ErrorBody {
            success: false,
            message: self.message.clone(),
            code: Some(self.kind.code()),
            detail,
        };

        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_per_kind() {
        assert_eq!(
            AuthError::user_exists("a@b.com").status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AuthError::invalid_credentials().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::email_not_verified("a@b.com").status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::user_not_found("abc").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AuthError::invalid_token("expired").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::provider_failure("upstream").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_provider_failure_status_override() {
        let err = AuthError::provider_failure("account has no email")
            .with_status(StatusCode::BAD_REQUEST);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.kind(), AuthErrorKind::ProviderFailure);
    }

    #[test]
    fn test_provider_code_preserved() {
        let err = AuthError::provider_failure("upstream rejected the request")
            .with_provider_code("TOO_MANY_ATTEMPTS_TRY_LATER");
        assert_eq!(err.provider_code(), Some("TOO_MANY_ATTEMPTS_TRY_LATER"));
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            AuthError::invalid_credentials().message(),
            "Invalid email or password"
        );
        assert_eq!(
            AuthError::user_not_found("nonexistent").message(),
            "User not found: nonexistent"
        );
    }

    #[test]
    fn test_symbolic_codes() {
        assert_eq!(AuthErrorKind::UserExists.code(), "auth/user-exists");
        assert_eq!(
            AuthErrorKind::ProviderFailure.code(),
            "auth/provider-failure"
        );
    }
}
