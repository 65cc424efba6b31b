//! Access-token claims validation.
//!
//! The login response token is not trusted as-is: its claims are decoded and
//! checked against the configured project before the canonical account is
//! re-fetched by the verified subject. Signature verification stays with the
//! provider, the subject is cross-checked through an authoritative lookup.

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::Deserialize;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccessClaims {
    pub iss: String,
    pub aud: String,
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json,
    #[error("token expired")]
    Expired,
    #[error("token issued in the future")]
    IssuedInFuture,
    #[error("invalid audience")]
    InvalidAudience,
    #[error("invalid issuer")]
    InvalidIssuer,
    #[error("missing subject")]
    MissingSubject,
}

fn b64d_json<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, TokenError> {
    let bytes = Base64UrlUnpadded::decode_vec(segment).map_err(|_| TokenError::Base64)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Json)
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs() as i64)
}

/// Decode and validate the token claims for `project_id` at the current time.
///
/// # Errors
/// Returns a [`TokenError`] if the token is malformed, expired, or was issued
/// for a different project.
pub fn verify_claims(token: &str, project_id: &str) -> Result<AccessClaims, TokenError> {
    verify_claims_at(token, project_id, unix_now())
}

/// Same as [`verify_claims`] with an explicit clock, used by tests.
///
/// # Errors
/// Returns a [`TokenError`] if the token is malformed, expired, or was issued
/// for a different project.
pub fn verify_claims_at(token: &str, project_id: &str, now: i64) -> Result<AccessClaims, TokenError> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenError::TokenFormat);
    };

    let claims: AccessClaims = b64d_json(payload)?;

    if claims.sub.trim().is_empty() {
        return Err(TokenError::MissingSubject);
    }

    if claims.aud != project_id {
        return Err(TokenError::InvalidAudience);
    }

    if !claims.iss.ends_with(&format!("/{project_id}")) {
        return Err(TokenError::InvalidIssuer);
    }

    if claims.exp <= now {
        return Err(TokenError::Expired);
    }

    // Small skew allowance for the provider's clock
    if claims.iat > now + 60 {
        return Err(TokenError::IssuedInFuture);
    }

    Ok(claims)
}
