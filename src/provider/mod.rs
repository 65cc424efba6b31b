//! Identity provider integration.
//!
//! The provider owns every durable fact: account existence, password hashing,
//! token issuance. This module exposes its surface behind the narrow
//! [`IdentityProvider`] trait so the adapter logic is testable against a fake,
//! plus the REST implementation and access-token claims validation.

pub mod adapter;
pub mod rest;
pub mod token;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Read-only projection of the provider's account object, never persisted
/// locally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub display_name: Option<String>,
    pub created_at: Option<String>,
}

/// Token pair issued by the provider on password sign-in, passed through
/// opaque apart from claims validation.
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider answered with an error signal, e.g. `EMAIL_EXISTS`.
    #[error("provider error: {code}")]
    Api { code: String, status: Option<u16> },
    /// The provider was unreachable or the transport failed.
    #[error("provider unreachable: {0}")]
    Network(String),
    /// The provider answered but the body was not what we expect.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

/// Narrow interface over the provider SDK surface.
///
/// Lookups return `Ok(None)` when the account does not exist; every other
/// condition is a [`ProviderError`].
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, ProviderError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, ProviderError>;

    async fn create_account(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<Account, ProviderError>;

    async fn set_email_verified(&self, id: &str) -> Result<(), ProviderError>;

    async fn verification_link(&self, email: &str) -> Result<String, ProviderError>;

    async fn password_sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionTokens, ProviderError>;
}
