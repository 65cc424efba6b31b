//! Structured event stream.
//!
//! Every log record carries a uniform envelope: a category, an event name and
//! a JSON context. Severity is decided by a per-event-name policy, not by the
//! caller, except for the generic [`EventLog::emit`] pass-through. The handle
//! is constructed once at startup and injected where needed; emission never
//! fails back into the calling operation.

use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Auth,
    Database,
    Validation,
    Api,
    Business,
    Security,
    Performance,
    Application,
}

impl Category {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Database => "database",
            Self::Validation => "validation",
            Self::Api => "api",
            Self::Business => "business",
            Self::Security => "security",
            Self::Performance => "performance",
            Self::Application => "application",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warn,
    Info,
    Debug,
}

/// Context keys that must never reach the sink with their raw value.
const REDACTED_KEYS: &[&str] = &[
    "password",
    "new_password",
    "current_password",
    "token",
    "id_token",
    "refresh_token",
    "access_token",
    "secret",
    "api_key",
];

/// Free-form event context with typed well-known fields.
///
/// Extra values go through [`EventContext::with`], which redacts any key that
/// names a secret.
#[derive(Debug, Clone, Default)]
pub struct EventContext {
    user_id: Option<String>,
    email: Option<String>,
    ip: Option<String>,
    extra: Map<String, Value>,
}

impl EventContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    /// Attach an arbitrary serializable value, secret-bearing keys are
    /// replaced with a redaction marker.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        let value = if is_secret_key(key) {
            Value::String("[REDACTED]".to_string())
        } else {
            value.into()
        };
        self.extra.insert(key.to_string(), value);
        self
    }

    fn to_json(&self) -> Value {
        let mut map = self.extra.clone();
        if let Some(user_id) = &self.user_id {
            map.insert("user_id".to_string(), Value::String(user_id.clone()));
        }
        if let Some(email) = &self.email {
            map.insert("email".to_string(), Value::String(email.clone()));
        }
        if let Some(ip) = &self.ip {
            map.insert("ip".to_string(), Value::String(ip.clone()));
        }
        Value::Object(map)
    }
}

fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    REDACTED_KEYS.iter().any(|secret| key == *secret)
}

/// Severity policy per event name.
///
/// Callers of the convenience wrappers never pick a level, they get the one
/// this table dictates.
#[must_use]
pub fn severity_for(category: Category, name: &str) -> Severity {
    match (category, name) {
        (Category::Auth, "registration_attempt" | "registration_success") => Severity::Info,
        (Category::Auth, "registration_failure") => Severity::Error,
        (Category::Auth, "login_success") => Severity::Info,
        (Category::Auth, "login_failure") => Severity::Warn,
        (Category::Security, "permission_denied" | "failed_auth_attempt") => Severity::Warn,
        (Category::Database | Category::Api, "slow_query") => Severity::Warn,
        (
            Category::Application,
            "startup" | "config_change" | "health_check",
        ) => Severity::Info,
        (Category::Application, "shutdown") => Severity::Warn,
        _ => {
            if name.ends_with("_failure") || name.ends_with("_error") {
                Severity::Error
            } else if name.ends_with("_denied") {
                Severity::Warn
            } else {
                Severity::Info
            }
        }
    }
}

/// Handle to the structured event sink.
///
/// Cloneable and cheap, passed explicitly instead of living behind a module
/// global. The sink is whatever `tracing` subscriber the composition root
/// installed.
#[derive(Debug, Clone, Default)]
pub struct EventLog;

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Generic pass-through emission with a caller-supplied severity.
    pub fn emit(&self, category: Category, name: &str, severity: Severity, context: EventContext) {
        let context = serde_json::to_string(&context.to_json()).unwrap_or_else(|_| "{}".into());
        let category = category.as_str();

        match severity {
            Severity::Error => error!(category, event = name, context = %context, "{name}"),
            Severity::Warn => warn!(category, event = name, context = %context, "{name}"),
            Severity::Info => info!(category, event = name, context = %context, "{name}"),
            Severity::Debug => debug!(category, event = name, context = %context, "{name}"),
        }
    }

    fn auth(&self, name: &str, context: EventContext) {
        self.emit(Category::Auth, name, severity_for(Category::Auth, name), context);
    }

    fn security(&self, name: &str, context: EventContext) {
        self.emit(
            Category::Security,
            name,
            severity_for(Category::Security, name),
            context,
        );
    }

    fn application(&self, name: &str, context: EventContext) {
        self.emit(
            Category::Application,
            name,
            severity_for(Category::Application, name),
            context,
        );
    }

    // auth

    pub fn registration_attempt(&self, email: &str) {
        self.auth("registration_attempt", EventContext::new().email(email));
    }

    pub fn registration_success(&self, user_id: &str, email: &str) {
        self.auth(
            "registration_success",
            EventContext::new().user_id(user_id).email(email),
        );
    }

    pub fn registration_failure(&self, email: &str, reason: &str) {
        self.auth(
            "registration_failure",
            EventContext::new().email(email).with("reason", reason),
        );
    }

    pub fn login_success(&self, user_id: &str, email: &str) {
        self.auth(
            "login_success",
            EventContext::new().user_id(user_id).email(email),
        );
    }

    pub fn login_failure(&self, email: &str, reason: &str) {
        self.auth(
            "login_failure",
            EventContext::new().email(email).with("reason", reason),
        );
    }

    pub fn email_verification_sent(&self, user_id: &str, email: &str) {
        self.auth(
            "email_verification_sent",
            EventContext::new().user_id(user_id).email(email),
        );
    }

    pub fn email_verified(&self, user_id: &str) {
        self.auth("email_verified", EventContext::new().user_id(user_id));
    }

    // security

    pub fn permission_denied(&self, user_id: &str, resource: &str) {
        self.security(
            "permission_denied",
            EventContext::new().user_id(user_id).with("resource", resource),
        );
    }

    pub fn failed_auth_attempt(&self, context: EventContext) {
        self.security("failed_auth_attempt", context);
    }

    // validation

    pub fn validation_failure(&self, field: &str, reason: &str) {
        self.emit(
            Category::Validation,
            "validation_failure",
            severity_for(Category::Validation, "validation_failure"),
            EventContext::new().with("field", field).with("reason", reason),
        );
    }

    // api / database

    pub fn api_error(&self, endpoint: &str, reason: &str) {
        self.emit(
            Category::Api,
            "api_error",
            severity_for(Category::Api, "api_error"),
            EventContext::new()
                .with("endpoint", endpoint)
                .with("reason", reason),
        );
    }

    pub fn database_error(&self, operation: &str, reason: &str) {
        self.emit(
            Category::Database,
            "database_error",
            severity_for(Category::Database, "database_error"),
            EventContext::new()
                .with("operation", operation)
                .with("reason", reason),
        );
    }

    /// Connection lifecycle events are informational unless the event itself
    /// denotes an error condition.
    pub fn connection_event(&self, name: &str, context: EventContext) {
        self.emit(
            Category::Database,
            name,
            severity_for(Category::Database, name),
            context,
        );
    }

    pub fn slow_query(&self, query: &str, duration_ms: u64) {
        self.emit(
            Category::Database,
            "slow_query",
            severity_for(Category::Database, "slow_query"),
            EventContext::new()
                .with("query", query)
                .with("duration_ms", duration_ms),
        );
    }

    // performance

    pub fn performance(&self, operation: &str, duration_ms: u64) {
        self.emit(
            Category::Performance,
            "operation_timing",
            severity_for(Category::Performance, "operation_timing"),
            EventContext::new()
                .with("operation", operation)
                .with("duration_ms", duration_ms),
        );
    }

    // application lifecycle

    pub fn startup(&self, port: u16) {
        self.application("startup", EventContext::new().with("port", port));
    }

    pub fn shutdown(&self) {
        self.application("shutdown", EventContext::new());
    }

    pub fn config_change(&self, setting: &str) {
        self.application("config_change", EventContext::new().with("setting", setting));
    }

    pub fn health_check(&self) {
        self.application("health_check", EventContext::new());
    }
}
