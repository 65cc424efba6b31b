pub mod health;
pub use self::health::health;

pub mod register;
pub use self::register::register;

pub mod login;
pub use self::login::login;

pub mod verify_email;
pub use self::verify_email::verify_email;

// common functions for the handlers
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use regex::Regex;
use serde_json::json;

pub const MIN_PASSWORD_LENGTH: usize = 6;

pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").map_or(false, |re| re.is_match(email))
}

pub fn valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
}

/// Shared 400 response body for shape validation failures.
pub fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "message": message })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(valid_email("a@b.com"));
        assert!(valid_email("first.last@sub.domain.tld"));
        assert!(!valid_email("no-at-sign"));
        assert!(!valid_email("two@@signs.com"));
        assert!(!valid_email("spaces in@mail.com"));
        assert!(!valid_email("missing@tld"));
    }

    #[test]
    fn test_valid_password() {
        assert!(valid_password("secret"));
        assert!(valid_password("longer-passphrase"));
        assert!(!valid_password("short"));
        assert!(!valid_password(""));
    }
}
