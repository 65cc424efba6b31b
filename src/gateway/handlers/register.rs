use crate::{
    events::EventLog,
    gateway::handlers::{bad_request, valid_email, valid_password},
    provider::adapter::AuthService,
};
use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

#[derive(ToSchema, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    email: String,
    full_name: String,
    password: String,
}

#[derive(ToSchema, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    success: bool,
    user_id: String,
    email_verified: bool,
    message: String,
}

#[utoipa::path(
    post,
    path= "/register",
    responses (
        (status = 201, description = "Registration successful", body = [RegisterResponse], content_type = "application/json"),
        (status = 400, description = "Missing or invalid fields"),
        (status = 409, description = "User with the specified email already exists"),
    ),
    tag= "register"
)]
#[instrument(skip_all)]
pub async fn register(
    auth: Extension<Arc<AuthService>>,
    events: Extension<EventLog>,
    payload: Option<Json<RegisterRequest>>,
) -> Response {
    let user: RegisterRequest = match payload {
        Some(Json(payload)) => payload,
        None => return bad_request("Missing payload"),
    };

    if !valid_email(&user.email) {
        events.validation_failure("email", "invalid format");
        return bad_request("Invalid email address");
    }

    if user.full_name.trim().is_empty() {
        events.validation_failure("fullName", "empty");
        return bad_request("Missing fullName");
    }

    if !valid_password(&user.password) {
        events.validation_failure("password", "too short");
        return bad_request("Password must be at least 6 characters");
    }

    let account = match auth
        .create_account(&user.email, &user.password, Some(user.full_name.trim()))
        .await
    {
        Ok(account) => account,
        Err(e) => return e.into_response(),
    };

    // Best effort: the provider delivers the link, a failure here is already
    // logged by the adapter and must not undo the registration.
    let message = match auth.send_verification_link(&account.id).await {
        Ok(_) => "Registration successful, verification email sent".to_string(),
        Err(_) => "Registration successful".to_string(),
    };

    (
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            user_id: account.id,
            email_verified: account.email_verified,
            message,
        }),
    )
        .into_response()
}
