use crate::{
    events::EventLog,
    gateway::handlers::{bad_request, valid_email},
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
pub struct LoginRequest {
    email: String,
    password: String,
}

#[derive(ToSchema, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    success: bool,
    user_id: String,
    email_verified: bool,
    token: String,
}

#[utoipa::path(
    post,
    path= "/login",
    responses (
        (status = 200, description = "Login successful", body = [LoginResponse], content_type = "application/json"),
        (status = 400, description = "Invalid email"),
        (status = 401, description = "Invalid email or password"),
        (status = 403, description = "Email not verified"),
    ),
    tag= "login"
)]
#[instrument(skip_all)]
pub async fn login(
    auth: Extension<Arc<AuthService>>,
    events: Extension<EventLog>,
    payload: Option<Json<LoginRequest>>,
) -> Response {
    let user: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return bad_request("Missing payload"),
    };

    if !valid_email(&user.email) {
        events.validation_failure("email", "invalid format");
        return bad_request("Invalid email address");
    }

    match auth.password_login(&user.email, &user.password).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(LoginResponse {
                success: true,
                user_id: outcome.account.id,
                email_verified: outcome.account.email_verified,
                token: outcome.access_token,
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
