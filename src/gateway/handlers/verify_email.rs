use crate::{
    gateway::handlers::bad_request,
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
pub struct VerifyEmailRequest {
    uid: String,
}

#[derive(ToSchema, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmailResponse {
    success: bool,
    email_verified: bool,
    message: String,
}

#[utoipa::path(
    post,
    path= "/verify-email",
    responses (
        (status = 200, description = "Email verified", body = [VerifyEmailResponse], content_type = "application/json"),
        (status = 400, description = "Missing uid"),
        (status = 404, description = "User not found"),
    ),
    tag= "verify"
)]
#[instrument(skip_all)]
pub async fn verify_email(
    auth: Extension<Arc<AuthService>>,
    payload: Option<Json<VerifyEmailRequest>>,
) -> Response {
    let request: VerifyEmailRequest = match payload {
        Some(Json(payload)) => payload,
        None => return bad_request("Missing payload"),
    };

    let uid = request.uid.trim();
    if uid.is_empty() {
        return bad_request("Missing uid");
    }

    match auth.verify_by_identifier(uid).await {
        Ok(account) => (
            StatusCode::OK,
            Json(VerifyEmailResponse {
                success: true,
                email_verified: account.email_verified,
                message: "Email verified".to_string(),
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
