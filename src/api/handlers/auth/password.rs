use super::types::{
    bad_request, error_response, ForgotPasswordRequest, ForgotPasswordResponse,
    ResetPasswordRequest,
};
use crate::api::handlers::{valid_password, valid_phone};
use crate::auth::AuthFlow;
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use secrecy::SecretString;
use tracing::error;
use uuid::Uuid;

#[utoipa::path(
    post,
    path= "/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses (
        (status = 200, description = "Reset code sent", body = [ForgotPasswordResponse], content_type = "application/json"),
        (status = 404, description = "Account not found or not verified"),
    ),
    tag= "password"
)]
pub async fn forgot_password(
    flow: Extension<AuthFlow>,
    payload: Option<Json<ForgotPasswordRequest>>,
) -> Response {
    let Some(Json(payload)) = payload else {
        return bad_request("Missing payload");
    };

    if !valid_phone(&payload.phone_number) {
        error!("Invalid phone number");

        return bad_request("Invalid phone number");
    }

    match flow.forgot_password(&payload.phone_number).await {
        Ok(user) => Json(ForgotPasswordResponse { user_id: user.id }).into_response(),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    patch,
    path= "/user/{id}/reset-password",
    request_body = ResetPasswordRequest,
    params(
        ("id" = Uuid, Path, description = "User id"),
    ),
    responses (
        (status = 204, description = "Password replaced"),
        (status = 400, description = "Wrong or expired verification code"),
        (status = 404, description = "Account not found or not verified"),
    ),
    tag= "password"
)]
pub async fn reset_password(
    flow: Extension<AuthFlow>,
    Path(id): Path<Uuid>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> Response {
    let Some(Json(payload)) = payload else {
        return bad_request("Missing payload");
    };

    if !valid_password(&payload.password) {
        error!("Invalid password");

        return bad_request("Invalid password");
    }

    let password = SecretString::from(payload.password);

    match flow.reset_password(id, &payload.otp_code, &password).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(&err),
    }
}
