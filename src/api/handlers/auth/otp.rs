use super::types::{
    bad_request, error_response, ResendCodeRequest, UserResponse, UserTokenResponse,
    VerifyAccountRequest,
};
use crate::auth::AuthFlow;
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use uuid::Uuid;

#[utoipa::path(
    patch,
    path= "/user/{id}/verify-account",
    request_body = VerifyAccountRequest,
    params(
        ("id" = Uuid, Path, description = "User id"),
    ),
    responses (
        (status = 200, description = "Account verified", body = [UserTokenResponse], content_type = "application/json"),
        (status = 400, description = "Wrong or expired verification code"),
        (status = 404, description = "Account not found"),
    ),
    tag= "otp"
)]
pub async fn verify_account(
    flow: Extension<AuthFlow>,
    Path(id): Path<Uuid>,
    payload: Option<Json<VerifyAccountRequest>>,
) -> Response {
    let Some(Json(payload)) = payload else {
        return bad_request("Missing payload");
    };

    match flow.verify_account(id, &payload.otp_code).await {
        Ok((user, token)) => Json(UserTokenResponse {
            token,
            user: UserResponse::from(user),
        })
        .into_response(),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    patch,
    path= "/user/resend-code",
    request_body = ResendCodeRequest,
    responses (
        (status = 204, description = "Fresh code issued and sent"),
        (status = 404, description = "Account not found"),
    ),
    tag= "otp"
)]
pub async fn resend_code(
    flow: Extension<AuthFlow>,
    payload: Option<Json<ResendCodeRequest>>,
) -> Response {
    let Some(Json(payload)) = payload else {
        return bad_request("Missing payload");
    };

    match flow.resend_code(payload.user_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(&err),
    }
}
