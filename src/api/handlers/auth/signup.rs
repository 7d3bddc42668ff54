use super::types::{bad_request, error_response, SignupRequest, UserResponse};
use crate::api::handlers::{valid_email, valid_password, valid_phone};
use crate::auth::{AuthFlow, NewUser};
use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use secrecy::SecretString;
use tracing::error;

#[utoipa::path(
    post,
    path= "/auth/user/sign-up",
    request_body = SignupRequest,
    responses (
        (status = 201, description = "Account created, verification code sent", body = [UserResponse], content_type = "application/json"),
        (status = 400, description = "Invalid field"),
        (status = 409, description = "Email or phone number already registered"),
    ),
    tag= "auth"
)]
pub async fn signup(
    flow: Extension<AuthFlow>,
    payload: Option<Json<SignupRequest>>,
) -> Response {
    let Some(Json(payload)) = payload else {
        return bad_request("Missing payload");
    };

    if !valid_email(&payload.email) {
        error!("Invalid email");

        return bad_request("Invalid email");
    }

    if !valid_phone(&payload.phone_number) {
        error!("Invalid phone number");

        return bad_request("Invalid phone number");
    }

    if !valid_password(&payload.password) {
        error!("Invalid password");

        return bad_request("Invalid password");
    }

    let new_user = NewUser {
        first_name: payload.first_name,
        last_name: payload.last_name,
        email: payload.email,
        phone_number: payload.phone_number,
        password: SecretString::from(payload.password),
    };

    match flow.signup_user(new_user).await {
        Ok(user) => (StatusCode::CREATED, Json(UserResponse::from(user))).into_response(),
        Err(err) => error_response(&err),
    }
}
