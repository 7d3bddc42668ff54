use super::types::{
    bad_request, error_response, ManagerLoginRequest, ManagerResponse, ManagerTokenResponse,
    UserLoginRequest, UserResponse, UserTokenResponse,
};
use crate::api::handlers::valid_phone;
use crate::auth::AuthFlow;
use axum::{
    extract::Extension,
    response::{IntoResponse, Json, Response},
};
use secrecy::SecretString;
use tracing::error;

#[utoipa::path(
    post,
    path= "/auth/user/sign-in",
    request_body = UserLoginRequest,
    responses (
        (status = 200, description = "Login successful", body = [UserTokenResponse], content_type = "application/json"),
        (status = 400, description = "Account not verified"),
        (status = 404, description = "Wrong credentials"),
    ),
    tag= "auth"
)]
pub async fn user_login(
    flow: Extension<AuthFlow>,
    payload: Option<Json<UserLoginRequest>>,
) -> Response {
    let Some(Json(payload)) = payload else {
        return bad_request("Missing payload");
    };

    if !valid_phone(&payload.phone_number) {
        error!("Invalid phone number");

        return bad_request("Invalid phone number");
    }

    let password = SecretString::from(payload.password);

    match flow.login_user(&payload.phone_number, &password).await {
        Ok((user, token)) => Json(UserTokenResponse {
            token,
            user: UserResponse::from(user),
        })
        .into_response(),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    post,
    path= "/auth/manager/sign-in",
    request_body = ManagerLoginRequest,
    responses (
        (status = 200, description = "Login successful", body = [ManagerTokenResponse], content_type = "application/json"),
        (status = 404, description = "Wrong credentials"),
    ),
    tag= "auth"
)]
pub async fn manager_login(
    flow: Extension<AuthFlow>,
    payload: Option<Json<ManagerLoginRequest>>,
) -> Response {
    let Some(Json(payload)) = payload else {
        return bad_request("Missing payload");
    };

    if payload.username.trim().is_empty() {
        error!("Invalid username");

        return bad_request("Invalid username");
    }

    let password = SecretString::from(payload.password);

    match flow.login_manager(&payload.username, &password).await {
        Ok((manager, token)) => Json(ManagerTokenResponse {
            token,
            manager: ManagerResponse::from(manager),
        })
        .into_response(),
        Err(err) => error_response(&err),
    }
}
