use super::guard::{require_tier, require_user};
use super::types::{
    bad_request, error_response, DeleteAccountRequest, ErrorBody, ListUsersQuery,
    UpdateUserRequest, UserListResponse, UserResponse,
};
use crate::api::handlers::{valid_email, valid_phone};
use crate::auth::{AuthError, AuthFlow, Tier, UserDetailsUpdate};
use axum::{
    extract::{Extension, Path, Query},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use secrecy::SecretString;
use tracing::error;
use uuid::Uuid;

const DEFAULT_PAGE: u64 = 1;
const DEFAULT_PAGE_SIZE: u64 = 50;

/// Validate the optional contact fields before they reach the flow.
fn details_from_payload(payload: UpdateUserRequest) -> Result<UserDetailsUpdate, Response> {
    if let Some(email) = &payload.email {
        if !valid_email(email) {
            error!("Invalid email");

            return Err(bad_request("Invalid email"));
        }
    }

    if let Some(phone_number) = &payload.phone_number {
        if !valid_phone(phone_number) {
            error!("Invalid phone number");

            return Err(bad_request("Invalid phone number"));
        }
    }

    let update = UserDetailsUpdate {
        first_name: payload.first_name,
        last_name: payload.last_name,
        email: payload.email,
        phone_number: payload.phone_number,
    };

    if update.is_empty() {
        return Err(bad_request("Nothing to update"));
    }

    Ok(update)
}

#[utoipa::path(
    get,
    path= "/user",
    params(ListUsersQuery),
    responses (
        (status = 200, description = "One page of user records", body = [UserListResponse], content_type = "application/json"),
        (status = 400, description = "Page out of bounds"),
        (status = 401, description = "Missing or invalid manager token"),
        (status = 403, description = "Insufficient privileges"),
    ),
    tag= "users"
)]
pub async fn list_users(
    flow: Extension<AuthFlow>,
    Query(query): Query<ListUsersQuery>,
    headers: HeaderMap,
) -> Response {
    if let Err(err) = require_tier(&flow, &headers, Tier::Director).await {
        return error_response(&err);
    }

    let page = query.page.unwrap_or(DEFAULT_PAGE);
    let size = query.size.unwrap_or(DEFAULT_PAGE_SIZE);

    match flow.list_users(page, size).await {
        Ok(page) => Json(UserListResponse {
            page: page.page,
            total_pages: page.total_pages,
            total_results: page.total,
            results: page.users.into_iter().map(UserResponse::from).collect(),
        })
        .into_response(),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    get,
    path= "/user/{id}",
    params(
        ("id" = Uuid, Path, description = "User id"),
    ),
    responses (
        (status = 200, description = "User record", body = [UserResponse], content_type = "application/json"),
        (status = 401, description = "Missing or invalid manager token"),
        (status = 403, description = "Insufficient privileges"),
        (status = 404, description = "Account not found"),
    ),
    tag= "users"
)]
pub async fn get_user(
    flow: Extension<AuthFlow>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Response {
    // Reading user records takes director privileges; monitors stay out.
    if let Err(err) = require_tier(&flow, &headers, Tier::Director).await {
        return error_response(&err);
    }

    match flow.store().find_user_by_id(id).await {
        Ok(Some(user)) => Json(UserResponse::from(user.without_secrets())).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                error: AuthError::NotFound.to_string(),
            }),
        )
            .into_response(),
        Err(err) => error_response(&AuthError::store(err)),
    }
}

#[utoipa::path(
    patch,
    path= "/user/{id}",
    request_body = UpdateUserRequest,
    params(
        ("id" = Uuid, Path, description = "User id"),
    ),
    responses (
        (status = 200, description = "Updated user record", body = [UserResponse], content_type = "application/json"),
        (status = 400, description = "Invalid field or empty update"),
        (status = 401, description = "Missing or invalid manager token"),
        (status = 403, description = "Insufficient privileges"),
        (status = 404, description = "Account not found"),
        (status = 409, description = "Email or phone number already registered"),
    ),
    tag= "users"
)]
pub async fn update_user(
    flow: Extension<AuthFlow>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    payload: Option<Json<UpdateUserRequest>>,
) -> Response {
    if let Err(err) = require_tier(&flow, &headers, Tier::Director).await {
        return error_response(&err);
    }

    let Some(Json(payload)) = payload else {
        return bad_request("Missing payload");
    };

    let update = match details_from_payload(payload) {
        Ok(update) => update,
        Err(response) => return response,
    };

    match flow.update_user_details(id, update).await {
        Ok(user) => Json(UserResponse::from(user)).into_response(),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    delete,
    path= "/user/{id}",
    params(
        ("id" = Uuid, Path, description = "User id"),
    ),
    responses (
        (status = 204, description = "User deleted"),
        (status = 401, description = "Missing or invalid manager token"),
        (status = 403, description = "Insufficient privileges"),
        (status = 404, description = "Account not found"),
    ),
    tag= "users"
)]
pub async fn delete_user(
    flow: Extension<AuthFlow>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Response {
    if let Err(err) = require_tier(&flow, &headers, Tier::Manager).await {
        return error_response(&err);
    }

    match flow.delete_user(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    patch,
    path= "/user/{id}/profile",
    request_body = UpdateUserRequest,
    params(
        ("id" = Uuid, Path, description = "User id"),
    ),
    responses (
        (status = 200, description = "Updated user record", body = [UserResponse], content_type = "application/json"),
        (status = 400, description = "Invalid field or empty update"),
        (status = 401, description = "Missing or invalid user token"),
        (status = 403, description = "Token does not belong to this account"),
        (status = 409, description = "Email or phone number already registered"),
    ),
    tag= "users"
)]
pub async fn update_profile(
    flow: Extension<AuthFlow>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    payload: Option<Json<UpdateUserRequest>>,
) -> Response {
    let requester = match require_user(&flow, &headers).await {
        Ok(user) => user,
        Err(err) => return error_response(&err),
    };

    let Some(Json(payload)) = payload else {
        return bad_request("Missing payload");
    };

    let update = match details_from_payload(payload) {
        Ok(update) => update,
        Err(response) => return response,
    };

    match flow.update_own_profile(requester.id, id, update).await {
        Ok(user) => Json(UserResponse::from(user)).into_response(),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    delete,
    path= "/user/account",
    request_body = DeleteAccountRequest,
    responses (
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Missing or invalid user token"),
        (status = 403, description = "Credentials belong to a different account"),
        (status = 404, description = "Wrong credentials"),
    ),
    tag= "users"
)]
pub async fn delete_account(
    flow: Extension<AuthFlow>,
    headers: HeaderMap,
    payload: Option<Json<DeleteAccountRequest>>,
) -> Response {
    let requester = match require_user(&flow, &headers).await {
        Ok(user) => user,
        Err(err) => return error_response(&err),
    };

    let Some(Json(payload)) = payload else {
        return bad_request("Missing payload");
    };

    let password = SecretString::from(payload.password);
    match flow
        .delete_own_account(requester.id, &payload.phone_number, &password)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(&err),
    }
}
