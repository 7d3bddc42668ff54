use super::guard::require_tier;
use super::types::{
    bad_request, error_response, CreateManagerRequest, ManagerListResponse, ManagerResponse,
    UpdateManagerRequest,
};
use crate::api::handlers::{valid_password, valid_phone};
use crate::auth::{AuthFlow, ManagerChange, NewManager, Role, Tier};
use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use secrecy::SecretString;
use tracing::error;
use uuid::Uuid;

#[utoipa::path(
    post,
    path= "/manager",
    request_body = CreateManagerRequest,
    responses (
        (status = 201, description = "Manager created", body = [ManagerResponse], content_type = "application/json"),
        (status = 400, description = "Invalid field"),
        (status = 401, description = "Missing or invalid manager token"),
        (status = 403, description = "Insufficient privileges"),
        (status = 409, description = "Username already registered"),
    ),
    tag= "managers"
)]
pub async fn create_manager(
    flow: Extension<AuthFlow>,
    headers: HeaderMap,
    payload: Option<Json<CreateManagerRequest>>,
) -> Response {
    if let Err(err) = require_tier(&flow, &headers, Tier::Manager).await {
        return error_response(&err);
    }

    let Some(Json(payload)) = payload else {
        return bad_request("Missing payload");
    };

    if payload.username.trim().is_empty() {
        error!("Invalid username");

        return bad_request("Invalid username");
    }

    if !valid_phone(&payload.phone_number) {
        error!("Invalid phone number");

        return bad_request("Invalid phone number");
    }

    if !valid_password(&payload.password) {
        error!("Invalid password");

        return bad_request("Invalid password");
    }

    let Ok(role) = payload.role.parse::<Role>() else {
        error!("Invalid role");

        return bad_request("Invalid role");
    };

    let new_manager = NewManager {
        username: payload.username,
        phone_number: payload.phone_number,
        password: SecretString::from(payload.password),
        role,
    };

    match flow.create_manager(new_manager).await {
        Ok(manager) => {
            (StatusCode::CREATED, Json(ManagerResponse::from(manager))).into_response()
        }
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    get,
    path= "/manager",
    responses (
        (status = 200, description = "All manager accounts", body = [ManagerListResponse], content_type = "application/json"),
        (status = 401, description = "Missing or invalid manager token"),
        (status = 403, description = "Insufficient privileges"),
    ),
    tag= "managers"
)]
pub async fn list_managers(flow: Extension<AuthFlow>, headers: HeaderMap) -> Response {
    if let Err(err) = require_tier(&flow, &headers, Tier::Director).await {
        return error_response(&err);
    }

    match flow.list_managers().await {
        Ok(managers) => Json(ManagerListResponse {
            total_results: managers.len(),
            results: managers.into_iter().map(ManagerResponse::from).collect(),
        })
        .into_response(),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    get,
    path= "/manager/{id}",
    params(
        ("id" = Uuid, Path, description = "Manager id"),
    ),
    responses (
        (status = 200, description = "Manager record", body = [ManagerResponse], content_type = "application/json"),
        (status = 401, description = "Missing or invalid manager token"),
        (status = 403, description = "Insufficient privileges"),
        (status = 404, description = "Manager not found"),
    ),
    tag= "managers"
)]
pub async fn get_manager(
    flow: Extension<AuthFlow>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Response {
    if let Err(err) = require_tier(&flow, &headers, Tier::Director).await {
        return error_response(&err);
    }

    match flow.get_manager(id).await {
        Ok(manager) => Json(ManagerResponse::from(manager)).into_response(),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    patch,
    path= "/manager/{id}",
    request_body = UpdateManagerRequest,
    params(
        ("id" = Uuid, Path, description = "Manager id"),
    ),
    responses (
        (status = 200, description = "Updated manager record", body = [ManagerResponse], content_type = "application/json"),
        (status = 400, description = "Invalid field or empty update"),
        (status = 401, description = "Missing or invalid manager token"),
        (status = 403, description = "Insufficient privileges"),
        (status = 404, description = "Manager not found"),
        (status = 409, description = "Username already registered"),
    ),
    tag= "managers"
)]
pub async fn update_manager(
    flow: Extension<AuthFlow>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    payload: Option<Json<UpdateManagerRequest>>,
) -> Response {
    if let Err(err) = require_tier(&flow, &headers, Tier::Manager).await {
        return error_response(&err);
    }

    let Some(Json(payload)) = payload else {
        return bad_request("Missing payload");
    };

    if let Some(username) = &payload.username {
        if username.trim().is_empty() {
            error!("Invalid username");

            return bad_request("Invalid username");
        }
    }

    if let Some(phone_number) = &payload.phone_number {
        if !valid_phone(phone_number) {
            error!("Invalid phone number");

            return bad_request("Invalid phone number");
        }
    }

    if let Some(password) = &payload.password {
        if !valid_password(password) {
            error!("Invalid password");

            return bad_request("Invalid password");
        }
    }

    let role = match &payload.role {
        Some(role) => match role.parse::<Role>() {
            Ok(role) => Some(role),
            Err(_) => {
                error!("Invalid role");

                return bad_request("Invalid role");
            }
        },
        None => None,
    };

    let change = ManagerChange {
        username: payload.username,
        phone_number: payload.phone_number,
        password: payload.password.map(SecretString::from),
        role,
    };

    if change.username.is_none()
        && change.phone_number.is_none()
        && change.password.is_none()
        && change.role.is_none()
    {
        return bad_request("Nothing to update");
    }

    match flow.update_manager(id, change).await {
        Ok(manager) => Json(ManagerResponse::from(manager)).into_response(),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    delete,
    path= "/manager/{id}",
    params(
        ("id" = Uuid, Path, description = "Manager id"),
    ),
    responses (
        (status = 204, description = "Manager deleted"),
        (status = 401, description = "Missing or invalid manager token"),
        (status = 403, description = "Insufficient privileges"),
        (status = 404, description = "Manager not found"),
    ),
    tag= "managers"
)]
pub async fn delete_manager(
    flow: Extension<AuthFlow>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Response {
    if let Err(err) = require_tier(&flow, &headers, Tier::Manager).await {
        return error_response(&err);
    }

    match flow.delete_manager(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(&err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthConfig, Manager};
    use crate::notify::LogNotifier;
    use crate::store::MemoryIdentityStore;
    use axum::http::{header::AUTHORIZATION, HeaderValue};
    use chrono::Utc;
    use std::sync::Arc;

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    async fn setup_with_role(role: Role) -> (AuthFlow, String) {
        let store = Arc::new(MemoryIdentityStore::new());
        let id = Uuid::new_v4();
        let now = Utc::now();
        store
            .insert_manager(Manager {
                id,
                username: "root-manager".to_string(),
                phone_number: "+15555550111".to_string(),
                password_hash: Some("$argon2id$fake".to_string()),
                role,
                created_at: now,
                updated_at: now,
            })
            .await;

        let flow = AuthFlow::new(
            store,
            Arc::new(LogNotifier),
            SecretString::from("test-secret"),
            AuthConfig::default(),
        );
        let token = flow
            .tokens()
            .issue_manager_token(id, "root-manager")
            .unwrap();
        (flow, token)
    }

    fn monitor_payload() -> CreateManagerRequest {
        CreateManagerRequest {
            username: "night-shift".to_string(),
            phone_number: "+15555550122".to_string(),
            password: "watchful-eyes".to_string(),
            role: "monitor".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_manager_requires_manager_tier() {
        let (flow, director) = setup_with_role(Role::Director).await;
        let response = create_manager(
            Extension(flow),
            bearer(&director),
            Some(Json(monitor_payload())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let (flow, manager) = setup_with_role(Role::Manager).await;
        let response = create_manager(
            Extension(flow),
            bearer(&manager),
            Some(Json(monitor_payload())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_create_manager_rejects_duplicates_and_unknown_roles() {
        let (flow, token) = setup_with_role(Role::Manager).await;

        let response = create_manager(
            Extension(flow.clone()),
            bearer(&token),
            Some(Json(monitor_payload())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = create_manager(
            Extension(flow.clone()),
            bearer(&token),
            Some(Json(monitor_payload())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let mut payload = monitor_payload();
        payload.username = "superuser-sam".to_string();
        payload.role = "superuser".to_string();
        let response = create_manager(Extension(flow), bearer(&token), Some(Json(payload))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_and_get_take_director_tier() {
        let (flow, monitor) = setup_with_role(Role::Monitor).await;
        let response = list_managers(Extension(flow.clone()), bearer(&monitor)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let (flow, director) = setup_with_role(Role::Director).await;
        let response = list_managers(Extension(flow.clone()), bearer(&director)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response =
            get_manager(Extension(flow), Path(Uuid::new_v4()), bearer(&director)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_manager_round_trip() {
        let (flow, token) = setup_with_role(Role::Manager).await;
        let created = flow
            .create_manager(NewManager {
                username: "night-shift".to_string(),
                phone_number: "+15555550122".to_string(),
                password: SecretString::from("watchful-eyes"),
                role: Role::Monitor,
            })
            .await
            .unwrap();

        let payload = UpdateManagerRequest {
            role: Some("director".to_string()),
            ..UpdateManagerRequest::default()
        };
        let response = update_manager(
            Extension(flow.clone()),
            Path(created.id),
            bearer(&token),
            Some(Json(payload)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        // Renaming onto the seed account's username collides
        let payload = UpdateManagerRequest {
            username: Some("root-manager".to_string()),
            ..UpdateManagerRequest::default()
        };
        let response = update_manager(
            Extension(flow.clone()),
            Path(created.id),
            bearer(&token),
            Some(Json(payload)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response =
            delete_manager(Extension(flow.clone()), Path(created.id), bearer(&token)).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = delete_manager(Extension(flow), Path(created.id), bearer(&token)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
