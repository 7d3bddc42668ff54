//! Request/response payloads and the error-to-status mapping.

use crate::auth::{AuthError, Manager, User};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(ToSchema, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub password: String,
}

#[derive(ToSchema, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLoginRequest {
    pub phone_number: String,
    pub password: String,
}

#[derive(ToSchema, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerLoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(ToSchema, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VerifyAccountRequest {
    pub otp_code: String,
}

#[derive(ToSchema, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    pub phone_number: String,
}

#[derive(ToSchema, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ResendCodeRequest {
    pub user_id: Uuid,
}

#[derive(ToSchema, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub otp_code: String,
    pub password: String,
}

/// Directory pagination, 1-based. Defaults match the admin UI: first page,
/// fifty records.
#[derive(IntoParams, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersQuery {
    pub page: Option<u64>,
    pub size: Option<u64>,
}

#[derive(ToSchema, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(ToSchema, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAccountRequest {
    pub phone_number: String,
    pub password: String,
}

#[derive(ToSchema, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateManagerRequest {
    pub username: String,
    pub phone_number: String,
    pub password: String,
    /// One of `manager`, `director`, `monitor`.
    pub role: String,
}

#[derive(ToSchema, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateManagerRequest {
    pub username: Option<String>,
    pub phone_number: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(ToSchema, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            phone_number: user.phone_number,
            verified: user.verified,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(ToSchema, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ManagerResponse {
    pub id: Uuid,
    pub username: String,
    pub phone_number: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Manager> for ManagerResponse {
    fn from(manager: Manager) -> Self {
        Self {
            id: manager.id,
            username: manager.username,
            phone_number: manager.phone_number,
            role: manager.role.to_string(),
            created_at: manager.created_at,
            updated_at: manager.updated_at,
        }
    }
}

#[derive(ToSchema, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserTokenResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(ToSchema, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ManagerTokenResponse {
    pub token: String,
    pub manager: ManagerResponse,
}

#[derive(ToSchema, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordResponse {
    pub user_id: Uuid,
}

#[derive(ToSchema, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    pub page: u64,
    pub total_pages: u64,
    pub total_results: u64,
    pub results: Vec<UserResponse>,
}

#[derive(ToSchema, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ManagerListResponse {
    pub total_results: usize,
    pub results: Vec<ManagerResponse>,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}

/// 400 with a short reason, used by field validation before the flow runs.
pub(in crate::api::handlers) fn bad_request(reason: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: reason.to_string(),
        }),
    )
        .into_response()
}

/// Map a flow error to a status code and JSON body. Store failures log the
/// source and report a generic message.
pub(in crate::api::handlers) fn error_response(err: &AuthError) -> Response {
    let status = match err {
        AuthError::Conflict(_) => StatusCode::CONFLICT,
        AuthError::WrongCredentials | AuthError::NotFound => StatusCode::NOT_FOUND,
        AuthError::NotVerified | AuthError::OtpInvalid | AuthError::PageOutOfBounds => {
            StatusCode::BAD_REQUEST
        }
        AuthError::Unauthorized | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
        AuthError::Forbidden => StatusCode::FORBIDDEN,
        AuthError::DeliveryFailed | AuthError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if let AuthError::Store(source) = err {
        tracing::error!("identity store failure: {source:?}");
    }

    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ConflictKind;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AuthError::Conflict(ConflictKind::Email), StatusCode::CONFLICT),
            (AuthError::WrongCredentials, StatusCode::NOT_FOUND),
            (AuthError::NotFound, StatusCode::NOT_FOUND),
            (AuthError::NotVerified, StatusCode::BAD_REQUEST),
            (AuthError::OtpInvalid, StatusCode::BAD_REQUEST),
            (AuthError::PageOutOfBounds, StatusCode::BAD_REQUEST),
            (AuthError::Unauthorized, StatusCode::UNAUTHORIZED),
            (AuthError::InvalidToken, StatusCode::UNAUTHORIZED),
            (AuthError::Forbidden, StatusCode::FORBIDDEN),
            (
                AuthError::DeliveryFailed,
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AuthError::Store(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(error_response(&err).status(), expected, "{err}");
        }
    }

    #[test]
    fn test_user_response_omits_secrets() {
        // The DTO has no place to put the hash or the code.
        let json = serde_json::to_string(&UserResponse {
            id: Uuid::nil(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "jane@example.com".to_string(),
            phone_number: "+15555550100".to_string(),
            verified: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
        .unwrap();

        assert!(json.contains("phoneNumber"));
        assert!(!json.contains("password"));
        assert!(!json.contains("otp"));
    }
}
