//! OpenAPI document served through Swagger UI at `/docs`.

use super::handlers::{auth, health};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::signup::signup,
        auth::login::user_login,
        auth::login::manager_login,
        auth::otp::verify_account,
        auth::otp::resend_code,
        auth::password::forgot_password,
        auth::password::reset_password,
        auth::users::list_users,
        auth::users::get_user,
        auth::users::update_user,
        auth::users::delete_user,
        auth::users::update_profile,
        auth::users::delete_account,
        auth::managers::create_manager,
        auth::managers::list_managers,
        auth::managers::get_manager,
        auth::managers::update_manager,
        auth::managers::delete_manager,
    ),
    components(schemas(
        health::Health,
        auth::types::SignupRequest,
        auth::types::UserLoginRequest,
        auth::types::ManagerLoginRequest,
        auth::types::VerifyAccountRequest,
        auth::types::ForgotPasswordRequest,
        auth::types::ResendCodeRequest,
        auth::types::ResetPasswordRequest,
        auth::types::UpdateUserRequest,
        auth::types::DeleteAccountRequest,
        auth::types::CreateManagerRequest,
        auth::types::UpdateManagerRequest,
        auth::types::UserResponse,
        auth::types::ManagerResponse,
        auth::types::UserTokenResponse,
        auth::types::ManagerTokenResponse,
        auth::types::ForgotPasswordResponse,
        auth::types::UserListResponse,
        auth::types::ManagerListResponse,
        auth::types::ErrorBody,
    )),
    tags(
        (name = "auth", description = "Signup and credential verification"),
        (name = "otp", description = "Verification code lifecycle"),
        (name = "password", description = "Password recovery"),
        (name = "users", description = "User directory and account management"),
        (name = "managers", description = "Manager account administration"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;
