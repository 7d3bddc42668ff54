//! Route handlers and shared request validation.

pub mod auth;
pub mod health;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use regex::Regex;

/// All documented routes. Middleware and extensions are layered on in
/// [`crate::api::new`].
#[must_use]
pub fn router() -> Router {
    Router::new()
        .route("/auth/user/sign-up", post(auth::signup::signup))
        .route("/auth/user/sign-in", post(auth::login::user_login))
        .route("/auth/manager/sign-in", post(auth::login::manager_login))
        .route("/auth/forgot-password", post(auth::password::forgot_password))
        .route(
            "/user/:id/verify-account",
            patch(auth::otp::verify_account),
        )
        .route("/user/resend-code", patch(auth::otp::resend_code))
        .route(
            "/user/:id/reset-password",
            patch(auth::password::reset_password),
        )
        .route("/user", get(auth::users::list_users))
        .route("/user/account", delete(auth::users::delete_account))
        .route(
            "/user/:id",
            get(auth::users::get_user)
                .patch(auth::users::update_user)
                .delete(auth::users::delete_user),
        )
        .route("/user/:id/profile", patch(auth::users::update_profile))
        .route(
            "/manager",
            post(auth::managers::create_manager).get(auth::managers::list_managers),
        )
        .route(
            "/manager/:id",
            get(auth::managers::get_manager)
                .patch(auth::managers::update_manager)
                .delete(auth::managers::delete_manager),
        )
        .route("/health", get(health::health).options(health::health))
}

/// Lightweight email sanity check used by auth handlers before persisting data.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Phone numbers are stored as given; only require digits with an optional
/// leading `+` and a sane length.
pub fn valid_phone(phone_number: &str) -> bool {
    Regex::new(r"^\+?[0-9]{7,15}$").is_ok_and(|re| re.is_match(phone_number))
}

/// Minimum password length before hashing.
pub fn valid_password(password: &str) -> bool {
    password.len() >= 8
}
