use crate::error::AppError;
use serde::{Deserialize, Serialize};

/// Request body for user login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    /// Username of the admin account.
    #[schema(example = "admin")]
    pub username: String,
    /// Account password.
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.username.trim().is_empty() {
        return Err(AppError::field("username", "Username must not be empty"));
    }
    if payload.password.is_empty() {
        return Err(AppError::field("password", "Password must not be empty"));
    }
    Ok(())
}

/// Successful login response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// JWT bearer token valid for 7 days.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    /// Authenticated user's username.
    #[schema(example = "admin")]
    pub username: String,
    /// User's role.
    #[schema(example = "editor")]
    pub role: String,
    /// Permissions granted to the user.
    #[schema(example = json!(["video:view", "video:change"]))]
    pub permissions: Vec<String>,
}

/// Current authenticated user's profile.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    /// User ID.
    #[schema(example = 1)]
    pub id: i32,
    /// Username.
    #[schema(example = "admin")]
    pub username: String,
    /// Role.
    #[schema(example = "editor")]
    pub role: String,
    /// Permissions.
    #[schema(example = json!(["video:view", "video:change"]))]
    pub permissions: Vec<String>,
}
