use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::jwt::Role;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CoachRegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub school: String,
    pub title: Option<String>,
    pub state: Option<String>,
}

/// Public part of an account returned to the client after login.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

/// Outcome of the one-time bootstrap. The plaintext password appears only
/// in the `created: true` response and nowhere else, ever.
#[derive(Debug, Serialize)]
pub struct SetupResponse {
    pub created: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisteredCoach {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub school: Option<String>,
    pub message: String,
}
