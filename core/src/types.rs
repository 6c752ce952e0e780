//! Request and response DTOs for the QvaPay API.
//!
//! # Design
//! Response shapes default every field so a server that omits optional
//! attributes still decodes. The edit payload mirrors a partial update: only
//! fields that are present get serialized.

use serde::{Deserialize, Serialize};

/// Credentials for `auth/login`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Payload for `auth/register`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite: Option<String>,
}

/// Token and profile returned by login and register.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub me: User,
}

pub type LoginResponse = AuthResponse;

/// Same shape as a login response. Decoding one does not open a session.
pub type RegisterResponse = AuthResponse;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogoutResponse {
    #[serde(default)]
    pub message: String,
}

/// Public attributes of a QvaPay user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub uuid: String,
    pub username: String,
    pub name: String,
    pub lastname: String,
    pub bio: String,
    pub profile_photo_path: String,
    pub balance: i64,
    pub complete_name: String,
    pub name_verified: String,
    pub profile_photo_url: String,
    pub average_rating: String,
}

impl User {
    pub fn is_empty(&self) -> bool {
        *self == User::default()
    }
}

/// Schema-agnostic profile body, passed through as decoded JSON.
pub type ProfileRaw = serde_json::Map<String, serde_json::Value>;

/// Partial profile update for `PUT user`. Omitted fields remain unchanged on
/// the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kyc: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl EditProfileRequest {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        *self == EditProfileRequest::default()
    }
}
