//! Fixed endpoint table for the QvaPay REST API.

use crate::http::HttpMethod;

/// One remote operation: its path, method and the single status code that
/// counts as success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Login,
    Register,
    Logout,
    Profile,
    EditProfile,
}

impl Endpoint {
    pub const ALL: [Endpoint; 5] = [
        Endpoint::Login,
        Endpoint::Register,
        Endpoint::Logout,
        Endpoint::Profile,
        Endpoint::EditProfile,
    ];

    /// Path relative to the configured server, without a leading slash.
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Login => "auth/login",
            Endpoint::Register => "auth/register",
            Endpoint::Logout => "auth/logout",
            Endpoint::Profile | Endpoint::EditProfile => "user",
        }
    }

    pub fn method(&self) -> HttpMethod {
        match self {
            Endpoint::Login | Endpoint::Register => HttpMethod::Post,
            Endpoint::Logout | Endpoint::Profile => HttpMethod::Get,
            Endpoint::EditProfile => HttpMethod::Put,
        }
    }

    pub fn expected_status(&self) -> u16 {
        match self {
            Endpoint::Login | Endpoint::Register | Endpoint::Profile => 200,
            Endpoint::Logout | Endpoint::EditProfile => 201,
        }
    }

    /// Endpoints that must never carry credentials.
    pub fn is_public(&self) -> bool {
        matches!(self, Endpoint::Login | Endpoint::Register)
    }

    /// True when `path` targets one of the public endpoints. Leading slashes
    /// are ignored so hand-built requests match too.
    pub fn is_public_path(path: &str) -> bool {
        let path = path.trim_start_matches('/');
        Endpoint::ALL
            .iter()
            .any(|endpoint| endpoint.is_public() && endpoint.path() == path)
    }
}
