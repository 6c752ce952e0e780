//! API client façade for the QvaPay REST API.
//!
//! # Design
//! Each operation is split the same way:
//! - `build_*` validates the payload and produces an `HttpRequest`.
//! - `parse_*` checks the status and decodes the body. It never touches the
//!   session.
//! - The operation itself runs build, the interceptor pipeline and parse in
//!   sequence, and only then applies any session change.
//!
//! Logout and edit remember the token current when the request was built.
//! If a concurrent login has replaced it by the time the response is parsed,
//! the late result is returned to the caller but not written to the session.
//!
//! The first failing step decides the `ApiError` kind and nothing after it
//! runs. Exactly one transport attempt is made per call.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ClientOptions;
use crate::endpoint::Endpoint;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::interceptor::{AuthInjection, DiagnosticCapture, HeaderStamping, Pipeline};
use crate::session::{Session, SessionState};
use crate::transport::{Transport, UreqTransport};
use crate::types::{
    EditProfileRequest, LoginRequest, LoginResponse, LogoutResponse, ProfileRaw,
    RegisterRequest, RegisterResponse, User,
};

/// Blocking client for the QvaPay API.
///
/// Owns its session: separately constructed clients never share
/// authentication state, while clones of one client do. The client is
/// `Send + Sync` and may be used from several threads at once; session reads
/// and writes are serialized, network calls are not.
#[derive(Clone)]
pub struct ApiClient {
    server: String,
    session: SessionState,
    pipeline: Pipeline,
}

impl ApiClient {
    /// Client for `server` with the default transport and no diagnostics.
    pub fn new(server: &str) -> Self {
        Self::from_options(ClientOptions::new().server(server))
    }

    pub fn from_options(options: ClientOptions) -> Self {
        let server = options.resolve_server();
        let session = SessionState::new();
        let transport: Arc<dyn Transport> = match options.transport {
            Some(transport) => transport,
            None => Arc::new(UreqTransport::with_timeout(options.timeout)),
        };

        let mut builder = Pipeline::builder(transport)
            .with(AuthInjection::new(session.clone()))
            .with(HeaderStamping);
        if let Some(sink) = options.diagnostics {
            builder = builder.with(DiagnosticCapture::new(sink));
        }

        Self {
            server,
            session,
            pipeline: builder.build(),
        }
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    /// Consistent snapshot of the current session.
    pub fn session(&self) -> Session {
        self.session.snapshot()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    // ---------------------------------------------------------------------
    // Operations
    // ---------------------------------------------------------------------

    /// Authenticates and opens a session with the returned token.
    pub fn login(&self, credentials: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let request = self.build_login(credentials)?;
        let response = self.dispatch(Endpoint::Login, request)?;
        let auth = self.parse_login(response)?;
        self.session.set_from_login(&auth);
        tracing::info!(user = %auth.me.username, "session established");
        Ok(auth)
    }

    /// Creates an account. The returned token is handed to the caller and
    /// does not open a session.
    pub fn register(&self, payload: &RegisterRequest) -> Result<RegisterResponse, ApiError> {
        let request = self.build_register(payload)?;
        let response = self.dispatch(Endpoint::Register, request)?;
        self.parse_register(response)
    }

    /// Ends the current session. Fails before any network activity when not
    /// logged in.
    pub fn logout(&self) -> Result<LogoutResponse, ApiError> {
        let token = self.session.access_token();
        let request = self.build_logout()?;
        let response = self.dispatch(Endpoint::Logout, request)?;
        let logout = self.parse_logout(response)?;
        if self.session.clear(&token) {
            tracing::info!("session cleared");
        } else {
            tracing::debug!("session replaced during logout, left in place");
        }
        Ok(logout)
    }

    pub fn get_profile(&self) -> Result<User, ApiError> {
        let request = self.build_get_profile();
        let response = self.dispatch(Endpoint::Profile, request)?;
        self.parse_get_profile(response)
    }

    /// Like `get_profile`, without imposing a schema on the body.
    pub fn get_profile_raw(&self) -> Result<ProfileRaw, ApiError> {
        let request = self.build_get_profile();
        let response = self.dispatch(Endpoint::Profile, request)?;
        self.parse_get_profile_raw(response)
    }

    /// Applies a partial profile update and stores the returned profile in
    /// the session.
    pub fn edit_profile(&self, payload: &EditProfileRequest) -> Result<User, ApiError> {
        let token = self.session.access_token();
        let request = self.build_edit_profile(payload)?;
        let response = self.dispatch(Endpoint::EditProfile, request)?;
        let profile = self.parse_edit_profile(response)?;
        if self.session.update_profile(&token, profile.clone()) {
            tracing::info!("session profile updated");
        }
        Ok(profile)
    }

    // ---------------------------------------------------------------------
    // Request builders
    // ---------------------------------------------------------------------

    pub fn build_login(&self, credentials: &LoginRequest) -> Result<HttpRequest, ApiError> {
        require("email", &credentials.email)?;
        require_present("password", &credentials.password)?;
        self.request(Endpoint::Login, Some(credentials))
    }

    pub fn build_register(&self, payload: &RegisterRequest) -> Result<HttpRequest, ApiError> {
        require("name", &payload.name)?;
        require("email", &payload.email)?;
        require_present("password", &payload.password)?;
        self.request(Endpoint::Register, Some(payload))
    }

    pub fn build_logout(&self) -> Result<HttpRequest, ApiError> {
        if !self.session.is_authenticated() {
            return Err(ApiError::RequestConstructionFailed(
                "logout requires an authenticated session".to_string(),
            ));
        }
        self.request::<()>(Endpoint::Logout, None)
    }

    pub fn build_get_profile(&self) -> HttpRequest {
        self.bare_request(Endpoint::Profile, None)
    }

    pub fn build_edit_profile(&self, payload: &EditProfileRequest) -> Result<HttpRequest, ApiError> {
        if payload.is_empty() {
            return Err(ApiError::RequestConstructionFailed(
                "profile edit payload has no fields set".to_string(),
            ));
        }
        self.request(Endpoint::EditProfile, Some(payload))
    }

    // ---------------------------------------------------------------------
    // Response parsers
    // ---------------------------------------------------------------------

    pub fn parse_login(&self, response: HttpResponse) -> Result<LoginResponse, ApiError> {
        decode(Endpoint::Login, response)
    }

    pub fn parse_register(&self, response: HttpResponse) -> Result<RegisterResponse, ApiError> {
        decode(Endpoint::Register, response)
    }

    pub fn parse_logout(&self, response: HttpResponse) -> Result<LogoutResponse, ApiError> {
        decode(Endpoint::Logout, response)
    }

    pub fn parse_get_profile(&self, response: HttpResponse) -> Result<User, ApiError> {
        decode(Endpoint::Profile, response)
    }

    pub fn parse_get_profile_raw(&self, response: HttpResponse) -> Result<ProfileRaw, ApiError> {
        decode(Endpoint::Profile, response)
    }

    pub fn parse_edit_profile(&self, response: HttpResponse) -> Result<User, ApiError> {
        decode(Endpoint::EditProfile, response)
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}/{}", self.server, endpoint.path())
    }

    fn bare_request(&self, endpoint: Endpoint, body: Option<String>) -> HttpRequest {
        HttpRequest {
            method: endpoint.method(),
            url: self.url(endpoint),
            path: endpoint.path().to_string(),
            headers: Vec::new(),
            body,
        }
    }

    fn request<T: Serialize>(
        &self,
        endpoint: Endpoint,
        payload: Option<&T>,
    ) -> Result<HttpRequest, ApiError> {
        let body = payload
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| ApiError::RequestConstructionFailed(e.to_string()))?;
        Ok(self.bare_request(endpoint, body))
    }

    fn dispatch(&self, endpoint: Endpoint, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        tracing::debug!(method = %request.method, url = %request.url, "dispatching request");
        let response = self.pipeline.execute(request).map_err(|e| {
            tracing::debug!(?endpoint, error = %e, "request execution failed");
            ApiError::RequestExecutionFailed(e)
        })?;
        tracing::debug!(?endpoint, status = response.status, "response received");
        Ok(response)
    }
}

/// Identifiers must contain something other than whitespace.
fn require(field: &str, value: &str) -> Result<(), ApiError> {
    require_present(field, value.trim())
}

/// Secrets are taken verbatim: only the empty string is rejected.
fn require_present(field: &str, value: &str) -> Result<(), ApiError> {
    if value.is_empty() {
        return Err(ApiError::RequestConstructionFailed(format!(
            "{field} must not be empty"
        )));
    }
    Ok(())
}

/// Map a status other than the endpoint's expected one to
/// `UnsuccessfulResponse`.
fn check_status(endpoint: Endpoint, response: &HttpResponse) -> Result<(), ApiError> {
    if response.status == endpoint.expected_status() {
        return Ok(());
    }
    Err(ApiError::UnsuccessfulResponse {
        status: response.status,
        body: response.text().into_owned(),
    })
}

fn decode<T: DeserializeOwned>(endpoint: Endpoint, response: HttpResponse) -> Result<T, ApiError> {
    check_status(endpoint, &response)?;
    serde_json::from_slice(&response.body).map_err(|e| ApiError::ResponseDecodingFailed(e.to_string()))
}
