//! Blocking client core for the QvaPay payment-platform API.
//!
//! # Overview
//! `ApiClient` exposes login, register, logout, profile fetch and profile
//! edit. Every call runs through one pipeline of interceptors around a
//! pluggable transport, and successful login, logout and edit calls update
//! the client's own session.
//!
//! # Design
//! - Each operation is split into `build_*` (request) and `parse_*`
//!   (response), so the I/O boundary and the session side effect stay
//!   explicit and testable.
//! - The interceptor chain is composed once at construction: auth injection,
//!   header stamping, then optional diagnostic capture, ahead of the
//!   transport.
//! - Session state is a per-client record behind a single lock.
//! - Every failure is one of the four `ApiError` kinds.

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod interceptor;
pub mod session;
pub mod transport;
pub mod types;

pub use client::ApiClient;
pub use config::ClientOptions;
pub use endpoint::Endpoint;
pub use error::{ApiError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use interceptor::{
    AuthInjection, DiagnosticCapture, HeaderStamping, Interceptor, Next, Pipeline,
    PipelineBuilder,
};
pub use session::{Session, SessionState};
pub use transport::{Transport, UreqTransport};
pub use types::{
    AuthResponse, EditProfileRequest, LoginRequest, LoginResponse, LogoutResponse, ProfileRaw,
    RegisterRequest, RegisterResponse, User,
};
