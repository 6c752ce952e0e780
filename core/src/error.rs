//! Error types for the QvaPay API client.
//!
//! # Design
//! Every operation fails with exactly one of four kinds, decided at a fixed
//! step: validate payload, build request, execute, check status, decode body.
//! The first failing step determines the variant and later steps never run.
//! Each variant carries enough context to debug the failure, but callers are
//! expected to branch on the variant alone.

use thiserror::Error;

/// Errors returned by every `ApiClient` operation.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The outgoing request could not be built, or the payload failed
    /// client-side validation. No network activity happened.
    #[error("failed to create HTTP request: {0}")]
    RequestConstructionFailed(String),

    /// The request was built but the transport could not complete it.
    #[error("failed to execute HTTP request: {0}")]
    RequestExecutionFailed(#[source] TransportError),

    /// The server answered with a status outside the operation's expected one.
    #[error("unsuccessful response: HTTP {status}: {body}")]
    UnsuccessfulResponse { status: u16, body: String },

    /// The response body could not be decoded into the expected shape.
    #[error("failed to decode HTTP response: {0}")]
    ResponseDecodingFailed(String),
}

/// Raw failure of the base transport.
///
/// Interceptors never produce `ApiError`s; whatever the terminal transport
/// reports travels back up the chain unchanged as one of these.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The ambient deadline expired before the exchange completed.
    #[error("request timed out")]
    Timeout,

    /// Connection, DNS, TLS or body I/O failure.
    #[error("transport I/O failure: {0}")]
    Io(String),
}

impl From<TransportError> for ApiError {
    fn from(error: TransportError) -> Self {
        ApiError::RequestExecutionFailed(error)
    }
}
