//! Request/response interceptor chain around the base transport.
//!
//! # Design
//! Each link implements `Interceptor::handle`, receiving the request and a
//! `Next` handle for the rest of the chain. A link may rewrite the request
//! before calling `next.run`, and may observe the response afterwards.
//! `PipelineBuilder` composes the links once, at client construction, in the
//! order they are added (outermost first), with the transport as terminal.
//!
//! The client installs, in order:
//! 1. `AuthInjection` — `Authorization` header on non-public endpoints.
//! 2. `HeaderStamping` — JSON content type and client identifier.
//! 3. `DiagnosticCapture` — verbatim dumps, only when a sink is configured.
//!
//! No link produces `ApiError`s. Transport failures travel back up unchanged.

use std::fmt::Write as _;
use std::io::Write;
use std::sync::{Arc, Mutex};

use crate::endpoint::Endpoint;
use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};
use crate::session::SessionState;
use crate::transport::Transport;

/// Identifier sent in the `User-Agent` header of every request.
pub const CLIENT_IDENTIFIER: &str = concat!("qvapay-rs/", env!("CARGO_PKG_VERSION"));

/// One link of the chain.
pub trait Interceptor: Send + Sync {
    fn handle(&self, request: HttpRequest, next: Next<'_>) -> Result<HttpResponse, TransportError>;
}

/// The remainder of the chain after the current link.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    interceptors: &'a [Arc<dyn Interceptor>],
    transport: &'a dyn Transport,
}

impl<'a> Next<'a> {
    /// Hands the request to the next link, or to the transport when none is
    /// left.
    pub fn run(self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        match self.interceptors.split_first() {
            Some((current, rest)) => current.handle(
                request,
                Next {
                    interceptors: rest,
                    transport: self.transport,
                },
            ),
            None => self.transport.execute(request),
        }
    }
}

/// A composed chain: ordered interceptors in front of a transport.
#[derive(Clone)]
pub struct Pipeline {
    interceptors: Vec<Arc<dyn Interceptor>>,
    transport: Arc<dyn Transport>,
}

impl Pipeline {
    pub fn builder(transport: Arc<dyn Transport>) -> PipelineBuilder {
        PipelineBuilder {
            interceptors: Vec::new(),
            transport,
        }
    }

    pub fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        Next {
            interceptors: &self.interceptors,
            transport: self.transport.as_ref(),
        }
        .run(request)
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }
}

pub struct PipelineBuilder {
    interceptors: Vec<Arc<dyn Interceptor>>,
    transport: Arc<dyn Transport>,
}

impl PipelineBuilder {
    /// Appends a link inside every link added so far.
    pub fn with<I>(mut self, interceptor: I) -> Self
    where
        I: Interceptor + 'static,
    {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            interceptors: self.interceptors,
            transport: self.transport,
        }
    }
}

/// Attaches `Authorization: <type> <token>` from the session.
///
/// Requests to login and register pass through untouched. An unauthenticated
/// session also passes through; rejecting it is the server's job.
pub struct AuthInjection {
    session: SessionState,
}

impl AuthInjection {
    pub fn new(session: SessionState) -> Self {
        Self { session }
    }
}

impl Interceptor for AuthInjection {
    fn handle(
        &self,
        mut request: HttpRequest,
        next: Next<'_>,
    ) -> Result<HttpResponse, TransportError> {
        if !Endpoint::is_public_path(&request.path) {
            if let Some(value) = self.session.authorization() {
                request.set_header("Authorization", value);
            }
        }
        next.run(request)
    }
}

/// Sets `Content-Type: application/json` and the client `User-Agent` on
/// every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderStamping;

impl Interceptor for HeaderStamping {
    fn handle(
        &self,
        mut request: HttpRequest,
        next: Next<'_>,
    ) -> Result<HttpResponse, TransportError> {
        request.set_header("Content-Type", "application/json");
        request.set_header("User-Agent", CLIENT_IDENTIFIER);
        next.run(request)
    }
}

/// Writes every request and response, headers and body, to a sink.
///
/// Observes without modifying. A failing sink drops the dump with a warning
/// and the exchange proceeds as if capture were disabled.
pub struct DiagnosticCapture {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl DiagnosticCapture {
    pub fn new(sink: Box<dyn Write + Send>) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    fn emit(&self, label: &str, dump: &str) {
        let mut sink = match self.sink.lock() {
            Ok(sink) => sink,
            Err(_) => {
                tracing::warn!("diagnostic sink poisoned, dropping {label} dump");
                return;
            }
        };
        let written = writeln!(sink, "{label}:\n{dump}\n").and_then(|()| sink.flush());
        if let Err(e) = written {
            tracing::warn!(error = %e, "failed to write {label} dump");
        }
    }
}

impl Interceptor for DiagnosticCapture {
    fn handle(&self, request: HttpRequest, next: Next<'_>) -> Result<HttpResponse, TransportError> {
        self.emit("Request", &dump_request(&request));
        let response = next.run(request)?;
        self.emit("Response", &dump_response(&response));
        Ok(response)
    }
}

/// HTTP/1.1-style rendering of a request.
pub fn dump_request(request: &HttpRequest) -> String {
    let mut out = format!("{} {} HTTP/1.1\r\n", request.method, request.url);
    write_headers_and_body(
        &mut out,
        &request.headers,
        request.body.as_deref().unwrap_or_default(),
    );
    out
}

/// HTTP/1.1-style rendering of a response.
pub fn dump_response(response: &HttpResponse) -> String {
    let mut out = format!("HTTP/1.1 {}\r\n", response.status);
    write_headers_and_body(&mut out, &response.headers, &response.text());
    out
}

fn write_headers_and_body(out: &mut String, headers: &[(String, String)], body: &str) {
    for (name, value) in headers {
        let _ = write!(out, "{name}: {value}\r\n");
    }
    out.push_str("\r\n");
    out.push_str(body);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;
    use crate::transport::mock::MockTransport;
    use crate::types::{AuthResponse, User};
    use std::io;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"))
        }
    }

    /// Records the order in which links see the request.
    struct Tag(&'static str, Arc<Mutex<Vec<&'static str>>>);

    impl Interceptor for Tag {
        fn handle(
            &self,
            request: HttpRequest,
            next: Next<'_>,
        ) -> Result<HttpResponse, TransportError> {
            self.1.lock().unwrap().push(self.0);
            next.run(request)
        }
    }

    fn request(path: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: format!("http://localhost:3000/{path}"),
            path: path.to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    fn authenticated() -> SessionState {
        let session = SessionState::new();
        session.set_from_login(&AuthResponse {
            access_token: "387003".to_string(),
            token_type: "Bearer".to_string(),
            me: User::default(),
        });
        session
    }

    #[test]
    fn links_run_in_insertion_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let transport = MockTransport::new().always(200, "{}");
        let pipeline = Pipeline::builder(Arc::new(transport))
            .with(Tag("outer", seen.clone()))
            .with(Tag("inner", seen.clone()))
            .build();

        pipeline.execute(request("user")).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["outer", "inner"]);
        assert_eq!(pipeline.len(), 2);
    }

    #[test]
    fn empty_pipeline_goes_straight_to_transport() {
        let transport = MockTransport::new().always(204, "");
        let pipeline = Pipeline::builder(Arc::new(transport.clone())).build();
        assert!(pipeline.is_empty());
        assert_eq!(pipeline.execute(request("user")).unwrap().status, 204);
        assert_eq!(transport.requests()[0], request("user"));
    }

    #[test]
    fn auth_injection_adds_header_when_authenticated() {
        let transport = MockTransport::new().always(200, "{}");
        let pipeline = Pipeline::builder(Arc::new(transport.clone()))
            .with(AuthInjection::new(authenticated()))
            .build();

        pipeline.execute(request("user")).unwrap();
        let sent = &transport.requests()[0];
        assert_eq!(sent.header("authorization"), Some("Bearer 387003"));
    }

    #[test]
    fn auth_injection_skips_public_endpoints() {
        let transport = MockTransport::new().always(200, "{}");
        let pipeline = Pipeline::builder(Arc::new(transport.clone()))
            .with(AuthInjection::new(authenticated()))
            .build();

        pipeline.execute(request("auth/login")).unwrap();
        pipeline.execute(request("auth/register")).unwrap();
        for sent in transport.requests() {
            assert_eq!(sent.header("Authorization"), None, "{}", sent.path);
        }
    }

    #[test]
    fn auth_injection_passes_through_without_session() {
        let transport = MockTransport::new().always(401, "");
        let pipeline = Pipeline::builder(Arc::new(transport.clone()))
            .with(AuthInjection::new(SessionState::new()))
            .build();

        let response = pipeline.execute(request("user")).unwrap();
        assert_eq!(response.status, 401);
        assert_eq!(transport.request_count(), 1);
        assert_eq!(transport.requests()[0].header("Authorization"), None);
    }

    #[test]
    fn header_stamping_overrides_existing_values() {
        let transport = MockTransport::new().always(200, "{}");
        let pipeline = Pipeline::builder(Arc::new(transport.clone()))
            .with(HeaderStamping)
            .build();

        let mut req = request("user");
        req.set_header("content-type", "text/plain");
        pipeline.execute(req).unwrap();

        let sent = &transport.requests()[0];
        assert_eq!(sent.headers.len(), 2);
        assert_eq!(sent.header("Content-Type"), Some("application/json"));
        assert_eq!(sent.header("User-Agent"), Some(CLIENT_IDENTIFIER));
    }

    #[test]
    fn diagnostic_capture_dumps_both_directions_unchanged() {
        let buffer = SharedBuffer::default();
        let transport = MockTransport::new().respond(200, r#"{"ok":true}"#);
        let pipeline = Pipeline::builder(Arc::new(transport.clone()))
            .with(HeaderStamping)
            .with(DiagnosticCapture::new(Box::new(buffer.clone())))
            .build();

        let mut req = request("auth/login");
        req.method = HttpMethod::Post;
        req.body = Some(r#"{"email":"a@b.c"}"#.to_string());
        let response = pipeline.execute(req).unwrap();

        assert_eq!(response.text(), r#"{"ok":true}"#);
        let dump = buffer.contents();
        assert!(dump.contains("POST http://localhost:3000/auth/login HTTP/1.1"));
        assert!(dump.contains("Content-Type: application/json"));
        assert!(dump.contains(r#"{"email":"a@b.c"}"#));
        assert!(dump.contains("HTTP/1.1 200"));
        assert!(dump.contains(r#"{"ok":true}"#));
        assert_eq!(
            transport.requests()[0].body.as_deref(),
            Some(r#"{"email":"a@b.c"}"#)
        );
    }

    #[test]
    fn diagnostic_capture_survives_broken_sink() {
        let transport = MockTransport::new().respond(201, "done");
        let pipeline = Pipeline::builder(Arc::new(transport))
            .with(DiagnosticCapture::new(Box::new(BrokenSink)))
            .build();

        let response = pipeline.execute(request("user")).unwrap();
        assert_eq!(response.status, 201);
        assert_eq!(response.text(), "done");
    }

    #[test]
    fn transport_errors_propagate_through_every_link() {
        let transport = MockTransport::new().fail(TransportError::Timeout);
        let pipeline = Pipeline::builder(Arc::new(transport))
            .with(AuthInjection::new(authenticated()))
            .with(HeaderStamping)
            .with(DiagnosticCapture::new(Box::new(SharedBuffer::default())))
            .build();

        let result = pipeline.execute(request("user"));
        assert!(matches!(result, Err(TransportError::Timeout)));
    }

    #[test]
    fn dump_response_renders_status_line_headers_and_body() {
        let response = HttpResponse {
            status: 422,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: b"{}".to_vec(),
        };
        assert_eq!(
            dump_response(&response),
            "HTTP/1.1 422\r\ncontent-type: application/json\r\n\r\n{}"
        );
    }
}
