//! Transport-agnostic HTTP model.
//!
//! The coordinator does not speak HTTP itself. Callers describe a request
//! with [`RequestDescriptor`] and supply an [`HttpExecutor`] that knows how
//! to issue it over a concrete transport handle. The executor reports a
//! [`RawOutcome`]: either the server's bytes plus response metadata, or a
//! transport-level failure. Application-level errors (a well-formed 4xx, an
//! error in a 200 body) are *not* transport failures; they are decided later
//! by a [`ResponseClassifier`](crate::request::ResponseClassifier).

use crate::effect::Effect;

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// HTTP GET.
    Get,
    /// HTTP POST.
    Post,
}

impl Method {
    /// Wire name of the method.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// A description of an HTTP request.
///
/// Descriptors are plain data: constructing one performs no I/O, and the same
/// descriptor may be executed more than once (the coordinator relies on this
/// when it retries).
///
/// # Examples
///
/// ```rust
/// use headway::http::{Method, RequestDescriptor};
///
/// let request = RequestDescriptor::new(Method::Post, "https://api.example.com/verify")
///     .with_header("Authorization", "Bearer token")
///     .with_body(b"{}".to_vec());
/// assert_eq!(request.method(), Method::Post);
/// assert_eq!(request.header("Authorization"), Some("Bearer token"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestDescriptor {
    method: Method,
    url: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl RequestDescriptor {
    /// Describe a request with no headers and an empty body.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Describe a POST carrying a JSON body.
    ///
    /// ```rust
    /// use headway::http::RequestDescriptor;
    ///
    /// let request = RequestDescriptor::json("https://api.example.com/verify", b"{}".to_vec());
    /// assert_eq!(request.header("Content-Type"), Some("application/json"));
    /// ```
    pub fn json(url: impl Into<String>, body: Vec<u8>) -> Self {
        Self::new(Method::Post, url)
            .with_header("Content-Type", "application/json")
            .with_body(body)
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the request body.
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// The request method.
    pub fn method(&self) -> Method {
        self.method
    }

    /// The request URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// All headers, in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Look up a header by exact name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// The request body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// Metadata of a received HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResponseMetadata {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, in wire order.
    pub headers: Vec<(String, String)>,
}

impl ResponseMetadata {
    /// Metadata with a status code and no headers.
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
        }
    }
}

/// A complete response received from the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResponseData {
    /// Raw response body.
    pub body: Vec<u8>,
    /// Status code and headers.
    pub metadata: ResponseMetadata,
}

impl ResponseData {
    /// A response with the given status and body.
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self {
            body,
            metadata: ResponseMetadata::with_status(status),
        }
    }
}

/// Kind of transport-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpFailureKind {
    /// Name resolution failed.
    Dns,
    /// TLS negotiation failed.
    Tls,
    /// The transport-layer timeout elapsed before a response arrived.
    Timeout,
    /// The connection failed or was reset.
    Io,
    /// The executor stopped without producing an outcome.
    Interrupted,
}

/// The request never produced a well-formed response.
///
/// A server may have seen part of the exchange; whatever metadata was
/// received before the failure is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HttpFailure {
    /// What went wrong at the transport layer.
    pub kind: HttpFailureKind,
    /// Response metadata received before the failure, if any.
    pub partial_metadata: Option<ResponseMetadata>,
}

impl HttpFailure {
    /// A failure with no partial response.
    pub fn new(kind: HttpFailureKind) -> Self {
        Self {
            kind,
            partial_metadata: None,
        }
    }
}

impl std::fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            HttpFailureKind::Dns => "dns resolution failed",
            HttpFailureKind::Tls => "tls negotiation failed",
            HttpFailureKind::Timeout => "request timed out",
            HttpFailureKind::Io => "connection failed",
            HttpFailureKind::Interrupted => "request interrupted",
        };
        match &self.partial_metadata {
            Some(meta) => write!(f, "{} (partial response, status {})", kind, meta.status),
            None => write!(f, "{}", kind),
        }
    }
}

impl std::error::Error for HttpFailure {}

/// Result of executing a request: the server's response, or a transport-level
/// failure. Application-level rejections are successful `RawOutcome`s.
pub type RawOutcome = Result<ResponseData, HttpFailure>;

/// Capability to execute a request over a transport handle.
///
/// Implementations must not start any work until the returned effect is run,
/// and must cancel the underlying request when the running effect is dropped.
/// The effect is expected to emit exactly one outcome; an effect that
/// completes without emitting is treated as
/// [`HttpFailureKind::Interrupted`].
pub trait HttpExecutor<H>: Send + Sync {
    /// Issue `request` over `handle`.
    fn execute(&self, handle: H, request: &RequestDescriptor) -> Effect<RawOutcome>;
}
