//! HTTP transport types shared by the request builder, the adapter and the
//! transports.
//!
//! # Design
//! Requests and responses are plain data. `DirectoryClient` builds
//! `HttpRequest` values and parses `HttpResponse` values; a `Transport`
//! executes the round-trip in between. Keeping the I/O at one seam lets the
//! adapter and both managers be tested against scripted responses.

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// An HTTP request described as plain data. `path` is the absolute URL;
/// `endpoint` is the same target relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub endpoint: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Login and registration calls report 401 as a form error instead of
    /// a session-invalidation signal.
    pub fn is_auth_request(&self) -> bool {
        self.endpoint.contains("/login") || self.endpoint.contains("/register")
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
