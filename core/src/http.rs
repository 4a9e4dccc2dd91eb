//! HTTP transport types for the gateway.
//!
//! # Design
//! Requests and responses are plain data with owned fields. The gateway
//! builds `HttpRequest` values and classifies `HttpResponse` values; a
//! `Transport` executes the round-trip in between. Keeping the data types
//! free of any client library lets tests script the network side.
//!
//! Headers are ordered `(name, value)` pairs compared case-insensitively.

use std::fmt;

use crate::multipart::FileUpload;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const AUTHORIZATION: &str = "Authorization";
pub const APPLICATION_JSON: &str = "application/json";

/// Gateway-level method. `Upload` goes over the wire as `POST`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Upload,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Upload => "UPLOAD",
        }
    }

    /// The method actually sent to the server.
    pub fn wire_method(&self) -> &'static str {
        match self {
            HttpMethod::Upload => "POST",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// Serialized JSON text.
    Json(String),
    /// Extra form fields in order, then the file. The transport encodes
    /// the form and sets its `Content-Type`.
    Multipart {
        fields: Vec<(String, String)>,
        file: FileUpload,
    },
}

/// An HTTP request described as plain data, ready for a `Transport`.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data, produced by a `Transport`.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// A response with `Content-Type: application/json`.
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, body).with_header(CONTENT_TYPE, APPLICATION_JSON)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// True when the content type mentions `application/json`.
    pub fn is_json(&self) -> bool {
        self.header(CONTENT_TYPE)
            .is_some_and(|ct| ct.to_ascii_lowercase().contains(APPLICATION_JSON))
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Merge header layers in order; a later layer replaces an earlier entry
/// with the same (case-insensitive) name, keeping the earlier position.
///
/// The gateway always calls this as `[json default, default headers,
/// per-call overrides]`.
pub fn merge_headers<'a, I>(layers: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = &'a [(String, String)]>,
{
    let mut merged: Vec<(String, String)> = Vec::new();
    for layer in layers {
        for (name, value) in layer {
            match merged.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
                Some(entry) => *entry = (name.clone(), value.clone()),
                None => merged.push((name.clone(), value.clone())),
            }
        }
    }
    merged
}
