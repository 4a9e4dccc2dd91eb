//! Per-call request descriptors.
//!
//! A `RequestDescriptor` captures what the caller asked for (method, path,
//! query, body, header overrides) before the gateway merges in its own
//! state. Body serialization errors are kept on the descriptor and surface
//! from `HttpRequestGateway::send` as a classified `UNKNOWN_ERROR`, so the
//! builder itself never fails.

use serde::Serialize;

use crate::http::HttpMethod;

#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: HttpMethod,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Result<String, String>>,
    headers: Vec<(String, String)>,
}

impl RequestDescriptor {
    pub fn new(method: HttpMethod, path: &str) -> Self {
        Self {
            method,
            path: normalize_path(path),
            query: Vec::new(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: &str) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: &str) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn patch(path: &str) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    pub fn delete(path: &str) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Append query parameters, keeping insertion order.
    pub fn query<K, V>(mut self, params: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.query.extend(
            params
                .iter()
                .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string())),
        );
        self
    }

    /// Serialize `body` as the JSON payload.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Self {
        self.body = Some(serde_json::to_string(body).map_err(|e| e.to_string()));
        self
    }

    /// Per-call header override; wins over every default.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Path plus encoded query string.
    pub fn target(&self) -> String {
        with_query(&self.path, &self.query)
    }

    pub(crate) fn take_body(&mut self) -> Option<Result<String, String>> {
        self.body.take()
    }
}

/// Prefix `/` when the path lacks one.
pub fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Append `params` as an `application/x-www-form-urlencoded` query string.
pub fn with_query(path: &str, params: &[(String, String)]) -> String {
    if params.is_empty() {
        return path.to_string();
    }
    let encoded = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .finish();
    let sep = if path.contains('?') { '&' } else { '?' };
    format!("{path}{sep}{encoded}")
}
