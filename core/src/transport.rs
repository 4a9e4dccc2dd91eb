//! The network seam and its reqwest implementation.
//!
//! # Design
//! The gateway never talks to a client library directly. It hands an
//! `HttpRequest` to a `Transport` and gets back an `HttpResponse` (any
//! status) or a `TransportError` when no response was obtained. Tests
//! substitute a scripted transport; production uses `ReqwestTransport`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::GatewayConfig;
use crate::error::{ConfigError, TransportError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, RequestBody};
use crate::multipart::build_form;

/// Cumulative bytes sent for one upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub sent: u64,
    pub total: Option<u64>,
}

impl UploadProgress {
    /// Rounded percentage, `None` unless the total is known and non-zero.
    pub fn percent(&self) -> Option<u8> {
        let total = self.total.filter(|t| *t > 0)?;
        let pct = (self.sent as f64 / total as f64 * 100.0).round();
        Some(pct.clamp(0.0, 100.0) as u8)
    }
}

/// Receives progress ticks. Called on the task that drives the upload, so
/// it must not block.
pub type ProgressSink = Arc<dyn Fn(UploadProgress) + Send + Sync>;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute a request. Non-2xx statuses are responses, not errors.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Execute a request, reporting upload progress. Transports that
    /// cannot observe the upload fall back to `send` with no ticks.
    async fn send_with_progress(
        &self,
        request: HttpRequest,
        progress: ProgressSink,
    ) -> Result<HttpResponse, TransportError> {
        let _ = progress;
        self.send(request).await
    }
}

/// `Transport` backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;
        Ok(Self { client })
    }

    /// Applies the configured user agent and, if set, the client timeout.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn builder(&self, request: &HttpRequest) -> reqwest::RequestBuilder {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post | HttpMethod::Upload => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };
        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }

    fn prepare(
        &self,
        mut request: HttpRequest,
        progress: Option<ProgressSink>,
    ) -> Result<reqwest::RequestBuilder, TransportError> {
        let body = request.body.take();
        let builder = self.builder(&request);
        Ok(match body {
            None => builder,
            Some(RequestBody::Json(text)) => builder.body(text),
            Some(RequestBody::Multipart { fields, file }) => {
                builder.multipart(build_form(fields, file, progress)?)
            }
        })
    }

    async fn execute(builder: reqwest::RequestBuilder) -> Result<HttpResponse, TransportError> {
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let builder = self.prepare(request, None)?;
        Self::execute(builder).await
    }

    /// Progress is reported for multipart bodies as the file part streams.
    async fn send_with_progress(
        &self,
        request: HttpRequest,
        progress: ProgressSink,
    ) -> Result<HttpResponse, TransportError> {
        let builder = self.prepare(request, Some(progress))?;
        Self::execute(builder).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_rounds_and_clamps() {
        let p = |sent, total| UploadProgress { sent, total }.percent();
        assert_eq!(p(1, Some(3)), Some(33));
        assert_eq!(p(2, Some(3)), Some(67));
        assert_eq!(p(10, Some(10)), Some(100));
        assert_eq!(p(11, Some(10)), Some(100));
        assert_eq!(p(5, None), None);
        assert_eq!(p(0, Some(0)), None);
    }

    #[tokio::test]
    async fn invalid_file_content_type_is_an_invalid_request() {
        use crate::multipart::FileUpload;

        let transport = ReqwestTransport::new().unwrap();
        let request = HttpRequest {
            method: HttpMethod::Upload,
            url: "http://127.0.0.1:9/upload".to_string(),
            headers: Vec::new(),
            body: Some(RequestBody::Multipart {
                fields: Vec::new(),
                file: FileUpload::new("a.txt", b"abc".to_vec()).with_content_type("text/plain\r\nX: 1"),
            }),
        };
        let err = transport.send(request).await.unwrap_err();
        assert!(matches!(err, TransportError::InvalidRequest(_)), "{err:?}");
    }
}
