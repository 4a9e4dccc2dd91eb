//! The request gateway.
//!
//! # Design
//! `HttpRequestGateway` owns the resolved base URL, the default header set
//! and the two collaborators it reports through (a `Transport` and a
//! `Notifier`). Every verb method funnels into one path: build the request,
//! dispatch it, classify the response, decode it. Failures are logged and
//! notified exactly once on the way out and returned as `ApiError`.
//!
//! The default header set is the only mutable state. It sits behind an
//! `RwLock` and is snapshotted when headers are merged, so a token change
//! never affects a request already in flight. There is no retry and no
//! gateway-level timeout; callers layer those on if they need them.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, info};

use crate::config::GatewayConfig;
use crate::error::{ApiError, ConfigError};
use crate::http::{
    merge_headers, HttpMethod, HttpRequest, RequestBody, APPLICATION_JSON, AUTHORIZATION, CONTENT_TYPE,
};
use crate::multipart::FileUpload;
use crate::notify::{Notification, Notifier, TracingNotifier};
use crate::request::{normalize_path, RequestDescriptor};
use crate::response::classify;
use crate::transport::{ProgressSink, ReqwestTransport, Transport, UploadProgress};

/// Receives upload progress as a percentage in `0..=100`.
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// Spelled-out "no body" for the write verbs.
pub const NO_BODY: Option<&()> = None;

pub struct HttpRequestGateway {
    base_url: String,
    default_headers: RwLock<Vec<(String, String)>>,
    transport: Arc<dyn Transport>,
    notifier: Arc<dyn Notifier>,
}

impl fmt::Debug for HttpRequestGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequestGateway")
            .field("base_url", &self.base_url)
            .field("default_headers", &*self.default_headers.read())
            .finish_non_exhaustive()
    }
}

impl HttpRequestGateway {
    pub fn new(
        config: &GatewayConfig,
        transport: Arc<dyn Transport>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: config.resolved_base_url()?,
            default_headers: RwLock::new(Vec::new()),
            transport,
            notifier,
        })
    }

    /// Gateway over `ReqwestTransport` that reports through `tracing`.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
        let transport = ReqwestTransport::from_config(config)?;
        Self::new(config, Arc::new(transport), Arc::new(TracingNotifier))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Snapshot of the default header set.
    pub fn default_headers(&self) -> Vec<(String, String)> {
        self.default_headers.read().clone()
    }

    /// Install `Authorization: Bearer <token>`, replacing any previous token.
    pub fn set_auth_token(&self, token: &str) {
        let mut headers = self.default_headers.write();
        headers.retain(|(name, _)| !name.eq_ignore_ascii_case(AUTHORIZATION));
        headers.push((AUTHORIZATION.to_string(), format!("Bearer {token}")));
    }

    pub fn clear_auth_token(&self) {
        self.default_headers
            .write()
            .retain(|(name, _)| !name.eq_ignore_ascii_case(AUTHORIZATION));
    }

    pub fn auth_token(&self) -> Option<String> {
        self.default_headers
            .read()
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(AUTHORIZATION))
            .and_then(|(_, value)| value.strip_prefix("Bearer ").map(str::to_string))
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Option<&[(&str, &str)]>,
    ) -> Result<T, ApiError> {
        let mut descriptor = RequestDescriptor::get(path);
        if let Some(query) = query {
            descriptor = descriptor.query(query);
        }
        self.send(descriptor).await
    }

    pub async fn post<T, B>(&self, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(with_body(RequestDescriptor::post(path), body)).await
    }

    pub async fn put<T, B>(&self, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(with_body(RequestDescriptor::put(path), body)).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(with_body(RequestDescriptor::patch(path), body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(RequestDescriptor::delete(path)).await
    }

    /// Dispatch an arbitrary descriptor. Every verb method ends up here.
    pub async fn send<T: DeserializeOwned>(&self, mut descriptor: RequestDescriptor) -> Result<T, ApiError> {
        let method = descriptor.method();
        let target = descriptor.target();
        info!(%method, path = %target, has_body = descriptor.has_body(), "dispatching request");

        let body = match descriptor.take_body().transpose() {
            Ok(body) => body.map(RequestBody::Json),
            Err(e) => {
                let err = ApiError::unknown(format!("failed to serialize request body: {e}"));
                return Err(self.fail(method, &target, err));
            }
        };
        let json_default = [(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string())];
        let request = HttpRequest {
            method,
            url: format!("{}{}", self.base_url, target),
            headers: self.merged_headers(&json_default, descriptor.headers()),
            body,
        };
        self.execute(method, &target, request, None).await
    }

    /// Upload `file` as `multipart/form-data` under the `file` field, with
    /// `fields` sent ahead of it. `on_progress` sees each tick whose total
    /// is known, as a percentage.
    pub async fn upload_file<T: DeserializeOwned>(
        &self,
        path: &str,
        file: &FileUpload,
        fields: Option<&[(&str, &str)]>,
        on_progress: Option<ProgressCallback>,
    ) -> Result<T, ApiError> {
        let method = HttpMethod::Upload;
        let target = normalize_path(path);
        info!(
            %method,
            path = %target,
            file_name = %file.file_name,
            file_size = file.size() as u64,
            "dispatching upload"
        );

        let fields: Vec<(String, String)> = fields
            .unwrap_or_default()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        // The transport sets the multipart Content-Type with its boundary.
        let mut headers = self.merged_headers(&[], &[]);
        headers.retain(|(name, _)| !name.eq_ignore_ascii_case(CONTENT_TYPE));
        let request = HttpRequest {
            method,
            url: format!("{}{}", self.base_url, target),
            headers,
            body: Some(RequestBody::Multipart {
                fields,
                file: file.clone(),
            }),
        };

        let sink: ProgressSink = Arc::new(move |tick: UploadProgress| {
            if let (Some(callback), Some(pct)) = (on_progress.as_ref(), tick.percent()) {
                callback(pct);
            }
        });
        self.execute(method, &target, request, Some(sink)).await
    }

    /// `content_type` < default header set < `overrides`.
    fn merged_headers(
        &self,
        content_type: &[(String, String)],
        overrides: &[(String, String)],
    ) -> Vec<(String, String)> {
        let defaults = self.default_headers();
        merge_headers([content_type, defaults.as_slice(), overrides])
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        target: &str,
        request: HttpRequest,
        progress: Option<ProgressSink>,
    ) -> Result<T, ApiError> {
        let sent = match progress {
            Some(sink) => self.transport.send_with_progress(request, sink).await,
            None => self.transport.send(request).await,
        };
        let outcome = sent
            .map_err(ApiError::from)
            .and_then(|response| {
                let status = response.status;
                classify(response).map(|body| (status, body))
            })
            .and_then(|(status, body)| body.decode::<T>().map(|value| (status, value)));

        match outcome {
            Ok((status, value)) => {
                info!(%method, path = %target, status, "request succeeded");
                Ok(value)
            }
            Err(err) => Err(self.fail(method, target, err)),
        }
    }

    fn fail(&self, method: HttpMethod, target: &str, err: ApiError) -> ApiError {
        error!(
            %method,
            path = %target,
            status = ?err.status(),
            code = err.code(),
            message = err.message(),
            details = ?err.details(),
            "request failed"
        );
        self.notifier.notify(&Notification::for_error(&err));
        err
    }
}

fn with_body<B: Serialize + ?Sized>(descriptor: RequestDescriptor, body: Option<&B>) -> RequestDescriptor {
    match body {
        Some(body) => descriptor.json(body),
        None => descriptor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::http::HttpResponse;
    use crate::notify::NoopNotifier;
    use async_trait::async_trait;

    struct Unreachable;

    #[async_trait]
    impl Transport for Unreachable {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
            Err(TransportError::Connect("unreachable".into()))
        }
    }

    fn gateway() -> HttpRequestGateway {
        HttpRequestGateway::new(
            &GatewayConfig::new("http://localhost:3000/"),
            Arc::new(Unreachable),
            Arc::new(NoopNotifier),
        )
        .unwrap()
    }

    #[test]
    fn base_url_is_trimmed() {
        assert_eq!(gateway().base_url(), "http://localhost:3000");
    }

    #[test]
    fn setting_the_same_token_twice_is_idempotent() {
        let g = gateway();
        g.set_auth_token("t");
        let first = g.default_headers();
        g.set_auth_token("t");
        assert_eq!(g.default_headers(), first);
        assert_eq!(first, vec![(AUTHORIZATION.to_string(), "Bearer t".to_string())]);
    }

    #[test]
    fn new_token_replaces_old() {
        let g = gateway();
        g.set_auth_token("old");
        g.set_auth_token("new");
        assert_eq!(g.default_headers().len(), 1);
        assert_eq!(g.auth_token().as_deref(), Some("new"));
    }

    #[test]
    fn clear_removes_the_header() {
        let g = gateway();
        g.clear_auth_token();
        g.set_auth_token("t");
        g.clear_auth_token();
        assert!(g.default_headers().is_empty());
        assert_eq!(g.auth_token(), None);
    }

    #[test]
    fn per_call_overrides_win() {
        let g = gateway();
        g.set_auth_token("t");
        let json_default = [(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string())];
        let overrides = [("authorization".to_string(), "Basic abc".to_string())];
        let merged = g.merged_headers(&json_default, &overrides);
        assert_eq!(
            merged,
            vec![
                (CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string()),
                ("authorization".to_string(), "Basic abc".to_string()),
            ]
        );
    }
}
