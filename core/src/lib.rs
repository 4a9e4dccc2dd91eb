//! HTTP request gateway for the recruitment portal backend.
//!
//! # Overview
//! `HttpRequestGateway` centralizes outbound calls: it builds URLs against
//! a base URL resolved once from configuration, merges default and bearer
//! headers, dispatches through a `Transport`, and classifies every response
//! into either the caller's type or a uniform `ApiError`. Failures are
//! logged through `tracing` and surfaced to the user through a `Notifier`.
//!
//! # Design
//! - The gateway is an explicit value. Construct it at startup and pass it
//!   (or an `Arc` of it) to call sites; `global()` offers a lazily built
//!   process-wide instance for code that cannot thread one through.
//! - Request/response types are plain data (`http`), so the network side
//!   is a trait (`Transport`) that tests replace with a scripted one.
//! - Classification lives in one function (`response::classify`) shared by
//!   the JSON verbs and uploads.
//! - No retry and no timeout at this layer.

pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod multipart;
pub mod notify;
pub mod request;
pub mod response;
pub mod services;
pub mod transport;
pub mod types;

use std::sync::OnceLock;

pub use config::GatewayConfig;
pub use error::{ApiError, ConfigError, ErrorKind, TransportError, NETWORK_ERROR, UNKNOWN_ERROR};
pub use gateway::{HttpRequestGateway, ProgressCallback, NO_BODY};
pub use http::{HttpMethod, HttpRequest, HttpResponse, RequestBody};
pub use multipart::FileUpload;
pub use notify::{NoopNotifier, Notification, NotificationKind, Notifier, TracingNotifier};
pub use request::RequestDescriptor;
pub use services::ApplicationService;
pub use transport::{ProgressSink, ReqwestTransport, Transport, UploadProgress};
pub use types::{
    ApplicationForm, ApplicationStatus, InsertedForm, NewApplicationForm, Session, StatusUpdate,
    UploadReceipt,
};

static GLOBAL: OnceLock<HttpRequestGateway> = OnceLock::new();

/// The process-wide gateway, built from `GatewayConfig::from_env()` on first
/// access and reused afterwards.
///
/// Initialization happens at most once per process. If two threads race
/// the first call, both build a gateway and one is discarded; nothing is
/// observable from the loser since construction performs no I/O. An error
/// is returned (and nothing is stored) when the environment holds an
/// invalid configuration, so a later call can retry.
pub fn global() -> Result<&'static HttpRequestGateway, ConfigError> {
    if let Some(gateway) = GLOBAL.get() {
        return Ok(gateway);
    }
    let gateway = HttpRequestGateway::from_config(&GatewayConfig::from_env()?)?;
    Ok(GLOBAL.get_or_init(|| gateway))
}

/// Install `gateway` as the process-wide instance. Fails, handing the
/// gateway back, if one is already installed.
pub fn install_global(gateway: HttpRequestGateway) -> Result<(), HttpRequestGateway> {
    GLOBAL.set(gateway)
}
