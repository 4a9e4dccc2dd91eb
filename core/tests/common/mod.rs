//! Shared test doubles: a scripted transport and a recording notifier.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use portal_gateway::{
    GatewayConfig, HttpRequest, HttpRequestGateway, HttpResponse, Notification, Notifier,
    ProgressSink, Transport, TransportError, UploadProgress,
};

pub const BASE_URL: &str = "http://backend.test";

/// Replays queued outcomes in order and records every request it sees.
/// Uploads replay `ticks` through the progress sink before answering.
#[derive(Default)]
pub struct ScriptedTransport {
    outcomes: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
    ticks: Vec<UploadProgress>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ticks(ticks: Vec<UploadProgress>) -> Self {
        Self {
            ticks,
            ..Self::default()
        }
    }

    pub fn respond(&self, response: HttpResponse) {
        self.outcomes.lock().push_back(Ok(response));
    }

    pub fn fail(&self, error: TransportError) {
        self.outcomes.lock().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests.lock().last().cloned().expect("no request was sent")
    }

    fn next(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().push(request);
        self.outcomes
            .lock()
            .pop_front()
            .expect("no scripted response left")
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.next(request)
    }

    async fn send_with_progress(
        &self,
        request: HttpRequest,
        progress: ProgressSink,
    ) -> Result<HttpResponse, TransportError> {
        for tick in &self.ticks {
            progress(*tick);
        }
        self.next(request)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn seen(&self) -> Vec<Notification> {
        self.seen.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) {
        self.seen.lock().push(notification.clone());
    }
}

pub struct Harness {
    pub gateway: HttpRequestGateway,
    pub transport: Arc<ScriptedTransport>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn harness() -> Harness {
    harness_with(ScriptedTransport::new())
}

pub fn harness_with(transport: ScriptedTransport) -> Harness {
    let transport = Arc::new(transport);
    let notifier = Arc::new(RecordingNotifier::default());
    let gateway = HttpRequestGateway::new(
        &GatewayConfig::new(BASE_URL),
        transport.clone(),
        notifier.clone(),
    )
    .unwrap();
    Harness {
        gateway,
        transport,
        notifier,
    }
}
