//! Typed access to the application-form endpoints.

use crate::error::ApiError;
use crate::gateway::{HttpRequestGateway, ProgressCallback};
use crate::multipart::FileUpload;
use crate::types::{
    ApplicationForm, ApplicationStatus, InsertedForm, NewApplicationForm, Session, StatusUpdate,
    UploadReceipt,
};

pub const APPLICATIONS_PATH: &str = "/api/forms/application";
pub const UPLOAD_PATH: &str = "/upload";
pub const SESSION_PATH: &str = "/api/session";
pub const HEALTH_PATH: &str = "/api/health";

/// Borrowing facade over a gateway for the application-form API.
#[derive(Debug, Clone, Copy)]
pub struct ApplicationService<'a> {
    gateway: &'a HttpRequestGateway,
}

impl<'a> ApplicationService<'a> {
    pub fn new(gateway: &'a HttpRequestGateway) -> Self {
        Self { gateway }
    }

    pub async fn submit(&self, form: &NewApplicationForm) -> Result<ApplicationForm, ApiError> {
        let inserted: InsertedForm = self.gateway.post(APPLICATIONS_PATH, Some(form)).await?;
        Ok(inserted.inserted_form)
    }

    pub async fn list(&self, status: Option<ApplicationStatus>) -> Result<Vec<ApplicationForm>, ApiError> {
        match status {
            Some(status) => {
                let query = [("status", status.as_str())];
                self.gateway.get(APPLICATIONS_PATH, Some(&query)).await
            }
            None => self.gateway.get(APPLICATIONS_PATH, None).await,
        }
    }

    pub async fn get(&self, id: u64) -> Result<ApplicationForm, ApiError> {
        self.gateway.get(&form_path(id), None).await
    }

    /// Record a review decision.
    pub async fn review(&self, id: u64, status: ApplicationStatus) -> Result<ApplicationForm, ApiError> {
        self.gateway
            .patch(&form_path(id), Some(&StatusUpdate { status }))
            .await
    }

    pub async fn replace(&self, id: u64, form: &NewApplicationForm) -> Result<ApplicationForm, ApiError> {
        self.gateway.put(&form_path(id), Some(form)).await
    }

    pub async fn withdraw(&self, id: u64) -> Result<(), ApiError> {
        self.gateway.delete(&form_path(id)).await
    }

    /// Attach a file (e.g. a CV) to an existing form.
    pub async fn upload_attachment(
        &self,
        id: u64,
        file: &FileUpload,
        on_progress: Option<ProgressCallback>,
    ) -> Result<UploadReceipt, ApiError> {
        let form_id = id.to_string();
        let fields = [("formId", form_id.as_str())];
        self.gateway
            .upload_file(UPLOAD_PATH, file, Some(&fields), on_progress)
            .await
    }

    pub async fn session(&self) -> Result<Session, ApiError> {
        self.gateway.get(SESSION_PATH, None).await
    }

    /// Liveness probe; the backend answers with plain text.
    pub async fn health(&self) -> Result<String, ApiError> {
        self.gateway.get(HEALTH_PATH, None).await
    }
}

fn form_path(id: u64) -> String {
    format!("{APPLICATIONS_PATH}/{id}")
}
