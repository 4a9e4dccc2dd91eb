//! DTOs for the recruitment portal API.
//!
//! # Design
//! These mirror the mock-server's schema but are defined independently;
//! the integration tests catch drift between the two crates.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Review state of an application, as set from the review dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A submitted application form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationForm {
    pub id: u64,
    pub staff_id: String,
    pub title: String,
    pub description: String,
    pub status: ApplicationStatus,
}

/// Payload for submitting or replacing an application form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewApplicationForm {
    pub staff_id: String,
    pub title: String,
    pub description: String,
}

/// Envelope returned when a form is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertedForm {
    pub inserted_form: ApplicationForm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: ApplicationStatus,
}

/// What the backend reports after storing an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub upload_id: Uuid,
    pub file_name: String,
    pub size: u64,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

/// The session the backend associates with the current bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inserted_form_uses_camel_case_envelope() {
        let value = json!({
            "insertedForm": {
                "id": 7,
                "staff_id": "42",
                "title": "T",
                "description": "D",
                "status": "pending"
            }
        });
        let parsed: InsertedForm = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.inserted_form.id, 7);
        assert_eq!(parsed.inserted_form.status, ApplicationStatus::Pending);
    }

    #[test]
    fn status_serializes_lowercase() {
        let update = StatusUpdate { status: ApplicationStatus::Approved };
        assert_eq!(serde_json::to_value(update).unwrap(), json!({"status": "approved"}));
        assert_eq!(ApplicationStatus::Rejected.to_string(), "rejected");
    }

    #[test]
    fn receipt_fields_default_to_empty() {
        let receipt: UploadReceipt = serde_json::from_value(json!({
            "uploadId": "00000000-0000-0000-0000-000000000000",
            "fileName": "cv.pdf",
            "size": 3
        }))
        .unwrap();
        assert!(receipt.fields.is_empty());
        assert_eq!(receipt.file_name, "cv.pdf");
    }
}
