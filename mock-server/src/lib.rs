use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApplicationForm {
    pub id: u64,
    pub staff_id: String,
    pub title: String,
    pub description: String,
    pub status: ApplicationStatus,
}

#[derive(Deserialize)]
pub struct NewApplicationForm {
    pub staff_id: String,
    pub title: String,
    pub description: String,
}

#[derive(Deserialize)]
pub struct StatusUpdate {
    pub status: ApplicationStatus,
}

#[derive(Deserialize)]
pub struct ListParams {
    pub status: Option<ApplicationStatus>,
}

#[derive(Deserialize)]
pub struct StatusParams {
    pub message: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub upload_id: Uuid,
    pub file_name: String,
    pub size: u64,
    pub fields: BTreeMap<String, String>,
}

pub struct Store {
    forms: RwLock<BTreeMap<u64, ApplicationForm>>,
    next_id: AtomicU64,
}

impl Store {
    /// Empty store whose first form gets `first_id`.
    pub fn starting_at(first_id: u64) -> Self {
        Self {
            forms: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(first_id),
        }
    }
}

pub type Db = Arc<Store>;

pub fn app() -> Router {
    app_with_store(Arc::new(Store::starting_at(1)))
}

pub fn app_with_store(db: Db) -> Router {
    Router::new()
        .route("/api/forms/application", get(list_forms).post(create_form))
        .route(
            "/api/forms/application/{id}",
            get(get_form).put(replace_form).patch(review_form).delete(delete_form),
        )
        .route("/api/session", get(session))
        .route("/api/health", get(health))
        .route("/api/status/{code}", get(status))
        .route("/api/echo", any(echo))
        .route("/upload", post(upload))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_store(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_store(db)).await
}

/// JSON error body in the shape the gateway classifies.
fn api_error(status: StatusCode, code: &str, message: &str, details: Option<Value>) -> Response {
    let mut body = json!({ "code": code, "message": message });
    if let Some(details) = details {
        body["details"] = details;
    }
    (status, Json(body)).into_response()
}

fn form_not_found(id: u64) -> Response {
    api_error(
        StatusCode::NOT_FOUND,
        "FORM_NOT_FOUND",
        &format!("application form {id} does not exist"),
        None,
    )
}

fn validate(input: &NewApplicationForm) -> Result<(), Response> {
    let blank = [
        ("staff_id", &input.staff_id),
        ("title", &input.title),
        ("description", &input.description),
    ]
    .into_iter()
    .find(|(_, value)| value.trim().is_empty());
    match blank {
        Some((field, _)) => Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "VALIDATION_ERROR",
            &format!("{field} must not be blank"),
            Some(json!({ "field": field })),
        )),
        None => Ok(()),
    }
}

async fn list_forms(State(db): State<Db>, Query(params): Query<ListParams>) -> Json<Vec<ApplicationForm>> {
    let forms = db.forms.read().await;
    Json(
        forms
            .values()
            .filter(|form| params.status.map_or(true, |s| form.status == s))
            .cloned()
            .collect(),
    )
}

async fn create_form(State(db): State<Db>, Json(input): Json<NewApplicationForm>) -> Response {
    if let Err(rejection) = validate(&input) {
        return rejection;
    }
    let form = ApplicationForm {
        id: db.next_id.fetch_add(1, Ordering::SeqCst),
        staff_id: input.staff_id,
        title: input.title,
        description: input.description,
        status: ApplicationStatus::Pending,
    };
    db.forms.write().await.insert(form.id, form.clone());
    tracing::info!(id = form.id, "application form created");
    (StatusCode::CREATED, Json(json!({ "insertedForm": form }))).into_response()
}

async fn get_form(State(db): State<Db>, Path(id): Path<u64>) -> Response {
    let forms = db.forms.read().await;
    match forms.get(&id) {
        Some(form) => Json(form.clone()).into_response(),
        None => form_not_found(id),
    }
}

async fn replace_form(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<NewApplicationForm>,
) -> Response {
    if let Err(rejection) = validate(&input) {
        return rejection;
    }
    let mut forms = db.forms.write().await;
    let Some(form) = forms.get_mut(&id) else {
        return form_not_found(id);
    };
    form.staff_id = input.staff_id;
    form.title = input.title;
    form.description = input.description;
    Json(form.clone()).into_response()
}

async fn review_form(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<StatusUpdate>,
) -> Response {
    let mut forms = db.forms.write().await;
    let Some(form) = forms.get_mut(&id) else {
        return form_not_found(id);
    };
    form.status = input.status;
    tracing::info!(id, status = ?input.status, "application form reviewed");
    Json(form.clone()).into_response()
}

async fn delete_form(State(db): State<Db>, Path(id): Path<u64>) -> Response {
    let mut forms = db.forms.write().await;
    match forms.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => form_not_found(id),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

async fn session(headers: HeaderMap) -> Response {
    match bearer_token(&headers) {
        Some(token) => Json(json!({ "token": token })).into_response(),
        None => api_error(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "a bearer token is required",
            None,
        ),
    }
}

async fn health() -> &'static str {
    "ok"
}

/// Responds with `code` and a `text/plain` body taken from `?message=`.
async fn status(Path(code): Path<u16>, Query(params): Query<StatusParams>) -> Response {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        params.message.unwrap_or_default(),
    )
        .into_response()
}

/// Reflects the method, query pairs, headers and body back as JSON.
async fn echo(
    method: Method,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
    body: String,
) -> Json<Value> {
    let headers: HashMap<String, String> = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    Json(json!({
        "method": method.as_str(),
        "query": query,
        "headers": headers,
        "body": body,
    }))
}

async fn upload(mut multipart: Multipart) -> Response {
    let mut file: Option<(String, u64)> = None;
    let mut fields = BTreeMap::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return api_error(StatusCode::BAD_REQUEST, "MALFORMED_MULTIPART", &e.to_string(), None)
            }
        };
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            match field.bytes().await {
                Ok(bytes) => file = Some((file_name, bytes.len() as u64)),
                Err(e) => {
                    return api_error(StatusCode::BAD_REQUEST, "MALFORMED_MULTIPART", &e.to_string(), None)
                }
            }
        } else {
            match field.text().await {
                Ok(text) => {
                    fields.insert(name, text);
                }
                Err(e) => {
                    return api_error(StatusCode::BAD_REQUEST, "MALFORMED_MULTIPART", &e.to_string(), None)
                }
            }
        }
    }

    let Some((file_name, size)) = file else {
        return api_error(StatusCode::BAD_REQUEST, "MISSING_FILE", "no file field in upload", None);
    };
    tracing::info!(%file_name, size, "upload stored");
    Json(UploadReceipt {
        upload_id: Uuid::new_v4(),
        file_name,
        size,
        fields,
    })
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_serializes_to_json() {
        let form = ApplicationForm {
            id: 7,
            staff_id: "42".to_string(),
            title: "T".to_string(),
            description: "D".to_string(),
            status: ApplicationStatus::Pending,
        };
        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["staff_id"], "42");
        assert_eq!(json["status"], "pending");
    }

    #[test]
    fn new_form_rejects_missing_title() {
        let result: Result<NewApplicationForm, _> =
            serde_json::from_str(r#"{"staff_id":"1","description":"D"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn blank_fields_fail_validation() {
        let input = NewApplicationForm {
            staff_id: "1".to_string(),
            title: "  ".to_string(),
            description: "D".to_string(),
        };
        let rejection = validate(&input).unwrap_err();
        assert_eq!(rejection.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn status_update_parses_lowercase() {
        let update: StatusUpdate = serde_json::from_str(r#"{"status":"approved"}"#).unwrap();
        assert_eq!(update.status, ApplicationStatus::Approved);
        assert!(serde_json::from_str::<StatusUpdate>(r#"{"status":"maybe"}"#).is_err());
    }

    #[test]
    fn store_ids_start_where_asked() {
        let store = Store::starting_at(7);
        assert_eq!(store.next_id.fetch_add(1, Ordering::SeqCst), 7);
        assert_eq!(store.next_id.fetch_add(1, Ordering::SeqCst), 8);
    }
}
