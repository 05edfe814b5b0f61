// FUNDEF Registry - Web layer
// REST API with Axum over the SQLite record store

use crate::apportionment::{apportion_records, ApportionmentError, ApportionmentReport};
use crate::db::{self, SortOrder, StoreError};
use crate::duration::{DurationError, EligibilityWindow};
use crate::export::{self, ExportError, CSV_CONTENT_TYPE, XLSX_CONTENT_TYPE};
use crate::money::Money;
use crate::teacher::{parse_date, Draft, FieldError, TeacherForm, TeacherRecord};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Shared application state, injected into every handler
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub window: EligibilityWindow,
}

impl AppState {
    pub fn new(conn: Connection, window: EligibilityWindow) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            window,
        }
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::Internal("database lock poisoned".to_string()))
    }
}

/// API Response wrapper
///
/// `message` carries the flash text a form page shows after the action.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
            errors: Vec::new(),
        }
    }

    fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    Validation(Vec<FieldError>),
    Conflict(String),
    NotFound(String),
    BadRequest(String),
    Unprocessable(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, errors) = match self {
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Please correct the highlighted fields".to_string(),
                errors,
            ),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg, Vec::new()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, Vec::new()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, Vec::new()),
            ApiError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg, Vec::new()),
            ApiError::Internal(msg) => {
                error!(%msg, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg, Vec::new())
            }
        };

        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(error),
            message: None,
            errors,
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::DuplicateCpf(_) => ApiError::Conflict(value.to_string()),
            StoreError::NotFound(_) => ApiError::NotFound(value.to_string()),
            StoreError::Validation(errors) => ApiError::Validation(errors),
            StoreError::Sqlite(_) | StoreError::Json(_) => ApiError::Internal(value.to_string()),
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(value: ExportError) -> Self {
        ApiError::Internal(value.to_string())
    }
}

impl From<ApportionmentError> for ApiError {
    fn from(value: ApportionmentError) -> Self {
        match value {
            ApportionmentError::EmptyInput => {
                ApiError::BadRequest("No teachers registered to apportion".to_string())
            }
            // Stored records are validated, so this is an integration bug
            ApportionmentError::InvalidShare { .. } => ApiError::Internal(value.to_string()),
        }
    }
}

impl From<DurationError> for ApiError {
    fn from(value: DurationError) -> Self {
        ApiError::Unprocessable(value.to_string())
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// Request / response bodies
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedDraft {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct MonthsWorkedRequest {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MonthsWorkedResponse {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub window: EligibilityWindow,
    pub months_worked: u32,
}

#[derive(Debug, Deserialize)]
pub struct ApportionmentRequest {
    pub total: Money,
}

#[derive(Debug, Default, Deserialize)]
pub struct FormatQuery {
    pub format: Option<String>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/teachers - All teachers, newest first
async fn list_teachers(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<Vec<TeacherRecord>>>> {
    let conn = state.conn()?;
    let teachers = db::list_teachers(&conn, SortOrder::NewestFirst)?;
    Ok(Json(ApiResponse::ok(teachers)))
}

/// POST /api/teachers - Validate and register a teacher
async fn create_teacher(
    State(state): State<AppState>,
    Json(form): Json<TeacherForm>,
) -> ApiResult<(StatusCode, Json<ApiResponse<TeacherRecord>>)> {
    let mut record = form.validate(&state.window).map_err(ApiError::Validation)?;

    let conn = state.conn()?;
    let id = db::insert_teacher(&conn, &record)?;
    record.id = Some(id);
    info!(id, "teacher registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(record).with_message("Teacher registered successfully")),
    ))
}

/// GET /api/teachers/:id
async fn get_teacher(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ApiResponse<TeacherRecord>>> {
    let conn = state.conn()?;
    let teacher = db::get_teacher(&conn, id)?.ok_or(StoreError::NotFound(id))?;
    Ok(Json(ApiResponse::ok(teacher)))
}

/// PUT /api/teachers/:id - Re-validate an edited record
async fn update_teacher(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(form): Json<TeacherForm>,
) -> ApiResult<Json<ApiResponse<TeacherRecord>>> {
    let mut record = form.validate(&state.window).map_err(ApiError::Validation)?;

    let conn = state.conn()?;
    db::update_teacher(&conn, id, &record)?;
    record.id = Some(id);
    info!(id, "teacher updated");

    Ok(Json(ApiResponse::ok(record).with_message("Teacher updated successfully")))
}

/// DELETE /api/teachers/:id
async fn delete_teacher(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ApiResponse<i64>>> {
    let conn = state.conn()?;
    db::delete_teacher(&conn, id)?;
    info!(id, "teacher deleted");

    Ok(Json(ApiResponse::ok(id).with_message("Teacher removed")))
}

/// GET /api/drafts - Drafts, most recently updated first
async fn list_drafts(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<Vec<Draft>>>> {
    let conn = state.conn()?;
    Ok(Json(ApiResponse::ok(db::list_drafts(&conn)?)))
}

/// POST /api/drafts - Save a partial form
async fn create_draft(
    State(state): State<AppState>,
    Json(form): Json<TeacherForm>,
) -> ApiResult<(StatusCode, Json<ApiResponse<CreatedDraft>>)> {
    form.validate_draft().map_err(ApiError::Validation)?;

    let conn = state.conn()?;
    let id = db::save_draft(&conn, &form, None)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(CreatedDraft { id }).with_message("Draft saved")),
    ))
}

/// GET /api/drafts/:id
async fn get_draft(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ApiResponse<Draft>>> {
    let conn = state.conn()?;
    let draft = db::load_draft(&conn, id)?.ok_or(StoreError::NotFound(id))?;
    Ok(Json(ApiResponse::ok(draft)))
}

/// PUT /api/drafts/:id - Update a draft (creates it if the id is unknown)
async fn update_draft(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(form): Json<TeacherForm>,
) -> ApiResult<Json<ApiResponse<CreatedDraft>>> {
    form.validate_draft().map_err(ApiError::Validation)?;

    let conn = state.conn()?;
    let id = db::save_draft(&conn, &form, Some(id))?;

    Ok(Json(ApiResponse::ok(CreatedDraft { id }).with_message("Draft saved")))
}

/// DELETE /api/drafts/:id
async fn delete_draft(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ApiResponse<i64>>> {
    let conn = state.conn()?;
    db::remove_draft(&conn, id)?;

    Ok(Json(ApiResponse::ok(id).with_message("Draft discarded")))
}

/// POST /api/drafts/:id/promote - Turn a complete draft into a teacher record
async fn promote_draft(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<(StatusCode, Json<ApiResponse<TeacherRecord>>)> {
    let mut conn = state.conn()?;
    let record = db::promote_draft(&mut conn, id, &state.window)?;
    info!(draft = id, teacher = ?record.id, "draft promoted");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(record).with_message("Teacher registered successfully")),
    ))
}

/// POST /api/months-worked - Tenure preview for a date pair
async fn months_worked(
    State(state): State<AppState>,
    Json(request): Json<MonthsWorkedRequest>,
) -> ApiResult<Json<ApiResponse<MonthsWorkedResponse>>> {
    let start = parse_date(&request.start)
        .ok_or_else(|| ApiError::BadRequest(format!("'{}' is not a date", request.start)))?;
    let end = parse_date(&request.end)
        .ok_or_else(|| ApiError::BadRequest(format!("'{}' is not a date", request.end)))?;

    let months_worked = state.window.months_worked(start, end)?;

    Ok(Json(ApiResponse::ok(MonthsWorkedResponse {
        start,
        end,
        window: state.window,
        months_worked,
    })))
}

/// POST /api/apportionment - Rateio of a total across all teachers
async fn apportionment(
    State(state): State<AppState>,
    Query(query): Query<FormatQuery>,
    Json(request): Json<ApportionmentRequest>,
) -> ApiResult<Response> {
    if request.total.is_negative() {
        return Err(ApiError::BadRequest("Total must not be negative".to_string()));
    }

    let teachers = {
        let conn = state.conn()?;
        db::teachers_for_apportionment(&conn)?
    };
    let report: ApportionmentReport = apportion_records(request.total, &teachers)?;
    info!(summary = %report.summary(), "apportionment computed");

    if query.format.as_deref() == Some("csv") {
        let bytes = export::export_apportionment_csv(&report)?;
        return Ok(attachment(CSV_CONTENT_TYPE, "rateio.csv", bytes));
    }
    if query.format.as_deref() == Some("xlsx") {
        let bytes = export::export_apportionment_xlsx(&report)?;
        return Ok(attachment(XLSX_CONTENT_TYPE, "rateio.xlsx", bytes));
    }

    let message = report.summary();
    Ok(Json(ApiResponse::ok(report).with_message(message)).into_response())
}

/// GET /api/export/csv
async fn export_csv(State(state): State<AppState>) -> ApiResult<Response> {
    let teachers = {
        let conn = state.conn()?;
        db::list_teachers(&conn, SortOrder::NewestFirst)?
    };
    let bytes = export::export_csv(&teachers)?;
    Ok(attachment(CSV_CONTENT_TYPE, "professores.csv", bytes))
}

/// GET /api/export/xlsx
async fn export_xlsx(State(state): State<AppState>) -> ApiResult<Response> {
    let teachers = {
        let conn = state.conn()?;
        db::list_teachers(&conn, SortOrder::NewestFirst)?
    };
    let bytes = export::export_xlsx(&teachers)?;
    Ok(attachment(XLSX_CONTENT_TYPE, "professores.xlsx", bytes))
}

fn attachment(content_type: &'static str, filename: &str, bytes: Vec<u8>) -> Response {
    if bytes.is_empty() {
        warn!(filename, "empty export");
    }
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// GET / - Serve index.html
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/teachers", get(list_teachers).post(create_teacher))
        .route(
            "/teachers/:id",
            get(get_teacher).put(update_teacher).delete(delete_teacher),
        )
        .route("/drafts", get(list_drafts).post(create_draft))
        .route(
            "/drafts/:id",
            get(get_draft).put(update_draft).delete(delete_draft),
        )
        .route("/drafts/:id/promote", post(promote_draft))
        .route("/months-worked", post(months_worked))
        .route("/apportionment", post(apportionment))
        .route("/export/csv", get(export_csv))
        .route("/export/xlsx", get(export_xlsx))
        .with_state(state);

    Router::new()
        .route("/", get(serve_index))
        .nest("/api", api_routes)
        .nest_service("/static", ServeDir::new("web"))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::teacher::tests::sample_form;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        let conn = Connection::open_in_memory().unwrap();
        db::setup_database(&conn).unwrap();
        router(AppState::new(conn, EligibilityWindow::fundef()))
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let (status, bytes) = send(app, request).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn form_json(name: &str, cpf: &str) -> Value {
        serde_json::to_value(sample_form(name, cpf)).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let (status, body) = send_json(&app(), get_request("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn teacher_crud_flow() {
        let app = app();

        let (status, body) = send_json(
            &app,
            json_request("POST", "/api/teachers", form_json("Maria", "529.982.247-25")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Teacher registered successfully");
        assert_eq!(body["data"]["months_worked"], 12);
        let id = body["data"]["id"].as_i64().unwrap();

        let (status, body) = send_json(&app, get_request(&format!("/api/teachers/{}", id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["cpf"], "52998224725");

        let mut edited = sample_form("Maria Souza", "529.982.247-25");
        edited.fundef_end = Some("2001-12-31".to_string());
        let (status, body) = send_json(
            &app,
            json_request(
                "PUT",
                &format!("/api/teachers/{}", id),
                serde_json::to_value(edited).unwrap(),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["months_worked"], 24);

        let (_, body) = send_json(&app, get_request("/api/teachers")).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/api/teachers/{}", id))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send_json(&app, request).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send_json(&app, get_request(&format!("/api/teachers/{}", id))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn invalid_form_returns_field_errors() {
        let app = app();
        let mut form = sample_form("Maria", "529.982.247-26");
        form.email = None;

        let (status, body) = send_json(
            &app,
            json_request("POST", "/api/teachers", serde_json::to_value(form).unwrap()),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let fields: Vec<&str> = body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap())
            .collect();
        assert!(fields.contains(&"cpf"));
        assert!(fields.contains(&"email"));
    }

    #[tokio::test]
    async fn duplicate_cpf_conflicts() {
        let app = app();
        let form = form_json("Maria", "529.982.247-25");

        let (status, _) = send_json(&app, json_request("POST", "/api/teachers", form.clone())).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send_json(&app, json_request("POST", "/api/teachers", form)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("529.982.247-25"));
    }

    #[tokio::test]
    async fn draft_save_and_promote() {
        let app = app();

        let partial = serde_json::json!({ "name": "Rascunho", "cpf": "529.982.247-25" });
        let (status, body) = send_json(&app, json_request("POST", "/api/drafts", partial)).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["data"]["id"].as_i64().unwrap();

        // Still incomplete
        let (status, _) = send_json(
            &app,
            json_request("POST", &format!("/api/drafts/{}/promote", id), Value::Null),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send_json(
            &app,
            json_request("PUT", &format!("/api/drafts/{}", id), form_json("Maria", "529.982.247-25")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let request = Request::builder()
            .method("POST")
            .uri(format!("/api/drafts/{}/promote", id))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send_json(&app, request).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["name"], "Maria");

        let (_, body) = send_json(&app, get_request("/api/drafts")).await;
        assert!(body["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn bad_draft_shape_is_rejected() {
        let partial = serde_json::json!({ "email": "not-an-email" });
        let (status, body) = send_json(&app(), json_request("POST", "/api/drafts", partial)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"][0]["field"], "email");
    }

    #[tokio::test]
    async fn months_worked_endpoint() {
        let app = app();

        let (status, body) = send_json(
            &app,
            json_request(
                "POST",
                "/api/months-worked",
                serde_json::json!({ "start": "01/01/2000", "end": "2000-12-31" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["months_worked"], 12);

        let (status, _) = send_json(
            &app,
            json_request(
                "POST",
                "/api/months-worked",
                serde_json::json!({ "start": "2001-01-01", "end": "2000-12-31" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send_json(
            &app,
            json_request(
                "POST",
                "/api/months-worked",
                serde_json::json!({ "start": "ontem", "end": "2000-12-31" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn apportionment_rejects_unusable_totals() {
        let app = app();
        send_json(&app, json_request("POST", "/api/teachers", form_json("A", "529.982.247-25"))).await;

        for total in [
            serde_json::json!("1000000000000000000000000000"),
            serde_json::json!("79228162514264337593543950335"),
            serde_json::json!(10.1),
            serde_json::json!("1.23.45,00"),
        ] {
            let (status, _) = send(
                &app,
                json_request("POST", "/api/apportionment", serde_json::json!({ "total": total })),
            )
            .await;
            assert!(status.is_client_error(), "{} gave {}", total, status);
        }

        let (status, body) = send_json(
            &app,
            json_request("POST", "/api/apportionment", serde_json::json!({ "total": "1,234.56" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["rows"][0]["share"], "1234.56");
    }

    #[tokio::test]
    async fn apportionment_endpoint() {
        let app = app();

        let (status, _) = send_json(
            &app,
            json_request("POST", "/api/apportionment", serde_json::json!({ "total": "100.00" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        for (name, cpf) in [("A", "529.982.247-25"), ("B", "111.444.777-35"), ("C", "123.456.789-09")] {
            send_json(&app, json_request("POST", "/api/teachers", form_json(name, cpf))).await;
        }

        let (status, body) = send_json(
            &app,
            json_request("POST", "/api/apportionment", serde_json::json!({ "total": "10.00" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let shares: Vec<&str> = body["data"]["rows"]
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row["share"].as_str().unwrap())
            .collect();
        assert_eq!(shares, vec!["3.34", "3.33", "3.33"]);

        let (status, bytes) = send(
            &app,
            json_request(
                "POST",
                "/api/apportionment?format=csv",
                serde_json::json!({ "total": "10.00" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("TOTAL,,,,,36,10.00"));
    }

    #[tokio::test]
    async fn export_endpoints() {
        let app = app();
        send_json(&app, json_request("POST", "/api/teachers", form_json("Maria", "529.982.247-25"))).await;

        let response = app.clone().oneshot(get_request("/api/export/csv")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], CSV_CONTENT_TYPE);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8(bytes.to_vec()).unwrap().contains("529.982.247-25"));

        let (status, bytes) = send(&app, get_request("/api/export/xlsx")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&bytes[..2], b"PK");
    }
}
