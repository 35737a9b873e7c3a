use std::sync::Arc;

use axum::{
    extract::{multipart::Field, DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post, put},
    Json, Router,
};
use docreq_shared::{Attachment, RequestId, RequestStatus, SubmissionForm, UserId, UserRole};
use docreq_store::{Notification, Request, RequestWithAuthor, StoreError, User};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use uuid::Uuid;

use crate::blob_store::AttachmentStore;
use crate::clock::Clock;
use crate::config::ServerConfig;
use crate::db::{with_db, SharedDb};
use crate::error::ServerError;
use crate::submission::RequestService;

/// Room for the non-file multipart fields on top of the attachment itself.
const FORM_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RequestService>,
    pub db: SharedDb,
    pub attachments: Arc<AttachmentStore>,
    pub clock: Arc<dyn Clock>,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let body_limit = state.config.max_attachment_size + FORM_OVERHEAD;

    Router::new()
        .route("/health", get(health_check))
        .route("/requests", post(create_requests).get(list_requests))
        .route("/requests/:id", get(get_request))
        .route("/requests/:id/attachment", get(get_attachment))
        .route("/requests/:id/status", patch(update_request_status))
        .route("/users", get(list_users))
        .route("/users/:id", put(upsert_user))
        .route("/users/:id/requests", get(list_user_requests))
        .route("/notifications", get(list_notifications))
        .route("/notifications/:id/read", post(mark_notification_read))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct CreatedResponse {
    ids: Vec<RequestId>,
}

#[derive(Deserialize)]
struct StatusQuery {
    status: Option<RequestStatus>,
}

#[derive(Deserialize)]
struct StatusUpdate {
    status: RequestStatus,
}

#[derive(Deserialize)]
struct NotificationQuery {
    #[serde(default)]
    unread: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserPayload {
    display_name: String,
    email: Option<String>,
    role: UserRole,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Multipart submission: `author_id`, one `document_type` field per selected
/// type, `quantity`, `purpose` and an optional `file`.
async fn create_requests(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ServerError> {
    let mut form = SubmissionForm {
        document_types: Vec::new(),
        quantity: 0,
        purpose: String::new(),
        author_id: UserId::new(""),
        attachment: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "author_id" => form.author_id = UserId::new(field_text(field).await?.trim()),
            "document_type" => form.document_types.push(field_text(field).await?),
            "quantity" => {
                let raw = field_text(field).await?;
                form.quantity = raw
                    .trim()
                    .parse()
                    .map_err(|_| ServerError::BadRequest(format!("Invalid quantity: {raw}")))?;
            }
            "purpose" => form.purpose = field_text(field).await?,
            "file" => {
                let file_name = field.file_name().unwrap_or("attachment").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Failed to read field: {}", e)))?;
                // Browsers send an empty part when no file was picked.
                if !data.is_empty() {
                    form.attachment = Some(Attachment { file_name, data });
                }
            }
            other => debug!(field = other, "ignoring unknown multipart field"),
        }
    }

    let ids = state.service.submit(&form).await?;

    info!(author = %form.author_id, count = ids.len(), "requests submitted via API");

    Ok((StatusCode::CREATED, Json(CreatedResponse { ids })))
}

async fn field_text(field: Field<'_>) -> Result<String, ServerError> {
    field
        .text()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Failed to read field: {}", e)))
}

async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Request>, ServerError> {
    let id: RequestId = id.parse()?;
    let lookup = id.clone();
    let request = with_db(&state.db, move |db| db.get_request(&lookup))
        .await
        .map_err(|e| match e {
            ServerError::Store(StoreError::NotFound) => ServerError::RequestNotFound(id.clone()),
            other => other,
        })?;
    Ok(Json(request))
}

async fn get_attachment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let id: RequestId = id.parse()?;
    let data = state.attachments.get(&id).await?;
    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], data))
}

/// Staff queue: requests in one status (default `HOLD`) with their authors.
async fn list_requests(
    headers: HeaderMap,
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<RequestWithAuthor>>, ServerError> {
    verify_staff_token(&headers, &state.config)?;

    let status = query.status.unwrap_or(RequestStatus::Hold);
    let requests = with_db(&state.db, move |db| db.list_requests_with_authors(status)).await?;
    Ok(Json(requests))
}

async fn update_request_status(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<Request>, ServerError> {
    verify_staff_token(&headers, &state.config)?;

    let id: RequestId = id.parse()?;
    let now = state.clock.now();
    let target = id.clone();
    let request = with_db(&state.db, move |db| {
        db.update_request_status(&target, update.status, now)
    })
    .await
    .map_err(|e| match e {
        ServerError::Store(StoreError::NotFound) => ServerError::RequestNotFound(id.clone()),
        other => other,
    })?;
    Ok(Json(request))
}

async fn list_user_requests(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Request>>, ServerError> {
    let author = UserId::new(user_id);
    let requests = with_db(&state.db, move |db| db.list_requests_for_author(&author)).await?;
    Ok(Json(requests))
}

async fn list_users(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, ServerError> {
    verify_staff_token(&headers, &state.config)?;
    Ok(Json(with_db(&state.db, |db| db.list_users()).await?))
}

async fn upsert_user(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<UserPayload>,
) -> Result<Json<User>, ServerError> {
    verify_staff_token(&headers, &state.config)?;

    if user_id.trim().is_empty() || payload.display_name.trim().is_empty() {
        return Err(ServerError::BadRequest(
            "User id and display name are required".into(),
        ));
    }

    let user = User {
        id: UserId::new(user_id),
        display_name: payload.display_name,
        email: payload.email,
        role: payload.role,
        created_at: state.clock.now(),
    };
    let stored = with_db(&state.db, move |db| {
        db.upsert_user(&user)?;
        db.get_user(&user.id)
    })
    .await?;

    info!(user = %stored.id, role = stored.role.as_str(), "user record saved");
    Ok(Json(stored))
}

async fn list_notifications(
    headers: HeaderMap,
    State(state): State<AppState>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<Vec<Notification>>, ServerError> {
    verify_staff_token(&headers, &state.config)?;
    let unread_only = query.unread;
    Ok(Json(
        with_db(&state.db, move |db| db.list_notifications(unread_only)).await?,
    ))
}

async fn mark_notification_read(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ServerError> {
    verify_staff_token(&headers, &state.config)?;

    if !with_db(&state.db, move |db| db.mark_notification_read(id)).await? {
        return Err(ServerError::NotFound(format!("notification {id}")));
    }
    Ok(Json(serde_json::json!({ "read": true })))
}

fn verify_staff_token(headers: &HeaderMap, config: &ServerConfig) -> Result<(), ServerError> {
    let Some(ref expected) = config.staff_token else {
        return Err(ServerError::Forbidden(
            "Staff API is disabled (no STAFF_TOKEN configured)".into(),
        ));
    };

    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or(auth);

    // Constant-time comparison to prevent timing attacks on the staff token.
    use subtle::ConstantTimeEq;
    let token_bytes = token.as_bytes();
    let expected_bytes = expected.as_bytes();
    if token_bytes.len() != expected_bytes.len()
        || token_bytes.ct_eq(expected_bytes).unwrap_u8() != 1
    {
        return Err(ServerError::Forbidden("Invalid staff token".into()));
    }

    Ok(())
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::Request as HttpRequest;
    use chrono::{FixedOffset, TimeZone, Utc};
    use docreq_store::Database;
    use tempfile::TempDir;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    use super::*;
    use crate::clock::FixedClock;
    use crate::submission::LocalBackend;

    const BOUNDARY: &str = "docreq-test-boundary";
    const STAFF: &str = "staff-secret";

    async fn test_state() -> (AppState, TempDir) {
        let dir = TempDir::new().unwrap();
        let config = ServerConfig {
            blob_storage_path: dir.path().join("blobs"),
            max_attachment_size: 1024,
            staff_token: Some(STAFF.to_string()),
            ..ServerConfig::default()
        };

        let db = Arc::new(Mutex::new(
            Database::open_at(&dir.path().join("docreq.db")).unwrap(),
        ));
        let attachments = Arc::new(
            AttachmentStore::new(config.blob_storage_path.clone(), config.max_attachment_size)
                .await
                .unwrap(),
        );
        let clock: Arc<dyn Clock> =
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 1, 3, 10, 0, 0).unwrap()));
        let service = Arc::new(RequestService::new(
            Arc::new(LocalBackend::new(db.clone(), attachments.clone())),
            clock.clone(),
            FixedOffset::east_opt(0).unwrap(),
            config.max_attachment_size,
        ));

        let state = AppState {
            service,
            db,
            attachments,
            clock,
            config: Arc::new(config),
        };
        (state, dir)
    }

    fn multipart(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Body {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((file_name, data)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        Body::from(body)
    }

    fn submit_request(body: Body) -> HttpRequest<Body> {
        HttpRequest::post("/requests")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(body)
            .unwrap()
    }

    async fn json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health() {
        let (state, _dir) = test_state().await;
        let response = build_router(state)
            .oneshot(HttpRequest::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn submit_fetch_and_download() {
        let (state, _dir) = test_state().await;
        let app = build_router(state);

        let body = multipart(
            &[
                ("author_id", "student-7"),
                ("document_type", "Diploma"),
                ("document_type", "Good Moral"),
                ("quantity", "2"),
                ("purpose", "Employment"),
            ],
            Some(("id.png", b"png-bytes")),
        );
        let response = app.clone().oneshot(submit_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let created = json(response).await;
        let mut ids: Vec<String> = created["ids"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["2024-03-0001", "2024-03-0002"]);

        let response = app
            .clone()
            .oneshot(
                HttpRequest::get("/requests/2024-03-0001")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let request = json(response).await;
        assert_eq!(request["status"], "ON_PROCESS");
        assert_eq!(request["authorId"], "student-7");
        assert_eq!(request["quantity"], 2);

        let response = app
            .oneshot(
                HttpRequest::get("/requests/2024-03-0002/attachment")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"png-bytes");
    }

    #[tokio::test]
    async fn missing_document_type_is_rejected() {
        let (state, _dir) = test_state().await;
        let db = state.db.clone();

        let body = multipart(
            &[
                ("author_id", "student-7"),
                ("quantity", "1"),
                ("purpose", "Employment"),
            ],
            None,
        );
        let response = build_router(state)
            .oneshot(submit_request(body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["error"], "Please select a document type");
        assert_eq!(
            db.lock()
                .await
                .counter_value(docreq_shared::constants::REQUEST_COUNTER)
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn partial_failure_reports_created_ids() {
        let (state, dir) = test_state().await;
        let app = build_router(state);

        // Whichever sibling draws the second id cannot store its attachment.
        std::fs::create_dir_all(
            dir.path()
                .join("blobs")
                .join("attachments")
                .join("2024-03-0002"),
        )
        .unwrap();

        let body = multipart(
            &[
                ("author_id", "student-7"),
                ("document_type", "Diploma"),
                ("document_type", "Good Moral"),
                ("quantity", "1"),
                ("purpose", "Employment"),
            ],
            Some(("id.png", b"png-bytes")),
        );
        let response = app.clone().oneshot(submit_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let failed = json(response).await;
        assert_eq!(
            failed["error"],
            "Failed to create document. Please try again later."
        );
        assert_eq!(failed["created"], serde_json::json!(["2024-03-0001"]));

        // Both request records were written; no rollback.
        for id in ["2024-03-0001", "2024-03-0002"] {
            let response = app
                .clone()
                .oneshot(
                    HttpRequest::get(format!("/requests/{id}"))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(json(response).await["status"], "ON_PROCESS");
        }

        let response = app
            .oneshot(
                HttpRequest::get("/requests/2024-03-0001/attachment")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn bad_and_unknown_ids() {
        let (state, _dir) = test_state().await;
        let app = build_router(state);

        let response = app
            .clone()
            .oneshot(HttpRequest::get("/requests/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .clone()
            .oneshot(
                HttpRequest::get("/requests/2024-03-00001")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(
                HttpRequest::get("/requests/2024-03-0404")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn staff_hold_queue() {
        let (state, _dir) = test_state().await;
        let app = build_router(state);

        let body = multipart(
            &[
                ("author_id", "student-7"),
                ("document_type", "Diploma"),
                ("quantity", "1"),
                ("purpose", "Employment"),
            ],
            None,
        );
        let response = app.clone().oneshot(submit_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        // No token, wrong token.
        let response = app
            .clone()
            .oneshot(HttpRequest::get("/requests").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let response = app
            .clone()
            .oneshot(
                HttpRequest::get("/requests")
                    .header(header::AUTHORIZATION, "Bearer wrong")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let auth = format!("Bearer {STAFF}");

        let response = app
            .clone()
            .oneshot(
                HttpRequest::put("/users/student-7")
                    .header(header::AUTHORIZATION, &auth)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"displayName":"Juan Dela Cruz","email":null,"role":"STUDENT"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(
                HttpRequest::patch("/requests/2024-03-0001/status")
                    .header(header::AUTHORIZATION, &auth)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"status":"HOLD"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["status"], "HOLD");

        let response = app
            .clone()
            .oneshot(
                HttpRequest::get("/requests?status=HOLD")
                    .header(header::AUTHORIZATION, &auth)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let hold = json(response).await;
        let hold = hold.as_array().unwrap();
        assert_eq!(hold.len(), 1);
        assert_eq!(hold[0]["id"], "2024-03-0001");
        assert_eq!(hold[0]["author"]["displayName"], "Juan Dela Cruz");

        let response = app
            .clone()
            .oneshot(
                HttpRequest::get("/notifications?unread=true")
                    .header(header::AUTHORIZATION, &auth)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let notes = json(response).await;
        let notes = notes.as_array().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0]["senderId"], "student-7");
        assert!(notes[0]["recipientId"].is_null());

        let note_id = notes[0]["id"].as_str().unwrap().to_string();
        let response = app
            .clone()
            .oneshot(
                HttpRequest::post(format!("/notifications/{note_id}/read"))
                    .header(header::AUTHORIZATION, &auth)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                HttpRequest::get("/users/student-7/requests")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let mine = json(response).await;
        assert_eq!(mine.as_array().unwrap().len(), 1);
    }
}
