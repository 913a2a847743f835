//! HTTP layer for the tender question service.
//!
//! Exposes an axum [`Router`] backed by any [`RecordStore`] and
//! [`DocumentService`], plus the [`SubmissionWorkflow`] that fills in
//! missing answers.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = tender_api::router(AppState::new(store, documents, config));
//! ```

pub mod error;
pub mod files;
pub mod questions;
pub mod submission;
pub mod submit;

#[cfg(test)]
mod mock;

pub use error::ApiError;
pub use submission::{SubmissionReport, SubmissionWorkflow, SubmitError};

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{delete, get, post},
};
use serde::Deserialize;
use tender_anthropic::AnthropicConfig;
use tender_core::{document::DocumentService, retention::DEFAULT_MAX_FILES, store::RecordStore};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `TENDER_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:             String,
  pub port:             u16,
  /// The JSON record document.
  pub store_path:       PathBuf,
  /// Where uploaded bytes are cached until their file is evicted.
  pub upload_dir:       PathBuf,
  /// How many files the retention policy keeps.
  pub max_files:        usize,
  pub max_upload_bytes: usize,
  pub anthropic:        AnthropicConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:             "127.0.0.1".to_string(),
      port:             3001,
      store_path:       PathBuf::from("data/db.json"),
      upload_dir:       PathBuf::from("uploads"),
      max_files:        DEFAULT_MAX_FILES,
      max_upload_bytes: 20 * 1024 * 1024,
      anthropic:        AnthropicConfig::default(),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S: RecordStore, D: DocumentService> {
  pub store:     Arc<S>,
  pub documents: Arc<D>,
  pub workflow:  Arc<SubmissionWorkflow>,
  pub config:    Arc<ServerConfig>,
}

impl<S: RecordStore, D: DocumentService> AppState<S, D> {
  pub fn new(store: S, documents: D, config: ServerConfig) -> Self {
    Self {
      store:     Arc::new(store),
      documents: Arc::new(documents),
      workflow:  Arc::new(SubmissionWorkflow::new()),
      config:    Arc::new(config),
    }
  }
}

impl<S: RecordStore, D: DocumentService> Clone for AppState<S, D> {
  fn clone(&self) -> Self {
    Self {
      store:     self.store.clone(),
      documents: self.documents.clone(),
      workflow:  self.workflow.clone(),
      config:    self.config.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router: `/health` plus the `/tender` API.
pub fn router<S, D>(state: AppState<S, D>) -> Router
where
  S: RecordStore + 'static,
  D: DocumentService + 'static,
{
  let max_upload_bytes = state.config.max_upload_bytes;

  let tender = Router::new()
    .route("/questions",          get(questions::list::<S, D>))
    .route("/question",           post(questions::create::<S, D>))
    .route("/question/{id}",      delete(questions::remove::<S, D>))
    .route("/upload",             post(files::upload::<S, D>))
    .route("/files",              get(files::list::<S, D>))
    .route("/files/{id}/answers", get(files::answers::<S, D>))
    .route("/submit",             post(submit::handler::<S, D>));

  Router::new()
    .route("/health", get(health))
    .nest("/tender", tender)
    .layer(DefaultBodyLimit::max(max_upload_bytes))
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::permissive())
    .with_state(state)
}

async fn health() -> &'static str { "OK" }

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use serde_json::{Value, json};
  use tempfile::TempDir;
  use tender_store_json::JsonStore;
  use tower::ServiceExt as _;

  use super::*;
  use crate::mock::MockDocuments;

  const BOUNDARY: &str = "tender-test-boundary";

  fn make_state() -> (AppState<JsonStore, MockDocuments>, TempDir) {
    make_state_with(JsonStore::open_in_memory())
  }

  fn make_state_with(store: JsonStore) -> (AppState<JsonStore, MockDocuments>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = ServerConfig {
      upload_dir: dir.path().join("uploads"),
      ..ServerConfig::default()
    };
    let state = AppState::new(store, MockDocuments::new(), config);
    (state, dir)
  }

  async fn send(
    state: &AppState<JsonStore, MockDocuments>,
    req:   Request<Body>,
  ) -> (StatusCode, Value) {
    let resp = router(state.clone()).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
  }

  fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
  }

  fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
      .method("POST")
      .uri(uri)
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap()
  }

  fn upload_req(name: &str, content_type: &str) -> Request<Body> {
    let mut body = format!(
      "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\n\
       Content-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(b"%PDF-1.7 test");
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
      .method("POST")
      .uri("/tender/upload")
      .header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
      )
      .body(Body::from(body))
      .unwrap()
  }

  fn cached_uploads(dir: &TempDir) -> usize {
    std::fs::read_dir(dir.path().join("uploads"))
      .map(|entries| entries.count())
      .unwrap_or(0)
  }

  // ── Health ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn health_returns_ok() {
    let (state, _dir) = make_state();
    let resp = router(state).oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }

  // ── Questions ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn add_question_then_list() {
    let (state, _dir) = make_state();

    let (status, created) =
      send(&state, post_json("/tender/question", json!({ "question": "Is this exempt?" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(created["id"].is_string());

    let (status, body) = send(&state, get("/tender/questions")).await;
    assert_eq!(status, StatusCode::OK);
    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0]["id"], created["id"]);
    assert_eq!(questions[0]["text"], "Is this exempt?");
    assert!(questions[0]["answers"].as_array().unwrap().is_empty());
  }

  #[tokio::test]
  async fn invalid_question_bodies_return_400() {
    let (state, _dir) = make_state();

    for body in [json!({}), json!({ "question": 123 }), json!({ "question": "  " })] {
      let (status, resp) = send(&state, post_json("/tender/question", body)).await;
      assert_eq!(status, StatusCode::BAD_REQUEST);
      assert!(resp["error"].as_str().unwrap().contains("question"), "{resp}");
    }
    assert!(state.store.list_questions().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn malformed_json_returns_400() {
    let (state, _dir) = make_state();
    let req = Request::builder()
      .method("POST")
      .uri("/tender/question")
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from("{not json"))
      .unwrap();
    let (status, _) = send(&state, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn delete_question() {
    let (state, _dir) = make_state();
    let q = state.store.add_question("Deadline?".into()).await.unwrap();

    let req = Request::builder()
      .method("DELETE")
      .uri(format!("/tender/question/{}", q.id))
      .body(Body::empty())
      .unwrap();
    let (status, _) = send(&state, req).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(state.store.list_questions().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn delete_unknown_question_returns_404() {
    let (state, _dir) = make_state();
    state.store.add_question("kept".into()).await.unwrap();

    let req = Request::builder()
      .method("DELETE")
      .uri(format!("/tender/question/{}", uuid::Uuid::new_v4()))
      .body(Body::empty())
      .unwrap();
    let (status, _) = send(&state, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(state.store.list_questions().await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn delete_question_with_non_uuid_id_returns_404() {
    let (state, _dir) = make_state();
    state.store.add_question("kept".into()).await.unwrap();

    let req = Request::builder()
      .method("DELETE")
      .uri("/tender/question/1718000000000")
      .body(Body::empty())
      .unwrap();
    let (status, body) = send(&state, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "question 1718000000000 not found");
    assert_eq!(state.store.list_questions().await.unwrap().len(), 1);
  }

  // ── Upload ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn upload_pdf_creates_file() {
    let (state, dir) = make_state();

    let (status, body) = send(&state, upload_req("tender.pdf", "application/pdf")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["existing"], false);

    let (_, files) = send(&state, get("/tender/files")).await;
    let files = files["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["id"], body["id"]);
    assert_eq!(files[0]["originalName"], "tender.pdf");
    assert!(files[0].get("localPath").is_none());
    assert!(files[0].get("externalRef").is_none());

    assert_eq!(state.documents.registrations(), 1);
    assert_eq!(cached_uploads(&dir), 1);
  }

  #[tokio::test]
  async fn upload_non_pdf_returns_400() {
    let (state, dir) = make_state();

    let (status, body) = send(&state, upload_req("notes.txt", "text/plain")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file uploaded or file is not a PDF.");
    assert_eq!(state.documents.registrations(), 0);
    assert_eq!(cached_uploads(&dir), 0);
  }

  #[tokio::test]
  async fn upload_same_name_returns_existing_id() {
    let (state, _dir) = make_state();

    let (_, first) = send(&state, upload_req("a.pdf", "application/pdf")).await;
    let (status, second) = send(&state, upload_req("a.pdf", "application/pdf")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["id"], first["id"]);
    assert_eq!(second["existing"], true);

    assert_eq!(state.documents.registrations(), 1);
    assert_eq!(state.store.list_files().await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn fourth_upload_evicts_and_releases_oldest() {
    let (state, dir) = make_state();

    for name in ["1.pdf", "2.pdf", "3.pdf", "4.pdf"] {
      let (status, _) = send(&state, upload_req(name, "application/pdf")).await;
      assert_eq!(status, StatusCode::CREATED);
    }

    let names: Vec<String> = state
      .store
      .list_files()
      .await
      .unwrap()
      .into_iter()
      .map(|f| f.original_name)
      .collect();
    assert_eq!(names, ["2.pdf", "3.pdf", "4.pdf"]);
    assert_eq!(state.documents.released(), ["file_0"]);
    assert_eq!(cached_uploads(&dir), 3);
  }

  #[tokio::test]
  async fn failed_registration_returns_500_and_discards_bytes() {
    let (state, dir) = make_state();
    state.documents.fail_registrations();

    let (status, body) = send(&state, upload_req("a.pdf", "application/pdf")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
    assert!(state.store.list_files().await.unwrap().is_empty());
    assert_eq!(cached_uploads(&dir), 0);
  }

  #[tokio::test]
  async fn upload_evicted_on_arrival_is_reported() {
    let (state, dir) = make_state_with(JsonStore::open_in_memory().with_max_files(0));

    let (status, body) = send(&state, upload_req("a.pdf", "application/pdf")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("a.pdf"), "{body}");
    assert!(state.store.list_files().await.unwrap().is_empty());
    assert_eq!(state.documents.released(), ["file_0"]);
    assert_eq!(cached_uploads(&dir), 0);
  }

  // ── Submit ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn submit_without_files_returns_404() {
    let (state, _dir) = make_state();
    state.store.add_question("q".into()).await.unwrap();

    let (status, body) = send(&state, post_json("/tender/submit", json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
  }

  #[tokio::test]
  async fn submit_answers_and_exposes_results() {
    let (state, _dir) = make_state();
    let (_, uploaded) = send(&state, upload_req("a.pdf", "application/pdf")).await;
    state.store.add_question("Deadline?".into()).await.unwrap();
    state.store.add_question("Budget?".into()).await.unwrap();

    let req = Request::builder()
      .method("POST")
      .uri("/tender/submit")
      .body(Body::empty())
      .unwrap();
    let (status, report) = send(&state, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["answered"], 2);
    assert_eq!(report["failed"], 0);

    let id = uploaded["id"].as_str().unwrap();
    let (status, body) = send(&state, get(&format!("/tender/files/{id}/answers"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fileName"], "a.pdf");
    let answers = body["answers"].as_array().unwrap();
    assert_eq!(answers.len(), 2);
    assert_eq!(answers[0]["question"], "Deadline?");
    assert_eq!(answers[0]["answer"], "Deadline? @ file_0");

    let (_, questions) = send(&state, get("/tender/questions")).await;
    let first = &questions["questions"][0];
    assert_eq!(first["answers"][0]["fileName"], "a.pdf");
  }

  #[tokio::test]
  async fn answers_for_unknown_file_returns_404() {
    let (state, _dir) = make_state();
    let uri = format!("/tender/files/{}/answers", uuid::Uuid::new_v4());
    let (status, _) = send(&state, get(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn answers_for_non_uuid_file_returns_404() {
    let (state, _dir) = make_state();
    let (status, body) = send(&state, get("/tender/files/abc/answers")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "file abc not found");
  }
}
