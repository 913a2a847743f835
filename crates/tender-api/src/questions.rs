//! Handlers for question endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/questions` | `{"questions": [...]}`, each with its answers across files |
//! | `POST`   | `/question` | Body: `{"question": "..."}`; returns 201 + stored question |
//! | `DELETE` | `/question/{id}` | 204, or 404 if unknown |

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tender_core::{
  document::DocumentService,
  file::FileRecord,
  question::{self, Question},
  store::RecordStore,
};
use uuid::Uuid;

use crate::{
  AppState,
  error::{ApiError, parse_id},
};

// ─── List ─────────────────────────────────────────────────────────────────────

/// One answer to a question, labelled with the file it came from.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAnswer {
  pub file_id:    Uuid,
  pub file_name:  String,
  pub answer:     String,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct QuestionView {
  #[serde(flatten)]
  pub question: Question,
  pub answers:  Vec<FileAnswer>,
}

#[derive(Debug, Serialize)]
pub struct QuestionList {
  pub questions: Vec<QuestionView>,
}

fn answers_for(question_id: Uuid, files: &[FileRecord]) -> Vec<FileAnswer> {
  files
    .iter()
    .filter_map(|f| {
      f.answer_for(question_id).map(|a| FileAnswer {
        file_id:    f.id,
        file_name:  f.original_name.clone(),
        answer:     a.answer.clone(),
        created_at: a.created_at,
      })
    })
    .collect()
}

/// `GET /questions`
pub async fn list<S, D>(
  State(state): State<AppState<S, D>>,
) -> Result<Json<QuestionList>, ApiError>
where
  S: RecordStore + 'static,
  D: DocumentService + 'static,
{
  let questions = state.store.list_questions().await.map_err(ApiError::store)?;
  let files = state.store.list_files().await.map_err(ApiError::store)?;

  let questions = questions
    .into_iter()
    .map(|q| QuestionView {
      answers:  answers_for(q.id, &files),
      question: q,
    })
    .collect();
  Ok(Json(QuestionList { questions }))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /question` — body: `{"question": "..."}`
pub async fn create<S, D>(
  State(state): State<AppState<S, D>>,
  body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecordStore + 'static,
  D: DocumentService + 'static,
{
  let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

  let Some(text) = body.get("question").and_then(Value::as_str) else {
    tracing::warn!(body = %body, "invalid question parameter");
    return Err(ApiError::BadRequest(
      "Missing or invalid 'question' property in request body.".into(),
    ));
  };
  let text = question::validate_text(text).map_err(|e| ApiError::BadRequest(e.to_string()))?;

  let question = state.store.add_question(text).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(question)))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /question/{id}`
pub async fn remove<S, D>(
  State(state): State<AppState<S, D>>,
  Path(raw): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: RecordStore + 'static,
  D: DocumentService + 'static,
{
  let id = parse_id(&raw, "question")?;
  let found = state.store.delete_question(id).await.map_err(ApiError::store)?;
  if !found {
    return Err(ApiError::NotFound(format!("question {id} not found")));
  }
  Ok(StatusCode::NO_CONTENT)
}
