//! Handlers for file endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/upload` | Multipart field `file`, `application/pdf` only; 201 new, 200 existing |
//! | `GET`  | `/files` | `{"files": [...]}` in upload order |
//! | `GET`  | `/files/{id}/answers` | `{"fileName": ..., "answers": [...]}`; 404 if unknown |

use std::path::{Path as FsPath, PathBuf};

use axum::{
  Json,
  extract::{Multipart, Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tender_core::{
  document::DocumentService,
  file::{Answer, FileRecord, NewFile},
  store::RecordStore,
};
use uuid::Uuid;

use crate::{
  AppState,
  error::{ApiError, parse_id},
};

const PDF_MIME: &str = "application/pdf";
const NOT_A_PDF: &str = "No file uploaded or file is not a PDF.";

// ─── Views ────────────────────────────────────────────────────────────────────

/// A file as exposed over the API; storage details stay server-side.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileView {
  pub id:            Uuid,
  pub original_name: String,
  pub size:          u64,
  pub created_at:    DateTime<Utc>,
  pub answers:       Vec<Answer>,
}

impl From<FileRecord> for FileView {
  fn from(f: FileRecord) -> Self {
    Self {
      id:            f.id,
      original_name: f.original_name,
      size:          f.size,
      created_at:    f.created_at,
      answers:       f.answers,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct FileList {
  pub files: Vec<FileView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAnswers {
  pub file_name: String,
  pub answers:   Vec<Answer>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
  pub id:       Uuid,
  pub existing: bool,
}

// ─── Local cache ──────────────────────────────────────────────────────────────

/// Write uploaded bytes to `dir` as `file-<millis>-<suffix>.pdf`.
async fn cache_upload(dir: &FsPath, bytes: &[u8]) -> std::io::Result<PathBuf> {
  tokio::fs::create_dir_all(dir).await?;
  let suffix = Uuid::new_v4().simple().to_string();
  let name = format!("file-{}-{}.pdf", Utc::now().timestamp_millis(), &suffix[..8]);
  let path = dir.join(name);
  tokio::fs::write(&path, bytes).await?;
  Ok(path)
}

async fn discard_upload(path: &FsPath) {
  if let Err(e) = tokio::fs::remove_file(path).await {
    tracing::warn!(path = %path.display(), error = %e, "failed to remove cached upload");
  }
}

/// Release a document-service reference, logging instead of failing.
pub(crate) async fn release_quietly<D: DocumentService>(documents: &D, external_ref: &str) {
  if let Err(e) = documents.release(external_ref).await {
    tracing::warn!(external_ref, error = %e, "failed to release document");
  }
}

// ─── Upload ───────────────────────────────────────────────────────────────────

struct Upload {
  name:  String,
  bytes: Vec<u8>,
}

async fn read_pdf_field(mut multipart: Multipart) -> Result<Upload, ApiError> {
  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(|e| ApiError::BadRequest(format!("failed to read multipart field: {e}")))?
  {
    if field.name() != Some("file") {
      continue;
    }
    if field.content_type() != Some(PDF_MIME) {
      tracing::warn!(content_type = ?field.content_type(), "rejected non-PDF upload");
      return Err(ApiError::BadRequest(NOT_A_PDF.into()));
    }
    let name = field
      .file_name()
      .map(str::to_owned)
      .filter(|n| !n.trim().is_empty())
      .ok_or_else(|| ApiError::BadRequest("uploaded file has no name".into()))?;
    let bytes = field
      .bytes()
      .await
      .map_err(|e| ApiError::BadRequest(format!("failed to read file: {e}")))?;
    return Ok(Upload { name, bytes: bytes.to_vec() });
  }
  tracing::warn!("no file uploaded");
  Err(ApiError::BadRequest(NOT_A_PDF.into()))
}

/// `POST /upload` — multipart form with a single PDF in field `file`.
///
/// A name already on record returns that file's id without contacting the
/// document service.
pub async fn upload<S, D>(
  State(state): State<AppState<S, D>>,
  multipart: Multipart,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecordStore + 'static,
  D: DocumentService + 'static,
{
  let Upload { name, bytes } = read_pdf_field(multipart).await?;
  tracing::info!(name = %name, size = bytes.len(), "processing upload");

  if let Some(existing) = state
    .store
    .find_file_by_name(&name)
    .await
    .map_err(ApiError::store)?
  {
    return Ok((StatusCode::OK, Json(UploadResponse { id: existing.id, existing: true })));
  }

  let size = bytes.len() as u64;
  let local_path = cache_upload(&state.config.upload_dir, &bytes).await?;

  let external_ref = match state.documents.register(name.clone(), bytes).await {
    Ok(external_ref) => external_ref,
    Err(e) => {
      discard_upload(&local_path).await;
      return Err(ApiError::upstream(e));
    }
  };

  let input = NewFile::new(external_ref.clone(), name, size).with_local_path(&local_path);
  let added = match state.store.add_file(input).await {
    Ok(added) => added,
    Err(e) => {
      discard_upload(&local_path).await;
      release_quietly(&*state.documents, &external_ref).await;
      return Err(ApiError::store(e));
    }
  };

  // Lost a race with a concurrent upload of the same name.
  if added.existing {
    discard_upload(&local_path).await;
    release_quietly(&*state.documents, &external_ref).await;
    return Ok((StatusCode::OK, Json(UploadResponse { id: added.file.id, existing: true })));
  }

  for evicted in &added.evicted {
    release_quietly(&*state.documents, &evicted.external_ref).await;
  }

  // Retention ranks by creation time, so a zero limit or a clock that stepped
  // backwards can evict the record just added.
  if added.evicted.iter().any(|f| f.id == added.file.id) {
    tracing::warn!(id = %added.file.id, "uploaded file was evicted by retention");
    return Err(ApiError::Internal(format!(
      "{} was evicted immediately by the retention policy",
      added.file.original_name
    )));
  }

  Ok((StatusCode::CREATED, Json(UploadResponse { id: added.file.id, existing: false })))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /files`
pub async fn list<S, D>(
  State(state): State<AppState<S, D>>,
) -> Result<Json<FileList>, ApiError>
where
  S: RecordStore + 'static,
  D: DocumentService + 'static,
{
  let files = state.store.list_files().await.map_err(ApiError::store)?;
  Ok(Json(FileList {
    files: files.into_iter().map(FileView::from).collect(),
  }))
}

// ─── Answers ──────────────────────────────────────────────────────────────────

/// `GET /files/{id}/answers`
pub async fn answers<S, D>(
  State(state): State<AppState<S, D>>,
  Path(raw): Path<String>,
) -> Result<Json<FileAnswers>, ApiError>
where
  S: RecordStore + 'static,
  D: DocumentService + 'static,
{
  let id = parse_id(&raw, "file")?;
  let file = state
    .store
    .get_file(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("file {id} not found")))?;
  Ok(Json(FileAnswers {
    file_name: file.original_name,
    answers:   file.answers,
  }))
}
