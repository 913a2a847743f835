//! Handler for `POST /submit`.

use axum::{Json, extract::State};
use tender_core::{document::DocumentService, store::RecordStore};

use crate::{
  AppState,
  error::ApiError,
  submission::{SubmissionReport, SubmitError},
};

/// `POST /submit` — answer every unanswered (file, question) pair.
///
/// Succeeds even when individual pairs fail; those stay unanswered and are
/// retried on the next submission.
pub async fn handler<S, D>(
  State(state): State<AppState<S, D>>,
) -> Result<Json<SubmissionReport>, ApiError>
where
  S: RecordStore + 'static,
  D: DocumentService + 'static,
{
  let report = state
    .workflow
    .run(&*state.store, &*state.documents)
    .await
    .map_err(|e| match e {
      SubmitError::NoFiles => ApiError::NoFiles,
      SubmitError::Store(e) => ApiError::Store(e),
    })?;
  Ok(Json(report))
}
