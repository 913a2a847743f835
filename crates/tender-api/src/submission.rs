//! The submission workflow: answer every (file, question) pair not yet
//! answered.
//!
//! Pairs are processed file-major, question-minor, one external call at a
//! time. A failing pair is logged and left unanswered for the next run; it
//! never aborts the rest of the submission.

use std::{
  collections::HashSet,
  sync::{Mutex, PoisonError},
};

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use tender_core::{
  document::DocumentService,
  file::FileRecord,
  question::Question,
  store::RecordStore,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum SubmitError {
  #[error("no files on record")]
  NoFiles,

  #[error("store error: {0}")]
  Store(#[source] BoxError),
}

/// Per-invocation counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReport {
  pub files:     usize,
  pub questions: usize,
  /// Calls made to the document service, successful or not.
  pub asked:     usize,
  pub answered:  usize,
  /// Pairs already answered, or claimed by an overlapping submission.
  pub skipped:   usize,
  pub failed:    usize,
}

enum PairOutcome {
  Answered,
  AlreadyAnswered,
  /// The file was evicted while the submission was running.
  FileGone,
}

// ─── Workflow ────────────────────────────────────────────────────────────────

/// Runs submissions and tracks which pairs are currently being answered.
///
/// Share one instance between all callers: overlapping runs skip pairs the
/// other run has claimed and re-check the store after claiming, so no pair
/// is answered twice.
#[derive(Debug, Default)]
pub struct SubmissionWorkflow {
  in_flight: Mutex<HashSet<(Uuid, Uuid)>>,
}

/// Releases a claimed pair when dropped.
struct Claim<'a> {
  workflow: &'a SubmissionWorkflow,
  pair:     (Uuid, Uuid),
}

impl Drop for Claim<'_> {
  fn drop(&mut self) {
    self
      .workflow
      .in_flight
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .remove(&self.pair);
  }
}

impl SubmissionWorkflow {
  pub fn new() -> Self { Self::default() }

  fn claim(&self, file_id: Uuid, question_id: Uuid) -> Option<Claim<'_>> {
    let pair = (file_id, question_id);
    let inserted = self
      .in_flight
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(pair);
    inserted.then_some(Claim { workflow: self, pair })
  }

  /// Ask every unanswered (file, question) pair and record the answers.
  ///
  /// Fails only if there are no files or the initial listing fails.
  pub async fn run<S, D>(
    &self,
    store: &S,
    documents: &D,
  ) -> Result<SubmissionReport, SubmitError>
  where
    S: RecordStore,
    D: DocumentService,
  {
    let files = store
      .list_files()
      .await
      .map_err(|e| SubmitError::Store(Box::new(e)))?;
    if files.is_empty() {
      tracing::warn!("submission requested with no files on record");
      return Err(SubmitError::NoFiles);
    }
    let questions = store
      .list_questions()
      .await
      .map_err(|e| SubmitError::Store(Box::new(e)))?;

    tracing::info!(
      files = files.len(),
      questions = questions.len(),
      "submission started"
    );

    let mut report = SubmissionReport {
      files: files.len(),
      questions: questions.len(),
      ..SubmissionReport::default()
    };

    for file in &files {
      for question in &questions {
        if file.is_answered(question.id) {
          report.skipped += 1;
          continue;
        }
        let Some(_claim) = self.claim(file.id, question.id) else {
          tracing::debug!(file_id = %file.id, question_id = %question.id, "pair in flight elsewhere");
          report.skipped += 1;
          continue;
        };

        match answer_pair(store, documents, file, question, &mut report).await {
          Ok(PairOutcome::Answered) => report.answered += 1,
          Ok(PairOutcome::AlreadyAnswered | PairOutcome::FileGone) => report.skipped += 1,
          Err(e) => {
            report.failed += 1;
            tracing::warn!(
              file_id = %file.id,
              question_id = %question.id,
              error = %e,
              "failed to answer question; will retry on next submission"
            );
          }
        }
      }
    }

    tracing::info!(
      asked = report.asked,
      answered = report.answered,
      skipped = report.skipped,
      failed = report.failed,
      "submission finished"
    );
    Ok(report)
  }
}

/// Answer one claimed pair, re-reading the file first so answers recorded
/// since the listing are respected.
async fn answer_pair<S, D>(
  store: &S,
  documents: &D,
  file: &FileRecord,
  question: &Question,
  report: &mut SubmissionReport,
) -> Result<PairOutcome, BoxError>
where
  S: RecordStore,
  D: DocumentService,
{
  match store.get_file(file.id).await? {
    None => return Ok(PairOutcome::FileGone),
    Some(current) if current.is_answered(question.id) => {
      return Ok(PairOutcome::AlreadyAnswered);
    }
    Some(_) => {}
  }

  report.asked += 1;
  let answer = documents
    .ask(std::slice::from_ref(&file.external_ref), &question.text)
    .await?;

  let recorded = store
    .add_answer(file.id, question.id, question.text.clone(), answer)
    .await?;
  if !recorded {
    return Ok(PairOutcome::FileGone);
  }
  Ok(PairOutcome::Answered)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
