//! Uploaded files and the answers recorded against them.
//!
//! A [`FileRecord`] is created once its bytes have been registered with the
//! document service. Apart from appending [`Answer`]s it is never updated;
//! it disappears only when the retention policy evicts it.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, question::Question};

// ─── Answer ──────────────────────────────────────────────────────────────────

/// The recorded result of asking one question against one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
  pub question_id: Uuid,
  /// Snapshot of the question text at answer time, kept for display even
  /// after the question itself is deleted.
  pub question:    String,
  pub answer:      String,
  pub created_at:  DateTime<Utc>,
}

// ─── FileRecord ──────────────────────────────────────────────────────────────

/// One uploaded PDF and its document-service reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
  pub id:            Uuid,
  /// Opaque handle returned by [`crate::document::DocumentService::register`].
  pub external_ref:  String,
  pub original_name: String,
  pub size:          u64,
  /// Locally cached bytes, removed best-effort on eviction.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub local_path:    Option<PathBuf>,
  pub created_at:    DateTime<Utc>,
  #[serde(default)]
  pub answers:       Vec<Answer>,
}

impl FileRecord {
  /// The answer recorded for `question_id`, if any.
  pub fn answer_for(&self, question_id: Uuid) -> Option<&Answer> {
    self.answers.iter().find(|a| a.question_id == question_id)
  }

  pub fn is_answered(&self, question_id: Uuid) -> bool {
    self.answer_for(question_id).is_some()
  }
}

// ─── NewFile ─────────────────────────────────────────────────────────────────

/// Input to [`crate::store::RecordStore::add_file`].
/// `id` and `created_at` are always set by the store.
#[derive(Debug, Clone)]
pub struct NewFile {
  pub external_ref:  String,
  pub original_name: String,
  pub size:          u64,
  pub local_path:    Option<PathBuf>,
}

impl NewFile {
  pub fn new(
    external_ref: impl Into<String>,
    original_name: impl Into<String>,
    size: u64,
  ) -> Self {
    Self {
      external_ref: external_ref.into(),
      original_name: original_name.into(),
      size,
      local_path: None,
    }
  }

  pub fn with_local_path(mut self, path: impl Into<PathBuf>) -> Self {
    self.local_path = Some(path.into());
    self
  }

  /// Check the fields a record cannot exist without.
  pub fn validate(&self) -> Result<()> {
    if self.original_name.trim().is_empty() {
      return Err(Error::InvalidFile("original name must not be empty".into()));
    }
    if self.external_ref.is_empty() {
      return Err(Error::InvalidFile("external reference must not be empty".into()));
    }
    Ok(())
  }

  /// Materialise the record with a fresh id and the current timestamp.
  pub fn into_record(self) -> FileRecord {
    FileRecord {
      id:            Uuid::now_v7(),
      external_ref:  self.external_ref,
      original_name: self.original_name,
      size:          self.size,
      local_path:    self.local_path,
      created_at:    Utc::now(),
      answers:       Vec::new(),
    }
  }
}

/// Outcome of [`crate::store::RecordStore::add_file`].
#[derive(Debug, Clone)]
pub struct AddedFile {
  pub file:     FileRecord,
  /// `true` if a file with the same original name already existed; `file`
  /// is then that earlier record and nothing was written.
  pub existing: bool,
  /// Files dropped by the retention policy as a result of this insert.
  pub evicted:  Vec<FileRecord>,
}

/// Build an answer for `question` with the current timestamp.
pub fn answer_to(question: &Question, answer: impl Into<String>) -> Answer {
  Answer {
    question_id: question.id,
    question:    question.text.clone(),
    answer:      answer.into(),
    created_at:  Utc::now(),
  }
}
