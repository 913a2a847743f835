//! The `RecordStore` trait.
//!
//! Implemented by storage backends (e.g. `tender-store-json`). The API layer
//! and the submission workflow depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  file::{AddedFile, FileRecord, NewFile},
  question::Question,
};

/// Abstraction over the record store backend.
///
/// The store exclusively owns questions, files and answers. Every mutating
/// method persists before returning; a persistence failure is reported as
/// the backend's error and is never retried internally.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Questions ─────────────────────────────────────────────────────────

  /// Create and persist a question. Fails with
  /// [`Error::InvalidQuestion`](crate::Error::InvalidQuestion) if `text` is
  /// empty.
  fn add_question(
    &self,
    text: String,
  ) -> impl Future<Output = Result<Question, Self::Error>> + Send + '_;

  /// Remove a question. Returns `false` if `id` is unknown.
  ///
  /// Answers already recorded against files are kept.
  fn delete_question(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// All questions in insertion order.
  fn list_questions(
    &self,
  ) -> impl Future<Output = Result<Vec<Question>, Self::Error>> + Send + '_;

  /// Retrieve a question by id. Returns `None` if not found.
  fn get_question(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Question>, Self::Error>> + Send + '_;

  // ── Files ─────────────────────────────────────────────────────────────

  /// Record an uploaded file.
  ///
  /// If a file with the same original name exists, it is returned unchanged
  /// with [`AddedFile::existing`] set and retention is not re-applied.
  /// Otherwise the file is appended, the retention policy runs, and the
  /// evicted records are returned.
  fn add_file(
    &self,
    input: NewFile,
  ) -> impl Future<Output = Result<AddedFile, Self::Error>> + Send + '_;

  /// All files in insertion order, each with its answers.
  fn list_files(
    &self,
  ) -> impl Future<Output = Result<Vec<FileRecord>, Self::Error>> + Send + '_;

  /// Retrieve a file by id. Returns `None` if not found.
  fn get_file(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<FileRecord>, Self::Error>> + Send + '_;

  /// Retrieve a file by its original name. Returns `None` if not found.
  fn find_file_by_name<'a>(
    &'a self,
    original_name: &'a str,
  ) -> impl Future<Output = Result<Option<FileRecord>, Self::Error>> + Send + 'a;

  // ── Answers ───────────────────────────────────────────────────────────

  /// Append an answer to a file. Returns `false` if `file_id` is unknown.
  ///
  /// Does not check for an existing answer to the same question; callers
  /// must do that first.
  fn add_answer(
    &self,
    file_id: Uuid,
    question_id: Uuid,
    question_text: String,
    answer_text: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
