//! [`JsonStore`] — the JSON-document implementation of [`RecordStore`].

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use tender_core::{
  file::{AddedFile, Answer, FileRecord, NewFile},
  question::Question,
  retention::{self, DEFAULT_MAX_FILES},
  store::RecordStore,
};

use crate::{
  Result,
  document::{self, Records},
};

/// What a mutation did to the in-memory copy of the document.
enum Change<T> {
  /// Nothing changed; skip the flush.
  Unchanged(T),
  /// The copy was modified and must be flushed before it is committed.
  Changed(T),
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A record store backed by a single JSON file.
///
/// Every operation runs under one lock. A mutation is applied to a copy of
/// the document, the copy is flushed, and only then does it replace the
/// in-memory state, so a failed flush leaves the store unchanged.
///
/// Cloning is cheap; the records are reference-counted.
#[derive(Clone)]
pub struct JsonStore {
  path:      Option<Arc<PathBuf>>,
  max_files: usize,
  records:   Arc<Mutex<Records>>,
}

impl JsonStore {
  /// Open (or create) a store at `path`.
  ///
  /// A missing document is initialised empty and written immediately,
  /// creating parent directories as needed.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    let records = match document::read(&path).await? {
      Some(records) => records,
      None => {
        let records = Records::default();
        document::write(&path, &records).await?;
        records
      }
    };

    tracing::info!(
      path = %path.display(),
      questions = records.questions.len(),
      files = records.files.len(),
      "record store opened"
    );

    Ok(Self {
      path:      Some(Arc::new(path)),
      max_files: DEFAULT_MAX_FILES,
      records:   Arc::new(Mutex::new(records)),
    })
  }

  /// Open a store that never touches disk. Useful for testing.
  pub fn open_in_memory() -> Self {
    Self {
      path:      None,
      max_files: DEFAULT_MAX_FILES,
      records:   Arc::new(Mutex::new(Records::default())),
    }
  }

  /// Set how many files the retention policy keeps.
  pub fn with_max_files(mut self, max_files: usize) -> Self {
    self.max_files = max_files;
    self
  }

  /// Run `f` against a copy of the records and commit it if it changed.
  async fn mutate<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&mut Records) -> Result<Change<T>>,
  {
    let mut records = self.records.lock().await;
    let mut next = records.clone();
    match f(&mut next)? {
      Change::Unchanged(value) => Ok(value),
      Change::Changed(value) => {
        if let Some(path) = &self.path {
          document::write(path, &next).await?;
        }
        *records = next;
        Ok(value)
      }
    }
  }

  /// Read from the current records.
  async fn view<T>(&self, f: impl FnOnce(&Records) -> T) -> T {
    let records = self.records.lock().await;
    f(&records)
  }
}

/// Best-effort removal of locally cached bytes for evicted files.
async fn remove_cached(evicted: &[FileRecord]) {
  for file in evicted {
    let Some(path) = &file.local_path else { continue };
    match tokio::fs::remove_file(path).await {
      Ok(()) => tracing::debug!(file_id = %file.id, path = %path.display(), "removed cached upload"),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
      Err(e) => tracing::warn!(
        file_id = %file.id,
        path = %path.display(),
        error = %e,
        "failed to remove cached upload"
      ),
    }
  }
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for JsonStore {
  type Error = crate::Error;

  // ── Questions ─────────────────────────────────────────────────────────────

  async fn add_question(&self, text: String) -> Result<Question> {
    let question = Question::new(&text)?;
    let stored = question.clone();

    self
      .mutate(move |records| {
        records.questions.push(stored);
        Ok(Change::Changed(()))
      })
      .await?;

    tracing::info!(question_id = %question.id, "question added");
    Ok(question)
  }

  async fn delete_question(&self, id: Uuid) -> Result<bool> {
    let found = self
      .mutate(move |records| {
        let before = records.questions.len();
        records.questions.retain(|q| q.id != id);
        if records.questions.len() == before {
          Ok(Change::Unchanged(false))
        } else {
          Ok(Change::Changed(true))
        }
      })
      .await?;

    if found {
      tracing::info!(question_id = %id, "question deleted");
    }
    Ok(found)
  }

  async fn list_questions(&self) -> Result<Vec<Question>> {
    Ok(self.view(|r| r.questions.clone()).await)
  }

  async fn get_question(&self, id: Uuid) -> Result<Option<Question>> {
    Ok(
      self
        .view(|r| r.questions.iter().find(|q| q.id == id).cloned())
        .await,
    )
  }

  // ── Files ─────────────────────────────────────────────────────────────────

  async fn add_file(&self, input: NewFile) -> Result<AddedFile> {
    input.validate()?;
    let max_files = self.max_files;

    let added = self
      .mutate(move |records| {
        if let Some(existing) = records
          .files
          .iter()
          .find(|f| f.original_name == input.original_name)
        {
          return Ok(Change::Unchanged(AddedFile {
            file:     existing.clone(),
            existing: true,
            evicted:  Vec::new(),
          }));
        }

        let file = input.into_record();
        records.files.push(file.clone());
        let retention = retention::apply(std::mem::take(&mut records.files), max_files);
        records.files = retention.kept;

        Ok(Change::Changed(AddedFile {
          file,
          existing: false,
          evicted: retention.evicted,
        }))
      })
      .await?;

    if added.existing {
      tracing::info!(file_id = %added.file.id, name = %added.file.original_name, "file already recorded");
      return Ok(added);
    }

    tracing::info!(
      file_id = %added.file.id,
      name = %added.file.original_name,
      size = added.file.size,
      "file recorded"
    );
    for file in &added.evicted {
      tracing::info!(file_id = %file.id, name = %file.original_name, "file evicted by retention");
    }
    remove_cached(&added.evicted).await;

    Ok(added)
  }

  async fn list_files(&self) -> Result<Vec<FileRecord>> {
    Ok(self.view(|r| r.files.clone()).await)
  }

  async fn get_file(&self, id: Uuid) -> Result<Option<FileRecord>> {
    Ok(
      self
        .view(|r| r.files.iter().find(|f| f.id == id).cloned())
        .await,
    )
  }

  async fn find_file_by_name(&self, original_name: &str) -> Result<Option<FileRecord>> {
    Ok(
      self
        .view(|r| {
          r.files
            .iter()
            .find(|f| f.original_name == original_name)
            .cloned()
        })
        .await,
    )
  }

  // ── Answers ───────────────────────────────────────────────────────────────

  async fn add_answer(
    &self,
    file_id: Uuid,
    question_id: Uuid,
    question_text: String,
    answer_text: String,
  ) -> Result<bool> {
    let found = self
      .mutate(move |records| {
        let Some(file) = records.files.iter_mut().find(|f| f.id == file_id) else {
          return Ok(Change::Unchanged(false));
        };
        file.answers.push(Answer {
          question_id,
          question:   question_text,
          answer:     answer_text,
          created_at: Utc::now(),
        });
        Ok(Change::Changed(true))
      })
      .await?;

    if found {
      tracing::debug!(file_id = %file_id, question_id = %question_id, "answer recorded");
    }
    Ok(found)
  }
}
