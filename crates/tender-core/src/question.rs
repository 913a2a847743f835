//! Questions: free-text queries asked against every stored file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// A user-submitted question. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
  /// Time-ordered (v7) so ids sort by creation.
  pub id:         Uuid,
  pub text:       String,
  pub created_at: DateTime<Utc>,
}

impl Question {
  /// Build a question with a fresh id and the current timestamp.
  ///
  /// The text is trimmed; empty or whitespace-only text is rejected.
  pub fn new(text: &str) -> Result<Self> {
    Ok(Self {
      id:         Uuid::now_v7(),
      text:       validate_text(text)?,
      created_at: Utc::now(),
    })
  }
}

/// Normalise question text, rejecting anything empty after trimming.
pub fn validate_text(text: &str) -> Result<String> {
  let trimmed = text.trim();
  if trimmed.is_empty() {
    return Err(Error::InvalidQuestion("question text must not be empty".into()));
  }
  Ok(trimmed.to_owned())
}
