//! Error type for `tender-anthropic`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("no Anthropic API key configured")]
  MissingApiKey,

  #[error("failed to build HTTP client: {0}")]
  Client(#[from] reqwest::Error),

  #[error("file upload failed: {0}")]
  Upload(String),

  #[error("question failed: {0}")]
  Query(String),

  #[error("file release failed: {0}")]
  Release(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
