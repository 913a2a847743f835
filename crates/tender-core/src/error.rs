//! Error types for `tender-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid question: {0}")]
  InvalidQuestion(String),

  #[error("invalid file: {0}")]
  InvalidFile(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
