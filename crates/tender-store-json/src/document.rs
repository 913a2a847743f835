//! On-disk layout: one JSON object holding every question and file.
//!
//! ```json
//! { "questions": [...], "files": [{ ..., "answers": [...] }] }
//! ```
//!
//! There is no schema version; documents written by anything else are not
//! supported.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tender_core::{file::FileRecord, question::Question};

use crate::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Records {
  #[serde(default)]
  pub questions: Vec<Question>,
  #[serde(default)]
  pub files:     Vec<FileRecord>,
}

/// Read the document at `path`, or `None` if it does not exist.
pub(crate) async fn read(path: &Path) -> Result<Option<Records>> {
  match tokio::fs::read(path).await {
    Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
    Err(e) => Err(e.into()),
  }
}

/// Replace the document at `path` in one step: write a sibling temp file,
/// then rename it over the target.
pub(crate) async fn write(path: &Path, records: &Records) -> Result<()> {
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    tokio::fs::create_dir_all(parent).await?;
  }

  let bytes = serde_json::to_vec_pretty(records)?;
  let tmp = temp_path(path);
  tokio::fs::write(&tmp, bytes).await?;
  if let Err(e) = tokio::fs::rename(&tmp, path).await {
    let _ = tokio::fs::remove_file(&tmp).await;
    return Err(e.into());
  }
  Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
  let mut name = path.as_os_str().to_owned();
  name.push(".tmp");
  PathBuf::from(name)
}
