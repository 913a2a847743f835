//! Retention policy: keep only the most recently created files.

use crate::file::FileRecord;

/// Number of files kept when no other limit is configured.
pub const DEFAULT_MAX_FILES: usize = 3;

/// The result of applying the retention policy.
#[derive(Debug, Clone, Default)]
pub struct Retention {
  /// Files to keep, in their original order.
  pub kept:    Vec<FileRecord>,
  /// Eviction candidates, oldest first.
  pub evicted: Vec<FileRecord>,
}

/// Split `files` into the `max_files` most recently created and the rest.
///
/// Files with equal `created_at` are ordered by position, so a later entry
/// counts as more recent.
pub fn apply(files: Vec<FileRecord>, max_files: usize) -> Retention {
  if files.len() <= max_files {
    return Retention { kept: files, evicted: Vec::new() };
  }

  let mut ranked: Vec<(usize, &FileRecord)> = files.iter().enumerate().collect();
  ranked.sort_by(|(ia, a), (ib, b)| {
    b.created_at.cmp(&a.created_at).then_with(|| ib.cmp(ia))
  });
  let mut keep = vec![false; files.len()];
  for (index, _) in ranked.into_iter().take(max_files) {
    keep[index] = true;
  }

  let mut retention = Retention::default();
  for (file, keep) in files.into_iter().zip(keep) {
    if keep {
      retention.kept.push(file);
    } else {
      retention.evicted.push(file);
    }
  }
  retention.evicted.sort_by_key(|f| f.created_at);
  retention
}
