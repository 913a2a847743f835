//! A scripted [`DocumentService`] for tests.

use std::{
  collections::HashSet,
  sync::{
    Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
  },
};

use tender_core::document::{DocumentService, ExternalRef};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("mock document service: {0}")]
pub struct MockError(String);

/// Answers every question with `"<question> @ <external_ref>"` and counts
/// calls. Individual (reference, question) pairs can be made to fail.
#[derive(Default)]
pub struct MockDocuments {
  registered:    AtomicUsize,
  asked:         AtomicUsize,
  fail_register: AtomicBool,
  failing:       Mutex<HashSet<(String, String)>>,
  released:      Mutex<Vec<String>>,
}

impl MockDocuments {
  pub fn new() -> Self { Self::default() }

  pub fn registrations(&self) -> usize { self.registered.load(Ordering::SeqCst) }

  pub fn asks(&self) -> usize { self.asked.load(Ordering::SeqCst) }

  pub fn released(&self) -> Vec<String> { self.released.lock().unwrap().clone() }

  pub fn fail_registrations(&self) { self.fail_register.store(true, Ordering::SeqCst); }

  pub fn fail_on(&self, external_ref: &str, question: &str) {
    self
      .failing
      .lock()
      .unwrap()
      .insert((external_ref.to_string(), question.to_string()));
  }

  pub fn clear_failures(&self) { self.failing.lock().unwrap().clear(); }
}

impl DocumentService for MockDocuments {
  type Error = MockError;

  async fn register(&self, file_name: String, _bytes: Vec<u8>) -> Result<ExternalRef, MockError> {
    if self.fail_register.load(Ordering::SeqCst) {
      return Err(MockError(format!("upload of {file_name} rejected")));
    }
    let n = self.registered.fetch_add(1, Ordering::SeqCst);
    Ok(format!("file_{n}"))
  }

  async fn ask(&self, external_refs: &[ExternalRef], question: &str) -> Result<String, MockError> {
    self.asked.fetch_add(1, Ordering::SeqCst);
    // Give overlapping callers a chance to interleave.
    tokio::task::yield_now().await;

    let external_ref = external_refs.join(",");
    let fails = self
      .failing
      .lock()
      .unwrap()
      .contains(&(external_ref.clone(), question.to_string()));
    if fails {
      return Err(MockError(format!("no answer for {question:?} on {external_ref}")));
    }
    Ok(format!("{question} @ {external_ref}"))
  }

  async fn release(&self, external_ref: &str) -> Result<(), MockError> {
    self.released.lock().unwrap().push(external_ref.to_string());
    Ok(())
  }
}
