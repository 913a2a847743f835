//! The `DocumentService` trait: the external document-QA capability.

use std::future::Future;

/// Opaque handle for a file registered with a [`DocumentService`].
pub type ExternalRef = String;

/// Fixed instruction sent with every question.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions based on \
document content accurately and concisely. The document is about public tenders. Please provide \
concise answers. If it is a conditional question, return just YES/NO. For invalid questions, \
return the answer Invalid question.";

/// Wrap a user question in the per-request instruction.
pub fn question_prompt(question: &str) -> String {
  format!(
    "Based on the document provided, please answer the following question: {question}. \
     Be accurate and concise."
  )
}

/// Abstraction over an external document question-answering service.
///
/// Every call is a single attempt; retries, timeouts and backoff are left to
/// the implementation's HTTP client defaults.
pub trait DocumentService: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Register raw PDF bytes and return the service's reference for them.
  fn register(
    &self,
    file_name: String,
    bytes: Vec<u8>,
  ) -> impl Future<Output = Result<ExternalRef, Self::Error>> + Send + '_;

  /// Ask `question` against one or more registered documents and return the
  /// concatenated text of the answer.
  fn ask<'a>(
    &'a self,
    external_refs: &'a [ExternalRef],
    question: &'a str,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;

  /// Release a registered document. Callers treat failure as non-fatal.
  fn release<'a>(
    &'a self,
    external_ref: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
