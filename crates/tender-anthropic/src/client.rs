//! [`AnthropicClient`] — the Anthropic implementation of [`DocumentService`].

use reqwest::{
  Client, Method, RequestBuilder, Response,
  multipart::{Form, Part},
};
use serde::Deserialize;
use tender_core::document::{DocumentService, ExternalRef, SYSTEM_PROMPT, question_prompt};

use crate::{
  Error, Result,
  wire::{ContentBlock, DocumentSource, FileObject, Message, MessagesRequest, MessagesResponse},
};

const API_VERSION: &str = "2023-06-01";
const FILES_BETA: &str = "files-api-2025-04-14";
const PDF_MIME: &str = "application/pdf";

// ─── Configuration ───────────────────────────────────────────────────────────

/// Connection settings for the Anthropic API.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnthropicConfig {
  /// Falls back to `ANTHROPIC_API_KEY` when left empty (resolved by the
  /// server binary).
  pub api_key:    String,
  pub model:      String,
  pub max_tokens: u32,
  pub base_url:   String,
}

impl Default for AnthropicConfig {
  fn default() -> Self {
    Self {
      api_key:    String::new(),
      model:      "claude-sonnet-4-20250514".to_string(),
      max_tokens: 4096,
      base_url:   "https://api.anthropic.com".to_string(),
    }
  }
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Async client for the Anthropic Files and Messages APIs.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based. No timeout
/// or retry is layered on top of the HTTP client defaults.
#[derive(Clone)]
pub struct AnthropicClient {
  client: Client,
  config: AnthropicConfig,
}

impl AnthropicClient {
  pub fn new(config: AnthropicConfig) -> Result<Self> {
    if config.api_key.is_empty() {
      return Err(Error::MissingApiKey);
    }
    let client = Client::builder().build()?;

    tracing::info!(
      model = %config.model,
      max_tokens = config.max_tokens,
      "Anthropic client initialised"
    );
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    self
      .client
      .request(method, self.url(path))
      .header("x-api-key", &self.config.api_key)
      .header("anthropic-version", API_VERSION)
      .header("anthropic-beta", FILES_BETA)
  }
}

/// Turn a non-2xx response into `"<status>: <body>"`.
async fn check_status(resp: Response) -> Result<Response, String> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let body = resp.text().await.unwrap_or_default();
  Err(format!("{status}: {body}"))
}

// ─── DocumentService impl ────────────────────────────────────────────────────

impl DocumentService for AnthropicClient {
  type Error = Error;

  async fn register(&self, file_name: String, bytes: Vec<u8>) -> Result<ExternalRef> {
    let size = bytes.len();
    tracing::info!(name = %file_name, size, "uploading file to Anthropic");

    let part = Part::bytes(bytes)
      .file_name(file_name.clone())
      .mime_str(PDF_MIME)
      .map_err(|e| Error::Upload(e.to_string()))?;

    let resp = self
      .request(Method::POST, "/v1/files")
      .multipart(Form::new().part("file", part))
      .send()
      .await
      .map_err(|e| Error::Upload(e.to_string()))?;
    let resp = check_status(resp).await.map_err(Error::Upload)?;

    let file: FileObject = resp
      .json()
      .await
      .map_err(|e| Error::Upload(format!("unexpected response: {e}")))?;

    tracing::info!(name = %file_name, external_ref = %file.id, "file uploaded");
    Ok(file.id)
  }

  async fn ask(&self, external_refs: &[ExternalRef], question: &str) -> Result<String> {
    if external_refs.is_empty() {
      return Err(Error::Query("no documents to ask about".into()));
    }
    tracing::info!(?external_refs, question, "asking question about file");

    let mut content = vec![ContentBlock::Text { text: question_prompt(question) }];
    content.extend(external_refs.iter().map(|id| ContentBlock::Document {
      source: DocumentSource::File { file_id: id },
    }));

    let body = MessagesRequest {
      model:      &self.config.model,
      max_tokens: self.config.max_tokens,
      system:     SYSTEM_PROMPT,
      messages:   vec![Message { role: "user", content }],
    };

    let resp = self
      .request(Method::POST, "/v1/messages")
      .json(&body)
      .send()
      .await
      .map_err(|e| Error::Query(e.to_string()))?;
    let resp = check_status(resp).await.map_err(Error::Query)?;

    let parsed: MessagesResponse = resp
      .json()
      .await
      .map_err(|e| Error::Query(format!("unexpected response: {e}")))?;
    let answer = parsed.text();

    tracing::info!(
      ?external_refs,
      question_length = question.len(),
      answer_length = answer.len(),
      "received answer from Anthropic"
    );
    Ok(answer)
  }

  async fn release(&self, external_ref: &str) -> Result<()> {
    let resp = self
      .request(Method::DELETE, &format!("/v1/files/{external_ref}"))
      .send()
      .await
      .map_err(|e| Error::Release(e.to_string()))?;
    check_status(resp).await.map_err(Error::Release)?;

    tracing::info!(external_ref, "file released");
    Ok(())
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
