//! Request and response bodies for the Anthropic HTTP API.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct MessagesRequest<'a> {
  pub model:      &'a str,
  pub max_tokens: u32,
  pub system:     &'a str,
  pub messages:   Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Message<'a> {
  pub role:    &'static str,
  pub content: Vec<ContentBlock<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ContentBlock<'a> {
  Text { text: String },
  Document { source: DocumentSource<'a> },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum DocumentSource<'a> {
  File { file_id: &'a str },
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessagesResponse {
  pub content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseBlock {
  #[serde(rename = "type")]
  pub kind: String,
  pub text: Option<String>,
}

impl MessagesResponse {
  /// Join every non-empty text block, in order, one per line.
  pub fn text(&self) -> String {
    self
      .content
      .iter()
      .filter(|b| b.kind == "text")
      .filter_map(|b| b.text.as_deref())
      .filter(|t| !t.is_empty())
      .collect::<Vec<_>>()
      .join("\n")
  }
}

/// The subset of a Files API object we use.
#[derive(Debug, Deserialize)]
pub(crate) struct FileObject {
  pub id: String,
}
