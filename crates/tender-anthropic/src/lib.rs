//! Anthropic-backed [`DocumentService`](tender_core::document::DocumentService).
//!
//! Files are registered through the Files API and questions are answered by
//! the Messages API with the registered files attached as documents.

mod client;
mod wire;

pub mod error;

pub use client::{AnthropicClient, AnthropicConfig};
pub use error::{Error, Result};
