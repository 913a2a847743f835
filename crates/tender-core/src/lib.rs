//! Core types and trait definitions for the tender question service.
//!
//! This crate is deliberately free of HTTP and filesystem dependencies.
//! Storage backends and document-service adapters implement the traits here;
//! the API layer depends only on those traits.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod document;
pub mod error;
pub mod file;
pub mod question;
pub mod retention;
pub mod store;

pub use error::{Error, Result};
