//! JSON flat-file backend for the tender record store.
//!
//! The whole record set lives in memory behind a single lock and is flushed
//! to one JSON document on every mutation.

mod document;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::JsonStore;
