//! Unroller Core — content model, reference extraction and the unrolling
//! engine.
//!
//! This crate has no HTTP server concerns; it only reads from upstream
//! content sources.
//!
//! # Modules
//!
//! - [`content`]: The content document model
//! - [`ids`]: UUID extraction and synthesized ids
//! - [`body`]: Embedded reference extraction from body markup
//! - [`schema`]: The per-request reference schema
//! - [`source`]: Content sources (batch, preview, retry, mock)
//! - [`unroller`]: The unroll operations
//! - [`error`]: Error types and Result alias

#![doc = include_str!("../README.md")]

pub mod body;
pub mod content;
pub mod error;
pub mod ids;
pub mod schema;
pub mod source;
pub mod unroller;

// Re-export key types at crate root for convenience
pub use content::{Content, Field};
pub use error::{Error, Result, UnrollError};
pub use source::{BatchReader, ContentMap, ContentSource, ContentSources, PreviewReader};
pub use unroller::{ContentUnroller, UnrollEvent};
