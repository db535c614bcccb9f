//! Core domain types for the trellis workflow suite.
//!
//! This crate provides the strongly-typed entity identifiers and the shared
//! `Result` alias used by the rest of the workspace.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ParseIdError, RunId, TemplateId};
