//! Folio kernel library.
//!
//! Review documents built from typed content blocks: the editing draft,
//! the access rules, the asset pipeline for images and the read side
//! (rendering and ranking). The `folio` binary is a thin CLI over this crate.

pub mod cli;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod file;
pub mod identity;
pub mod models;
pub mod permissions;

pub use error::{ContentError, ContentResult};
