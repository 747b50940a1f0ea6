//! Translation subsystem.
//!
//! # Responsibilities
//! - Wrap each extracted text in a marker carrying its origin index
//! - Pack wrapped texts into size-bounded chunks
//! - Translate all chunks concurrently, all-or-nothing
//! - Recover the per-entry translations from the marker stream
//!
//! # Design Decisions
//! - Translators are plain string-to-string services behind [`Translate`]
//! - Chunk results are ordered by chunk index, never by completion order
//! - No retries; a failed or timed-out chunk fails the request

pub mod backend;
pub mod chunk;
pub mod engine;
pub mod error;
pub mod marker;
pub mod papago;

pub use backend::{Passthrough, Translate, TranslatorBackend};
pub use chunk::Chunk;
pub use engine::TranslationEngine;
pub use error::TranslateError;
pub use papago::Papago;
