//! Rendition ladder: the fixed catalog of output variants and the selector
//! that picks the subset a given source can produce.
//!
//! # Example
//!
//! ```ignore
//! use vidladder_core::ladder::RenditionCatalog;
//!
//! let catalog = RenditionCatalog::default();
//! let ladder = catalog.select(500);
//! assert_eq!(ladder.len(), 2); // 480p, 360p
//! ```

mod catalog;
mod types;

pub use catalog::{default_renditions, select_ladder, RenditionCatalog};
pub use types::{FrameSize, RenditionSpec};

use thiserror::Error;

/// Errors raised while building a rendition catalog.
#[derive(Debug, Error)]
pub enum LadderError {
    #[error("Rendition catalog is empty")]
    EmptyCatalog,

    #[error("Duplicate rendition name: {0}")]
    DuplicateRendition(String),

    #[error("Invalid rendition '{name}': {reason}")]
    InvalidRendition { name: String, reason: String },
}
