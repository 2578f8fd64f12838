//! Offline source-content library.
//!
//! Content (projects, source languages, resources, chapters, frames, notes
//! and key terms) is kept in hierarchical on-disk indexes and synchronized
//! against a remote catalog by comparing per-entity modification stamps.

pub mod cmd;
pub mod config;
pub mod error;
pub mod fetch;
pub mod index;
pub mod languages;
pub mod library;
pub mod lock;
pub mod sync;
pub mod types;
pub mod updates;
pub mod util;

pub use error::{Error, Result};
pub use fetch::{CatalogTransport, Endpoints, HttpTransport};
pub use index::{IndexPath, IndexStore, MergeMode, MergeReport, SourceTranslation};
pub use library::{CatalogView, Library, LibraryOptions, PreviewLibrary, ProjectCategory};
pub use sync::{Progress, ProgressListener, SyncOutcome};
pub use updates::UpdateSet;
