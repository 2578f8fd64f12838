use std::{io, path::PathBuf};

use thiserror::Error;

/// Main error type for the srclib crate.
///
/// Storage failures, malformed documents, transport failures and
/// interruption are kept as distinct variants so callers can tell an
/// unreachable catalog apart from a damaged index.
#[derive(Debug, Error)]
pub enum Error {
   /// I/O error that is not tied to a specific index location.
   #[error("io error: {0}")]
   Io(#[from] io::Error),

   /// I/O error while reading or writing an index location.
   #[error("storage error during {op} at {}: {source}", .path.display())]
   Storage {
      op:     &'static str,
      path:   PathBuf,
      #[source]
      source: io::Error,
   },

   /// A document exists but does not have the required structure.
   #[error("malformed document at {path}: {reason}")]
   Malformed { path: String, reason: String },

   /// An entity id cannot be used as an index path segment.
   #[error("invalid entity id {0:?}")]
   InvalidId(String),

   /// Configuration-related error occurred.
   #[error("config error: {0}")]
   Config(#[from] ConfigError),

   /// HTTP request or response error occurred.
   #[error("http error: {0}")]
   Http(#[from] HttpError),

   /// Archive packing or unpacking failed.
   #[error("archive error: {0}")]
   Archive(#[from] ArchiveError),

   /// JSON serialization or deserialization error occurred.
   #[error("json error: {0}")]
   Json(#[from] serde_json::Error),

   /// The remote catalog could not be queried at all.
   #[error("update check failed: {0}")]
   UpdateCheck(String),

   /// A cancellation signal was observed at a checkpoint.
   #[error("operation cancelled")]
   Cancelled,

   /// Another synchronization run holds the library lock.
   #[error("library is busy: another synchronization run holds {}", .0.display())]
   Busy(PathBuf),

   /// The index root is a container; it never holds a document.
   #[error("the index root has no document")]
   RootDocument,
}

impl Error {
   pub(crate) fn storage(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
      Self::Storage { op, path: path.into(), source }
   }

   pub fn exit_code(&self) -> i32 {
      match self {
         Self::Busy(_) => 10,
         Self::Http(_) | Self::UpdateCheck(_) => 11,
         Self::Cancelled => 12,
         Self::Malformed { .. } | Self::Archive(_) => 13,
         _ => 1,
      }
   }
}

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
   /// A configured URL is not usable as an API root.
   #[error("invalid catalog url {0:?}: expected an http(s) url")]
   InvalidUrl(String),
}

/// Errors that can occur during HTTP operations.
#[derive(Debug, Error)]
pub enum HttpError {
   /// HTTP request failed (network error, timeout, etc.).
   #[error("request failed: {0}")]
   Request(#[from] reqwest::Error),

   /// Received a non-success HTTP status code.
   #[error("GET {url} returned HTTP {status}")]
   StatusCode { url: String, status: u16 },
}

/// Errors that can occur while exporting or importing index archives.
#[derive(Debug, Error)]
pub enum ArchiveError {
   /// The archive does not match its checksum sidecar.
   #[error("checksum mismatch: expected {expected}, got {actual}")]
   ChecksumMismatch { expected: String, actual: String },

   /// There is nothing to export.
   #[error("index root {} does not exist", .0.display())]
   MissingRoot(PathBuf),
}

/// Standard result type using [`enum@Error`] as the default error type
pub type Result<T, E = Error> = std::result::Result<T, E>;
