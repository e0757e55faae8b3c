//! Error types for `forum-core`.
//!
//! Every failure the sync layer reports falls into one of four classes (see
//! [`Failure`]). The `Display` text of an [`Error`] is short enough to be
//! shown to the user as a transient notice.

use thiserror::Error;
use uuid::Uuid;

/// Boxed error from one of the external services.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  /// A required field was blank; raised before anything is dispatched.
  #[error("{0}")]
  Validation(&'static str),

  #[error("not signed in")]
  Unauthenticated,

  #[error("authentication failed: {0}")]
  Auth(#[source] BoxError),

  #[error("write rejected: {0}")]
  Write(#[source] BoxError),

  #[error("read failed: {0}")]
  Read(#[source] BoxError),

  #[error("malformed {kind} document {id}: {source}")]
  Decode {
    kind:   &'static str,
    id:     Uuid,
    #[source]
    source: serde_json::Error,
  },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

/// Failure class of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
  /// Bad credential, missing session, or directory unreachable.
  Auth,
  /// Create, update or delete rejected.
  Write,
  /// Subscription or one-shot fetch failed.
  Read,
  /// Caught locally; never reached the network.
  Validation,
}

impl Error {
  pub fn failure(&self) -> Failure {
    match self {
      Self::Validation(_) => Failure::Validation,
      Self::Unauthenticated | Self::Auth(_) => Failure::Auth,
      Self::Write(_) | Self::Serialization(_) => Failure::Write,
      Self::Read(_) | Self::Decode { .. } => Failure::Read,
    }
  }

  pub fn auth(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Auth(Box::new(e))
  }

  pub fn write(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Write(Box::new(e))
  }

  pub fn read(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Read(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
