//! Error type for `forum-store-sqlite`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("stored document is not a JSON object: {0}")]
  NotAnObject(Uuid),

  #[error("document not found: {path}/{id}")]
  DocumentNotFound { path: String, id: Uuid },

  #[error("an account already exists for {0}")]
  EmailTaken(String),

  #[error("password must be at least {0} characters")]
  WeakPassword(usize),

  #[error("invalid e-mail or password")]
  InvalidCredentials,

  #[error("no account for {0}")]
  UnknownEmail(String),

  #[error("not signed in")]
  NotSignedIn,

  #[error("password hashing failed: {0}")]
  PasswordHash(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
