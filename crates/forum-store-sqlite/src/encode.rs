//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps outside documents are RFC 3339 strings. UUIDs are hyphenated
//! lowercase strings, which is also how serde writes them into documents, so
//! `json_extract` comparisons against encoded ids line up.

use chrono::{DateTime, Utc};
use forum_core::{
  document::{Document, Fields},
  entity::User,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

// ─── Fields ───────────────────────────────────────────────────────────────────

pub fn encode_fields(fields: &Fields) -> Result<String> {
  Ok(serde_json::to_string(fields)?)
}

/// JSON path selecting a top-level field, for `json_extract`.
pub fn json_path(field: &str) -> String { format!("$.{field}") }

// ─── Raw row types ────────────────────────────────────────────────────────────

/// A `documents` row before parsing.
pub struct RawDocument {
  pub doc_id:      String,
  pub fields_json: String,
}

impl RawDocument {
  pub fn into_document(self) -> Result<Document> {
    let id = decode_uuid(&self.doc_id)?;
    match serde_json::from_str(&self.fields_json)? {
      Value::Object(fields) => Ok(Document::new(id, fields)),
      _ => Err(Error::NotAnObject(id)),
    }
  }
}

/// A `users` row before parsing, without the password hash.
pub struct RawUser {
  pub user_id:      String,
  pub display_name: String,
  pub email:        String,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:      decode_uuid(&self.user_id)?,
      display_name: self.display_name,
      email:        self.email,
    })
  }
}
