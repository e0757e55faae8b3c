//! Entity model: users, posts, comments and favorite markers.
//!
//! Plain values with no behaviour beyond conversion to and from
//! [`Document`]s. Timestamps travel as epoch milliseconds so the store can
//! order them numerically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Result,
  document::{Document, Entity, Fields, decode_fields, encode_fields},
};

/// Field names shared between entities, queries and partial updates.
pub mod field {
  pub const POST_ID: &str = "post_id";
  pub const CREATED_AT: &str = "created_at";
  pub const ADDED_AT: &str = "added_at";
  pub const TOPIC: &str = "topic";
  pub const CONTENT: &str = "content";
}

/// Author name stamped on content written by a user with no name or e-mail.
pub const ANONYMOUS: &str = "Anonymous";

// ─── User ────────────────────────────────────────────────────────────────────

/// Identity snapshot taken from the directory session. Never stored by the
/// sync layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:      Uuid,
  /// May be empty until the user picks one.
  pub display_name: String,
  pub email:        String,
}

impl User {
  /// The name written into `author_name` of new posts and comments.
  pub fn author_label(&self) -> &str {
    if !self.display_name.trim().is_empty() {
      &self.display_name
    } else if !self.email.is_empty() {
      &self.email
    } else {
      ANONYMOUS
    }
  }

  /// The name shown on the profile header: display name, else the local part
  /// of the e-mail.
  pub fn short_name(&self) -> &str {
    if !self.display_name.trim().is_empty() {
      return &self.display_name;
    }
    match self.email.split_once('@') {
      Some((local, _)) if !local.is_empty() => local,
      _ if !self.email.is_empty() => &self.email,
      _ => ANONYMOUS,
    }
  }
}

// ─── Post ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
  pub post_id:     Uuid,
  pub author_id:   Uuid,
  pub author_name: String,
  pub topic:       String,
  pub content:     String,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub created_at:  DateTime<Utc>,
}

impl Entity for Post {
  const KIND: &'static str = "post";

  fn id(&self) -> Uuid { self.post_id }

  fn from_document(doc: Document) -> Result<Self> {
    decode_fields(Self::KIND, doc)
  }

  fn to_fields(&self) -> Result<Fields> { encode_fields(self) }
}

// ─── Comment ─────────────────────────────────────────────────────────────────

/// A comment, scoped under exactly one post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
  pub comment_id:  Uuid,
  pub post_id:     Uuid,
  pub author_id:   Uuid,
  pub author_name: String,
  pub content:     String,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub created_at:  DateTime<Utc>,
}

impl Entity for Comment {
  const KIND: &'static str = "comment";

  fn id(&self) -> Uuid { self.comment_id }

  fn from_document(doc: Document) -> Result<Self> {
    decode_fields(Self::KIND, doc)
  }

  fn to_fields(&self) -> Result<Fields> { encode_fields(self) }
}

// ─── FavoriteMark ────────────────────────────────────────────────────────────

/// Marker document under `users/{user_id}/favorites`. Its document id is the
/// post id; only `added_at` is stored as a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteMark {
  pub post_id:  Uuid,
  pub added_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
struct RawMark {
  #[serde(with = "chrono::serde::ts_milliseconds")]
  added_at: DateTime<Utc>,
}

impl Entity for FavoriteMark {
  const KIND: &'static str = "favorite";

  fn id(&self) -> Uuid { self.post_id }

  fn from_document(doc: Document) -> Result<Self> {
    let post_id = doc.id;
    let raw: RawMark = decode_fields(Self::KIND, doc)?;
    Ok(Self { post_id, added_at: raw.added_at })
  }

  fn to_fields(&self) -> Result<Fields> {
    encode_fields(&RawMark { added_at: self.added_at })
  }
}
