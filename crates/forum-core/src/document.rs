//! The untyped document shape exchanged with the store, and the [`Entity`]
//! trait that converts typed entities to and from it.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{Error, Result};

/// Top-level fields of a document.
pub type Fields = Map<String, Value>;

/// One document as stored: an id within its collection plus a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
  pub id:     Uuid,
  pub fields: Fields,
}

impl Document {
  pub fn new(id: Uuid, fields: Fields) -> Self { Self { id, fields } }
}

/// A typed value that lives in a document collection.
pub trait Entity: Sized {
  /// Short name used in logs and decode errors.
  const KIND: &'static str;

  fn id(&self) -> Uuid;

  fn from_document(doc: Document) -> Result<Self>;

  fn to_fields(&self) -> Result<Fields>;
}

/// Decode a document whose fields are the serde form of `T`.
pub(crate) fn decode_fields<T: DeserializeOwned>(
  kind: &'static str,
  doc: Document,
) -> Result<T> {
  serde_json::from_value(Value::Object(doc.fields))
    .map_err(|source| Error::Decode { kind, id: doc.id, source })
}

/// Encode `value` as a field map. Fails if it does not serialise to an object.
pub fn encode_fields<T: Serialize>(value: &T) -> Result<Fields> {
  match serde_json::to_value(value)? {
    Value::Object(map) => Ok(map),
    other => Err(Error::Serialization(serde::ser::Error::custom(format!(
      "expected a JSON object, got {other}"
    )))),
  }
}

/// Build a field map from `(name, value)` pairs, for partial updates.
pub fn fields<const N: usize>(pairs: [(&str, Value); N]) -> Fields {
  pairs
    .into_iter()
    .map(|(k, v)| (k.to_owned(), v))
    .collect()
}
