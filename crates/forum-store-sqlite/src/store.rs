//! [`SqliteStore`]: the SQLite implementation of [`DocumentStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use forum_core::{
  document::{Document, Fields},
  path::{CollectionPath, Query},
  store::{DocumentStore, SnapshotStream},
};

use crate::{
  Error, Result,
  encode::{RawDocument, encode_fields, encode_uuid, json_path},
  schema::SCHEMA,
};

/// Change notifications buffered per subscriber before it lags. A lagging
/// subscriber re-queries, so the bound only limits redundant work.
const CHANGE_BUFFER: usize = 64;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A document store backed by a single SQLite file.
///
/// Every successful write broadcasts the collection it touched; each live
/// subscription re-runs its query when its collection changes and pushes the
/// full result. Cloning is cheap and clones share subscribers.
#[derive(Clone)]
pub struct SqliteStore {
  conn:    tokio_rusqlite::Connection,
  changes: broadcast::Sender<CollectionPath>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::with_connection(conn).await
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::with_connection(conn).await
  }

  async fn with_connection(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    let (changes, _) = broadcast::channel(CHANGE_BUFFER);
    Ok(Self { conn, changes })
  }

  fn notify(&self, path: CollectionPath) {
    // No receivers simply means nobody is subscribed.
    let _ = self.changes.send(path);
  }

  /// Run `query` once and return the matching documents in query order.
  async fn run_query(&self, query: &Query) -> Result<Vec<Document>> {
    let mut sql = String::from(
      "SELECT doc_id, fields_json FROM documents WHERE collection = ?1",
    );
    let mut params: Vec<String> = vec![query.path.to_string()];

    if let Some(filter) = &query.where_in {
      let ids: Vec<String> = filter.values.iter().copied().map(encode_uuid).collect();
      params.push(json_path(filter.field));
      params.push(serde_json::to_string(&ids)?);
      sql.push_str(&format!(
        " AND json_extract(fields_json, ?{}) IN (SELECT value FROM json_each(?{}))",
        params.len() - 1,
        params.len(),
      ));
    }

    match &query.order_by {
      Some(order) => {
        params.push(json_path(order.field));
        sql.push_str(&format!(
          " ORDER BY json_extract(fields_json, ?{}) {}, doc_id",
          params.len(),
          order.direction,
        ));
      }
      None => sql.push_str(" ORDER BY doc_id"),
    }

    let raws: Vec<RawDocument> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), |row| {
            Ok(RawDocument {
              doc_id:      row.get(0)?,
              fields_json: row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDocument::into_document).collect()
  }
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for SqliteStore {
  type Error = Error;

  async fn subscribe(&self, query: Query) -> Result<SnapshotStream<Error>> {
    // Listen before the initial read so no write can fall between the two.
    let mut changes = self.changes.subscribe();
    let initial = self.run_query(&query).await?;

    let (tx, stream) = SnapshotStream::channel();
    tx.send(Ok(initial));

    let store = self.clone();
    tokio::spawn(async move {
      loop {
        tokio::select! {
          _ = tx.closed() => break,
          changed = changes.recv() => match changed {
            Ok(path) if path != query.path => continue,
            Ok(_) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => break,
          },
        }
        if !tx.send(store.run_query(&query).await) {
          break;
        }
      }
      tracing::debug!(path = %query.path, "subscription closed");
    });

    Ok(stream)
  }

  async fn get_one(&self, path: CollectionPath, id: Uuid) -> Result<Option<Document>> {
    let collection = path.to_string();
    let id_str = encode_uuid(id);

    let raw: Option<RawDocument> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT doc_id, fields_json FROM documents
             WHERE collection = ?1 AND doc_id = ?2",
            rusqlite::params![collection, id_str],
            |row| {
              Ok(RawDocument {
                doc_id:      row.get(0)?,
                fields_json: row.get(1)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawDocument::into_document).transpose()
  }

  async fn create_or_replace(
    &self,
    path:   CollectionPath,
    id:     Option<Uuid>,
    fields: Fields,
  ) -> Result<Uuid> {
    let id = id.unwrap_or_else(|| self.allocate_id(path));
    let collection  = path.to_string();
    let id_str      = encode_uuid(id);
    let fields_json = encode_fields(&fields)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO documents (collection, doc_id, fields_json) VALUES (?1, ?2, ?3)
           ON CONFLICT (collection, doc_id) DO UPDATE SET fields_json = excluded.fields_json",
          rusqlite::params![collection, id_str, fields_json],
        )?;
        Ok(())
      })
      .await?;

    self.notify(path);
    Ok(id)
  }

  async fn update_fields(
    &self,
    path:   CollectionPath,
    id:     Uuid,
    fields: Fields,
  ) -> Result<()> {
    let collection = path.to_string();
    let id_str     = encode_uuid(id);
    let patch      = encode_fields(&fields)?;

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE documents SET fields_json = json_patch(fields_json, ?3)
           WHERE collection = ?1 AND doc_id = ?2",
          rusqlite::params![collection, id_str, patch],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::DocumentNotFound { path: path.to_string(), id });
    }
    self.notify(path);
    Ok(())
  }

  async fn delete(&self, path: CollectionPath, id: Uuid) -> Result<()> {
    let collection = path.to_string();
    let id_str     = encode_uuid(id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM documents WHERE collection = ?1 AND doc_id = ?2",
          rusqlite::params![collection, id_str],
        )?;
        Ok(())
      })
      .await?;

    self.notify(path);
    Ok(())
  }
}
