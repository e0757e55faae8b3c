//! The `DocumentStore` trait and its realtime snapshot stream.
//!
//! The trait is implemented by storage backends (e.g. `forum-store-sqlite`).
//! The sync layer depends on this abstraction, not on any concrete backend.

use std::future::Future;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
  document::{Document, Fields},
  path::{CollectionPath, Query},
};

// ─── Snapshot stream ─────────────────────────────────────────────────────────

type Snapshot<E> = Result<Vec<Document>, E>;

/// Receiving half of a realtime subscription.
///
/// Every item is a full snapshot of the query result; there are no deltas.
/// Dropping the stream tells the store to stop pushing.
#[derive(Debug)]
pub struct SnapshotStream<E> {
  rx: mpsc::UnboundedReceiver<Snapshot<E>>,
}

/// Sending half of a realtime subscription, held by the store.
#[derive(Debug)]
pub struct SnapshotSender<E> {
  tx: mpsc::UnboundedSender<Snapshot<E>>,
}

impl<E> Clone for SnapshotSender<E> {
  fn clone(&self) -> Self { Self { tx: self.tx.clone() } }
}

impl<E> SnapshotStream<E> {
  /// Create a connected sender/stream pair.
  pub fn channel() -> (SnapshotSender<E>, SnapshotStream<E>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SnapshotSender { tx }, SnapshotStream { rx })
  }

  /// Wait for the next snapshot. `None` once the store stops pushing.
  pub async fn next(&mut self) -> Option<Snapshot<E>> { self.rx.recv().await }
}

impl<E> SnapshotSender<E> {
  /// Push one snapshot. Returns `false` if the subscriber has gone away.
  pub fn send(&self, snapshot: Snapshot<E>) -> bool {
    self.tx.send(snapshot).is_ok()
  }

  pub fn is_closed(&self) -> bool { self.tx.is_closed() }

  /// Resolves once the subscriber drops its [`SnapshotStream`].
  pub async fn closed(&self) { self.tx.closed().await }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the remote document store: CRUD on id-keyed JSON
/// documents grouped in collections, plus realtime query subscriptions.
///
/// All methods return `Send` futures so the trait can be used from spawned
/// tokio tasks.
pub trait DocumentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Reserve a fresh document id in `path` without writing anything.
  fn allocate_id(&self, path: CollectionPath) -> Uuid {
    let _ = path;
    Uuid::new_v4()
  }

  /// Start a realtime subscription. The first item is the current result of
  /// `query`; later items follow every change to the queried collection.
  fn subscribe(
    &self,
    query: Query,
  ) -> impl Future<Output = Result<SnapshotStream<Self::Error>, Self::Error>>
  + Send
  + '_;

  /// Fetch one document. Returns `None` if it does not exist.
  fn get_one(
    &self,
    path: CollectionPath,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Document>, Self::Error>> + Send + '_;

  /// Write a whole document, replacing any existing one. The store assigns
  /// an id when `id` is `None`; the id written is returned.
  fn create_or_replace(
    &self,
    path: CollectionPath,
    id: Option<Uuid>,
    fields: Fields,
  ) -> impl Future<Output = Result<Uuid, Self::Error>> + Send + '_;

  /// Overwrite the given top-level fields of an existing document, leaving
  /// the others untouched. Fails if the document does not exist.
  fn update_fields(
    &self,
    path: CollectionPath,
    id: Uuid,
    fields: Fields,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete a document. Deleting a missing document succeeds.
  fn delete(
    &self,
    path: CollectionPath,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
