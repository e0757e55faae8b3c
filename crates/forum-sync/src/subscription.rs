//! The subscription manager: a small registry of realtime subscriptions,
//! keyed by logical stream, that feeds [`Projections`].
//!
//! Each live subscription is a spawned task tagged with a generation number.
//! A snapshot is applied only while its generation is still the registered
//! one for its key, and the check and the projection write happen under the
//! registry lock. Replacing or clearing a stream therefore cuts off the old
//! task's deliveries immediately, even if the task has not yet observed its
//! abort.
//!
//! Favorites are derived in two hops. A snapshot on
//! [`StreamKey::FavoriteIds`] replaces the id set and then (re)starts
//! [`StreamKey::FavoritePosts`] with a membership query over that set. The
//! edge is one-directional: nothing on the posts side feeds back.

use std::{
  collections::{BTreeSet, HashMap},
  sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use forum_core::{
  document::{Document, Entity},
  entity::{Comment, Post},
  path::Query,
  store::DocumentStore,
};
use strum::Display;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::projection::Projections;

// ─── Keys and handles ────────────────────────────────────────────────────────

/// A logical realtime stream. At most one subscription per key is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum StreamKey {
  /// The global feed.
  Posts,
  /// Comments of the post currently in focus.
  Comments,
  /// The signed-in user's favorite markers.
  FavoriteIds,
  /// Posts whose id is in the current favorite id set.
  FavoritePosts,
}

/// Identifies one registration. Stale handles (whose stream was since
/// replaced) are ignored by [`SubscriptionManager::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionHandle {
  pub key:    StreamKey,
  generation: u64,
}

// ─── Registry ────────────────────────────────────────────────────────────────

struct Active {
  generation: u64,
  query:      Query,
  task:       JoinHandle<()>,
}

#[derive(Default)]
struct Registry {
  next_generation: u64,
  active:          HashMap<StreamKey, Active>,
}

struct Inner<S> {
  store:       Arc<S>,
  projections: Arc<Projections>,
  registry:    Mutex<Registry>,
}

impl<S> Drop for Inner<S> {
  fn drop(&mut self) {
    let registry = self.registry.get_mut().unwrap_or_else(PoisonError::into_inner);
    for (_, active) in registry.active.drain() {
      active.task.abort();
    }
  }
}

// ─── Manager ─────────────────────────────────────────────────────────────────

/// Owns every realtime subscription of one client session.
///
/// Cloning is cheap; clones share the registry. Dropping the last clone
/// cancels every subscription.
pub struct SubscriptionManager<S> {
  inner: Arc<Inner<S>>,
}

impl<S> Clone for SubscriptionManager<S> {
  fn clone(&self) -> Self { Self { inner: Arc::clone(&self.inner) } }
}

impl<S> SubscriptionManager<S>
where
  S: DocumentStore + 'static,
{
  pub fn new(store: Arc<S>, projections: Arc<Projections>) -> Self {
    Self {
      inner: Arc::new(Inner {
        store,
        projections,
        registry: Mutex::new(Registry::default()),
      }),
    }
  }

  /// Register `query` as the source of `key`, cancelling whatever fed `key`
  /// before. Must be called from within a tokio runtime.
  pub fn subscribe(&self, key: StreamKey, query: Query) -> SubscriptionHandle {
    self.inner.start(key, query)
  }

  /// Stop the subscription behind `handle` if it is still the live one for
  /// its key. The projection keeps its last value. Returns whether anything
  /// was stopped.
  pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
    let mut registry = self.inner.lock();
    let current = registry.active.get(&handle.key).map(|a| a.generation);
    if current != Some(handle.generation) {
      return false;
    }
    if let Some(active) = registry.active.remove(&handle.key) {
      active.task.abort();
    }
    tracing::debug!(stream = %handle.key, "unsubscribed");
    true
  }

  /// Stop `key` and reset its projection to empty before returning.
  /// Clearing the favorite ids also clears the favorite posts derived from
  /// them.
  pub fn clear(&self, key: StreamKey) {
    let mut registry = self.inner.lock();
    self.inner.clear_locked(&mut registry, key);
  }

  /// Stop every subscription. Projections keep their last values.
  pub fn shutdown(&self) {
    let mut registry = self.inner.lock();
    let stopped = registry.active.len();
    for (_, active) in registry.active.drain() {
      active.task.abort();
    }
    tracing::debug!(stopped, "all subscriptions released");
  }

  pub fn is_active(&self, key: StreamKey) -> bool {
    self.inner.lock().active.contains_key(&key)
  }

  /// The query currently feeding `key`, if any.
  pub fn active_query(&self, key: StreamKey) -> Option<Query> {
    self.inner.lock().active.get(&key).map(|a| a.query.clone())
  }

  pub fn active_count(&self) -> usize { self.inner.lock().active.len() }

  // ── Streams ───────────────────────────────────────────────────────────────

  /// Feed the global post list.
  pub fn watch_posts(&self) -> SubscriptionHandle {
    self.subscribe(StreamKey::Posts, Query::feed())
  }

  /// Feed the comment list from `post_id`, replacing any previous post's
  /// comments subscription. Switching posts empties the list first.
  pub fn watch_comments(&self, post_id: Uuid) -> SubscriptionHandle {
    self.subscribe(StreamKey::Comments, Query::comments(post_id))
  }

  /// Leave a post's detail view: stop its comments and empty the list.
  pub fn clear_comments(&self) { self.clear(StreamKey::Comments); }

  /// Feed the favorite id set of `user_id`; favorite posts follow it.
  pub fn watch_favorites(&self, user_id: Uuid) -> SubscriptionHandle {
    self.subscribe(StreamKey::FavoriteIds, Query::favorite_marks(user_id))
  }
}

// ─── Delivery ────────────────────────────────────────────────────────────────

impl<S> Inner<S>
where
  S: DocumentStore + 'static,
{
  fn lock(&self) -> MutexGuard<'_, Registry> {
    self.registry.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn start(self: &Arc<Self>, key: StreamKey, query: Query) -> SubscriptionHandle {
    let mut registry = self.lock();
    self.start_locked(&mut registry, key, query)
  }

  fn start_locked(
    self: &Arc<Self>,
    registry: &mut Registry,
    key: StreamKey,
    query: Query,
  ) -> SubscriptionHandle {
    // Another collection's snapshot must not stand in for this one while the
    // new subscription has yet to deliver.
    if registry.active.get(&key).is_some_and(|a| a.query.path != query.path) {
      self.clear_locked(registry, key);
    }

    registry.next_generation += 1;
    let generation = registry.next_generation;

    if let Some(previous) = registry.active.remove(&key) {
      previous.task.abort();
      tracing::debug!(stream = %key, "replacing subscription");
    }

    let task = tokio::spawn(run(
      Arc::downgrade(self),
      Arc::clone(&self.store),
      key,
      generation,
      query.clone(),
    ));
    tracing::debug!(stream = %key, path = %query.path, generation, "subscribed");
    registry.active.insert(key, Active { generation, query, task });

    SubscriptionHandle { key, generation }
  }

  fn clear_locked(&self, registry: &mut Registry, key: StreamKey) {
    if let Some(active) = registry.active.remove(&key) {
      active.task.abort();
      tracing::debug!(stream = %key, "cleared");
    }
    match key {
      StreamKey::Posts => self.projections.replace_posts(Vec::new()),
      StreamKey::Comments => self.projections.replace_comments(Vec::new()),
      StreamKey::FavoriteIds => {
        self.projections.replace_favorite_ids(BTreeSet::new());
        self.clear_locked(registry, StreamKey::FavoritePosts);
      }
      StreamKey::FavoritePosts => self.projections.replace_favorite_posts(Vec::new()),
    }
  }

  /// Apply one snapshot from the subscription `generation` of `key`.
  fn deliver(self: &Arc<Self>, key: StreamKey, generation: u64, docs: Vec<Document>) {
    let mut registry = self.lock();
    let Some(active) = registry
      .active
      .get(&key)
      .filter(|a| a.generation == generation)
    else {
      tracing::debug!(stream = %key, generation, "discarding snapshot from replaced subscription");
      return;
    };

    match self.apply(key, &active.query, docs) {
      Ok(Some(ids)) => self.follow_favorites(&mut registry, ids),
      Ok(None) => {}
      Err(e) => {
        tracing::warn!(stream = %key, error = %e, "dropping undecodable snapshot");
      }
    }
  }

  /// Decode `docs` and replace the projection behind `key`. For the favorite
  /// id stream, returns the new id set so the caller can re-query the posts.
  fn apply(
    &self,
    key: StreamKey,
    query: &Query,
    docs: Vec<Document>,
  ) -> forum_core::Result<Option<BTreeSet<Uuid>>> {
    match key {
      StreamKey::Posts => {
        let mut posts = decode_all::<Post>(docs)?;
        newest_first(&mut posts);
        self.projections.replace_posts(posts);
      }
      StreamKey::Comments => {
        let mut comments = decode_all::<Comment>(docs)?;
        comments.sort_by_key(|c| c.created_at);
        self.projections.replace_comments(comments);
      }
      StreamKey::FavoriteIds => {
        let ids: BTreeSet<Uuid> = docs.iter().map(|d| d.id).collect();
        self.projections.replace_favorite_ids(ids.clone());
        return Ok(Some(ids));
      }
      StreamKey::FavoritePosts => {
        let mut posts = decode_all::<Post>(docs)?;
        // The id set this subscription was opened for bounds what may show,
        // whatever the store sends.
        if let Some(filter) = &query.where_in {
          posts.retain(|p| filter.contains(&p.post_id));
        }
        newest_first(&mut posts);
        self.projections.replace_favorite_posts(posts);
      }
    }
    Ok(None)
  }

  /// Second hop of the favorites derivation. Runs under the same lock as
  /// the id-set write, so a concurrent clear cannot slip in between.
  fn follow_favorites(self: &Arc<Self>, registry: &mut Registry, ids: BTreeSet<Uuid>) {
    if ids.is_empty() {
      self.clear_locked(registry, StreamKey::FavoritePosts);
      return;
    }

    let query = Query::posts_in(ids);
    let unchanged = registry
      .active
      .get(&StreamKey::FavoritePosts)
      .is_some_and(|a| a.query == query);
    if !unchanged {
      self.start_locked(registry, StreamKey::FavoritePosts, query);
    }
  }
}

/// Body of one subscription task.
async fn run<S>(
  inner: Weak<Inner<S>>,
  store: Arc<S>,
  key: StreamKey,
  generation: u64,
  query: Query,
) where
  S: DocumentStore + 'static,
{
  let mut stream = match store.subscribe(query).await {
    Ok(stream) => stream,
    Err(e) => {
      tracing::warn!(stream = %key, error = %e, "subscription failed; projection left as is");
      return;
    }
  };

  while let Some(snapshot) = stream.next().await {
    let Some(manager) = inner.upgrade() else { break };
    match snapshot {
      Ok(docs) => manager.deliver(key, generation, docs),
      Err(e) => {
        tracing::warn!(stream = %key, error = %e, "push error; projection left as is");
      }
    }
  }
}

fn decode_all<T: Entity>(docs: Vec<Document>) -> forum_core::Result<Vec<T>> {
  docs.into_iter().map(T::from_document).collect()
}

fn newest_first(posts: &mut [Post]) {
  posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
