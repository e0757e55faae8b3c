//! The mutation gateway: every write the client makes against the document
//! store.
//!
//! Writes do not touch projections; the change comes back through the
//! realtime subscriptions. The two exceptions both concern the selected-post
//! slot: [`MutationGateway::get_post_by_id`] writes its result there, and a
//! confirmed [`MutationGateway::delete_post`] clears it.
//!
//! The acting identity is passed into each call. `None` means nobody is
//! signed in and the call fails with [`Error::Unauthenticated`] before any
//! store access.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use forum_core::{
  Error, Result,
  document::{Entity, fields},
  entity::{Comment, FavoriteMark, Post, User, field},
  path::CollectionPath,
  store::DocumentStore,
};
use serde_json::json;
use uuid::Uuid;

use crate::projection::Projections;

/// Message for a blank required field.
pub const FILL_ALL_FIELDS: &str = "Fill in all fields";

/// Message for a blank comment.
pub const EMPTY_COMMENT: &str = "Comment cannot be empty";

/// Outcome of [`MutationGateway::toggle_favorite`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteChange {
  Added,
  Removed,
}

pub struct MutationGateway<S> {
  store:       Arc<S>,
  projections: Arc<Projections>,
}

impl<S> Clone for MutationGateway<S> {
  fn clone(&self) -> Self {
    Self {
      store:       Arc::clone(&self.store),
      projections: Arc::clone(&self.projections),
    }
  }
}

impl<S: DocumentStore> MutationGateway<S> {
  pub fn new(store: Arc<S>, projections: Arc<Projections>) -> Self {
    Self { store, projections }
  }

  // ─── Posts ─────────────────────────────────────────────────────────────────

  /// Create a post authored by `author`. The id is allocated before the
  /// write and is part of the stored document.
  pub async fn create_post(
    &self,
    author: Option<&User>,
    topic: &str,
    content: &str,
  ) -> Result<Post> {
    let author = author.ok_or(Error::Unauthenticated)?;
    require_filled(&[topic, content], FILL_ALL_FIELDS)?;

    let post = Post {
      post_id:     self.store.allocate_id(CollectionPath::Posts),
      author_id:   author.user_id,
      author_name: author.author_label().to_owned(),
      topic:       topic.to_owned(),
      content:     content.to_owned(),
      created_at:  now_millis(),
    };
    self
      .store
      .create_or_replace(CollectionPath::Posts, Some(post.post_id), post.to_fields()?)
      .await
      .map_err(Error::write)?;

    tracing::info!(post_id = %post.post_id, author_id = %post.author_id, "post created");
    Ok(post)
  }

  /// Overwrite topic and content of a post. Ownership is the caller's check.
  pub async fn update_post(&self, post_id: Uuid, topic: &str, content: &str) -> Result<()> {
    require_filled(&[topic, content], FILL_ALL_FIELDS)?;

    self
      .store
      .update_fields(
        CollectionPath::Posts,
        post_id,
        fields([(field::TOPIC, json!(topic)), (field::CONTENT, json!(content))]),
      )
      .await
      .map_err(Error::write)?;

    tracing::debug!(%post_id, "post updated");
    Ok(())
  }

  /// Delete a post. On success the selected-post slot is cleared if it held
  /// this post.
  pub async fn delete_post(&self, post_id: Uuid) -> Result<()> {
    self
      .store
      .delete(CollectionPath::Posts, post_id)
      .await
      .map_err(Error::write)?;

    self.projections.clear_selected_if(post_id);
    tracing::info!(%post_id, "post deleted");
    Ok(())
  }

  /// Fetch one post into the selected-post slot.
  ///
  /// The slot is cleared first. If a later fetch (or a navigation reset)
  /// starts before this one resolves, this result is discarded. A failed or
  /// missing fetch leaves the slot empty.
  pub async fn get_post_by_id(&self, post_id: Uuid) {
    let ticket = self.projections.begin_selected(Some(post_id));

    let post = match self.fetch_post(post_id).await {
      Ok(post) => post,
      Err(e) => {
        tracing::warn!(%post_id, error = %e, "fetching post failed");
        None
      }
    };

    if !self.projections.finish_selected(ticket, post) {
      tracing::debug!(%post_id, ticket, "discarding superseded post fetch");
    }
  }

  /// One-shot read of a post, bypassing the projections.
  pub async fn fetch_post(&self, post_id: Uuid) -> Result<Option<Post>> {
    self
      .store
      .get_one(CollectionPath::Posts, post_id)
      .await
      .map_err(Error::read)?
      .map(Post::from_document)
      .transpose()
  }

  // ─── Comments ──────────────────────────────────────────────────────────────

  pub async fn create_comment(
    &self,
    author: Option<&User>,
    post_id: Uuid,
    content: &str,
  ) -> Result<Comment> {
    let author = author.ok_or(Error::Unauthenticated)?;
    require_filled(&[content], EMPTY_COMMENT)?;

    let path = CollectionPath::Comments(post_id);
    let comment = Comment {
      comment_id:  self.store.allocate_id(path),
      post_id,
      author_id:   author.user_id,
      author_name: author.author_label().to_owned(),
      content:     content.to_owned(),
      created_at:  now_millis(),
    };
    self
      .store
      .create_or_replace(path, Some(comment.comment_id), comment.to_fields()?)
      .await
      .map_err(Error::write)?;

    tracing::debug!(%post_id, comment_id = %comment.comment_id, "comment created");
    Ok(comment)
  }

  pub async fn update_comment(
    &self,
    post_id: Uuid,
    comment_id: Uuid,
    content: &str,
  ) -> Result<()> {
    require_filled(&[content], EMPTY_COMMENT)?;

    self
      .store
      .update_fields(
        CollectionPath::Comments(post_id),
        comment_id,
        fields([(field::CONTENT, json!(content))]),
      )
      .await
      .map_err(Error::write)?;

    tracing::debug!(%post_id, %comment_id, "comment updated");
    Ok(())
  }

  pub async fn delete_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<()> {
    self
      .store
      .delete(CollectionPath::Comments(post_id), comment_id)
      .await
      .map_err(Error::write)?;

    tracing::debug!(%post_id, %comment_id, "comment deleted");
    Ok(())
  }

  // ─── Favorites ─────────────────────────────────────────────────────────────

  /// Flip the favorite marker of `post_id` for `user`.
  ///
  /// The direction comes from the local favorite id set, not from the store,
  /// so a stale set can pick the wrong direction if another session changed
  /// the marker meanwhile.
  pub async fn toggle_favorite(
    &self,
    user: Option<&User>,
    post_id: Uuid,
  ) -> Result<FavoriteChange> {
    let user = user.ok_or(Error::Unauthenticated)?;
    let path = CollectionPath::Favorites(user.user_id);

    let change = if self.projections.is_favorite(post_id) {
      self.store.delete(path, post_id).await.map_err(Error::write)?;
      FavoriteChange::Removed
    } else {
      let mark = FavoriteMark { post_id, added_at: now_millis() };
      self
        .store
        .create_or_replace(path, Some(post_id), mark.to_fields()?)
        .await
        .map_err(Error::write)?;
      FavoriteChange::Added
    };

    tracing::debug!(%post_id, user_id = %user.user_id, ?change, "favorite toggled");
    Ok(change)
  }
}

fn require_filled(values: &[&str], message: &'static str) -> Result<()> {
  if values.iter().any(|v| v.trim().is_empty()) {
    return Err(Error::Validation(message));
  }
  Ok(())
}

/// Current time at the millisecond precision the store keeps.
fn now_millis() -> DateTime<Utc> {
  use chrono::SubsecRound as _;
  Utc::now().trunc_subsecs(3)
}
