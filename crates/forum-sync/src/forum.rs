//! [`Forum`]: one client session wired to one document store and one
//! directory.

use std::sync::Arc;

use forum_core::{
  Error, Result,
  directory::DirectoryService,
  entity::{Comment, Post, User},
  store::DocumentStore,
};
use tokio::sync::watch;
use uuid::Uuid;

use crate::{
  gateway::{FavoriteChange, MutationGateway},
  projection::Projections,
  subscription::SubscriptionManager,
};

struct Shared<S, D> {
  directory:     Arc<D>,
  projections:   Arc<Projections>,
  subscriptions: SubscriptionManager<S>,
  gateway:       MutationGateway<S>,
  user:          watch::Sender<Option<User>>,
}

/// The client-side state of the forum: projections, their subscriptions,
/// the mutation gateway and the signed-in identity.
///
/// Cloning is cheap; clones share everything.
pub struct Forum<S, D> {
  shared: Arc<Shared<S, D>>,
}

impl<S, D> Clone for Forum<S, D> {
  fn clone(&self) -> Self { Self { shared: Arc::clone(&self.shared) } }
}

impl<S, D> Forum<S, D>
where
  S: DocumentStore + 'static,
  D: DirectoryService,
{
  pub fn new(store: Arc<S>, directory: Arc<D>) -> Self {
    let projections = Arc::new(Projections::new());
    Self {
      shared: Arc::new(Shared {
        directory,
        subscriptions: SubscriptionManager::new(Arc::clone(&store), Arc::clone(&projections)),
        gateway: MutationGateway::new(store, Arc::clone(&projections)),
        projections,
        user: watch::channel(None).0,
      }),
    }
  }

  pub fn projections(&self) -> &Projections { &self.shared.projections }

  pub fn subscriptions(&self) -> &SubscriptionManager<S> { &self.shared.subscriptions }

  pub fn gateway(&self) -> &MutationGateway<S> { &self.shared.gateway }

  pub fn directory(&self) -> &D { &self.shared.directory }

  /// The signed-in identity, if any.
  pub fn user(&self) -> Option<User> { self.shared.user.borrow().clone() }

  pub fn watch_user(&self) -> watch::Receiver<Option<User>> { self.shared.user.subscribe() }

  // ─── Session ───────────────────────────────────────────────────────────────

  /// Resume the directory's persisted session, if it has one.
  pub async fn restore_session(&self) -> Result<Option<User>> {
    let user = self.directory().current_user().await.map_err(Error::auth)?;
    if let Some(user) = &user {
      tracing::info!(user_id = %user.user_id, "session restored");
      self.begin_session(user.clone());
    }
    Ok(user)
  }

  /// Adopt `user` as the signed-in identity and start the feed and favorites
  /// streams for it.
  pub fn begin_session(&self, user: User) {
    let subscriptions = self.subscriptions();
    subscriptions.watch_posts();
    subscriptions.watch_favorites(user.user_id);
    self.set_user(user);
  }

  /// Replace the identity without touching subscriptions (after a rename).
  pub fn set_user(&self, user: User) { self.shared.user.send_replace(Some(user)); }

  /// Release every subscription and empty every projection.
  pub fn end_session(&self) {
    self.subscriptions().shutdown();
    self.projections().reset();
    self.shared.user.send_replace(None);
  }

  pub async fn sign_in(&self, email: &str, password: &str) -> Result<User> {
    let user = self
      .directory()
      .sign_in(email, password)
      .await
      .map_err(Error::auth)?;
    self.begin_session(user.clone());
    Ok(user)
  }

  pub async fn sign_up(&self, email: &str, password: &str) -> Result<User> {
    let user = self
      .directory()
      .sign_up(email, password)
      .await
      .map_err(Error::auth)?;
    self.begin_session(user.clone());
    Ok(user)
  }

  pub async fn send_password_reset(&self, email: &str) -> Result<()> {
    self
      .directory()
      .send_password_reset(email)
      .await
      .map_err(Error::auth)
  }

  /// Rename the signed-in user and adopt the updated identity.
  pub async fn rename(&self, name: &str) -> Result<User> {
    if self.user().is_none() {
      return Err(Error::Unauthenticated);
    }
    let user = self
      .directory()
      .update_display_name(name)
      .await
      .map_err(Error::auth)?;
    self.set_user(user.clone());
    Ok(user)
  }

  /// Sign out. Local state is torn down even if the directory call fails.
  pub async fn sign_out(&self) -> Result<()> {
    let result = self.directory().sign_out().await.map_err(Error::auth);
    self.end_session();
    tracing::info!("signed out");
    result
  }

  // ─── Mutations as the signed-in user ───────────────────────────────────────

  pub async fn create_post(&self, topic: &str, content: &str) -> Result<Post> {
    let user = self.user();
    self.gateway().create_post(user.as_ref(), topic, content).await
  }

  pub async fn create_comment(&self, post_id: Uuid, content: &str) -> Result<Comment> {
    let user = self.user();
    self.gateway().create_comment(user.as_ref(), post_id, content).await
  }

  pub async fn toggle_favorite(&self, post_id: Uuid) -> Result<FavoriteChange> {
    let user = self.user();
    self.gateway().toggle_favorite(user.as_ref(), post_id).await
  }
}
