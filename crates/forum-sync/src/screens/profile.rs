//! Profile screen: header, the user's own posts, rename and sign-out.

use forum_core::{
  Error, Result,
  directory::DirectoryService,
  entity::{Post, User},
  store::DocumentStore,
};
use uuid::Uuid;

use crate::{Forum, LoadingFlag};

const EMPTY_NAME: &str = "Name cannot be empty";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
  /// The draft matched the current name; nothing was sent.
  Unchanged,
  Renamed(User),
}

pub struct ProfileScreen<S, D> {
  forum: Forum<S, D>,

  /// Rename dialog draft; `None` while the dialog is closed.
  pub rename_draft: Option<String>,

  pub updating: LoadingFlag,

  /// Post awaiting delete confirmation.
  pub pending_delete: Option<Uuid>,
}

impl<S, D> ProfileScreen<S, D>
where
  S: DocumentStore + 'static,
  D: DirectoryService,
{
  pub fn new(forum: Forum<S, D>) -> Self {
    Self {
      forum,
      rename_draft: None,
      updating: LoadingFlag::default(),
      pending_delete: None,
    }
  }

  pub fn header_name(&self) -> String {
    self
      .forum
      .user()
      .map(|u| u.short_name().to_owned())
      .unwrap_or_default()
  }

  pub fn email(&self) -> String { self.forum.user().map(|u| u.email).unwrap_or_default() }

  /// Posts written by the signed-in user, newest first.
  pub fn my_posts(&self) -> Vec<Post> {
    let Some(user) = self.forum.user() else { return Vec::new() };
    // The feed projection is already newest first.
    self
      .forum
      .projections()
      .posts()
      .into_iter()
      .filter(|p| p.author_id == user.user_id)
      .collect()
  }

  // ── Rename ────────────────────────────────────────────────────────────────

  pub fn open_rename(&mut self) { self.rename_draft = Some(self.header_name()); }

  pub fn cancel_rename(&mut self) { self.rename_draft = None; }

  /// Submit the rename dialog. It closes on success or when nothing
  /// changed, and stays open on failure.
  pub async fn submit_rename(&mut self) -> Result<RenameOutcome> {
    let draft = self.rename_draft.clone().unwrap_or_default();
    let name = draft.trim();
    if name.is_empty() {
      return Err(Error::Validation(EMPTY_NAME));
    }

    let current = self.forum.user().ok_or(Error::Unauthenticated)?;
    if current.display_name == name {
      self.rename_draft = None;
      return Ok(RenameOutcome::Unchanged);
    }

    let user = {
      let _busy = self.updating.raise();
      self.forum.rename(name).await?
    };
    tracing::info!(user_id = %user.user_id, "display name changed");
    self.rename_draft = None;
    Ok(RenameOutcome::Renamed(user))
  }

  // ── Delete ────────────────────────────────────────────────────────────────

  pub fn request_delete(&mut self, post_id: Uuid) { self.pending_delete = Some(post_id); }

  pub fn cancel_delete(&mut self) { self.pending_delete = None; }

  /// Delete the pending post. The dialog closes whatever the outcome.
  pub async fn confirm_delete(&mut self) -> Result<()> {
    let Some(post_id) = self.pending_delete.take() else {
      return Ok(());
    };
    self.forum.gateway().delete_post(post_id).await
  }

  pub async fn sign_out(&mut self) -> Result<()> {
    self.rename_draft = None;
    self.pending_delete = None;
    self.forum.sign_out().await
  }
}
