//! The feed screen: community and favorites tabs, with a post detail view.

use forum_core::{
  Error, Result,
  directory::DirectoryService,
  entity::{Comment, Post},
  store::DocumentStore,
};
use strum::{Display, EnumIter};
use uuid::Uuid;

use crate::{Forum, FavoriteChange, LoadingFlag, gateway::EMPTY_COMMENT};

// ─── Tab / Focus ─────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum Tab {
  #[default]
  Community,
  Favorites,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
  #[default]
  Listing,
  Detail(Uuid),
}

/// Open comment-edit dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentEdit {
  pub comment: Comment,
  pub draft:   String,
}

// ─── FeedScreen ──────────────────────────────────────────────────────────────

pub struct FeedScreen<S, D> {
  forum: Forum<S, D>,

  pub tab:   Tab,
  pub focus: Focus,

  /// Author-only overflow menu on the detail view.
  pub admin_menu_open: bool,

  /// Delete-post confirmation dialog.
  pub delete_dialog_open: bool,

  /// Comment box draft; `None` while the box is collapsed.
  pub comment_input: Option<String>,

  pub comment_edit: Option<CommentEdit>,

  pub deleting:        LoadingFlag,
  pub sending_comment: LoadingFlag,
}

impl<S, D> FeedScreen<S, D>
where
  S: DocumentStore + 'static,
  D: DirectoryService,
{
  pub fn new(forum: Forum<S, D>) -> Self {
    Self {
      forum,
      tab: Tab::default(),
      focus: Focus::default(),
      admin_menu_open: false,
      delete_dialog_open: false,
      comment_input: None,
      comment_edit: None,
      deleting: LoadingFlag::default(),
      sending_comment: LoadingFlag::default(),
    }
  }

  // ── Derived state ─────────────────────────────────────────────────────────

  /// The list shown under the current tab.
  pub fn visible_posts(&self) -> Vec<Post> {
    let projections = self.forum.projections();
    match self.tab {
      Tab::Community => projections.posts(),
      Tab::Favorites => projections.favorite_posts(),
    }
  }

  pub fn focused_id(&self) -> Option<Uuid> {
    match self.focus {
      Focus::Listing => None,
      Focus::Detail(id) => Some(id),
    }
  }

  /// The focused post once its fetch has landed.
  pub fn focused_post(&self) -> Option<Post> {
    let id = self.focused_id()?;
    self
      .forum
      .projections()
      .selected_post()
      .filter(|p| p.post_id == id)
  }

  pub fn comments(&self) -> Vec<Comment> { self.forum.projections().comments() }

  /// The new-post button shows only on the list.
  pub fn fab_visible(&self) -> bool { self.focus == Focus::Listing }

  pub fn is_favorite(&self) -> bool {
    self
      .focused_id()
      .is_some_and(|id| self.forum.projections().is_favorite(id))
  }

  /// Whether the signed-in user wrote the focused post.
  pub fn is_author(&self) -> bool {
    let Some(user) = self.forum.user() else { return false };
    self.focused_post().is_some_and(|p| p.author_id == user.user_id)
  }

  pub fn can_edit_comment(&self, comment: &Comment) -> bool {
    self
      .forum
      .user()
      .is_some_and(|u| u.user_id == comment.author_id)
  }

  // ── Navigation ────────────────────────────────────────────────────────────

  /// Switch tabs. Always lands on the list.
  pub fn select_tab(&mut self, tab: Tab) {
    self.back_to_list();
    self.tab = tab;
  }

  /// Open a post: start its comments stream and fetch it into the selected
  /// slot.
  pub async fn open_post(&mut self, post_id: Uuid) {
    self.close_overlays();
    self.focus = Focus::Detail(post_id);
    self.forum.subscriptions().watch_comments(post_id);
    self.forum.gateway().get_post_by_id(post_id).await;
  }

  /// Return to the list from anywhere: back button, logo click, tab switch.
  pub fn back_to_list(&mut self) {
    self.close_overlays();
    self.focus = Focus::Listing;
    self.forum.subscriptions().clear_comments();
    self.forum.projections().clear_selected();
  }

  fn close_overlays(&mut self) {
    self.admin_menu_open = false;
    self.delete_dialog_open = false;
    self.comment_input = None;
    self.comment_edit = None;
  }

  // ── Post actions ──────────────────────────────────────────────────────────

  pub async fn toggle_favorite(&self) -> Result<FavoriteChange> {
    let post_id = self.focused_id().ok_or(Error::Validation("no post selected"))?;
    self.forum.toggle_favorite(post_id).await
  }

  /// Open the admin menu. Ignored unless the user wrote the focused post.
  pub fn open_admin_menu(&mut self) -> bool {
    self.admin_menu_open = self.is_author();
    self.admin_menu_open
  }

  /// "Edit" from the admin menu: returns the post to hand to the editor.
  pub fn edit_focused(&mut self) -> Option<Uuid> {
    self.admin_menu_open = false;
    self.is_author().then(|| self.focused_id()).flatten()
  }

  /// "Delete" from the admin menu: ask for confirmation.
  pub fn request_delete(&mut self) {
    self.admin_menu_open = false;
    self.delete_dialog_open = self.is_author();
  }

  pub fn cancel_delete(&mut self) { self.delete_dialog_open = false; }

  /// Delete the focused post and return to the list. On failure the screen
  /// stays on the post.
  pub async fn confirm_delete(&mut self) -> Result<()> {
    self.delete_dialog_open = false;
    let post_id = self.focused_id().ok_or(Error::Validation("no post selected"))?;

    let result = {
      let _busy = self.deleting.raise();
      self.forum.gateway().delete_post(post_id).await
    };
    if result.is_ok() {
      self.back_to_list();
    }
    result
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  pub fn open_comment_input(&mut self) {
    self.comment_input.get_or_insert_with(String::new);
  }

  pub fn cancel_comment_input(&mut self) { self.comment_input = None; }

  /// Send the comment draft. The box collapses on success and keeps its
  /// text on failure.
  pub async fn submit_comment(&mut self) -> Result<Comment> {
    let post_id = self.focused_id().ok_or(Error::Validation("no post selected"))?;
    let draft = self.comment_input.clone().unwrap_or_default();
    if draft.trim().is_empty() {
      return Err(Error::Validation(EMPTY_COMMENT));
    }

    let result = {
      let _busy = self.sending_comment.raise();
      self.forum.create_comment(post_id, &draft).await
    };
    if result.is_ok() {
      self.comment_input = None;
    }
    result
  }

  /// Open the edit dialog for one of the user's own comments.
  pub fn begin_comment_edit(&mut self, comment: Comment) -> bool {
    if !self.can_edit_comment(&comment) {
      return false;
    }
    let draft = comment.content.clone();
    self.comment_edit = Some(CommentEdit { comment, draft });
    true
  }

  pub fn cancel_comment_edit(&mut self) { self.comment_edit = None; }

  /// Save the comment-edit dialog. It closes on success only.
  pub async fn save_comment_edit(&mut self) -> Result<()> {
    let Some(edit) = self.comment_edit.clone() else {
      return Ok(());
    };
    self
      .forum
      .gateway()
      .update_comment(edit.comment.post_id, edit.comment.comment_id, &edit.draft)
      .await?;
    self.comment_edit = None;
    Ok(())
  }

  pub async fn delete_comment(&self, comment: &Comment) -> Result<()> {
    self
      .forum
      .gateway()
      .delete_comment(comment.post_id, comment.comment_id)
      .await
  }
}
