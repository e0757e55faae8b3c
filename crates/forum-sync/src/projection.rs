//! The projection store: process-local, observable copies of remote state.
//!
//! Each projection is a [`watch`] channel. Readers take a snapshot or
//! subscribe for change notifications; writers (crate-internal only) always
//! replace the whole value, so a reader never sees a half-updated list.

use std::{
  collections::BTreeSet,
  sync::{
    Mutex, PoisonError,
    atomic::{AtomicU64, Ordering},
  },
};

use forum_core::entity::{Comment, Post};
use tokio::sync::watch;
use uuid::Uuid;

/// The four projections the UI reads: the global feed, the selected post,
/// the focused post's comments, and the user's favorites (as an id set and as
/// the derived list of posts).
#[derive(Debug)]
pub struct Projections {
  posts:          watch::Sender<Vec<Post>>,
  selected_post:  watch::Sender<Option<Post>>,
  /// Ticket of the most recently started selected-post fetch.
  selected_seq:   AtomicU64,
  /// Post id that fetch is reading, while it is in flight.
  selected_fetch: Mutex<Option<Uuid>>,
  comments:       watch::Sender<Vec<Comment>>,
  favorite_ids:   watch::Sender<BTreeSet<Uuid>>,
  favorite_posts: watch::Sender<Vec<Post>>,
}

impl Default for Projections {
  fn default() -> Self {
    Self {
      posts:          watch::channel(Vec::new()).0,
      selected_post:  watch::channel(None).0,
      selected_seq:   AtomicU64::new(0),
      selected_fetch: Mutex::new(None),
      comments:       watch::channel(Vec::new()).0,
      favorite_ids:   watch::channel(BTreeSet::new()).0,
      favorite_posts: watch::channel(Vec::new()).0,
    }
  }
}

impl Projections {
  pub fn new() -> Self { Self::default() }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// All posts, newest first.
  pub fn posts(&self) -> Vec<Post> { self.posts.borrow().clone() }

  pub fn selected_post(&self) -> Option<Post> { self.selected_post.borrow().clone() }

  /// Comments of the focused post, oldest first.
  pub fn comments(&self) -> Vec<Comment> { self.comments.borrow().clone() }

  pub fn favorite_ids(&self) -> BTreeSet<Uuid> { self.favorite_ids.borrow().clone() }

  /// Favorite posts, newest first.
  pub fn favorite_posts(&self) -> Vec<Post> { self.favorite_posts.borrow().clone() }

  pub fn is_favorite(&self, post_id: Uuid) -> bool {
    self.favorite_ids.borrow().contains(&post_id)
  }

  // ── Change notification ───────────────────────────────────────────────────

  pub fn watch_posts(&self) -> watch::Receiver<Vec<Post>> { self.posts.subscribe() }

  pub fn watch_selected_post(&self) -> watch::Receiver<Option<Post>> {
    self.selected_post.subscribe()
  }

  pub fn watch_comments(&self) -> watch::Receiver<Vec<Comment>> { self.comments.subscribe() }

  pub fn watch_favorite_ids(&self) -> watch::Receiver<BTreeSet<Uuid>> {
    self.favorite_ids.subscribe()
  }

  pub fn watch_favorite_posts(&self) -> watch::Receiver<Vec<Post>> {
    self.favorite_posts.subscribe()
  }

  // ── Whole-value writes ────────────────────────────────────────────────────

  pub(crate) fn replace_posts(&self, posts: Vec<Post>) { self.posts.send_replace(posts); }

  pub(crate) fn replace_comments(&self, comments: Vec<Comment>) {
    self.comments.send_replace(comments);
  }

  pub(crate) fn replace_favorite_ids(&self, ids: BTreeSet<Uuid>) {
    self.favorite_ids.send_replace(ids);
  }

  pub(crate) fn replace_favorite_posts(&self, posts: Vec<Post>) {
    self.favorite_posts.send_replace(posts);
  }

  /// Clear the selected post and issue a new fetch ticket for `target`. Any
  /// fetch holding an older ticket can no longer write the slot.
  pub(crate) fn begin_selected(&self, target: Option<Uuid>) -> u64 {
    let mut ticket = 0;
    self.selected_post.send_modify(|slot| {
      ticket = self.invalidate_fetch(target);
      *slot = None;
    });
    ticket
  }

  /// Must run inside a `selected_post` modify closure.
  fn invalidate_fetch(&self, target: Option<Uuid>) -> u64 {
    *self.selected_fetch.lock().unwrap_or_else(PoisonError::into_inner) = target;
    self.selected_seq.fetch_add(1, Ordering::SeqCst) + 1
  }

  /// Store the result of the fetch holding `ticket`, unless a newer fetch or
  /// a reset has started since. Returns whether the value was stored.
  pub(crate) fn finish_selected(&self, ticket: u64, post: Option<Post>) -> bool {
    self.selected_post.send_if_modified(|slot| {
      if self.selected_seq.load(Ordering::SeqCst) != ticket {
        return false;
      }
      *self.selected_fetch.lock().unwrap_or_else(PoisonError::into_inner) = None;
      *slot = post;
      true
    })
  }

  /// Navigation reset: clear the slot and invalidate in-flight fetches.
  pub(crate) fn clear_selected(&self) { self.begin_selected(None); }

  /// Clear the selected post if it is `post_id`, and drop any in-flight fetch
  /// of `post_id` so a read taken before a delete cannot land after it.
  pub(crate) fn clear_selected_if(&self, post_id: Uuid) -> bool {
    self.selected_post.send_if_modified(|slot| {
      let held = slot.as_ref().is_some_and(|p| p.post_id == post_id);
      let fetching = *self.selected_fetch.lock().unwrap_or_else(PoisonError::into_inner)
        == Some(post_id);
      if fetching {
        self.invalidate_fetch(None);
      }
      if held {
        *slot = None;
      }
      held
    })
  }

  /// Empty every projection (sign-out).
  pub(crate) fn reset(&self) {
    self.replace_posts(Vec::new());
    self.clear_selected();
    self.replace_comments(Vec::new());
    self.replace_favorite_ids(BTreeSet::new());
    self.replace_favorite_posts(Vec::new());
  }
}
