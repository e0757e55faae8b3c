//! Collection paths and the query shape understood by a [`DocumentStore`].
//!
//! [`DocumentStore`]: crate::store::DocumentStore

use std::{collections::BTreeSet, fmt};

use strum::Display;
use uuid::Uuid;

use crate::entity::field;

// ─── Paths ───────────────────────────────────────────────────────────────────

/// A logical collection in the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionPath {
  /// `posts`
  Posts,
  /// `posts/{post_id}/comments`
  Comments(Uuid),
  /// `users/{user_id}/favorites`
  Favorites(Uuid),
}

impl fmt::Display for CollectionPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Posts => f.write_str("posts"),
      Self::Comments(post_id) => write!(f, "posts/{post_id}/comments"),
      Self::Favorites(user_id) => write!(f, "users/{user_id}/favorites"),
    }
  }
}

// ─── Query ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Direction {
  Asc,
  Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
  pub field:     &'static str,
  pub direction: Direction,
}

/// Membership filter: keep documents whose `field` is one of `values`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhereIn {
  pub field:  &'static str,
  pub values: BTreeSet<Uuid>,
}

impl WhereIn {
  pub fn contains(&self, id: &Uuid) -> bool { self.values.contains(id) }
}

/// Parameters for [`DocumentStore::subscribe`](crate::store::DocumentStore::subscribe).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
  pub path:     CollectionPath,
  pub order_by: Option<OrderBy>,
  pub where_in: Option<WhereIn>,
}

impl Query {
  /// Every document in `path`, in store order.
  pub fn all(path: CollectionPath) -> Self {
    Self { path, order_by: None, where_in: None }
  }

  pub fn order_by(mut self, field: &'static str, direction: Direction) -> Self {
    self.order_by = Some(OrderBy { field, direction });
    self
  }

  pub fn where_in(
    mut self,
    field: &'static str,
    values: impl IntoIterator<Item = Uuid>,
  ) -> Self {
    self.where_in = Some(WhereIn { field, values: values.into_iter().collect() });
    self
  }

  /// The global feed: `posts` ordered by creation time, newest first.
  pub fn feed() -> Self {
    Self::all(CollectionPath::Posts).order_by(field::CREATED_AT, Direction::Desc)
  }

  /// One post's comments, oldest first.
  pub fn comments(post_id: Uuid) -> Self {
    Self::all(CollectionPath::Comments(post_id))
      .order_by(field::CREATED_AT, Direction::Asc)
  }

  /// The favorite markers of one user.
  pub fn favorite_marks(user_id: Uuid) -> Self {
    Self::all(CollectionPath::Favorites(user_id))
  }

  /// Posts whose id is in `ids`. No ordering is requested; membership
  /// queries are re-sorted by the caller.
  pub fn posts_in(ids: impl IntoIterator<Item = Uuid>) -> Self {
    Self::all(CollectionPath::Posts).where_in(field::POST_ID, ids)
  }
}
