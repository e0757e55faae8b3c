//! Per-screen view-state coordinators.
//!
//! Each coordinator holds the ephemeral state of one screen (focus, tab,
//! dialogs, drafts, loading flags) and turns user intents into calls on a
//! [`Forum`](crate::Forum). Nothing here is persisted. Failures come back as
//! [`forum_core::Error`]; its `Display` text is the notice to show.

pub mod auth;
pub mod editor;
pub mod feed;
pub mod profile;

pub use auth::{AuthMode, AuthOutcome, AuthScreen};
pub use editor::{EditorMode, EditorScreen};
pub use feed::{CommentEdit, FeedScreen, Focus, Tab};
pub use profile::{ProfileScreen, RenameOutcome};
