//! Client-side synchronisation and view-state reconciliation for the forum.
//!
//! Keeps an in-memory projection of remote collections consistent under
//! realtime pushes, user mutations and screen navigation:
//!
//! - [`Projections`]: the observable state UI consumes (posts, selected
//!   post, comments, favorites). Every update is a whole-value replace.
//! - [`SubscriptionManager`]: at most one live realtime subscription per
//!   [`StreamKey`]; pushes land in [`Projections`].
//! - [`MutationGateway`]: writes against the document store; never touches
//!   projections except the selected-post slot.
//! - [`screens`]: per-screen view-state coordinators.
//! - [`Forum`]: wires the above to one store and one directory.

pub mod forum;
pub mod gateway;
pub mod loading;
pub mod projection;
pub mod screens;
pub mod subscription;

pub use forum::Forum;
pub use gateway::{FavoriteChange, MutationGateway};
pub use loading::LoadingFlag;
pub use projection::Projections;
pub use subscription::{StreamKey, SubscriptionHandle, SubscriptionManager};

#[cfg(test)]
mod tests;
