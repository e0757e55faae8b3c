//! The `DirectoryService` trait: the external identity provider.

use std::future::Future;

use crate::entity::User;

/// Abstraction over the authentication provider.
///
/// The provider owns the session: after a successful `sign_in` or `sign_up`
/// the signed-in user is returned by `current_user` until `sign_out`.
pub trait DirectoryService: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn sign_in<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + 'a;

  /// Create an account and sign it in. The display name starts out empty.
  fn sign_up<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + 'a;

  fn sign_out(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn send_password_reset<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn current_user(
    &self,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Rename the signed-in user and return the updated identity.
  fn update_display_name<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + 'a;
}
