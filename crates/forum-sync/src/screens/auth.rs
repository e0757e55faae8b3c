//! Sign-in, registration and password-reset screen.

use forum_core::{
  Error, Result,
  directory::DirectoryService,
  entity::User,
  store::DocumentStore,
};
use strum::Display;

use crate::{Forum, LoadingFlag, gateway::FILL_ALL_FIELDS};

const ENTER_EMAIL: &str = "Enter your e-mail";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display)]
pub enum AuthMode {
  #[default]
  SignIn,
  Register,
  ForgotPassword,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
  /// Signed in (or registered and signed in); the session has begun.
  SignedIn(User),
  ResetSent,
}

pub struct AuthScreen<S, D> {
  forum: Forum<S, D>,

  pub mode:     AuthMode,
  pub email:    String,
  pub password: String,
  pub loading:  LoadingFlag,
}

impl<S, D> AuthScreen<S, D>
where
  S: DocumentStore + 'static,
  D: DirectoryService,
{
  pub fn new(forum: Forum<S, D>) -> Self {
    Self {
      forum,
      mode: AuthMode::default(),
      email: String::new(),
      password: String::new(),
      loading: LoadingFlag::default(),
    }
  }

  /// Change mode. The e-mail carries over; the password does not.
  pub fn switch_mode(&mut self, mode: AuthMode) {
    self.mode = mode;
    self.password.clear();
  }

  pub async fn submit(&mut self) -> Result<AuthOutcome> {
    let email = self.email.trim().to_owned();

    if self.mode == AuthMode::ForgotPassword {
      if email.is_empty() {
        return Err(Error::Validation(ENTER_EMAIL));
      }
      let _busy = self.loading.raise();
      self.forum.send_password_reset(&email).await?;
      return Ok(AuthOutcome::ResetSent);
    }

    if email.is_empty() || self.password.is_empty() {
      return Err(Error::Validation(FILL_ALL_FIELDS));
    }

    let user = {
      let _busy = self.loading.raise();
      match self.mode {
        AuthMode::Register => self.forum.sign_up(&email, &self.password).await?,
        _ => self.forum.sign_in(&email, &self.password).await?,
      }
    };
    self.password.clear();
    Ok(AuthOutcome::SignedIn(user))
  }
}
