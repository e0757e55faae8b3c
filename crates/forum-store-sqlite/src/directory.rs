//! [`SqliteDirectory`]: a local [`DirectoryService`] with argon2 password
//! hashes and a session that survives restarts.

use std::path::Path;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use chrono::Utc;
use rand_core::OsRng;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use forum_core::{directory::DirectoryService, entity::User};

use crate::{
  Error, Result,
  encode::{RawUser, encode_dt, encode_uuid},
  schema::SCHEMA,
};

/// Shortest password accepted by [`SqliteDirectory::sign_up`].
pub const MIN_PASSWORD_LEN: usize = 6;

/// A user row together with its PHC hash string.
struct Credentials {
  user:          RawUser,
  password_hash: String,
}

/// Accounts and the current session, stored in the same SQLite file as the
/// documents (or in memory).
#[derive(Clone)]
pub struct SqliteDirectory {
  conn: tokio_rusqlite::Connection,
}

impl SqliteDirectory {
  /// Open (or create) the directory at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::with_connection(conn).await
  }

  /// Open an in-memory directory, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::with_connection(conn).await
  }

  async fn with_connection(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self { conn })
  }

  /// Number of password-reset requests recorded for `email`.
  pub async fn reset_requests(&self, email: &str) -> Result<usize> {
    let email = email.trim().to_owned();
    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM password_resets WHERE email = ?1 COLLATE NOCASE",
          rusqlite::params![email],
          |row| row.get(0),
        )?)
      })
      .await?;
    Ok(usize::try_from(count).unwrap_or_default())
  }

  async fn credentials(&self, email: &str) -> Result<Option<Credentials>> {
    let email = email.to_owned();
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(conn
            .query_row(
              "SELECT user_id, display_name, email, password_hash
               FROM users WHERE email = ?1",
              rusqlite::params![email],
              |row| {
                Ok(Credentials {
                  user:          RawUser {
                    user_id:      row.get(0)?,
                    display_name: row.get(1)?,
                    email:        row.get(2)?,
                  },
                  password_hash: row.get(3)?,
                })
              },
            )
            .optional()?)
        })
        .await?,
    )
  }

  async fn start_session(&self, user_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(user_id);
    let at_str = encode_dt(Utc::now());
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO session (slot, user_id, started_at) VALUES (0, ?1, ?2)
           ON CONFLICT (slot) DO UPDATE
             SET user_id = excluded.user_id, started_at = excluded.started_at",
          rusqlite::params![id_str, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Password hashing ────────────────────────────────────────────────────────

fn hash_password(password: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| Error::PasswordHash(e.to_string()))?
      .to_string(),
  )
}

fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc)
    .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
    .is_ok()
}

// ─── DirectoryService impl ───────────────────────────────────────────────────

impl DirectoryService for SqliteDirectory {
  type Error = Error;

  async fn sign_in(&self, email: &str, password: &str) -> Result<User> {
    let creds = self
      .credentials(email.trim())
      .await?
      .ok_or(Error::InvalidCredentials)?;

    if !verify_password(password, &creds.password_hash) {
      return Err(Error::InvalidCredentials);
    }

    let user = creds.user.into_user()?;
    self.start_session(user.user_id).await?;
    tracing::info!(user_id = %user.user_id, "signed in");
    Ok(user)
  }

  async fn sign_up(&self, email: &str, password: &str) -> Result<User> {
    if password.chars().count() < MIN_PASSWORD_LEN {
      return Err(Error::WeakPassword(MIN_PASSWORD_LEN));
    }

    let user = User {
      user_id:      Uuid::new_v4(),
      display_name: String::new(),
      email:        email.trim().to_owned(),
    };
    let hash = hash_password(password)?;

    let id_str = encode_uuid(user.user_id);
    let email  = user.email.clone();
    let at_str = encode_dt(Utc::now());

    let created = self
      .conn
      .call(move |conn| {
        let taken = conn
          .query_row(
            "SELECT 1 FROM users WHERE email = ?1",
            rusqlite::params![email],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Ok(false);
        }
        conn.execute(
          "INSERT INTO users (user_id, email, display_name, password_hash, created_at)
           VALUES (?1, ?2, '', ?3, ?4)",
          rusqlite::params![id_str, email, hash, at_str],
        )?;
        Ok(true)
      })
      .await?;

    if !created {
      return Err(Error::EmailTaken(user.email));
    }

    self.start_session(user.user_id).await?;
    tracing::info!(user_id = %user.user_id, "account created");
    Ok(user)
  }

  async fn sign_out(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute("DELETE FROM session", [])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn send_password_reset(&self, email: &str) -> Result<()> {
    let email = email.trim().to_owned();
    if self.credentials(&email).await?.is_none() {
      return Err(Error::UnknownEmail(email));
    }

    let token  = encode_uuid(Uuid::new_v4());
    let at_str = encode_dt(Utc::now());
    let stored = email.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO password_resets (token, email, requested_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![token, stored, at_str],
        )?;
        Ok(())
      })
      .await?;

    tracing::info!(%email, "password reset requested");
    Ok(())
  }

  async fn current_user(&self) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(|conn| {
        Ok(conn
          .query_row(
            "SELECT u.user_id, u.display_name, u.email
             FROM session s JOIN users u ON u.user_id = s.user_id",
            [],
            |row| {
              Ok(RawUser {
                user_id:      row.get(0)?,
                display_name: row.get(1)?,
                email:        row.get(2)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn update_display_name(&self, name: &str) -> Result<User> {
    let name = name.trim().to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE users SET display_name = ?1
           WHERE user_id = (SELECT user_id FROM session WHERE slot = 0)",
          rusqlite::params![name],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(Some(conn.query_row(
          "SELECT u.user_id, u.display_name, u.email
           FROM session s JOIN users u ON u.user_id = s.user_id",
          [],
          |row| {
            Ok(RawUser {
              user_id:      row.get(0)?,
              display_name: row.get(1)?,
              email:        row.get(2)?,
            })
          },
        )?))
      })
      .await?;

    raw.ok_or(Error::NotSignedIn)?.into_user()
  }
}
