//! Client configuration: an optional TOML file layered under `FORUM_*`
//! environment variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use serde::Deserialize;

const DEFAULT_STORE_PATH: &str = "~/.local/share/forum/forum.db";
const DEFAULT_SNAPSHOT_TIMEOUT_MS: u64 = 2_000;

#[derive(Debug, Clone, Deserialize)]
pub struct ForumConfig {
  /// SQLite file holding documents, accounts and the session.
  pub store_path:          PathBuf,
  /// How long read commands wait for the first realtime snapshot.
  pub snapshot_timeout_ms: u64,
}

impl ForumConfig {
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .set_default("store_path", DEFAULT_STORE_PATH)?
      .set_default("snapshot_timeout_ms", DEFAULT_SNAPSHOT_TIMEOUT_MS)?
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("FORUM"))
      .build()
      .context("failed to read config file")?;

    let mut cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise ForumConfig")?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    Ok(cfg)
  }

  pub fn snapshot_timeout(&self) -> Duration { Duration::from_millis(self.snapshot_timeout_ms) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
