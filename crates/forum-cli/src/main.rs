//! `forum`: command-line client for the forum, backed by a local SQLite
//! database.
//!
//! # Usage
//!
//! ```text
//! forum register --email ana@example.com --password secret1
//! forum post new --topic "Hello" --content "First post"
//! forum feed --favorites
//! forum watch
//! ```

mod commands;
mod config;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use forum_store_sqlite::{SqliteDirectory, SqliteStore};
use forum_sync::Forum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::config::ForumConfig;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "forum", version, about = "Forum client")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "forum.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Create an account and sign in.
  Register {
    #[arg(long)]
    email:    String,
    #[arg(long, env = "FORUM_PASSWORD")]
    password: String,
  },
  /// Sign in to an existing account.
  Login {
    #[arg(long)]
    email:    String,
    #[arg(long, env = "FORUM_PASSWORD")]
    password: String,
  },
  /// Sign out.
  Logout,
  /// Show the signed-in account.
  Whoami,
  /// Change your display name.
  Rename { name: String },
  /// Request a password-reset e-mail.
  ResetPassword {
    #[arg(long)]
    email: String,
  },
  /// List posts, newest first.
  Feed {
    /// Only posts you marked as favorite.
    #[arg(long, conflicts_with = "mine")]
    favorites: bool,
    /// Only posts you wrote.
    #[arg(long)]
    mine:      bool,
  },
  /// Show one post with its comments.
  Show { post: Uuid },
  /// Create, edit or delete posts.
  #[command(subcommand)]
  Post(PostCommand),
  /// Add, edit or delete comments.
  #[command(subcommand)]
  Comment(CommentCommand),
  /// Toggle a post in your favorites.
  Fav { post: Uuid },
  /// Print the feed every time it changes, until interrupted.
  Watch,
}

#[derive(Subcommand, Debug)]
enum PostCommand {
  New {
    #[arg(long)]
    topic:   String,
    #[arg(long)]
    content: String,
  },
  /// Edit a post you wrote; omitted fields keep their current value.
  Edit {
    post:    Uuid,
    #[arg(long)]
    topic:   Option<String>,
    #[arg(long)]
    content: Option<String>,
  },
  Rm { post: Uuid },
}

#[derive(Subcommand, Debug)]
enum CommentCommand {
  Add { post: Uuid, content: String },
  Edit { post: Uuid, comment: Uuid, content: String },
  Rm { post: Uuid, comment: Uuid },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = ForumConfig::load(&cli.config)?;

  if let Some(parent) = cfg.store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }

  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;
  let directory = SqliteDirectory::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open directory at {:?}", cfg.store_path))?;

  let forum = Forum::new(Arc::new(store), Arc::new(directory));
  commands::run(&forum, &cfg, cli.command).await
}
