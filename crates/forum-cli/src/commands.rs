//! Command dispatch: each subcommand drives the screen coordinators the way
//! the interactive client would.

use std::time::Duration;

use anyhow::{Context as _, bail};
use forum_core::entity::{Comment, Post, User};
use forum_store_sqlite::{SqliteDirectory, SqliteStore};
use forum_sync::{
  FavoriteChange, Forum,
  screens::{AuthMode, AuthOutcome, AuthScreen, EditorScreen, FeedScreen, ProfileScreen, RenameOutcome},
};
use tokio::sync::watch;
use uuid::Uuid;

use crate::{Command, CommentCommand, PostCommand, config::ForumConfig};

type LocalForum = Forum<SqliteStore, SqliteDirectory>;

pub async fn run(forum: &LocalForum, cfg: &ForumConfig, command: Command) -> anyhow::Result<()> {
  let timeout = cfg.snapshot_timeout();

  match command {
    Command::Register { email, password } => {
      let user = authenticate(forum, AuthMode::Register, email, password).await?;
      println!("Account created. Signed in as {}.", user.short_name());
    }
    Command::Login { email, password } => {
      let user = authenticate(forum, AuthMode::SignIn, email, password).await?;
      println!("Signed in as {}.", user.short_name());
    }
    Command::Logout => {
      forum.sign_out().await?;
      println!("Signed out.");
    }
    Command::Whoami => match forum.restore_session().await? {
      Some(user) => println!("{} <{}> ({})", user.short_name(), user.email, user.user_id),
      None => println!("Not signed in."),
    },
    Command::Rename { name } => {
      require_user(forum).await?;
      let mut profile = ProfileScreen::new(forum.clone());
      profile.open_rename();
      profile.rename_draft = Some(name);
      match profile.submit_rename().await? {
        RenameOutcome::Unchanged => println!("Name unchanged."),
        RenameOutcome::Renamed(user) => println!("Name updated to {}.", user.display_name),
      }
    }
    Command::ResetPassword { email } => {
      let mut auth = AuthScreen::new(forum.clone());
      auth.switch_mode(AuthMode::ForgotPassword);
      auth.email = email;
      auth.submit().await?;
      println!("Password reset e-mail sent.");
    }

    Command::Feed { favorites, mine } => {
      // Watch before the session starts its streams so no snapshot is missed.
      let projections = forum.projections();
      let (mut posts_rx, mut ids_rx, mut favs_rx) = (
        projections.watch_posts(),
        projections.watch_favorite_ids(),
        projections.watch_favorite_posts(),
      );
      let user = require_user(forum).await?;

      let posts = if favorites {
        first_snapshot(&mut ids_rx, timeout).await?;
        if projections.favorite_ids().is_empty() {
          Vec::new()
        } else {
          first_snapshot(&mut favs_rx, timeout).await?;
          projections.favorite_posts()
        }
      } else {
        first_snapshot(&mut posts_rx, timeout).await?;
        if mine {
          ProfileScreen::new(forum.clone()).my_posts()
        } else {
          projections.posts()
        }
      };
      print_posts(&posts, Some(&user));
    }
    Command::Show { post } => {
      let mut comments = forum.projections().watch_comments();
      let mut ids = forum.projections().watch_favorite_ids();
      require_user(forum).await?;
      let mut feed = FeedScreen::new(forum.clone());
      feed.open_post(post).await;

      let p = feed.focused_post().context("post not found")?;
      first_snapshot(&mut comments, timeout).await?;
      first_snapshot(&mut ids, timeout).await?;
      print_post(&p, feed.is_favorite());
      print_comments(&feed.comments());
      feed.back_to_list();
    }

    Command::Post(PostCommand::New { topic, content }) => {
      require_user(forum).await?;
      let mut editor = EditorScreen::create(forum.clone());
      editor.topic = topic;
      editor.content = content;
      if let Some(post) = editor.submit().await? {
        println!("Created post {}.", post.post_id);
      }
    }
    Command::Post(PostCommand::Edit { post, topic, content }) => {
      let user = require_user(forum).await?;
      let mut editor = EditorScreen::edit(forum.clone(), post).await;
      let current = forum.projections().selected_post().context("post not found")?;
      if current.author_id != user.user_id {
        bail!("only the author can edit this post");
      }
      if let Some(topic) = topic {
        editor.topic = topic;
      }
      if let Some(content) = content {
        editor.content = content;
      }
      editor.submit().await?;
      println!("Updated post {post}.");
    }
    Command::Post(PostCommand::Rm { post }) => {
      require_user(forum).await?;
      let mut feed = FeedScreen::new(forum.clone());
      feed.open_post(post).await;
      feed.focused_post().context("post not found")?;
      feed.request_delete();
      if !feed.delete_dialog_open {
        bail!("only the author can delete this post");
      }
      feed.confirm_delete().await?;
      println!("Deleted post {post}.");
    }

    Command::Comment(CommentCommand::Add { post, content }) => {
      require_user(forum).await?;
      let mut feed = FeedScreen::new(forum.clone());
      feed.open_post(post).await;
      feed.focused_post().context("post not found")?;
      feed.open_comment_input();
      feed.comment_input = Some(content);
      let comment = feed.submit_comment().await?;
      println!("Added comment {}.", comment.comment_id);
    }
    Command::Comment(CommentCommand::Edit { post, comment, content }) => {
      require_user(forum).await?;
      let (mut feed, target) = open_comment(forum, post, comment, timeout).await?;
      if !feed.begin_comment_edit(target) {
        bail!("only the author can edit this comment");
      }
      if let Some(edit) = feed.comment_edit.as_mut() {
        edit.draft = content;
      }
      feed.save_comment_edit().await?;
      println!("Updated comment {comment}.");
    }
    Command::Comment(CommentCommand::Rm { post, comment }) => {
      require_user(forum).await?;
      let (feed, target) = open_comment(forum, post, comment, timeout).await?;
      if !feed.can_edit_comment(&target) {
        bail!("only the author can delete this comment");
      }
      feed.delete_comment(&target).await?;
      println!("Deleted comment {comment}.");
    }

    Command::Fav { post } => {
      // The toggle direction comes from the local id set, so load it first.
      let mut ids = forum.projections().watch_favorite_ids();
      require_user(forum).await?;
      first_snapshot(&mut ids, timeout).await?;
      match forum.toggle_favorite(post).await? {
        FavoriteChange::Added => println!("Added {post} to favorites."),
        FavoriteChange::Removed => println!("Removed {post} from favorites."),
      }
    }
    Command::Watch => {
      let rx = forum.projections().watch_posts();
      let user = require_user(forum).await?;
      watch_feed(&user, rx).await?;
    }
  }

  forum.subscriptions().shutdown();
  Ok(())
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

async fn authenticate(
  forum: &LocalForum,
  mode: AuthMode,
  email: String,
  password: String,
) -> anyhow::Result<User> {
  let mut auth = AuthScreen::new(forum.clone());
  auth.switch_mode(mode);
  auth.email = email;
  auth.password = password;
  match auth.submit().await? {
    AuthOutcome::SignedIn(user) => Ok(user),
    AuthOutcome::ResetSent => bail!("unexpected reset outcome in {mode} mode"),
  }
}

/// Resume the persisted session; every command but login and register
/// needs one.
async fn require_user(forum: &LocalForum) -> anyhow::Result<User> {
  forum
    .restore_session()
    .await?
    .context("not signed in; run `forum login` first")
}

/// Wait until `rx` sees its first value from a subscription.
async fn first_snapshot<T>(rx: &mut watch::Receiver<T>, timeout: Duration) -> anyhow::Result<()> {
  tokio::time::timeout(timeout, rx.changed())
    .await
    .context("timed out waiting for data")?
    .context("projection closed")?;
  Ok(())
}

async fn open_comment(
  forum: &LocalForum,
  post: Uuid,
  comment: Uuid,
  timeout: Duration,
) -> anyhow::Result<(FeedScreen<SqliteStore, SqliteDirectory>, Comment)> {
  let mut rx = forum.projections().watch_comments();
  let mut feed = FeedScreen::new(forum.clone());
  feed.open_post(post).await;
  first_snapshot(&mut rx, timeout).await?;

  let target = feed
    .comments()
    .into_iter()
    .find(|c| c.comment_id == comment)
    .context("comment not found")?;
  Ok((feed, target))
}

async fn watch_feed(user: &User, mut rx: watch::Receiver<Vec<Post>>) -> anyhow::Result<()> {
  loop {
    tokio::select! {
      changed = rx.changed() => {
        changed.context("feed closed")?;
        let posts = rx.borrow_and_update().clone();
        println!("── {} ──", chrono::Local::now().format("%H:%M:%S"));
        print_posts(&posts, Some(user));
      }
      _ = tokio::signal::ctrl_c() => break,
    }
  }
  Ok(())
}

// ─── Output ───────────────────────────────────────────────────────────────────

fn print_posts(posts: &[Post], me: Option<&User>) {
  if posts.is_empty() {
    println!("No posts.");
    return;
  }
  for post in posts {
    let mine = me.is_some_and(|u| u.user_id == post.author_id);
    println!(
      "{}  {}  {:<24}  {}{}",
      post.post_id,
      post.created_at.format("%Y-%m-%d %H:%M"),
      post.author_name,
      post.topic,
      if mine { "  (you)" } else { "" },
    );
  }
}

fn print_post(post: &Post, favorite: bool) {
  println!("{}{}", post.topic, if favorite { "  ♥" } else { "" });
  println!("by {} on {}", post.author_name, post.created_at.format("%Y-%m-%d %H:%M"));
  println!();
  println!("{}", post.content);
}

fn print_comments(comments: &[Comment]) {
  println!();
  if comments.is_empty() {
    println!("No comments yet.");
    return;
  }
  for c in comments {
    println!("[{}] {} ({}): {}", c.comment_id, c.author_name, c.created_at.format("%H:%M"), c.content);
  }
}
