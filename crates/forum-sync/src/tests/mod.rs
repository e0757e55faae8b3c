//! Tests for the sync layer, against the scripted fakes in [`fake`] and, end
//! to end, against the SQLite backend.

mod screens;

use std::{sync::Arc, time::Duration};

use chrono::{TimeZone, Utc};
use forum_core::{
  document::{Document, Entity},
  entity::{Post, User},
  path::CollectionPath,
};
use uuid::Uuid;

use self::fake::{FakeDirectory, FakeStore};
use crate::Forum;

type TestForum = Forum<FakeStore, FakeDirectory>;

struct Harness {
  store:     Arc<FakeStore>,
  directory: Arc<FakeDirectory>,
  forum:     TestForum,
}

fn harness() -> Harness {
  let store = Arc::new(FakeStore::default());
  let directory = Arc::new(FakeDirectory::default());
  let forum = Forum::new(Arc::clone(&store), Arc::clone(&directory));
  Harness { store, directory, forum }
}

/// A harness with `ana@example.com` signed in and a session started.
fn signed_in() -> (Harness, User) {
  let h = harness();
  let user = h.directory.add_account("ana@example.com", "secret1", "Ana");
  h.directory.set_current(Some(user.clone()));
  h.forum.begin_session(user.clone());
  (h, user)
}

fn post(topic: &str, created_ms: i64) -> Post {
  post_by(Uuid::new_v4(), topic, created_ms)
}

fn post_by(author_id: Uuid, topic: &str, created_ms: i64) -> Post {
  Post {
    post_id: Uuid::new_v4(),
    author_id,
    author_name: "Ana".into(),
    topic: topic.into(),
    content: format!("about {topic}"),
    created_at: Utc.timestamp_millis_opt(created_ms).unwrap(),
  }
}

fn doc<E: Entity>(entity: &E) -> Document {
  Document::new(entity.id(), entity.to_fields().unwrap())
}

/// Seed `post` into the fake store without notifying subscribers.
fn seed(store: &FakeStore, post: &Post) {
  store.insert(CollectionPath::Posts, post.post_id, post.to_fields().unwrap());
}

fn topics(posts: &[Post]) -> Vec<&str> { posts.iter().map(|p| p.topic.as_str()).collect() }

/// Poll `cond` until it holds, failing the test after two seconds.
async fn wait_for(mut cond: impl FnMut() -> bool) {
  tokio::time::timeout(Duration::from_secs(2), async {
    while !cond() {
      tokio::time::sleep(Duration::from_millis(5)).await;
    }
  })
  .await
  .expect("condition not reached within timeout");
}

/// Give spawned subscription tasks a chance to drain their queues.
async fn settle() { tokio::time::sleep(Duration::from_millis(50)).await; }
