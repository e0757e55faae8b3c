//! Integration tests for `SqliteStore` and `SqliteDirectory` against
//! in-memory databases.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use forum_core::{
  directory::DirectoryService,
  document::{Entity, fields},
  entity::{Post, field},
  path::{CollectionPath, Query},
  store::{DocumentStore, SnapshotStream},
};
use serde_json::json;
use uuid::Uuid;

use crate::{Error, SqliteDirectory, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn directory() -> SqliteDirectory {
  SqliteDirectory::open_in_memory()
    .await
    .expect("in-memory directory")
}

fn post(topic: &str, created_ms: i64) -> Post {
  Post {
    post_id:     Uuid::new_v4(),
    author_id:   Uuid::nil(),
    author_name: "Ana".into(),
    topic:       topic.into(),
    content:     format!("about {topic}"),
    created_at:  Utc.timestamp_millis_opt(created_ms).unwrap(),
  }
}

async fn put(s: &SqliteStore, p: &Post) {
  s.create_or_replace(CollectionPath::Posts, Some(p.post_id), p.to_fields().unwrap())
    .await
    .unwrap();
}

async fn next_topics(stream: &mut SnapshotStream<Error>) -> Vec<String> {
  let snapshot = tokio::time::timeout(Duration::from_secs(5), stream.next())
    .await
    .expect("snapshot within timeout")
    .expect("stream open")
    .expect("snapshot ok");
  snapshot
    .into_iter()
    .map(|doc| Post::from_document(doc).unwrap().topic)
    .collect()
}

// ─── Documents ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_document() {
  let s = store().await;
  let p = post("rust", 100);
  put(&s, &p).await;

  let doc = s.get_one(CollectionPath::Posts, p.post_id).await.unwrap().unwrap();
  assert_eq!(Post::from_document(doc).unwrap(), p);
}

#[tokio::test]
async fn get_missing_document_returns_none() {
  let s = store().await;
  let doc = s.get_one(CollectionPath::Posts, Uuid::new_v4()).await.unwrap();
  assert!(doc.is_none());
}

#[tokio::test]
async fn create_without_id_assigns_one() {
  let s = store().await;
  let id = s
    .create_or_replace(CollectionPath::Posts, None, fields([("topic", json!("x"))]))
    .await
    .unwrap();
  assert!(s.get_one(CollectionPath::Posts, id).await.unwrap().is_some());
}

#[tokio::test]
async fn collections_are_isolated() {
  let s = store().await;
  let p = post("rust", 100);
  put(&s, &p).await;

  let other = CollectionPath::Comments(p.post_id);
  assert!(s.get_one(other, p.post_id).await.unwrap().is_none());
}

#[tokio::test]
async fn update_fields_merges_top_level_fields() {
  let s = store().await;
  let p = post("rust", 100);
  put(&s, &p).await;

  s.update_fields(
    CollectionPath::Posts,
    p.post_id,
    fields([(field::TOPIC, json!("go")), (field::CONTENT, json!("changed"))]),
  )
  .await
  .unwrap();

  let doc = s.get_one(CollectionPath::Posts, p.post_id).await.unwrap().unwrap();
  let updated = Post::from_document(doc).unwrap();
  assert_eq!(updated.topic, "go");
  assert_eq!(updated.content, "changed");
  assert_eq!(updated.author_name, p.author_name);
  assert_eq!(updated.created_at, p.created_at);
}

#[tokio::test]
async fn update_missing_document_fails() {
  let s = store().await;
  let err = s
    .update_fields(CollectionPath::Posts, Uuid::new_v4(), fields([("topic", json!("x"))]))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::DocumentNotFound { .. }));
}

#[tokio::test]
async fn delete_removes_document_and_tolerates_missing() {
  let s = store().await;
  let p = post("rust", 100);
  put(&s, &p).await;

  s.delete(CollectionPath::Posts, p.post_id).await.unwrap();
  assert!(s.get_one(CollectionPath::Posts, p.post_id).await.unwrap().is_none());

  s.delete(CollectionPath::Posts, p.post_id).await.unwrap();
}

// ─── Subscriptions ───────────────────────────────────────────────────────────

#[tokio::test]
async fn subscription_pushes_ordered_snapshots() {
  let s = store().await;
  put(&s, &post("X", 100)).await;
  put(&s, &post("Y", 200)).await;

  let mut stream = s.subscribe(Query::feed()).await.unwrap();
  assert_eq!(next_topics(&mut stream).await, ["Y", "X"]);

  put(&s, &post("Z", 50)).await;
  assert_eq!(next_topics(&mut stream).await, ["Y", "X", "Z"]);
}

#[tokio::test]
async fn subscription_ignores_other_collections() {
  let s = store().await;
  let p = post("X", 100);
  put(&s, &p).await;

  let mut stream = s.subscribe(Query::feed()).await.unwrap();
  assert_eq!(next_topics(&mut stream).await, ["X"]);

  s.create_or_replace(CollectionPath::Comments(p.post_id), None, fields([]))
    .await
    .unwrap();
  put(&s, &post("Y", 200)).await;

  // The comment write produced no snapshot; the next one reflects the post.
  assert_eq!(next_topics(&mut stream).await, ["Y", "X"]);
}

#[tokio::test]
async fn where_in_filters_by_membership() {
  let s = store().await;
  let p1 = post("one", 100);
  let p2 = post("two", 200);
  put(&s, &p1).await;
  put(&s, &p2).await;

  let mut stream = s.subscribe(Query::posts_in([p1.post_id])).await.unwrap();
  assert_eq!(next_topics(&mut stream).await, ["one"]);

  let mut empty = s.subscribe(Query::posts_in([])).await.unwrap();
  assert!(next_topics(&mut empty).await.is_empty());
}

#[tokio::test]
async fn comments_are_ordered_oldest_first() {
  let s = store().await;
  let parent = Uuid::new_v4();
  for (text, at) in [("late", 300), ("early", 100), ("middle", 200)] {
    s.create_or_replace(
      CollectionPath::Comments(parent),
      None,
      fields([(field::TOPIC, json!(text)), (field::CREATED_AT, json!(at))]),
    )
    .await
    .unwrap();
  }

  let mut stream = s.subscribe(Query::comments(parent)).await.unwrap();
  let snapshot = stream.next().await.unwrap().unwrap();
  let order: Vec<_> = snapshot
    .iter()
    .map(|d| d.fields[field::TOPIC].as_str().unwrap().to_owned())
    .collect();
  assert_eq!(order, ["early", "middle", "late"]);
}

// ─── Directory ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn sign_up_starts_a_session() {
  let d = directory().await;
  let user = d.sign_up("ana@example.com", "secret1").await.unwrap();
  assert_eq!(user.email, "ana@example.com");
  assert!(user.display_name.is_empty());

  assert_eq!(d.current_user().await.unwrap(), Some(user));
}

#[tokio::test]
async fn sign_up_rejects_short_password_and_duplicate_email() {
  let d = directory().await;
  let err = d.sign_up("ana@example.com", "123").await.unwrap_err();
  assert!(matches!(err, Error::WeakPassword(_)));

  d.sign_up("ana@example.com", "secret1").await.unwrap();
  let err = d.sign_up("ANA@example.com", "secret2").await.unwrap_err();
  assert!(matches!(err, Error::EmailTaken(_)));
}

#[tokio::test]
async fn sign_in_checks_password() {
  let d = directory().await;
  let user = d.sign_up("ana@example.com", "secret1").await.unwrap();
  d.sign_out().await.unwrap();
  assert!(d.current_user().await.unwrap().is_none());

  let err = d.sign_in("ana@example.com", "wrong!!").await.unwrap_err();
  assert!(matches!(err, Error::InvalidCredentials));
  let err = d.sign_in("bob@example.com", "secret1").await.unwrap_err();
  assert!(matches!(err, Error::InvalidCredentials));

  let again = d.sign_in("ana@example.com", "secret1").await.unwrap();
  assert_eq!(again.user_id, user.user_id);
  assert_eq!(d.current_user().await.unwrap(), Some(again));
}

#[tokio::test]
async fn update_display_name_requires_session() {
  let d = directory().await;
  let err = d.update_display_name("Ana").await.unwrap_err();
  assert!(matches!(err, Error::NotSignedIn));

  d.sign_up("ana@example.com", "secret1").await.unwrap();
  let renamed = d.update_display_name("  Ana  ").await.unwrap();
  assert_eq!(renamed.display_name, "Ana");
  assert_eq!(d.current_user().await.unwrap().unwrap().display_name, "Ana");
}

#[tokio::test]
async fn password_reset_is_recorded_for_known_accounts_only() {
  let d = directory().await;
  d.sign_up("ana@example.com", "secret1").await.unwrap();

  d.send_password_reset("ana@example.com").await.unwrap();
  assert_eq!(d.reset_requests("ana@example.com").await.unwrap(), 1);

  let err = d.send_password_reset("bob@example.com").await.unwrap_err();
  assert!(matches!(err, Error::UnknownEmail(_)));
}
