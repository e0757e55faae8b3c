use forum_core::{Error, Failure, path::CollectionPath};
use strum::IntoEnumIterator;
use uuid::Uuid;

use super::{harness, post, post_by, seed, settle, signed_in, topics, wait_for};
use crate::{
  StreamKey,
  screens::{
    AuthMode, AuthOutcome, AuthScreen, EditorMode, EditorScreen, FeedScreen, Focus,
    ProfileScreen, RenameOutcome, Tab,
  },
};

// ─── Feed ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn feed_starts_on_community_listing() {
  let (h, _) = signed_in();
  let feed = FeedScreen::new(h.forum.clone());
  assert_eq!(feed.tab, Tab::Community);
  assert_eq!(feed.focus, Focus::Listing);
  assert!(feed.fab_visible());
  assert_eq!(Tab::iter().map(|t| t.to_string()).collect::<Vec<_>>(), ["Community", "Favorites"]);
}

#[tokio::test]
async fn opening_a_post_focuses_it_and_streams_comments() {
  let (h, _) = signed_in();
  let p = post("p", 1);
  seed(&h.store, &p);
  let mut feed = FeedScreen::new(h.forum.clone());

  feed.open_post(p.post_id).await;

  assert_eq!(feed.focus, Focus::Detail(p.post_id));
  assert!(!feed.fab_visible());
  assert_eq!(feed.focused_post(), Some(p.clone()));
  assert_eq!(
    h.forum.subscriptions().active_query(StreamKey::Comments).map(|q| q.path),
    Some(CollectionPath::Comments(p.post_id))
  );
}

#[tokio::test]
async fn switching_posts_never_shows_the_previous_posts_comments() {
  let (h, _) = signed_in();
  let (a, b) = (post("A", 1), post("B", 2));
  seed(&h.store, &a);
  seed(&h.store, &b);
  let mut feed = FeedScreen::new(h.forum.clone());

  feed.open_post(a.post_id).await;
  h.forum.create_comment(a.post_id, "comment on A").await.unwrap();
  wait_for(|| feed.comments().len() == 1).await;

  h.store.fail_reads(true);
  feed.open_post(b.post_id).await;
  assert_eq!(feed.focus, Focus::Detail(b.post_id));
  assert!(feed.comments().is_empty());

  settle().await;
  assert!(feed.comments().iter().all(|c| c.post_id == b.post_id));
}

#[tokio::test]
async fn tab_switch_always_returns_to_listing() {
  let (h, user) = signed_in();
  let p = post_by(user.user_id, "p", 1);
  seed(&h.store, &p);
  let mut feed = FeedScreen::new(h.forum.clone());

  for tab in Tab::iter() {
    feed.open_post(p.post_id).await;
    feed.open_comment_input();
    assert!(feed.open_admin_menu());

    feed.select_tab(tab);

    assert_eq!(feed.tab, tab);
    assert_eq!(feed.focus, Focus::Listing);
    assert!(!h.forum.subscriptions().is_active(StreamKey::Comments));
    assert!(h.forum.projections().comments().is_empty());
    assert_eq!(h.forum.projections().selected_post(), None);
    assert!(feed.comment_input.is_none());
    assert!(!feed.admin_menu_open);
  }
}

#[tokio::test]
async fn back_to_list_discards_in_flight_fetch() {
  let (h, _) = signed_in();
  let p = post("p", 1);
  seed(&h.store, &p);
  let release = h.store.gate_get(p.post_id);

  let forum = h.forum.clone();
  let opening = tokio::spawn(async move {
    let mut feed = FeedScreen::new(forum);
    feed.open_post(p.post_id).await;
  });
  wait_for(|| h.store.gated_gets() == 1).await;

  let mut feed = FeedScreen::new(h.forum.clone());
  feed.back_to_list();
  release.send(()).unwrap();
  opening.await.unwrap();

  assert_eq!(h.forum.projections().selected_post(), None);
}

#[tokio::test]
async fn visible_posts_follow_the_tab() {
  let (h, _) = signed_in();
  let (p1, p2) = (post("one", 1), post("two", 2));
  seed(&h.store, &p1);
  seed(&h.store, &p2);
  h.forum.subscriptions().watch_posts();
  let mut feed = FeedScreen::new(h.forum.clone());

  wait_for(|| topics(&feed.visible_posts()) == ["two", "one"]).await;

  feed.open_post(p1.post_id).await;
  feed.toggle_favorite().await.unwrap();
  wait_for(|| feed.is_favorite()).await;

  feed.select_tab(Tab::Favorites);
  wait_for(|| topics(&feed.visible_posts()) == ["one"]).await;
}

#[tokio::test]
async fn admin_actions_are_author_only() {
  let (h, _) = signed_in();
  let foreign = post("theirs", 1);
  seed(&h.store, &foreign);
  let mut feed = FeedScreen::new(h.forum.clone());

  feed.open_post(foreign.post_id).await;
  assert!(!feed.is_author());
  assert!(!feed.open_admin_menu());
  assert_eq!(feed.edit_focused(), None);
  feed.request_delete();
  assert!(!feed.delete_dialog_open);
}

#[tokio::test]
async fn confirmed_delete_returns_to_listing() {
  let (h, user) = signed_in();
  let mine = post_by(user.user_id, "mine", 1);
  seed(&h.store, &mine);
  let mut feed = FeedScreen::new(h.forum.clone());

  feed.open_post(mine.post_id).await;
  assert_eq!(feed.edit_focused(), Some(mine.post_id));
  feed.request_delete();
  assert!(feed.delete_dialog_open);

  feed.confirm_delete().await.unwrap();
  assert_eq!(feed.focus, Focus::Listing);
  assert!(!feed.delete_dialog_open);
  assert!(!feed.deleting.is_set());
  assert!(!h.store.contains(CollectionPath::Posts, mine.post_id));
}

#[tokio::test]
async fn failed_delete_stays_on_post_and_lowers_flag() {
  let (h, user) = signed_in();
  let mine = post_by(user.user_id, "mine", 1);
  seed(&h.store, &mine);
  let mut feed = FeedScreen::new(h.forum.clone());
  feed.open_post(mine.post_id).await;
  feed.request_delete();

  h.store.fail_writes(true);
  let err = feed.confirm_delete().await.unwrap_err();
  assert_eq!(err.failure(), Failure::Write);
  assert_eq!(feed.focus, Focus::Detail(mine.post_id));
  assert!(!feed.deleting.is_set());
}

#[tokio::test]
async fn comment_box_collapses_on_success_and_keeps_text_on_failure() {
  let (h, _) = signed_in();
  let p = post("p", 1);
  seed(&h.store, &p);
  let mut feed = FeedScreen::new(h.forum.clone());
  feed.open_post(p.post_id).await;

  feed.open_comment_input();
  assert!(matches!(feed.submit_comment().await, Err(Error::Validation(_))));

  feed.comment_input = Some("nice".into());
  h.store.fail_writes(true);
  assert!(feed.submit_comment().await.is_err());
  assert_eq!(feed.comment_input.as_deref(), Some("nice"));
  assert!(!feed.sending_comment.is_set());

  h.store.fail_writes(false);
  let comment = feed.submit_comment().await.unwrap();
  assert_eq!(comment.content, "nice");
  assert!(feed.comment_input.is_none());
  wait_for(|| feed.comments().len() == 1).await;
}

#[tokio::test]
async fn comment_edit_dialog_is_author_only() {
  let (h, _) = signed_in();
  let p = post("p", 1);
  seed(&h.store, &p);
  let mut feed = FeedScreen::new(h.forum.clone());
  feed.open_post(p.post_id).await;

  feed.comment_input = Some("first".into());
  let mine = feed.submit_comment().await.unwrap();
  let mut theirs = mine.clone();
  theirs.author_id = Uuid::new_v4();

  assert!(!feed.begin_comment_edit(theirs));
  assert!(feed.begin_comment_edit(mine.clone()));

  if let Some(edit) = feed.comment_edit.as_mut() {
    edit.draft = "edited".into();
  }
  feed.save_comment_edit().await.unwrap();
  assert!(feed.comment_edit.is_none());
  wait_for(|| feed.comments().first().is_some_and(|c| c.content == "edited")).await;

  feed.delete_comment(&mine).await.unwrap();
  wait_for(|| feed.comments().is_empty()).await;
}

// ─── Editor ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn editor_rejects_blank_fields_and_lowers_flag() {
  let (h, _) = signed_in();
  let mut editor = EditorScreen::create(h.forum.clone());
  assert!(!editor.can_submit());

  editor.topic = "topic".into();
  let err = editor.submit().await.unwrap_err();
  assert_eq!(err.failure(), Failure::Validation);
  assert!(!editor.saving.is_set());
  assert!(h.store.writes().is_empty());

  editor.content = "body".into();
  assert!(editor.can_submit());
  let created = editor.submit().await.unwrap().unwrap();
  assert_eq!(created.topic, "topic");
}

#[tokio::test]
async fn editor_prefills_in_edit_mode() {
  let (h, user) = signed_in();
  let mine = post_by(user.user_id, "before", 1);
  seed(&h.store, &mine);

  let mut editor = EditorScreen::edit(h.forum.clone(), mine.post_id).await;
  assert_eq!(editor.mode, EditorMode::Edit(mine.post_id));
  assert_eq!(editor.topic, "before");
  assert_eq!(editor.content, mine.content);

  editor.topic = "after".into();
  assert_eq!(editor.submit().await.unwrap(), None);
  let stored = h.forum.gateway().fetch_post(mine.post_id).await.unwrap().unwrap();
  assert_eq!(stored.topic, "after");
}

// ─── Profile ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn profile_lists_only_my_posts() {
  let (h, user) = signed_in();
  let (old, new) = (post_by(user.user_id, "old", 1), post_by(user.user_id, "new", 3));
  seed(&h.store, &old);
  seed(&h.store, &new);
  seed(&h.store, &post("theirs", 2));
  let profile = ProfileScreen::new(h.forum.clone());

  wait_for(|| topics(&profile.my_posts()) == ["new", "old"]).await;
  assert_eq!(profile.header_name(), "Ana");
  assert_eq!(profile.email(), "ana@example.com");
}

#[tokio::test]
async fn rename_validates_and_skips_unchanged_names() {
  let (h, _) = signed_in();
  let mut profile = ProfileScreen::new(h.forum.clone());

  profile.open_rename();
  assert_eq!(profile.rename_draft.as_deref(), Some("Ana"));
  assert_eq!(profile.submit_rename().await.unwrap(), RenameOutcome::Unchanged);
  assert!(profile.rename_draft.is_none());
  assert_eq!(h.directory.rename_calls(), 0);

  profile.rename_draft = Some("   ".into());
  let err = profile.submit_rename().await.unwrap_err();
  assert_eq!(err.failure(), Failure::Validation);
  assert!(profile.rename_draft.is_some());

  profile.rename_draft = Some("Ana B".into());
  let RenameOutcome::Renamed(user) = profile.submit_rename().await.unwrap() else {
    panic!("expected a rename");
  };
  assert_eq!(user.display_name, "Ana B");
  assert_eq!(profile.header_name(), "Ana B");
  assert!(!profile.updating.is_set());
}

#[tokio::test]
async fn failed_rename_keeps_dialog_open() {
  let (h, _) = signed_in();
  let mut profile = ProfileScreen::new(h.forum.clone());
  h.directory.fail(true);

  profile.rename_draft = Some("Someone".into());
  let err = profile.submit_rename().await.unwrap_err();
  assert_eq!(err.failure(), Failure::Auth);
  assert_eq!(profile.rename_draft.as_deref(), Some("Someone"));
  assert!(!profile.updating.is_set());
}

#[tokio::test]
async fn profile_delete_dialog_holds_pending_post() {
  let (h, user) = signed_in();
  let mine = post_by(user.user_id, "mine", 1);
  seed(&h.store, &mine);
  let mut profile = ProfileScreen::new(h.forum.clone());

  profile.request_delete(mine.post_id);
  profile.cancel_delete();
  profile.confirm_delete().await.unwrap();
  assert!(h.store.contains(CollectionPath::Posts, mine.post_id));

  profile.request_delete(mine.post_id);
  profile.confirm_delete().await.unwrap();
  assert!(profile.pending_delete.is_none());
  assert!(!h.store.contains(CollectionPath::Posts, mine.post_id));
}

#[tokio::test]
async fn sign_out_tears_down_the_session() {
  let (h, _) = signed_in();
  let p = post("p", 1);
  seed(&h.store, &p);
  wait_for(|| h.forum.projections().posts().len() == 1).await;
  let mut profile = ProfileScreen::new(h.forum.clone());

  profile.sign_out().await.unwrap();

  assert!(h.forum.user().is_none());
  assert_eq!(h.forum.subscriptions().active_count(), 0);
  assert!(h.forum.projections().posts().is_empty());
  wait_for(|| h.store.live_subscribers(CollectionPath::Posts) == 0).await;
}

// ─── Auth ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn auth_requires_all_fields() {
  let h = harness();
  let mut auth = AuthScreen::new(h.forum.clone());
  auth.email = "ana@example.com".into();

  let err = auth.submit().await.unwrap_err();
  assert_eq!(err.to_string(), "Fill in all fields");
  assert!(!auth.loading.is_set());
}

#[tokio::test]
async fn sign_in_begins_the_session() {
  let h = harness();
  let user = h.directory.add_account("ana@example.com", "secret1", "Ana");
  let mut auth = AuthScreen::new(h.forum.clone());
  auth.email = " ana@example.com ".into();
  auth.password = "secret1".into();

  assert_eq!(auth.submit().await.unwrap(), AuthOutcome::SignedIn(user.clone()));
  assert_eq!(h.forum.user(), Some(user));
  assert!(auth.password.is_empty());
  assert!(h.forum.subscriptions().is_active(StreamKey::Posts));
  assert!(h.forum.subscriptions().is_active(StreamKey::FavoriteIds));
}

#[tokio::test]
async fn bad_credentials_are_an_auth_failure() {
  let h = harness();
  h.directory.add_account("ana@example.com", "secret1", "Ana");
  let mut auth = AuthScreen::new(h.forum.clone());
  auth.email = "ana@example.com".into();
  auth.password = "wrong".into();

  let err = auth.submit().await.unwrap_err();
  assert_eq!(err.failure(), Failure::Auth);
  assert!(h.forum.user().is_none());
  assert_eq!(h.forum.subscriptions().active_count(), 0);
  assert!(!auth.loading.is_set());
}

#[tokio::test]
async fn register_and_reset_modes() {
  let h = harness();
  let mut auth = AuthScreen::new(h.forum.clone());
  auth.switch_mode(AuthMode::Register);
  auth.email = "new@example.com".into();
  auth.password = "secret1".into();
  assert!(matches!(auth.submit().await.unwrap(), AuthOutcome::SignedIn(_)));

  auth.switch_mode(AuthMode::ForgotPassword);
  assert!(auth.password.is_empty());
  assert_eq!(auth.submit().await.unwrap(), AuthOutcome::ResetSent);
  assert_eq!(h.directory.resets(), ["new@example.com"]);

  auth.email.clear();
  assert_eq!(auth.submit().await.unwrap_err().failure(), Failure::Validation);
}

#[tokio::test]
async fn restore_session_resumes_persisted_user() {
  let h = harness();
  assert_eq!(h.forum.restore_session().await.unwrap(), None);
  assert_eq!(h.forum.subscriptions().active_count(), 0);

  let user = h.directory.add_account("ana@example.com", "secret1", "Ana");
  h.directory.set_current(Some(user.clone()));
  assert_eq!(h.forum.restore_session().await.unwrap(), Some(user));
  assert!(h.forum.subscriptions().is_active(StreamKey::Posts));
}
