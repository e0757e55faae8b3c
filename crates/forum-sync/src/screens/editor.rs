//! Create / edit post screen.

use forum_core::{
  Result,
  directory::DirectoryService,
  entity::Post,
  store::DocumentStore,
};
use uuid::Uuid;

use crate::{Forum, LoadingFlag};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
  Create,
  Edit(Uuid),
}

pub struct EditorScreen<S, D> {
  forum: Forum<S, D>,

  pub mode:    EditorMode,
  pub topic:   String,
  pub content: String,
  pub saving:  LoadingFlag,
}

impl<S, D> EditorScreen<S, D>
where
  S: DocumentStore + 'static,
  D: DirectoryService,
{
  /// An empty editor for a new post.
  pub fn create(forum: Forum<S, D>) -> Self {
    Self {
      forum,
      mode: EditorMode::Create,
      topic: String::new(),
      content: String::new(),
      saving: LoadingFlag::default(),
    }
  }

  /// An editor for `post_id`, pre-filled from a fresh fetch of the post. If
  /// the post cannot be loaded the fields stay empty.
  pub async fn edit(forum: Forum<S, D>, post_id: Uuid) -> Self {
    forum.gateway().get_post_by_id(post_id).await;
    let loaded = forum
      .projections()
      .selected_post()
      .filter(|p| p.post_id == post_id);

    let mut screen = Self::create(forum);
    screen.mode = EditorMode::Edit(post_id);
    if let Some(post) = loaded {
      screen.topic = post.topic;
      screen.content = post.content;
    }
    screen
  }

  pub fn can_submit(&self) -> bool {
    !self.saving.is_set() && !self.topic.trim().is_empty() && !self.content.trim().is_empty()
  }

  /// Save the draft. Returns the created post in create mode, `None` after
  /// an edit.
  pub async fn submit(&self) -> Result<Option<Post>> {
    let _busy = self.saving.raise();
    match self.mode {
      EditorMode::Create => {
        let post = self.forum.create_post(&self.topic, &self.content).await?;
        Ok(Some(post))
      }
      EditorMode::Edit(post_id) => {
        self
          .forum
          .gateway()
          .update_post(post_id, &self.topic, &self.content)
          .await?;
        Ok(None)
      }
    }
  }
}
