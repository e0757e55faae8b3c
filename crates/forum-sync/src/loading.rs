//! Boolean in-flight flags for screen coordinators.

use tokio::sync::watch;

/// Set while a mutation is in flight. Raising returns a guard; the flag drops
/// back when the guard does, whether the mutation succeeded, failed or was
/// cancelled.
#[derive(Debug)]
pub struct LoadingFlag {
  tx: watch::Sender<bool>,
}

impl Default for LoadingFlag {
  fn default() -> Self { Self { tx: watch::channel(false).0 } }
}

impl LoadingFlag {
  pub fn is_set(&self) -> bool { *self.tx.borrow() }

  pub fn watch(&self) -> watch::Receiver<bool> { self.tx.subscribe() }

  pub fn raise(&self) -> LoadingGuard<'_> {
    self.tx.send_replace(true);
    LoadingGuard { flag: self }
  }
}

#[must_use = "the flag is lowered as soon as the guard is dropped"]
pub struct LoadingGuard<'a> {
  flag: &'a LoadingFlag,
}

impl Drop for LoadingGuard<'_> {
  fn drop(&mut self) { self.flag.tx.send_replace(false); }
}
