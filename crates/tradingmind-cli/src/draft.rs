//! Debounced draft persistence.
//!
//! Every input replaces the pending write; the draft only reaches the
//! [`DraftCache`] once input has been quiet for the configured delay.

use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;
use tracing::debug;
use tradingmind_core::local::{Draft, DraftCache};

pub struct DraftWriter {
  cache:      Arc<DraftCache>,
  delay:      Duration,
  latest:     Option<Draft>,
  pending:    Option<JoinHandle<()>>,
  /// Aborted writes whose tasks may not have stopped yet.
  superseded: Vec<JoinHandle<()>>,
}

impl DraftWriter {
  pub fn new(cache: Arc<DraftCache>, delay: Duration) -> Self {
    Self { cache, delay, latest: None, pending: None, superseded: Vec::new() }
  }

  /// Record new input. Cancels any pending write and schedules this one.
  pub fn input(&mut self, draft: Draft) {
    self.abort_pending();
    self.latest = Some(draft.clone());

    let cache = Arc::clone(&self.cache);
    let delay = self.delay;
    self.pending = Some(tokio::spawn(async move {
      tokio::time::sleep(delay).await;
      cache.save(&draft);
    }));
  }

  /// Write the latest input now instead of waiting out the delay.
  ///
  /// Debounced writes already in progress finish first, so none can land
  /// after this one or after the draft is cleared.
  pub async fn flush(&mut self) -> bool {
    self.settle().await;
    match self.latest.take() {
      Some(draft) => self.cache.save(&draft),
      None => false,
    }
  }

  /// Drop any pending write without persisting it.
  pub async fn cancel(&mut self) {
    self.settle().await;
    self.latest = None;
  }

  /// Abort every outstanding write and wait until their tasks have stopped.
  async fn settle(&mut self) {
    self.abort_pending();
    for handle in std::mem::take(&mut self.superseded) {
      // A cancelled task reports `JoinError::Cancelled`; either way it is done.
      let _ = handle.await;
    }
  }

  fn abort_pending(&mut self) {
    self.superseded.retain(|handle| !handle.is_finished());
    if let Some(handle) = self.pending.take()
      && !handle.is_finished()
    {
      debug!("superseding pending draft write");
      handle.abort();
      self.superseded.push(handle);
    }
  }
}

impl Drop for DraftWriter {
  fn drop(&mut self) { self.abort_pending(); }
}
