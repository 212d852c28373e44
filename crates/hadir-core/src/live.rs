//! Standing queries: result sets that are re-delivered whenever the
//! underlying collection changes.
//!
//! A [`Live`] owns a background task that waits on the store's revision
//! counter for one collection and re-runs its query after every bump. The
//! latest result is published through a `watch` channel. Dropping the
//! [`Live`] aborts the task, so a subscription cannot outlive its owner.

use std::{future::Future, sync::Arc};

use tokio::{sync::watch, task::JoinHandle};

use crate::store::{AttendanceStore, Collection};

/// One delivered result set.
pub type Snapshot<T> = Arc<Vec<T>>;

/// A live, continuously refreshed query result.
pub struct Live<T> {
  rx:         watch::Receiver<Option<Snapshot<T>>>,
  task:       JoinHandle<()>,
  collection: Collection,
}

impl<T> Live<T>
where
  T: Send + Sync + 'static,
{
  /// Start a standing query over `collection`.
  ///
  /// `fetch` runs once immediately and again after each revision bump.
  /// Bumps that arrive while a fetch is in flight coalesce into one re-run.
  /// A failed fetch is logged and the previous snapshot stays in place.
  pub fn spawn<S, F, Fut>(store: Arc<S>, collection: Collection, fetch: F) -> Self
  where
    S: AttendanceStore + 'static,
    F: Fn(Arc<S>) -> Fut + Send + 'static,
    Fut: Future<Output = Result<Vec<T>, S::Error>> + Send + 'static,
  {
    let (tx, rx) = watch::channel(None);
    let mut revisions = store.watch(collection);

    let task = tokio::spawn(async move {
      tracing::debug!(%collection, "subscription started");
      loop {
        revisions.borrow_and_update();
        match fetch(store.clone()).await {
          Ok(items) => {
            if tx.send(Some(Arc::new(items))).is_err() {
              break;
            }
          }
          Err(e) => tracing::warn!(%collection, error = %e, "live query failed"),
        }
        if revisions.changed().await.is_err() {
          break;
        }
      }
      tracing::debug!(%collection, "subscription ended");
    });

    Self { rx, task, collection }
  }

  /// The most recently delivered snapshot, or `None` while the first fetch
  /// is still outstanding.
  pub fn current(&self) -> Option<Snapshot<T>> { self.rx.borrow().clone() }

  /// Wait for the next delivery not yet seen by this handle.
  ///
  /// Returns `None` once the subscription has ended.
  pub async fn changed(&mut self) -> Option<Snapshot<T>> {
    loop {
      self.rx.changed().await.ok()?;
      if let Some(snapshot) = self.rx.borrow_and_update().clone() {
        return Some(snapshot);
      }
    }
  }

  pub fn collection(&self) -> Collection { self.collection }

  /// Stop delivery and release the subscription.
  pub fn cancel(self) { drop(self) }
}

impl<T> Drop for Live<T> {
  fn drop(&mut self) {
    tracing::debug!(collection = %self.collection, "subscription cancelled");
    self.task.abort();
  }
}
