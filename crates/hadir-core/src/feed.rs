//! Realtime report feed over the attendance log.
//!
//! The feed holds a standing query over every attendance event, most recent
//! first. Exports are taken from the snapshot the feed currently holds; they
//! never re-query the store, so an export can trail the newest write by one
//! delivery.

use std::sync::Arc;

use crate::{
  attendance::{AttendanceEvent, AttendanceQuery},
  live::{Live, Snapshot},
  report::{ReportLocale, export_csv},
  store::{AttendanceStore, Collection},
};

pub struct ReportFeed {
  live: Live<AttendanceEvent>,
}

impl ReportFeed {
  /// Subscribe to the whole attendance log.
  pub fn subscribe<S: AttendanceStore + 'static>(store: Arc<S>) -> Self {
    Self::subscribe_query(store, AttendanceQuery::all())
  }

  /// Subscribe to the events matching `query`.
  pub fn subscribe_query<S: AttendanceStore + 'static>(
    store: Arc<S>,
    query: AttendanceQuery,
  ) -> Self {
    let live = Live::spawn(store, Collection::Attendance, move |store| {
      let query = query.clone();
      async move {
        let mut events = store.list_attendance(&query).await?;
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok::<_, S::Error>(events)
      }
    });
    Self { live }
  }

  /// The rows last delivered, most recent first. Empty until the first
  /// delivery.
  pub fn rows(&self) -> Snapshot<AttendanceEvent> { self.live.current().unwrap_or_default() }

  /// Whether the first delivery has arrived.
  pub fn is_loaded(&self) -> bool { self.live.current().is_some() }

  /// Wait for the next delivery.
  pub async fn next(&mut self) -> Option<Snapshot<AttendanceEvent>> { self.live.changed().await }

  /// CSV projection of [`ReportFeed::rows`].
  pub fn export_csv(&self, locale: &ReportLocale) -> String { export_csv(&self.rows(), locale) }

  /// Hand over the underlying subscription.
  pub fn into_live(self) -> Live<AttendanceEvent> { self.live }
}
