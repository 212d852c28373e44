pub mod account;
pub mod reports;
pub mod roster;
pub mod student;
pub mod teacher;

use std::convert::Infallible;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, stream};
use hadir_core::live::{Live, Snapshot};
use serde::Serialize;

/// Name of the SSE event carrying one snapshot.
pub(super) const SNAPSHOT_EVENT: &str = "snapshot";

fn snapshot_event<T: Serialize>(snapshot: &Snapshot<T>) -> Event {
  Event::default()
    .event(SNAPSHOT_EVENT)
    .json_data(snapshot.as_slice())
    .unwrap_or_else(|e| {
      tracing::warn!(error = %e, "snapshot not serialisable");
      Event::default().comment("snapshot not serialisable")
    })
}

/// Stream every delivery of `live` as an SSE event.
///
/// The stream owns the subscription; when the client disconnects axum drops
/// the stream and with it the [`Live`], which stops its task.
pub(super) fn sse_from_live<T>(
  live: Live<T>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
  T: Serialize + Send + Sync + 'static,
{
  let stream = stream::unfold(live, |mut live| async move {
    let snapshot = live.changed().await?;
    Some((Ok(snapshot_event(&snapshot)), live))
  });
  Sse::new(stream).keep_alive(KeepAlive::default())
}
