//! Attendance reports for teachers and administrators.
//!
//! The JSON snapshot and the CSV download both read the shared report feed,
//! so a download reflects exactly what the feed last delivered. The live
//! endpoint opens a subscription of its own per client.

use axum::{
  Json,
  extract::State,
  http::header,
  response::IntoResponse,
};
use chrono::Utc;
use hadir_core::{
  attendance::AttendanceEvent,
  auth::CredentialStore,
  feed::ReportFeed,
  report::export_filename,
  view::View,
};
use serde::Serialize;

use crate::{AppState, auth::CurrentSession, error::Error, handlers::sse_from_live};

const STAFF: &[View] = &[View::Admin, View::Teacher];

#[derive(Debug, Serialize)]
pub struct ReportSnapshot {
  /// `false` until the feed's first delivery; `rows` is empty meanwhile.
  pub loaded: bool,
  pub rows:   Vec<AttendanceEvent>,
}

/// `GET /reports/attendance`
pub async fn snapshot<S>(
  State(state): State<AppState<S>>,
  current: CurrentSession,
) -> Result<Json<ReportSnapshot>, Error>
where
  S: CredentialStore + 'static,
{
  current.require(STAFF)?;
  Ok(Json(ReportSnapshot {
    loaded: state.reports.is_loaded(),
    rows:   state.reports.rows().to_vec(),
  }))
}

/// `GET /reports/attendance/live`
pub async fn live<S>(
  State(state): State<AppState<S>>,
  current: CurrentSession,
) -> Result<impl IntoResponse, Error>
where
  S: CredentialStore + 'static,
{
  current.require(STAFF)?;
  let feed = ReportFeed::subscribe(state.store.clone());
  Ok(sse_from_live(feed.into_live()))
}

/// `GET /reports/attendance.csv`
pub async fn csv<S>(
  State(state): State<AppState<S>>,
  current: CurrentSession,
) -> Result<impl IntoResponse, Error>
where
  S: CredentialStore + 'static,
{
  current.require(STAFF)?;

  let body = state.reports.export_csv(&state.locale);
  let filename = export_filename(Utc::now());
  tracing::info!(
    %filename,
    rows = state.reports.rows().len(),
    username = %current.user().username,
    "report exported"
  );

  Ok((
    [
      (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
      (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
    ],
    body,
  ))
}
