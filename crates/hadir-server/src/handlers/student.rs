//! The student's own surface: the scannable code and check-in history.

use axum::{
  Json,
  extract::State,
  http::header,
  response::IntoResponse,
};
use hadir_core::{
  attendance::{AttendanceEvent, AttendanceQuery},
  auth::CredentialStore,
  view::View,
};

use crate::{AppState, auth::CurrentSession, error::Error};

/// `GET /student/code`: the record id as plain text, the exact payload a
/// teacher's scanner feeds to check-in.
pub async fn code<S>(
  State(_state): State<AppState<S>>,
  current: CurrentSession,
) -> Result<impl IntoResponse, Error>
where
  S: CredentialStore + 'static,
{
  current.require(&[View::Student])?;
  let id = current.record_id()?;
  Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], id.to_string()))
}

/// `GET /student/history`: own events, most recent first.
pub async fn history<S>(
  State(state): State<AppState<S>>,
  current: CurrentSession,
) -> Result<Json<Vec<AttendanceEvent>>, Error>
where
  S: CredentialStore + 'static,
{
  current.require(&[View::Student])?;
  let id = current.record_id()?;
  let events = state
    .store
    .list_attendance(&AttendanceQuery::for_student(id.to_string()))
    .await
    .map_err(Error::store)?;
  Ok(Json(events))
}
