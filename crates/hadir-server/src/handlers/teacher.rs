//! The teacher's scanning view.
//!
//! Opening the view loads the subject list into the session's
//! [`ScanSession`]; leaving it resets the selection. Scans go through the
//! shared check-in engine and leave a self-clearing notice behind.

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{NaiveDate, Utc};
use hadir_core::{
  auth::CredentialStore,
  session::ScanSession,
  subject::Subject,
  view::View,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{AppState, auth::CurrentSession, error::Error};

/// Load the subject list into the session's scan state, opening it if
/// needed. Returns the loaded list.
async fn load_subjects<S>(state: &AppState<S>, current: &CurrentSession) -> Result<Vec<Subject>, Error>
where
  S: CredentialStore + 'static,
{
  let teacher_id = current.record_id()?;
  let subjects = state.store.list_subjects().await.map_err(Error::store)?;
  let ttl = state.notice_ttl;

  let loaded = subjects.clone();
  state
    .sessions
    .with_scan(&current.token, move |scan| match scan {
      Some(scan) => scan.load_subjects(loaded),
      None => *scan = Some(ScanSession::new(teacher_id, loaded).with_notice_ttl(ttl)),
    })
    .await
    .ok_or(Error::Unauthorized)?;

  tracing::debug!(%teacher_id, count = subjects.len(), "subjects loaded");
  Ok(subjects)
}

/// Make sure the scan state exists without reloading an open one.
async fn ensure_open<S>(state: &AppState<S>, current: &CurrentSession) -> Result<(), Error>
where
  S: CredentialStore + 'static,
{
  let open = state
    .sessions
    .with_scan(&current.token, |scan| scan.is_some())
    .await
    .ok_or(Error::Unauthorized)?;
  if !open {
    load_subjects(state, current).await?;
  }
  Ok(())
}

// ─── Subjects ─────────────────────────────────────────────────────────────────

/// `GET /teacher/subjects`
pub async fn subjects<S>(
  State(state): State<AppState<S>>,
  current: CurrentSession,
) -> Result<Json<Vec<Subject>>, Error>
where
  S: CredentialStore + 'static,
{
  current.require(&[View::Teacher])?;
  Ok(Json(load_subjects(&state, &current).await?))
}

// ─── Selection ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SelectBody {
  pub subject_id: Uuid,
}

/// `PUT /teacher/session`
pub async fn select<S>(
  State(state): State<AppState<S>>,
  current: CurrentSession,
  Json(body): Json<SelectBody>,
) -> Result<impl IntoResponse, Error>
where
  S: CredentialStore + 'static,
{
  current.require(&[View::Teacher])?;
  ensure_open(&state, &current).await?;

  state
    .sessions
    .with_scan(&current.token, |scan| match scan {
      Some(scan) => scan.select(body.subject_id).map_err(Error::from),
      None => Err(Error::Unauthorized),
    })
    .await
    .ok_or(Error::Unauthorized)??;

  Ok(Json(json!({ "selected": body.subject_id })))
}

/// `DELETE /teacher/session`
pub async fn leave<S>(
  State(state): State<AppState<S>>,
  current: CurrentSession,
) -> Result<impl IntoResponse, Error>
where
  S: CredentialStore + 'static,
{
  current.require(&[View::Teacher])?;
  state
    .sessions
    .with_scan(&current.token, |scan| {
      if let Some(scan) = scan {
        scan.reset();
      }
    })
    .await
    .ok_or(Error::Unauthorized)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Scan ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ScanBody {
  pub student_id:  String,
  /// Today's date on the scanning device. Defaults to the server's UTC date.
  pub client_date: Option<NaiveDate>,
}

/// `POST /teacher/scan`
pub async fn scan<S>(
  State(state): State<AppState<S>>,
  current: CurrentSession,
  Json(body): Json<ScanBody>,
) -> Result<impl IntoResponse, Error>
where
  S: CredentialStore + 'static,
{
  current.require(&[View::Teacher])?;
  ensure_open(&state, &current).await?;

  let client_date = body.client_date.unwrap_or_else(|| Utc::now().date_naive());
  let (request, subjects) = state
    .sessions
    .with_scan(&current.token, |scan| match scan {
      Some(scan) => scan
        .prepare(&body.student_id, client_date)
        .map(|request| (request, scan.subjects().to_vec()))
        .map_err(Error::from),
      None => Err(Error::Unauthorized),
    })
    .await
    .ok_or(Error::Unauthorized)??;

  let outcome = state.engine.check_in(&subjects, request).await;

  let notice = state
    .sessions
    .with_scan(&current.token, |scan| {
      scan.as_mut().map(|scan| scan.record_outcome(&outcome, Utc::now()).clone())
    })
    .await
    .flatten();

  let event = outcome?;
  Ok((StatusCode::CREATED, Json(json!({ "event": event, "notice": notice }))))
}

// ─── Notice ───────────────────────────────────────────────────────────────────

/// `GET /teacher/notice`
pub async fn notice<S>(
  State(state): State<AppState<S>>,
  current: CurrentSession,
) -> Result<impl IntoResponse, Error>
where
  S: CredentialStore + 'static,
{
  current.require(&[View::Teacher])?;
  let now = Utc::now();
  let notice = state
    .sessions
    .with_scan(&current.token, |scan| scan.as_ref().and_then(|s| s.notice(now).cloned()))
    .await
    .ok_or(Error::Unauthorized)?;
  Ok(Json(json!({ "notice": notice })))
}
