//! Handlers for `/roster` endpoints. Administrator only.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/roster/{kind}` | `kind` is `students`, `teachers` or `subjects` |
//! | `GET`    | `/roster/{kind}/live` | SSE, one `snapshot` event per change |
//! | `POST`   | `/roster/{kind}` | Body: form fields, plus `password` for people; 201 `{"id":..,"account":..}` |
//! | `DELETE` | `/roster/{kind}/{id}?confirm=true` | 400 without `confirm` |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use hadir_core::{
  Error as CoreError, WriteError,
  auth::{AuthError, CredentialStore, IdentityProvider, normalize_username},
  roster::{RosterFields, RosterItem, RosterKind},
  view::View,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{AppState, auth::CurrentSession, error::Error, handlers::sse_from_live};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /roster/{kind}`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  current: CurrentSession,
  Path(kind): Path<RosterKind>,
) -> Result<Json<Vec<RosterItem>>, Error>
where
  S: CredentialStore + 'static,
{
  current.require(&[View::Admin])?;
  let snapshot = state.roster.snapshot(kind).await?;
  Ok(Json(snapshot.to_vec()))
}

/// `GET /roster/{kind}/live`
pub async fn live<S>(
  State(state): State<AppState<S>>,
  current: CurrentSession,
  Path(kind): Path<RosterKind>,
) -> Result<impl IntoResponse, Error>
where
  S: CredentialStore + 'static,
{
  current.require(&[View::Admin])?;
  Ok(sse_from_live(state.roster.list(kind)))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  #[serde(flatten)]
  pub fields:   RosterFields,
  /// Initial password for a student or teacher login. Ignored for subjects.
  #[serde(default)]
  pub password: Option<String>,
}

/// What happened to the login account behind a new student or teacher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Account {
  Created,
  /// An account for the username was already present and keeps its password.
  Existing,
}

/// `POST /roster/{kind}`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  current: CurrentSession,
  Path(kind): Path<RosterKind>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, Error>
where
  S: CredentialStore + 'static,
{
  current.require(&[View::Admin])?;
  let CreateBody { fields, password } = body;

  let login = match kind.role() {
    Some(_) => {
      let password = password
        .filter(|p| !p.is_empty())
        .ok_or(CoreError::from(WriteError::MissingField("password")))?;
      fields.username.as_deref().map(|u| (normalize_username(u), password))
    }
    None => None,
  };

  let id = state.roster.create(kind, fields).await?;

  let account = match login {
    Some((username, password)) => Some(open_account(&state, &username, &password).await?),
    None => None,
  };

  Ok((StatusCode::CREATED, Json(json!({ "id": id, "account": account }))))
}

/// Create the login account for a roster username.
async fn open_account<S>(
  state: &AppState<S>,
  username: &str,
  password: &str,
) -> Result<Account, Error>
where
  S: CredentialStore + 'static,
{
  let email = state.directory.email_for(username);
  match state.provider.sign_up(&email, password).await {
    Ok(_) => {
      tracing::info!(%email, "account created");
      Ok(Account::Created)
    }
    Err(AuthError::AccountExists) => {
      tracing::info!(%email, "account already present; password unchanged");
      Ok(Account::Existing)
    }
    Err(e) => Err(e.into()),
  }
}

// ─── Delete ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
  #[serde(default)]
  pub confirm: bool,
}

/// `DELETE /roster/{kind}/{id}?confirm=true`
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  current: CurrentSession,
  Path((kind, id)): Path<(RosterKind, Uuid)>,
  Query(params): Query<DeleteParams>,
) -> Result<impl IntoResponse, Error>
where
  S: CredentialStore + 'static,
{
  current.require(&[View::Admin])?;

  let pending = state.roster.request_delete(kind, id);
  if !params.confirm {
    return Err(Error::BadRequest("delete must be confirmed with ?confirm=true".to_owned()));
  }

  if state.roster.delete(pending.confirm()).await? {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(Error::NotFound(format!("no {kind} record {id}")))
  }
}
