//! Sign-in, sign-out and the current profile.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/login` | Body: `{"username":..,"password":..}` |
//! | `POST` | `/auth/logout` | Revokes the bearer token |
//! | `GET`  | `/me` | Re-resolves the signed-in principal |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use hadir_core::{
  auth::{CredentialStore, login as sign_in},
  identity::Resolution,
  user::UserRecord,
  view::View,
};
use serde::{Deserialize, Serialize};

use crate::{
  AppState,
  auth::CurrentSession,
  error::Error,
  sessions::Session,
};

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub username: String,
  pub password: String,
}

/// What a client needs to render the right surface.
#[derive(Debug, Serialize)]
pub struct Profile {
  pub user:       UserRecord,
  /// `resolved` or `fallback`.
  pub resolution: &'static str,
  pub view:       View,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message:    Option<&'static str>,
}

impl From<&Resolution> for Profile {
  fn from(resolution: &Resolution) -> Self {
    let view = View::route(resolution.user());
    Self {
      user: resolution.user().clone(),
      resolution: if resolution.is_fallback() { "fallback" } else { "resolved" },
      view,
      message: view.message(),
    }
  }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
  pub token:   String,
  #[serde(flatten)]
  pub profile: Profile,
}

/// `POST /auth/login`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<LoginResponse>, Error>
where
  S: CredentialStore + 'static,
{
  let principal = sign_in(&*state.provider, &state.directory, &body.username, &body.password).await?;
  let resolution = state.resolver.resolve(&principal).await?;
  let profile = Profile::from(&resolution);

  let token = state.sessions.issue(Session::new(principal, resolution)).await;
  let active = state.sessions.count().await;
  tracing::info!(
    username = %profile.user.username,
    view = %profile.view,
    resolution = profile.resolution,
    active,
    "session started"
  );

  Ok(Json(LoginResponse { token, profile }))
}

/// `POST /auth/logout`
pub async fn logout<S>(
  State(state): State<AppState<S>>,
  current: CurrentSession,
) -> impl IntoResponse
where
  S: CredentialStore + 'static,
{
  state.sessions.revoke(&current.token).await;
  tracing::info!(username = %current.user().username, "session ended");
  StatusCode::NO_CONTENT
}

/// `GET /me`
pub async fn me<S>(
  State(state): State<AppState<S>>,
  current: CurrentSession,
) -> Result<Json<Profile>, Error>
where
  S: CredentialStore + 'static,
{
  let resolution = state.resolver.resolve(&current.session.principal).await?;
  let profile = Profile::from(&resolution);
  state.sessions.set_resolution(&current.token, resolution).await;
  Ok(Json(profile))
}
