//! Error types and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use hadir_core::{WriteError, auth::AuthError, session::SELECT_SUBJECT_PROMPT};
use serde_json::json;
use thiserror::Error;

/// Generic message for any failed mutation; the cause goes to the log only.
const SAVE_FAILED: &str = "Gagal menyimpan data";

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,

  #[error("forbidden")]
  Forbidden,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("configuration error: {0}")]
  Config(String),

  #[error(transparent)]
  Core(#[from] hadir_core::Error),

  #[error(transparent)]
  Auth(#[from] AuthError),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

fn server_error(e: &dyn std::error::Error, message: &str) -> (StatusCode, String) {
  tracing::error!(error = %e, "request failed");
  (StatusCode::INTERNAL_SERVER_ERROR, message.to_owned())
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    use hadir_core::Error as Core;

    let (status, message) = match &self {
      Error::Unauthorized => {
        let mut res = (
          StatusCode::UNAUTHORIZED,
          Json(json!({ "error": "unauthorized" })),
        )
          .into_response();
        res
          .headers_mut()
          .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        return res;
      }
      Error::Forbidden => (StatusCode::FORBIDDEN, "forbidden".to_owned()),
      Error::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      Error::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      Error::Config(_) => server_error(&self, "server misconfigured"),
      Error::Store(e) => server_error(e.as_ref(), "store error"),

      Error::Core(core) => match core {
        Core::BlankStudentId => (StatusCode::BAD_REQUEST, core.to_string()),
        Core::NoSubjectSelected => (StatusCode::CONFLICT, SELECT_SUBJECT_PROMPT.to_owned()),
        Core::UnknownSubject(_) => (StatusCode::NOT_FOUND, core.to_string()),
        Core::DuplicateCheckIn { .. } => (StatusCode::CONFLICT, core.to_string()),
        Core::Write(WriteError::MissingField(_)) => (StatusCode::BAD_REQUEST, core.to_string()),
        Core::Write(WriteError::Store(_)) => server_error(core, SAVE_FAILED),
        Core::Read(_) => server_error(core, "store error"),
        Core::Auth(auth) => auth_status(auth),
      },
      Error::Auth(auth) => auth_status(auth),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

fn auth_status(e: &AuthError) -> (StatusCode, String) {
  match e {
    AuthError::UserNotFound | AuthError::WrongCredentials => {
      (StatusCode::UNAUTHORIZED, e.to_string())
    }
    AuthError::AccountExists => (StatusCode::CONFLICT, e.to_string()),
    AuthError::Backend(_) => server_error(e, "identity provider error"),
  }
}
