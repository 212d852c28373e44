//! Error types for `hadir-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::auth::AuthError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("student id is blank")]
  BlankStudentId,

  #[error("no subject selected")]
  NoSubjectSelected,

  #[error("subject not found: {0}")]
  UnknownSubject(Uuid),

  #[error("student {student_id} already checked in for this subject today")]
  DuplicateCheckIn { student_id: String },

  #[error("write failed: {0}")]
  Write(#[from] WriteError),

  #[error("read failed: {0}")]
  Read(#[source] BoxError),

  #[error(transparent)]
  Auth(#[from] AuthError),
}

impl Error {
  pub(crate) fn read(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Read(Box::new(e))
  }

  pub(crate) fn store_write(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Write(WriteError::Store(Box::new(e)))
  }
}

/// Any failed roster or attendance mutation.
///
/// Callers surface every variant as the same generic "failed to save" notice;
/// the variants exist for logs.
#[derive(Debug, Error)]
pub enum WriteError {
  #[error("missing required field `{0}`")]
  MissingField(&'static str),

  #[error("store error: {0}")]
  Store(#[source] BoxError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
