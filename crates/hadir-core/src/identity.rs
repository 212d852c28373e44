//! Identity resolution: from an authenticated [`Principal`] to a
//! [`UserRecord`].
//!
//! Resolution is read-only. The administrator sentinel never touches the
//! store; everyone else is looked up by username. A principal with no roster
//! record is not an error: it resolves to a degraded student profile, tagged
//! [`Resolution::Fallback`] so callers can warn about the drift.

use std::sync::Arc;

use serde::Serialize;

use crate::{
  Error, Result,
  auth::{Directory, Principal},
  store::AttendanceStore,
  user::{Role, UserRecord},
};

/// Display name given to a principal with no roster record.
pub const FALLBACK_NAME: &str = "Siswa Demo";

/// Display name of the synthesised administrator.
pub const ADMIN_NAME: &str = "Administrator";

/// The outcome of resolving a principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "resolution", content = "user", rename_all = "snake_case")]
pub enum Resolution {
  /// The administrator sentinel or a matching roster record.
  Resolved(UserRecord),
  /// No roster record matched; a placeholder student profile.
  Fallback(UserRecord),
}

impl Resolution {
  pub fn user(&self) -> &UserRecord {
    match self {
      Self::Resolved(u) | Self::Fallback(u) => u,
    }
  }

  pub fn into_user(self) -> UserRecord {
    match self {
      Self::Resolved(u) | Self::Fallback(u) => u,
    }
  }

  pub fn is_fallback(&self) -> bool { matches!(self, Self::Fallback(_)) }
}

/// Resolves principals against the `users` collection.
pub struct IdentityResolver<S> {
  store:     Arc<S>,
  directory: Directory,
}

impl<S: AttendanceStore> IdentityResolver<S> {
  pub fn new(store: Arc<S>, directory: Directory) -> Self { Self { store, directory } }

  pub fn directory(&self) -> &Directory { &self.directory }

  pub async fn resolve(&self, principal: &Principal) -> Result<Resolution> {
    if self.directory.is_admin(principal) {
      return Ok(Resolution::Resolved(UserRecord {
        id:         None,
        username:   self.directory.admin_username.clone(),
        name:       ADMIN_NAME.to_owned(),
        role:       Role::Admin,
        id_number:  None,
        class_name: None,
        created_at: None,
      }));
    }

    let username = principal.username();
    let found = self
      .store
      .find_user_by_username(username)
      .await
      .map_err(Error::read)?;

    match found {
      Some(user) => Ok(Resolution::Resolved(user)),
      None => {
        tracing::warn!(%username, "no roster record for principal; using fallback profile");
        Ok(Resolution::Fallback(UserRecord {
          id:         None,
          username:   username.to_owned(),
          name:       FALLBACK_NAME.to_owned(),
          role:       Role::Student,
          id_number:  None,
          class_name: None,
          created_at: None,
        }))
      }
    }
  }
}
