//! Role router: which surface a resolved user gets.

use serde::Serialize;

use crate::user::{Role, UserRecord};

/// The mutually exclusive surfaces of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum View {
  Admin,
  Teacher,
  Student,
  /// The user's role is not one the application knows. Nothing is rendered
  /// except a prompt to contact the administrator.
  Unknown,
}

impl View {
  /// Pick the surface for `user`. A pure function of `user.role`.
  pub fn route(user: &UserRecord) -> Self { Self::for_role(user.role) }

  pub fn for_role(role: Role) -> Self {
    match role {
      Role::Admin => Self::Admin,
      Role::Teacher => Self::Teacher,
      Role::Student => Self::Student,
      Role::Unknown => Self::Unknown,
    }
  }

  /// Text shown in place of a surface, if any.
  pub fn message(self) -> Option<&'static str> {
    match self {
      Self::Unknown => Some("Akun Anda belum memiliki peran. Hubungi administrator."),
      _ => None,
    }
  }
}
