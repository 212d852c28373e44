//! Application-level user records.
//!
//! A [`UserRecord`] is the profile attached to an authenticated principal. It
//! lives in the `users` collection alongside every other role; the role field
//! is what separates students from teachers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The closed set of roles a user record may carry.
///
/// Stored role codes that match none of the known roles decode to
/// [`Role::Unknown`] rather than failing, so a corrupt record still resolves
/// to a profile that the view router can refuse explicitly.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::AsRefStr,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  Admin,
  #[serde(alias = "guru")]
  #[strum(to_string = "teacher", serialize = "guru")]
  Teacher,
  #[serde(alias = "siswa")]
  #[strum(to_string = "student", serialize = "siswa")]
  Student,
  #[serde(other)]
  Unknown,
}

impl Role {
  /// Decode a stored role code, accepting the legacy Indonesian codes.
  pub fn from_code(code: &str) -> Self { code.parse().unwrap_or(Self::Unknown) }
}

/// A user profile as held in the roster (or synthesised by the resolver).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
  /// Storage-assigned id. `None` only for synthesised profiles.
  pub id:         Option<Uuid>,
  pub username:   String,
  pub name:       String,
  pub role:       Role,
  /// Student number (NIS) or teacher number (NIP).
  pub id_number:  Option<String>,
  /// Class label, students only (e.g. `7A`).
  pub class_name: Option<String>,
  pub created_at: Option<DateTime<Utc>>,
}

/// Input to [`AttendanceStore::add_user`](crate::store::AttendanceStore::add_user).
///
/// The store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
  pub username:   String,
  pub name:       String,
  pub role:       Role,
  pub id_number:  Option<String>,
  pub class_name: Option<String>,
}
