//! The `AttendanceStore` trait and its change-notification contract.
//!
//! The trait is implemented by storage backends (e.g. `hadir-store-sqlite`).
//! Everything above it (the resolver, roster, check-in engine and report feed)
//! depends on this abstraction, not on any concrete backend.

use std::future::Future;

use tokio::sync::watch;
use uuid::Uuid;

use crate::{
  attendance::{AttendanceEvent, AttendanceQuery, NewAttendance},
  subject::Subject,
  user::{NewUser, Role, UserRecord},
};

// ─── Collections ─────────────────────────────────────────────────────────────

/// The logical collections a store holds. Each has its own revision counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::AsRefStr, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Collection {
  Users,
  Subjects,
  Attendance,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Hadir store backend.
///
/// Attendance is append-only: there is no update or delete for events. Users
/// and subjects support create and delete only.
///
/// Every committed write bumps the revision of the collection it touched;
/// [`AttendanceStore::watch`] exposes those revisions so that standing queries
/// can re-run on change. Revisions for one collection are published in commit
/// order. No ordering holds across collections.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait AttendanceStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a new user record; `id` and `created_at` are set by the store.
  fn add_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<UserRecord, Self::Error>> + Send + '_;

  /// Retrieve a user by id. Returns `None` if not found.
  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<UserRecord>, Self::Error>> + Send + '_;

  /// Find the first user whose `username` equals `username` exactly.
  fn find_user_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<UserRecord>, Self::Error>> + Send + 'a;

  /// List users in creation order, optionally restricted to one role.
  fn list_users(
    &self,
    role: Option<Role>,
  ) -> impl Future<Output = Result<Vec<UserRecord>, Self::Error>> + Send + '_;

  /// Delete a user of the given role. Returns `false` if no such user existed.
  ///
  /// Attendance events referencing the user are left untouched.
  fn delete_user(
    &self,
    id: Uuid,
    role: Role,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Subjects ──────────────────────────────────────────────────────────

  fn add_subject(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  /// List subjects in creation order.
  fn list_subjects(
    &self,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;

  /// Delete a subject. Returns `false` if no such subject existed.
  fn delete_subject(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Attendance, append-only ──────────────────────────────────────────

  /// Append one event. The `id` and `timestamp` are assigned by the store.
  fn append_attendance(
    &self,
    input: NewAttendance,
  ) -> impl Future<Output = Result<AttendanceEvent, Self::Error>> + Send + '_;

  /// Events matching `query`, ordered by `timestamp` descending.
  fn list_attendance<'a>(
    &'a self,
    query: &'a AttendanceQuery,
  ) -> impl Future<Output = Result<Vec<AttendanceEvent>, Self::Error>> + Send + 'a;

  // ── Change notification ───────────────────────────────────────────────

  /// A receiver that observes the revision counter of `collection`.
  fn watch(&self, collection: Collection) -> watch::Receiver<u64>;
}
