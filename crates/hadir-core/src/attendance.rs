//! Attendance events: the append-only log every report is derived from.
//!
//! An event is written exactly once per successful check-in and never
//! updated. It carries denormalised references (`student_id`, the subject
//! name) so that later roster deletions do not rewrite history.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Attendance status. Check-in only ever records [`AttendanceStatus::Present`].
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  strum::AsRefStr,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceStatus {
  #[default]
  #[strum(to_string = "present", serialize = "hadir")]
  Present,
}

impl AttendanceStatus {
  /// Label used in exported reports.
  pub fn label(self) -> &'static str {
    match self {
      Self::Present => "Hadir",
    }
  }
}

/// One recorded check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceEvent {
  pub id:           Uuid,
  /// The scanned identifier, verbatim. May no longer resolve to a roster
  /// record if the student was deleted.
  pub student_id:   String,
  pub teacher_id:   Uuid,
  pub subject_id:   Uuid,
  /// Subject name as it was at check-in time.
  pub subject_name: String,
  /// Server-assigned; the canonical event order.
  pub timestamp:    DateTime<Utc>,
  /// Date on the checking-in client's clock. Near midnight this can differ
  /// from `timestamp`'s date; it is kept as reported.
  pub date:         NaiveDate,
  pub status:       AttendanceStatus,
}

/// Input to [`AttendanceStore::append_attendance`](crate::store::AttendanceStore::append_attendance).
///
/// The store assigns `id` and `timestamp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttendance {
  pub student_id:   String,
  pub teacher_id:   Uuid,
  pub subject_id:   Uuid,
  pub subject_name: String,
  pub date:         NaiveDate,
  pub status:       AttendanceStatus,
}

/// Filter for [`AttendanceStore::list_attendance`](crate::store::AttendanceStore::list_attendance).
///
/// Results are always ordered by `timestamp`, most recent first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendanceQuery {
  pub student_id: Option<String>,
  pub subject_id: Option<Uuid>,
  pub date:       Option<NaiveDate>,
  pub limit:      Option<usize>,
}

impl AttendanceQuery {
  /// Every event in the log.
  pub fn all() -> Self { Self::default() }

  pub fn for_student(student_id: impl Into<String>) -> Self {
    Self { student_id: Some(student_id.into()), ..Self::default() }
  }
}
