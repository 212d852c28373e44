//! The check-in engine: validates one scan and appends one attendance event.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  Error, Result,
  attendance::{AttendanceEvent, AttendanceQuery, AttendanceStatus, NewAttendance},
  store::AttendanceStore,
  subject::Subject,
};

/// Subject name recorded when the selected subject is not in the loaded list.
pub const UNKNOWN_SUBJECT: &str = "Unknown";

/// One check-in request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckIn {
  /// The scanned or typed identifier. Surrounding whitespace is ignored.
  pub student_id:  String,
  pub teacher_id:  Uuid,
  pub subject_id:  Option<Uuid>,
  /// Today's date on the checking-in device.
  pub client_date: NaiveDate,
}

/// What to do when the same student is checked in twice for one subject on
/// one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
  /// Record every scan.
  #[default]
  Allow,
  /// Refuse a second scan with the same student, subject and client date.
  RejectSameDay,
}

/// Validates check-ins and appends them to the attendance log.
pub struct CheckInEngine<S> {
  store:  Arc<S>,
  policy: DuplicatePolicy,
}

impl<S> Clone for CheckInEngine<S> {
  fn clone(&self) -> Self { Self { store: self.store.clone(), policy: self.policy } }
}

impl<S: AttendanceStore> CheckInEngine<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store, policy: DuplicatePolicy::default() } }

  pub fn with_policy(mut self, policy: DuplicatePolicy) -> Self {
    self.policy = policy;
    self
  }

  pub fn policy(&self) -> DuplicatePolicy { self.policy }

  /// Record one check-in.
  ///
  /// `subjects` is the subject list the caller has loaded; it is only used to
  /// snapshot the subject name. A subject missing from it is recorded under
  /// [`UNKNOWN_SUBJECT`].
  ///
  /// Validation failures perform no store access. A store failure is
  /// returned as-is and is not retried.
  pub async fn check_in(&self, subjects: &[Subject], request: CheckIn) -> Result<AttendanceEvent> {
    let student_id = request.student_id.trim();
    if student_id.is_empty() {
      return Err(Error::BlankStudentId);
    }
    let subject_id = request.subject_id.ok_or(Error::NoSubjectSelected)?;

    if self.policy == DuplicatePolicy::RejectSameDay {
      let query = AttendanceQuery {
        student_id: Some(student_id.to_owned()),
        subject_id: Some(subject_id),
        date:       Some(request.client_date),
        limit:      Some(1),
      };
      let existing = self
        .store
        .list_attendance(&query)
        .await
        .map_err(Error::read)?;
      if !existing.is_empty() {
        tracing::info!(%student_id, %subject_id, "duplicate check-in rejected");
        return Err(Error::DuplicateCheckIn { student_id: student_id.to_owned() });
      }
    }

    let subject_name = subjects
      .iter()
      .find(|s| s.id == subject_id)
      .map_or_else(|| UNKNOWN_SUBJECT.to_owned(), |s| s.name.clone());

    let input = NewAttendance {
      student_id: student_id.to_owned(),
      teacher_id: request.teacher_id,
      subject_id,
      subject_name,
      date: request.client_date,
      status: AttendanceStatus::Present,
    };

    match self.store.append_attendance(input).await {
      Ok(event) => {
        tracing::info!(
          event_id = %event.id,
          student_id = %event.student_id,
          subject = %event.subject_name,
          "check-in recorded"
        );
        Ok(event)
      }
      Err(e) => {
        tracing::warn!(%student_id, %subject_id, error = %e, "check-in failed");
        Err(Error::store_write(e))
      }
    }
  }
}
