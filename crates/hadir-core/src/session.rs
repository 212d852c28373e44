//! The teacher's scan session: which subject the next scan is recorded
//! against, plus the transient notice left by the last scan.
//!
//! A session is in-memory only and scoped to the teacher's scanning view.
//! Leaving the view calls [`ScanSession::reset`].

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  Error, Result,
  attendance::AttendanceEvent,
  checkin::CheckIn,
  subject::Subject,
};

/// Prompt shown when scanning is attempted with no subject selected.
pub const SELECT_SUBJECT_PROMPT: &str = "Pilih mata pelajaran dulu!";

/// Seconds a notice stays visible unless configured otherwise.
pub const DEFAULT_NOTICE_TTL_SECS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
  Success,
  Failure,
}

/// A self-clearing status message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
  pub kind:       NoticeKind,
  pub message:    String,
  pub expires_at: DateTime<Utc>,
}

impl Notice {
  pub fn is_visible(&self, now: DateTime<Utc>) -> bool { now < self.expires_at }
}

/// Per-teacher scanning state.
#[derive(Debug, Clone)]
pub struct ScanSession {
  teacher_id: Uuid,
  subjects:   Vec<Subject>,
  selected:   Option<Uuid>,
  notice:     Option<Notice>,
  notice_ttl: TimeDelta,
}

impl ScanSession {
  /// Open a session with the subject list loaded for this view.
  pub fn new(teacher_id: Uuid, subjects: Vec<Subject>) -> Self {
    Self {
      teacher_id,
      subjects,
      selected: None,
      notice: None,
      notice_ttl: TimeDelta::seconds(DEFAULT_NOTICE_TTL_SECS),
    }
  }

  pub fn with_notice_ttl(mut self, ttl: TimeDelta) -> Self {
    self.notice_ttl = ttl;
    self
  }

  pub fn teacher_id(&self) -> Uuid { self.teacher_id }

  pub fn subjects(&self) -> &[Subject] { &self.subjects }

  /// Replace the loaded subject list. A selection that is no longer listed
  /// is kept; the check-in engine falls back to a placeholder name for it.
  pub fn load_subjects(&mut self, subjects: Vec<Subject>) { self.subjects = subjects; }

  pub fn selected(&self) -> Option<Uuid> { self.selected }

  /// Choose the subject for subsequent scans. Only listed subjects can be
  /// chosen.
  pub fn select(&mut self, subject_id: Uuid) -> Result<()> {
    if !self.subjects.iter().any(|s| s.id == subject_id) {
      return Err(Error::UnknownSubject(subject_id));
    }
    self.selected = Some(subject_id);
    Ok(())
  }

  /// Leave the scanning view: forget the selection and any notice.
  pub fn reset(&mut self) {
    self.selected = None;
    self.notice = None;
  }

  /// Check that scanning may start.
  pub fn ensure_ready(&self) -> Result<Uuid> { self.selected.ok_or(Error::NoSubjectSelected) }

  /// Build the check-in request for one scanned identifier.
  ///
  /// Fails with [`Error::NoSubjectSelected`] if nothing is selected.
  pub fn prepare(&self, student_id: &str, client_date: NaiveDate) -> Result<CheckIn> {
    let subject_id = self.ensure_ready()?;
    Ok(CheckIn {
      student_id: student_id.to_owned(),
      teacher_id: self.teacher_id,
      subject_id: Some(subject_id),
      client_date,
    })
  }

  /// Record the outcome of a scan as a notice that expires after the TTL.
  pub fn record_outcome(
    &mut self,
    outcome: &Result<AttendanceEvent>,
    now: DateTime<Utc>,
  ) -> &Notice {
    let (kind, message) = match outcome {
      Ok(event) => (NoticeKind::Success, format!("Absen Berhasil: {}", event.student_id)),
      Err(_) => (NoticeKind::Failure, "Gagal mencatat absen".to_owned()),
    };
    self.notice.insert(Notice { kind, message, expires_at: now + self.notice_ttl })
  }

  /// The last notice, if it has not expired yet.
  pub fn notice(&self, now: DateTime<Utc>) -> Option<&Notice> {
    self.notice.as_ref().filter(|n| n.is_visible(now))
  }
}
