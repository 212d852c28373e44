//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings with microsecond
//! precision, so text order equals time order. UUIDs are stored as hyphenated
//! lowercase strings. Dates are `YYYY-MM-DD`.

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use hadir_core::{
  attendance::{AttendanceEvent, AttendanceStatus},
  subject::Subject,
  user::{Role, UserRecord},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

/// The current time at the precision the store keeps.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ────────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Codes ────────────────────────────────────────────────────────────────────

pub fn encode_role(r: Role) -> &'static str {
  match r {
    Role::Admin => "admin",
    Role::Teacher => "teacher",
    Role::Student => "student",
    Role::Unknown => "unknown",
  }
}

pub fn encode_status(s: AttendanceStatus) -> &'static str {
  match s {
    AttendanceStatus::Present => "present",
  }
}

pub fn decode_status(s: &str) -> Result<AttendanceStatus> {
  s.parse().map_err(|_| Error::Decode { column: "status", value: s.to_owned() })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:    String,
  pub username:   String,
  pub name:       String,
  pub role:       String,
  pub id_number:  Option<String>,
  pub class_name: Option<String>,
  pub created_at: String,
}

impl RawUser {
  pub const COLUMNS: &'static str =
    "user_id, username, name, role, id_number, class_name, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:    row.get(0)?,
      username:   row.get(1)?,
      name:       row.get(2)?,
      role:       row.get(3)?,
      id_number:  row.get(4)?,
      class_name: row.get(5)?,
      created_at: row.get(6)?,
    })
  }

  pub fn into_user(self) -> Result<UserRecord> {
    Ok(UserRecord {
      id:         Some(decode_uuid(&self.user_id)?),
      username:   self.username,
      name:       self.name,
      role:       Role::from_code(&self.role),
      id_number:  self.id_number,
      class_name: self.class_name,
      created_at: Some(decode_dt(&self.created_at)?),
    })
  }
}

/// Raw strings read directly from a `subjects` row.
pub struct RawSubject {
  pub subject_id: String,
  pub name:       String,
  pub created_at: String,
}

impl RawSubject {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subject_id: row.get(0)?,
      name:       row.get(1)?,
      created_at: row.get(2)?,
    })
  }

  pub fn into_subject(self) -> Result<Subject> {
    Ok(Subject {
      id:         decode_uuid(&self.subject_id)?,
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from an `attendance` row.
pub struct RawEvent {
  pub event_id:     String,
  pub student_id:   String,
  pub teacher_id:   String,
  pub subject_id:   String,
  pub subject_name: String,
  pub timestamp:    String,
  pub date_string:  String,
  pub status:       String,
}

impl RawEvent {
  pub const COLUMNS: &'static str = "event_id, student_id, teacher_id, subject_id, \
                                     subject_name, timestamp, date_string, status";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      event_id:     row.get(0)?,
      student_id:   row.get(1)?,
      teacher_id:   row.get(2)?,
      subject_id:   row.get(3)?,
      subject_name: row.get(4)?,
      timestamp:    row.get(5)?,
      date_string:  row.get(6)?,
      status:       row.get(7)?,
    })
  }

  pub fn into_event(self) -> Result<AttendanceEvent> {
    Ok(AttendanceEvent {
      id:           decode_uuid(&self.event_id)?,
      student_id:   self.student_id,
      teacher_id:   decode_uuid(&self.teacher_id)?,
      subject_id:   decode_uuid(&self.subject_id)?,
      subject_name: self.subject_name,
      timestamp:    decode_dt(&self.timestamp)?,
      date:         decode_date(&self.date_string)?,
      status:       decode_status(&self.status)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_sort_as_text() {
    let a = Utc.with_ymd_and_hms(2026, 10, 15, 9, 0, 0).unwrap();
    let b = a + chrono::TimeDelta::microseconds(1);
    let c = a + chrono::TimeDelta::seconds(10);
    let (ea, eb, ec) = (encode_dt(a), encode_dt(b), encode_dt(c));
    assert_eq!(ea.len(), eb.len());
    assert!(ea < eb && eb < ec);
    assert_eq!(decode_dt(&eb).unwrap(), b);
  }

  #[test]
  fn legacy_status_code_decodes() {
    assert_eq!(decode_status("hadir").unwrap(), AttendanceStatus::Present);
    assert!(decode_status("absent").is_err());
  }
}
