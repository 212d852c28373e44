//! CSV export of the attendance log.
//!
//! Dates and times are rendered in the deployment's locale (Indonesian long
//! form, in the deployment's UTC offset). The export is a pure function of the
//! events handed to it.

use chrono::{DateTime, Datelike, FixedOffset, Offset, Timelike, Utc, Weekday};

use crate::attendance::AttendanceEvent;

/// The fixed header row of every export.
pub const CSV_HEADER: &str = "Tanggal,Jam,ID Siswa,Mata Pelajaran,Status";

/// Deployment locale settings for rendering reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportLocale {
  pub offset: FixedOffset,
}

impl ReportLocale {
  /// Western Indonesia Time, UTC+7.
  pub fn wib() -> Self {
    Self { offset: FixedOffset::east_opt(7 * 3600).unwrap_or_else(|| Utc.fix()) }
  }

  /// Build from an offset in minutes east of UTC. `None` if out of range.
  pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
    FixedOffset::east_opt(minutes.checked_mul(60)?).map(|offset| Self { offset })
  }

  /// `Kamis, 15 Oktober 2026`
  pub fn long_date(&self, at: DateTime<Utc>) -> String {
    let local = at.with_timezone(&self.offset);
    format!(
      "{}, {} {} {}",
      weekday_name(local.weekday()),
      local.day(),
      month_name(local.month()),
      local.year()
    )
  }

  /// `08.05`
  pub fn time(&self, at: DateTime<Utc>) -> String {
    let local = at.with_timezone(&self.offset);
    format!("{:02}.{:02}", local.hour(), local.minute())
  }
}

impl Default for ReportLocale {
  fn default() -> Self { Self::wib() }
}

fn weekday_name(day: Weekday) -> &'static str {
  match day {
    Weekday::Mon => "Senin",
    Weekday::Tue => "Selasa",
    Weekday::Wed => "Rabu",
    Weekday::Thu => "Kamis",
    Weekday::Fri => "Jumat",
    Weekday::Sat => "Sabtu",
    Weekday::Sun => "Minggu",
  }
}

fn month_name(month: u32) -> &'static str {
  const MONTHS: [&str; 12] = [
    "Januari", "Februari", "Maret", "April", "Mei", "Juni", "Juli", "Agustus",
    "September", "Oktober", "November", "Desember",
  ];
  MONTHS
    .get(month.saturating_sub(1) as usize)
    .copied()
    .unwrap_or("")
}

fn csv_quote(s: &str) -> String {
  if s.contains([',', '"', '\n', '\r']) {
    format!("\"{}\"", s.replace('"', "\"\""))
  } else {
    s.to_owned()
  }
}

/// Render `events` as a CSV document: the header plus one row per event, in
/// the order given.
pub fn export_csv(events: &[AttendanceEvent], locale: &ReportLocale) -> String {
  let mut out = String::from(CSV_HEADER);
  for event in events {
    out.push('\n');
    let fields = [
      locale.long_date(event.timestamp),
      locale.time(event.timestamp),
      event.student_id.clone(),
      event.subject_name.clone(),
      event.status.label().to_owned(),
    ];
    let row: Vec<String> = fields.iter().map(|f| csv_quote(f)).collect();
    out.push_str(&row.join(","));
  }
  out
}

/// `Laporan_Absensi_2026-10-15T01:05:00.000Z.csv`
pub fn export_filename(now: DateTime<Utc>) -> String {
  format!("Laporan_Absensi_{}.csv", now.format("%Y-%m-%dT%H:%M:%S%.3fZ"))
}
