//! Integration tests for `SqliteStore` against an in-memory database.

use std::{sync::Arc, time::Duration};

use chrono::NaiveDate;
use hadir_core::{
  Error as CoreError,
  attendance::{AttendanceQuery, AttendanceStatus, NewAttendance},
  auth::{CredentialStore, Directory, Principal},
  checkin::{CheckIn, CheckInEngine, DuplicatePolicy, UNKNOWN_SUBJECT},
  feed::ReportFeed,
  identity::{FALLBACK_NAME, IdentityResolver},
  live::{Live, Snapshot},
  report::{CSV_HEADER, ReportLocale},
  roster::{Roster, RosterFields, RosterItem, RosterKind},
  store::{AttendanceStore, Collection},
  subject::Subject,
  user::{NewUser, Role},
};
use tokio::time::timeout;
use uuid::Uuid;

use crate::SqliteStore;

const WAIT: Duration = Duration::from_secs(5);

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn date(day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2026, 10, day).unwrap() }

fn student(username: &str, name: &str) -> NewUser {
  NewUser {
    username:   username.into(),
    name:       name.into(),
    role:       Role::Student,
    id_number:  Some(format!("NIS-{username}")),
    class_name: Some("7A".into()),
  }
}

fn event(student_id: &str, subject: &Subject, day: u32) -> NewAttendance {
  NewAttendance {
    student_id:   student_id.into(),
    teacher_id:   Uuid::new_v4(),
    subject_id:   subject.id,
    subject_name: subject.name.clone(),
    date:         date(day),
    status:       AttendanceStatus::Present,
  }
}

/// Wait until a live query delivers a snapshot satisfying `pred`.
async fn settle<T: Send + Sync + 'static>(
  live: &mut Live<T>,
  pred: impl Fn(&[T]) -> bool,
) -> Snapshot<T> {
  timeout(WAIT, async {
    loop {
      if let Some(snapshot) = live.current() {
        if pred(snapshot.as_slice()) {
          return snapshot;
        }
      }
      live.changed().await.expect("subscription ended");
    }
  })
  .await
  .expect("timed out waiting for delivery")
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_user() {
  let s = store().await;

  let user = s.add_user(student("budi", "Budi Santoso")).await.unwrap();
  let id = user.id.expect("store assigns an id");
  assert!(user.created_at.is_some());

  let fetched = s.get_user(id).await.unwrap().unwrap();
  assert_eq!(fetched, user);
  assert!(s.get_user(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn find_by_username_is_exact() {
  let s = store().await;
  s.add_user(student("siti", "Siti Aminah")).await.unwrap();

  let found = s.find_user_by_username("siti").await.unwrap().unwrap();
  assert_eq!(found.name, "Siti Aminah");
  assert!(s.find_user_by_username("Siti").await.unwrap().is_none());
}

#[tokio::test]
async fn list_users_filters_by_role_including_legacy_codes() {
  let s = store().await;
  s.add_user(student("budi", "Budi")).await.unwrap();
  s.add_user(NewUser {
    username:   "pakahmad".into(),
    name:       "Ahmad".into(),
    role:       Role::Teacher,
    id_number:  Some("NIP-1".into()),
    class_name: None,
  })
  .await
  .unwrap();
  s.execute_raw(
    "INSERT INTO users (user_id, username, name, role, created_at)
     VALUES ('6f1c2a4e-1111-4c1d-8a1e-000000000001', 'bulastri', 'Lastri', 'guru',
             '2024-01-01T00:00:00.000000Z');",
  )
  .await
  .unwrap();

  let teachers = s.list_users(Some(Role::Teacher)).await.unwrap();
  let names: Vec<_> = teachers.iter().map(|u| u.name.as_str()).collect();
  assert_eq!(names, ["Ahmad", "Lastri"]);

  let students = s.list_users(Some(Role::Student)).await.unwrap();
  assert_eq!(students.len(), 1);
  assert_eq!(s.list_users(None).await.unwrap().len(), 3);
}

#[tokio::test]
async fn delete_user_checks_role() {
  let s = store().await;
  let user = s.add_user(student("budi", "Budi")).await.unwrap();
  let id = user.id.unwrap();

  assert!(!s.delete_user(id, Role::Teacher).await.unwrap());
  assert!(s.get_user(id).await.unwrap().is_some());

  assert!(s.delete_user(id, Role::Student).await.unwrap());
  assert!(s.get_user(id).await.unwrap().is_none());
  assert!(!s.delete_user(id, Role::Student).await.unwrap());
}

// ─── Subjects ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn subjects_keep_creation_order() {
  let s = store().await;
  let math = s.add_subject("Matematika".into()).await.unwrap();
  s.add_subject("IPA".into()).await.unwrap();

  let names: Vec<_> = s
    .list_subjects()
    .await
    .unwrap()
    .into_iter()
    .map(|s| s.name)
    .collect();
  assert_eq!(names, ["Matematika", "IPA"]);

  assert!(s.delete_subject(math.id).await.unwrap());
  assert!(!s.delete_subject(math.id).await.unwrap());
  assert_eq!(s.list_subjects().await.unwrap().len(), 1);
}

// ─── Attendance ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn attendance_is_listed_most_recent_first() {
  let s = store().await;
  let math = s.add_subject("Matematika".into()).await.unwrap();

  let first = s.append_attendance(event("S001", &math, 15)).await.unwrap();
  let second = s.append_attendance(event("S002", &math, 15)).await.unwrap();
  let third = s.append_attendance(event("S001", &math, 16)).await.unwrap();

  let all = s.list_attendance(&AttendanceQuery::all()).await.unwrap();
  let ids: Vec<_> = all.iter().map(|e| e.id).collect();
  assert_eq!(ids, [third.id, second.id, first.id]);
  assert!(all.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
}

#[tokio::test]
async fn attendance_query_filters() {
  let s = store().await;
  let math = s.add_subject("Matematika".into()).await.unwrap();
  let ipa = s.add_subject("IPA".into()).await.unwrap();

  s.append_attendance(event("S001", &math, 15)).await.unwrap();
  s.append_attendance(event("S001", &ipa, 15)).await.unwrap();
  s.append_attendance(event("S002", &math, 16)).await.unwrap();

  let mine = s.list_attendance(&AttendanceQuery::for_student("S001")).await.unwrap();
  assert_eq!(mine.len(), 2);

  let q = AttendanceQuery { subject_id: Some(math.id), date: Some(date(16)), ..Default::default() };
  let rows = s.list_attendance(&q).await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].student_id, "S002");

  let q = AttendanceQuery { limit: Some(1), ..Default::default() };
  assert_eq!(s.list_attendance(&q).await.unwrap().len(), 1);
}

#[tokio::test]
async fn legacy_status_code_decodes() {
  let s = store().await;
  s.execute_raw(
    "INSERT INTO attendance (
       event_id, student_id, teacher_id, subject_id,
       subject_name, timestamp, date_string, status
     ) VALUES (
       '6f1c2a4e-2222-4c1d-8a1e-000000000001', 'S009',
       '6f1c2a4e-3333-4c1d-8a1e-000000000001', '6f1c2a4e-4444-4c1d-8a1e-000000000001',
       'Fiqih', '2024-03-01T01:00:00.000000Z', '2024-03-01', 'hadir'
     );",
  )
  .await
  .unwrap();

  let rows = s.list_attendance(&AttendanceQuery::all()).await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].status, AttendanceStatus::Present);
}

// ─── Change notification ─────────────────────────────────────────────────────

#[tokio::test]
async fn writes_bump_only_their_collection() {
  let s = store().await;
  let mut users = s.watch(Collection::Users);
  let mut subjects = s.watch(Collection::Subjects);

  s.add_subject("Matematika".into()).await.unwrap();
  assert!(subjects.has_changed().unwrap());
  assert!(!users.has_changed().unwrap());
  assert_eq!(*subjects.borrow_and_update(), 1);

  let ghost = s.delete_user(Uuid::new_v4(), Role::Student).await.unwrap();
  assert!(!ghost);
  assert!(!users.has_changed().unwrap());

  s.add_user(student("budi", "Budi")).await.unwrap();
  assert_eq!(*users.borrow_and_update(), 1);
}

#[tokio::test]
async fn clones_share_revisions() {
  let s = store().await;
  let other = s.clone();
  let mut rx = s.watch(Collection::Attendance);

  let math = other.add_subject("Matematika".into()).await.unwrap();
  other.append_attendance(event("S001", &math, 15)).await.unwrap();
  assert!(rx.has_changed().unwrap());
}

// ─── Credentials ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn credentials_insert_once() {
  let s = store().await;
  let email = "admin@mtsdarulhuda.com";

  assert!(s.insert_credential(email.into(), "hash-1".into()).await.unwrap());
  assert!(!s.insert_credential(email.into(), "hash-2".into()).await.unwrap());
  assert_eq!(s.credential_hash(email).await.unwrap().as_deref(), Some("hash-1"));
  assert!(s.credential_hash("nobody@mtsdarulhuda.com").await.unwrap().is_none());
}

// ─── Check-in engine ─────────────────────────────────────────────────────────

#[tokio::test]
async fn check_in_appends_exactly_one_event() {
  let s = Arc::new(store().await);
  let math = s.add_subject("Matematika".into()).await.unwrap();
  let engine = CheckInEngine::new(s.clone());
  let teacher = Uuid::new_v4();

  let recorded = engine
    .check_in(std::slice::from_ref(&math), CheckIn {
      student_id:  "  S001 ".into(),
      teacher_id:  teacher,
      subject_id:  Some(math.id),
      client_date: date(15),
    })
    .await
    .unwrap();

  assert_eq!(recorded.student_id, "S001");
  assert_eq!(recorded.subject_name, "Matematika");
  assert_eq!(recorded.teacher_id, teacher);
  assert_eq!(recorded.date, date(15));

  let all = s.list_attendance(&AttendanceQuery::all()).await.unwrap();
  assert_eq!(all, [recorded]);
}

#[tokio::test]
async fn invalid_check_in_writes_nothing() {
  let s = Arc::new(store().await);
  let math = s.add_subject("Matematika".into()).await.unwrap();
  let engine = CheckInEngine::new(s.clone());
  let mut rx = s.watch(Collection::Attendance);

  let blank = engine
    .check_in(&[math.clone()], CheckIn {
      student_id:  "   ".into(),
      teacher_id:  Uuid::new_v4(),
      subject_id:  Some(math.id),
      client_date: date(15),
    })
    .await;
  assert!(matches!(blank, Err(CoreError::BlankStudentId)));

  let unselected = engine
    .check_in(&[math], CheckIn {
      student_id:  "S001".into(),
      teacher_id:  Uuid::new_v4(),
      subject_id:  None,
      client_date: date(15),
    })
    .await;
  assert!(matches!(unselected, Err(CoreError::NoSubjectSelected)));

  assert!(!rx.has_changed().unwrap());
  assert!(s.list_attendance(&AttendanceQuery::all()).await.unwrap().is_empty());
}

#[tokio::test]
async fn unlisted_subject_gets_placeholder_name() {
  let s = Arc::new(store().await);
  let engine = CheckInEngine::new(s.clone());
  let gone = Uuid::new_v4();

  let recorded = engine
    .check_in(&[], CheckIn {
      student_id:  "S001".into(),
      teacher_id:  Uuid::new_v4(),
      subject_id:  Some(gone),
      client_date: date(15),
    })
    .await
    .unwrap();
  assert_eq!(recorded.subject_name, UNKNOWN_SUBJECT);
  assert_eq!(recorded.subject_id, gone);
}

#[tokio::test]
async fn duplicates_follow_policy() {
  let s = Arc::new(store().await);
  let math = s.add_subject("Matematika".into()).await.unwrap();
  let subjects = [math.clone()];
  let request = |day| CheckIn {
    student_id:  "S001".into(),
    teacher_id:  Uuid::new_v4(),
    subject_id:  Some(math.id),
    client_date: date(day),
  };

  let lenient = CheckInEngine::new(s.clone());
  assert_eq!(lenient.policy(), DuplicatePolicy::Allow);
  lenient.check_in(&subjects, request(15)).await.unwrap();
  lenient.check_in(&subjects, request(15)).await.unwrap();
  assert_eq!(s.list_attendance(&AttendanceQuery::all()).await.unwrap().len(), 2);

  let strict = CheckInEngine::new(s.clone()).with_policy(DuplicatePolicy::RejectSameDay);
  let dup = strict.check_in(&subjects, request(15)).await;
  assert!(matches!(dup, Err(CoreError::DuplicateCheckIn { ref student_id }) if student_id == "S001"));
  strict.check_in(&subjects, request(16)).await.unwrap();
  assert_eq!(s.list_attendance(&AttendanceQuery::all()).await.unwrap().len(), 3);
}

// ─── Identity ────────────────────────────────────────────────────────────────

fn principal(username: &str) -> Principal {
  Principal { email: format!("{username}@mtsdarulhuda.com") }
}

#[tokio::test]
async fn identity_resolves_roster_record() {
  let s = Arc::new(store().await);
  let user = s.add_user(student("budi", "Budi Santoso")).await.unwrap();
  let resolver = IdentityResolver::new(s, Directory::new("mtsdarulhuda.com", "admin"));

  let first = resolver.resolve(&principal("budi")).await.unwrap();
  assert!(!first.is_fallback());
  assert_eq!(first.user(), &user);

  let again = resolver.resolve(&principal("budi")).await.unwrap();
  assert_eq!(first, again);
}

#[tokio::test]
async fn identity_without_record_falls_back() {
  let s = Arc::new(store().await);
  let resolver = IdentityResolver::new(s.clone(), Directory::new("mtsdarulhuda.com", "admin"));

  let resolution = resolver.resolve(&principal("ghost")).await.unwrap();
  assert!(resolution.is_fallback());
  let user = resolution.into_user();
  assert_eq!(user.name, FALLBACK_NAME);
  assert_eq!(user.role, Role::Student);
  assert_eq!(user.username, "ghost");
  assert_eq!(user.id, None);

  assert!(s.list_users(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn admin_is_synthesised_without_a_record() {
  let s = Arc::new(store().await);
  let resolver = IdentityResolver::new(s, Directory::new("mtsdarulhuda.com", "admin"));

  let resolution = resolver.resolve(&principal("admin")).await.unwrap();
  assert!(!resolution.is_fallback());
  assert_eq!(resolution.user().role, Role::Admin);
}

// ─── Roster ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn roster_create_validates_per_kind() {
  let s = Arc::new(store().await);
  let roster = Roster::new(s.clone());

  let missing_class = roster
    .create(RosterKind::Students, RosterFields {
      name:       Some("Budi".into()),
      username:   Some("budi".into()),
      id_number:  Some("123".into()),
      class_name: None,
    })
    .await;
  assert!(matches!(missing_class, Err(CoreError::Write(_))));

  let teacher = roster
    .create(RosterKind::Teachers, RosterFields {
      name:      Some("Ahmad".into()),
      username:  Some("pakahmad".into()),
      id_number: Some("NIP-1".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  let stored = s.get_user(teacher).await.unwrap().unwrap();
  assert_eq!(stored.role, Role::Teacher);
  assert_eq!(stored.class_name, None);

  let subject = roster
    .create(RosterKind::Subjects, RosterFields { name: Some("IPA".into()), ..Default::default() })
    .await
    .unwrap();
  let listed = roster.snapshot(RosterKind::Subjects).await.unwrap();
  assert_eq!(listed.iter().map(RosterItem::id).collect::<Vec<_>>(), [Some(subject)]);
}

#[tokio::test]
async fn roster_usernames_match_the_signed_in_principal() {
  let s = Arc::new(store().await);
  let roster = Roster::new(s.clone());
  let directory = Directory::new("mtsdarulhuda.com", "admin");

  let id = roster
    .create(RosterKind::Teachers, RosterFields {
      name:      Some("Budi Hartono".into()),
      username:  Some(" Pak Budi ".into()),
      id_number: Some("NIP-2".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(s.get_user(id).await.unwrap().unwrap().username, "pakbudi");

  let principal = Principal { email: directory.email_for("PakBudi") };
  let resolution = IdentityResolver::new(s, directory).resolve(&principal).await.unwrap();
  assert!(!resolution.is_fallback());
  assert_eq!(resolution.user().role, Role::Teacher);
  assert_eq!(resolution.user().id, Some(id));
}

#[tokio::test]
async fn live_roster_drops_deleted_record_and_keeps_events() {
  let s = Arc::new(store().await);
  let roster = Roster::new(s.clone());
  let budi = s.add_user(student("budi", "Budi")).await.unwrap().id.unwrap();
  let siti = s.add_user(student("siti", "Siti")).await.unwrap().id.unwrap();
  let math = s.add_subject("Matematika".into()).await.unwrap();
  s.append_attendance(event("budi", &math, 15)).await.unwrap();

  let mut live = roster.list(RosterKind::Students);
  settle(&mut live, |rows| rows.len() == 2).await;

  let deleted = roster
    .delete(roster.request_delete(RosterKind::Students, budi).confirm())
    .await
    .unwrap();
  assert!(deleted);

  let rows = settle(&mut live, |rows| rows.len() == 1).await;
  assert_eq!(rows[0].id(), Some(siti));

  let events = s.list_attendance(&AttendanceQuery::for_student("budi")).await.unwrap();
  assert_eq!(events.len(), 1);
}

#[tokio::test]
async fn cancelled_subscription_does_not_block_writes() {
  let s = Arc::new(store().await);
  let roster = Roster::new(s.clone());
  let mut live = roster.list(RosterKind::Subjects);
  settle(&mut live, |rows| rows.is_empty()).await;
  live.cancel();

  s.add_subject("IPA".into()).await.unwrap();
  assert_eq!(roster.snapshot(RosterKind::Subjects).await.unwrap().len(), 1);
}

// ─── Report feed ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn report_feed_follows_new_check_ins() {
  let s = Arc::new(store().await);
  let math = s.add_subject("Matematika".into()).await.unwrap();
  let mut feed = ReportFeed::subscribe(s.clone());

  timeout(WAIT, async {
    while !feed.is_loaded() {
      feed.next().await.expect("feed ended");
    }
  })
  .await
  .expect("initial delivery");
  assert!(feed.rows().is_empty());

  let engine = CheckInEngine::new(s.clone());
  engine
    .check_in(&[math.clone()], CheckIn {
      student_id:  "S001".into(),
      teacher_id:  Uuid::new_v4(),
      subject_id:  Some(math.id),
      client_date: date(15),
    })
    .await
    .unwrap();

  timeout(WAIT, async {
    while feed.rows().is_empty() {
      feed.next().await.expect("feed ended");
    }
  })
  .await
  .expect("delivery after check-in");

  let rows = feed.rows();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].subject_name, "Matematika");
  assert_eq!(rows[0].student_id, "S001");
  assert_eq!(rows[0].status, AttendanceStatus::Present);

  let csv = feed.export_csv(&ReportLocale::wib());
  let lines: Vec<_> = csv.lines().collect();
  assert_eq!(lines.len(), 2);
  assert_eq!(lines[0], CSV_HEADER);
  assert!(lines[1].contains(",S001,Matematika,Hadir"));
}

#[tokio::test]
async fn report_rows_and_export_are_newest_first() {
  let s = Arc::new(store().await);
  let math = s.add_subject("Matematika".into()).await.unwrap();
  s.execute_raw(
    "INSERT INTO attendance (
       event_id, student_id, teacher_id, subject_id,
       subject_name, timestamp, date_string, status
     ) VALUES
     ('6f1c2a4e-2222-4c1d-8a1e-000000000002', 'S002',
      '6f1c2a4e-3333-4c1d-8a1e-000000000001', '6f1c2a4e-4444-4c1d-8a1e-000000000001',
      'Fiqih', '2024-03-02T01:00:00.000000Z', '2024-03-02', 'present'),
     ('6f1c2a4e-2222-4c1d-8a1e-000000000001', 'S001',
      '6f1c2a4e-3333-4c1d-8a1e-000000000001', '6f1c2a4e-4444-4c1d-8a1e-000000000001',
      'Fiqih', '2024-03-01T01:00:00.000000Z', '2024-03-01', 'present'),
     ('6f1c2a4e-2222-4c1d-8a1e-000000000003', 'S003',
      '6f1c2a4e-3333-4c1d-8a1e-000000000001', '6f1c2a4e-4444-4c1d-8a1e-000000000001',
      'Fiqih', '2024-03-03T01:00:00.000000Z', '2024-03-03', 'present');",
  )
  .await
  .unwrap();

  let mut feed = ReportFeed::subscribe(s.clone());
  CheckInEngine::new(s.clone())
    .check_in(&[math.clone()], CheckIn {
      student_id:  "S004".into(),
      teacher_id:  Uuid::new_v4(),
      subject_id:  Some(math.id),
      client_date: date(15),
    })
    .await
    .unwrap();

  timeout(WAIT, async {
    while feed.rows().len() < 4 {
      feed.next().await.expect("feed ended");
    }
  })
  .await
  .expect("delivery of all rows");

  let rows = feed.rows();
  let students: Vec<_> = rows.iter().map(|e| e.student_id.as_str()).collect();
  assert_eq!(students, ["S004", "S003", "S002", "S001"]);
  assert!(rows.windows(2).all(|w| w[0].timestamp > w[1].timestamp));

  let csv = feed.export_csv(&ReportLocale::wib());
  let exported: Vec<_> = csv
    .lines()
    .skip(1)
    .map(|line| line.split(',').rev().nth(2).unwrap_or_default())
    .collect();
  assert_eq!(exported, students);
}
