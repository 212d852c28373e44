//! [`SqliteStore`]: the SQLite implementation of [`AttendanceStore`].

use std::{path::Path, sync::Arc};

use hadir_core::{
  attendance::{AttendanceEvent, AttendanceQuery, NewAttendance},
  auth::CredentialStore,
  store::{AttendanceStore, Collection},
  subject::Subject,
  user::{NewUser, Role, UserRecord},
};
use rusqlite::OptionalExtension as _;
use tokio::sync::watch;
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    RawEvent, RawSubject, RawUser, encode_date, encode_dt, encode_role, encode_status,
    encode_uuid, now,
  },
  schema::SCHEMA,
};

// ─── Revisions ───────────────────────────────────────────────────────────────

/// One revision counter per collection, bumped after every committed write.
struct Revisions {
  users:      watch::Sender<u64>,
  subjects:   watch::Sender<u64>,
  attendance: watch::Sender<u64>,
}

impl Revisions {
  fn new() -> Self {
    Self {
      users:      watch::Sender::new(0),
      subjects:   watch::Sender::new(0),
      attendance: watch::Sender::new(0),
    }
  }

  fn sender(&self, collection: Collection) -> &watch::Sender<u64> {
    match collection {
      Collection::Users => &self.users,
      Collection::Subjects => &self.subjects,
      Collection::Attendance => &self.attendance,
    }
  }

  fn bump(&self, collection: Collection) {
    self.sender(collection).send_modify(|rev| *rev += 1);
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Hadir store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection and revision counters are
/// reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:      tokio_rusqlite::Connection,
  revisions: Arc<Revisions>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self { conn, revisions: Arc::new(Revisions::new()) })
  }

  /// Run raw SQL against the database, bypassing revision bumps.
  #[cfg(test)]
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── AttendanceStore impl ────────────────────────────────────────────────────

impl AttendanceStore for SqliteStore {
  type Error = crate::Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, input: NewUser) -> Result<UserRecord> {
    let user = UserRecord {
      id:         Some(Uuid::new_v4()),
      username:   input.username,
      name:       input.name,
      role:       input.role,
      id_number:  input.id_number,
      class_name: input.class_name,
      created_at: Some(now()),
    };

    let id_str     = user.id.map(encode_uuid);
    let username   = user.username.clone();
    let name       = user.name.clone();
    let role_str   = encode_role(user.role);
    let id_number  = user.id_number.clone();
    let class_name = user.class_name.clone();
    let at_str     = user.created_at.map(encode_dt);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, username, name, role, id_number, class_name, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![id_str, username, name, role_str, id_number, class_name, at_str],
        )?;
        Ok(())
      })
      .await?;

    self.revisions.bump(Collection::Users);
    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<UserRecord>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {} FROM users WHERE user_id = ?1", RawUser::COLUMNS),
              rusqlite::params![id_str],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
    let username = username.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM users WHERE username = ?1 ORDER BY seq LIMIT 1",
                RawUser::COLUMNS
              ),
              rusqlite::params![username],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn list_users(&self, role: Option<Role>) -> Result<Vec<UserRecord>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {} FROM users ORDER BY seq", RawUser::COLUMNS))?;
        let rows = stmt
          .query_map([], RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    // Role codes include legacy aliases, so the filter runs on decoded roles.
    let users = raws
      .into_iter()
      .map(RawUser::into_user)
      .collect::<Result<Vec<_>>>()?;
    Ok(match role {
      Some(r) => users.into_iter().filter(|u| u.role == r).collect(),
      None => users,
    })
  }

  async fn delete_user(&self, id: Uuid, role: Role) -> Result<bool> {
    let id_str = encode_uuid(id);

    let removed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let stored: Option<String> = tx
          .query_row(
            "SELECT role FROM users WHERE user_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;
        let removed = match stored {
          Some(code) if Role::from_code(&code) == role => {
            tx.execute("DELETE FROM users WHERE user_id = ?1", rusqlite::params![id_str])? > 0
          }
          _ => false,
        };
        tx.commit()?;
        Ok(removed)
      })
      .await?;

    if removed {
      self.revisions.bump(Collection::Users);
    }
    Ok(removed)
  }

  // ── Subjects ──────────────────────────────────────────────────────────────

  async fn add_subject(&self, name: String) -> Result<Subject> {
    let subject = Subject { id: Uuid::new_v4(), name, created_at: now() };

    let id_str = encode_uuid(subject.id);
    let name   = subject.name.clone();
    let at_str = encode_dt(subject.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subjects (subject_id, name, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, name, at_str],
        )?;
        Ok(())
      })
      .await?;

    self.revisions.bump(Collection::Subjects);
    Ok(subject)
  }

  async fn list_subjects(&self) -> Result<Vec<Subject>> {
    let raws: Vec<RawSubject> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT subject_id, name, created_at FROM subjects ORDER BY seq")?;
        let rows = stmt
          .query_map([], RawSubject::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubject::into_subject).collect()
  }

  async fn delete_subject(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let removed = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "DELETE FROM subjects WHERE subject_id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(n > 0)
      })
      .await?;

    if removed {
      self.revisions.bump(Collection::Subjects);
    }
    Ok(removed)
  }

  // ── Attendance, append-only ──────────────────────────────────────────────

  async fn append_attendance(&self, input: NewAttendance) -> Result<AttendanceEvent> {
    let event = AttendanceEvent {
      id:           Uuid::new_v4(),
      student_id:   input.student_id,
      teacher_id:   input.teacher_id,
      subject_id:   input.subject_id,
      subject_name: input.subject_name,
      timestamp:    now(),
      date:         input.date,
      status:       input.status,
    };

    let event_id     = encode_uuid(event.id);
    let student_id   = event.student_id.clone();
    let teacher_id   = encode_uuid(event.teacher_id);
    let subject_id   = encode_uuid(event.subject_id);
    let subject_name = event.subject_name.clone();
    let timestamp    = encode_dt(event.timestamp);
    let date_string  = encode_date(event.date);
    let status       = encode_status(event.status);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO attendance (
             event_id, student_id, teacher_id, subject_id,
             subject_name, timestamp, date_string, status
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            event_id,
            student_id,
            teacher_id,
            subject_id,
            subject_name,
            timestamp,
            date_string,
            status,
          ],
        )?;
        Ok(())
      })
      .await?;

    self.revisions.bump(Collection::Attendance);
    Ok(event)
  }

  async fn list_attendance(&self, query: &AttendanceQuery) -> Result<Vec<AttendanceEvent>> {
    let student_id = query.student_id.clone();
    let subject_id = query.subject_id.map(encode_uuid);
    let date       = query.date.map(encode_date);
    // SQLite treats a negative LIMIT as "no limit".
    let limit      = query.limit.map_or(-1, |l| l as i64);

    let raws: Vec<RawEvent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM attendance
           WHERE (?1 IS NULL OR student_id  = ?1)
             AND (?2 IS NULL OR subject_id  = ?2)
             AND (?3 IS NULL OR date_string = ?3)
           ORDER BY timestamp DESC, seq DESC
           LIMIT ?4",
          RawEvent::COLUMNS
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![student_id, subject_id, date, limit],
            RawEvent::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }

  // ── Change notification ───────────────────────────────────────────────────

  fn watch(&self, collection: Collection) -> watch::Receiver<u64> {
    self.revisions.sender(collection).subscribe()
  }
}

// ─── CredentialStore impl ────────────────────────────────────────────────────

impl CredentialStore for SqliteStore {
  async fn insert_credential(&self, email: String, password_hash: String) -> Result<bool> {
    let at_str = encode_dt(now());

    let inserted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "INSERT OR IGNORE INTO accounts (email, password_hash, created_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![email, password_hash, at_str],
        )?;
        Ok(n > 0)
      })
      .await?;

    Ok(inserted)
  }

  async fn credential_hash(&self, email: &str) -> Result<Option<String>> {
    let email = email.to_owned();

    let hash = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT password_hash FROM accounts WHERE email = ?1",
              rusqlite::params![email],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    if hash.is_none() {
      tracing::debug!("no credential for requested email");
    }
    Ok(hash)
  }
}
