//! SQL schema for the Hadir SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- `seq` gives creation order and breaks timestamp ties.
CREATE TABLE IF NOT EXISTS users (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     TEXT NOT NULL UNIQUE,
    username    TEXT NOT NULL,
    name        TEXT NOT NULL,
    role        TEXT NOT NULL,   -- 'admin' | 'teacher' | 'student' (legacy 'guru' | 'siswa')
    id_number   TEXT,
    class_name  TEXT,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS subjects (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    subject_id  TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

-- Attendance is strictly append-only.
-- No UPDATE or DELETE is ever issued against this table. References to
-- users and subjects are plain text with no foreign keys: deleting a roster
-- record leaves its events in place.
CREATE TABLE IF NOT EXISTS attendance (
    seq           INTEGER PRIMARY KEY AUTOINCREMENT,
    event_id      TEXT NOT NULL UNIQUE,
    student_id    TEXT NOT NULL,
    teacher_id    TEXT NOT NULL,
    subject_id    TEXT NOT NULL,
    subject_name  TEXT NOT NULL,   -- snapshot at check-in
    timestamp     TEXT NOT NULL,   -- RFC 3339 UTC, fixed width; server-assigned
    date_string   TEXT NOT NULL,   -- YYYY-MM-DD on the client's clock
    status        TEXT NOT NULL DEFAULT 'present'
);

CREATE TABLE IF NOT EXISTS accounts (
    email          TEXT PRIMARY KEY,
    password_hash  TEXT NOT NULL,   -- argon2 PHC string
    created_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS users_username_idx     ON users(username);
CREATE INDEX IF NOT EXISTS attendance_time_idx    ON attendance(timestamp);
CREATE INDEX IF NOT EXISTS attendance_student_idx ON attendance(student_id);

PRAGMA user_version = 1;
";
