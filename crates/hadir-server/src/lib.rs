//! HTTP surface for Hadir.
//!
//! Exposes an axum [`Router`] over any [`CredentialStore`]: sign-in with
//! bearer sessions, roster administration, the teacher's scanning session,
//! realtime reports (JSON, SSE and CSV) and the student's own code and
//! history.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod sessions;

pub use error::Error;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Router,
  routing::{delete, get, post},
};
use chrono::TimeDelta;
use hadir_core::{
  auth::{CredentialStore, Directory},
  checkin::{CheckInEngine, DuplicatePolicy},
  feed::ReportFeed,
  identity::IdentityResolver,
  report::ReportLocale,
  roster::Roster,
  session::DEFAULT_NOTICE_TTL_SECS,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::LocalIdentityProvider;
use handlers::{account, reports, roster, student, teacher};
use sessions::{DEFAULT_IDLE_TIMEOUT, Sessions};

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_email_domain() -> String { "mtsdarulhuda.com".to_owned() }
fn default_admin_username() -> String { "admin".to_owned() }
fn default_utc_offset_minutes() -> i32 { 7 * 60 }
fn default_notice_ttl_secs() -> i64 { DEFAULT_NOTICE_TTL_SECS }
fn default_session_idle_secs() -> u64 { DEFAULT_IDLE_TIMEOUT.as_secs() }

/// Runtime server configuration, deserialised from `config.toml` and
/// `HADIR_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  /// One SQLite file per deployment.
  pub store_path:         PathBuf,
  #[serde(default = "default_email_domain")]
  pub email_domain:       String,
  #[serde(default = "default_admin_username")]
  pub admin_username:     String,
  /// Offset used when rendering report dates and times.
  #[serde(default = "default_utc_offset_minutes")]
  pub utc_offset_minutes: i32,
  #[serde(default = "default_notice_ttl_secs")]
  pub notice_ttl_secs:    i64,
  #[serde(default)]
  pub duplicate_policy:   DuplicatePolicy,
  /// Bearer sessions unused for this long are dropped.
  #[serde(default = "default_session_idle_secs")]
  pub session_idle_secs:  u64,
}

impl ServerConfig {
  pub fn directory(&self) -> Directory {
    Directory::new(self.email_domain.clone(), self.admin_username.clone())
  }

  pub fn locale(&self) -> Result<ReportLocale, Error> {
    ReportLocale::from_offset_minutes(self.utc_offset_minutes).ok_or_else(|| {
      Error::Config(format!("utc_offset_minutes out of range: {}", self.utc_offset_minutes))
    })
  }

  pub fn notice_ttl(&self) -> Result<TimeDelta, Error> {
    TimeDelta::try_seconds(self.notice_ttl_secs)
      .filter(|ttl| *ttl >= TimeDelta::zero())
      .ok_or_else(|| Error::Config(format!("invalid notice_ttl_secs: {}", self.notice_ttl_secs)))
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:      Arc<S>,
  pub config:     Arc<ServerConfig>,
  pub directory:  Arc<Directory>,
  pub provider:   Arc<LocalIdentityProvider<S>>,
  pub resolver:   Arc<IdentityResolver<S>>,
  pub roster:     Roster<S>,
  pub engine:     CheckInEngine<S>,
  /// Standing query over the whole attendance log, shared by every report
  /// reader.
  pub reports:    Arc<ReportFeed>,
  pub locale:     ReportLocale,
  pub notice_ttl: TimeDelta,
  pub sessions:   Arc<Sessions>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:      self.store.clone(),
      config:     self.config.clone(),
      directory:  self.directory.clone(),
      provider:   self.provider.clone(),
      resolver:   self.resolver.clone(),
      roster:     self.roster.clone(),
      engine:     self.engine.clone(),
      reports:    self.reports.clone(),
      locale:     self.locale,
      notice_ttl: self.notice_ttl,
      sessions:   self.sessions.clone(),
    }
  }
}

impl<S: CredentialStore + 'static> AppState<S> {
  /// Wire up the services over `store`. Must be called inside a tokio
  /// runtime: the report feed starts its subscription immediately.
  pub fn new(store: Arc<S>, config: ServerConfig) -> Result<Self, Error> {
    let directory = config.directory();
    let locale = config.locale()?;
    let notice_ttl = config.notice_ttl()?;

    Ok(Self {
      provider: Arc::new(LocalIdentityProvider::new(store.clone())),
      resolver: Arc::new(IdentityResolver::new(store.clone(), directory.clone())),
      roster: Roster::new(store.clone()),
      engine: CheckInEngine::new(store.clone()).with_policy(config.duplicate_policy),
      reports: Arc::new(ReportFeed::subscribe(store.clone())),
      directory: Arc::new(directory),
      locale,
      notice_ttl,
      sessions: Arc::new(Sessions::new(Duration::from_secs(config.session_idle_secs))),
      config: Arc::new(config),
      store,
    })
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the Hadir server.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: CredentialStore + 'static,
{
  Router::new()
    // Session
    .route("/auth/login",                 post(account::login::<S>))
    .route("/auth/logout",                post(account::logout::<S>))
    .route("/me",                         get(account::me::<S>))
    // Roster administration
    .route("/roster/{kind}",              get(roster::list::<S>).post(roster::create::<S>))
    .route("/roster/{kind}/live",         get(roster::live::<S>))
    .route("/roster/{kind}/{id}",         delete(roster::remove::<S>))
    // Teacher scanning
    .route("/teacher/subjects",           get(teacher::subjects::<S>))
    .route("/teacher/session",            delete(teacher::leave::<S>).put(teacher::select::<S>))
    .route("/teacher/scan",               post(teacher::scan::<S>))
    .route("/teacher/notice",             get(teacher::notice::<S>))
    // Reports
    .route("/reports/attendance",         get(reports::snapshot::<S>))
    .route("/reports/attendance/live",    get(reports::live::<S>))
    .route("/reports/attendance.csv",     get(reports::csv::<S>))
    // Student
    .route("/student/code",               get(student::code::<S>))
    .route("/student/history",            get(student::history::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
