//! Bearer sessions: one per successful sign-in, held in memory.
//!
//! A session carries the principal, the identity resolution made at sign-in,
//! and the teacher's scan session once the scanning view is opened. Sessions
//! unused for longer than the idle timeout are dropped: lazily when their
//! token is next presented, and in bulk whenever a new session is issued.

use std::{collections::HashMap, time::Duration};

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use hadir_core::{
  auth::Principal,
  identity::Resolution,
  session::ScanSession,
  user::UserRecord,
  view::View,
};
use rand_core::{OsRng, RngCore};
use tokio::{sync::Mutex, time::Instant};

const TOKEN_BYTES: usize = 32;

/// Idle timeout used by [`Sessions::default`].
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(12 * 60 * 60);

/// The server-side state behind one bearer token.
#[derive(Debug, Clone)]
pub struct Session {
  pub principal:  Principal,
  pub resolution: Resolution,
  pub scan:       Option<ScanSession>,
}

impl Session {
  pub fn new(principal: Principal, resolution: Resolution) -> Self {
    Self { principal, resolution, scan: None }
  }

  pub fn user(&self) -> &UserRecord { self.resolution.user() }

  pub fn view(&self) -> View { View::route(self.user()) }
}

struct Entry {
  session:   Session,
  last_seen: Instant,
}

impl Entry {
  fn is_idle(&self, timeout: Duration) -> bool { self.last_seen.elapsed() >= timeout }
}

pub struct Sessions {
  inner:        Mutex<HashMap<String, Entry>>,
  idle_timeout: Duration,
}

impl Default for Sessions {
  fn default() -> Self { Self::new(DEFAULT_IDLE_TIMEOUT) }
}

fn new_token() -> String {
  let mut bytes = [0u8; TOKEN_BYTES];
  OsRng.fill_bytes(&mut bytes);
  B64.encode(bytes)
}

impl Sessions {
  pub fn new(idle_timeout: Duration) -> Self {
    Self { inner: Mutex::new(HashMap::new()), idle_timeout }
  }

  /// Store `session` under a fresh token and return the token. Idle sessions
  /// are evicted first.
  pub async fn issue(&self, session: Session) -> String {
    let token = new_token();
    let mut inner = self.inner.lock().await;
    let before = inner.len();
    inner.retain(|_, entry| !entry.is_idle(self.idle_timeout));
    let evicted = before - inner.len();
    if evicted > 0 {
      tracing::debug!(evicted, "idle sessions dropped");
    }
    inner.insert(token.clone(), Entry { session, last_seen: Instant::now() });
    token
  }

  /// Drop the session for `token`. Returns `false` if there was none.
  pub async fn revoke(&self, token: &str) -> bool {
    self.inner.lock().await.remove(token).is_some()
  }

  /// The live entry for `token`, marked as used. An idle entry is removed.
  fn touch<'a>(
    &self,
    inner: &'a mut HashMap<String, Entry>,
    token: &str,
  ) -> Option<&'a mut Entry> {
    if inner.get(token)?.is_idle(self.idle_timeout) {
      inner.remove(token);
      return None;
    }
    let entry = inner.get_mut(token)?;
    entry.last_seen = Instant::now();
    Some(entry)
  }

  /// A copy of the session without its scan state.
  pub async fn get(&self, token: &str) -> Option<Session> {
    let mut inner = self.inner.lock().await;
    self
      .touch(&mut inner, token)
      .map(|e| Session { scan: None, ..e.session.clone() })
  }

  /// Replace the resolution recorded for `token`.
  pub async fn set_resolution(&self, token: &str, resolution: Resolution) -> bool {
    let mut inner = self.inner.lock().await;
    match self.touch(&mut inner, token) {
      Some(entry) => {
        entry.session.resolution = resolution;
        true
      }
      None => false,
    }
  }

  /// Run `f` against the scan slot of `token`'s session. `None` if the
  /// session is gone.
  pub async fn with_scan<R>(
    &self,
    token: &str,
    f: impl FnOnce(&mut Option<ScanSession>) -> R,
  ) -> Option<R> {
    let mut inner = self.inner.lock().await;
    self.touch(&mut inner, token).map(|e| f(&mut e.session.scan))
  }

  pub async fn count(&self) -> usize { self.inner.lock().await.len() }
}
