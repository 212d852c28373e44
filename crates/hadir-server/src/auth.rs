//! Password identity provider and the bearer-session extractor.

use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};
use hadir_core::{
  auth::{AuthError, CredentialStore, IdentityProvider, Principal},
  user::UserRecord,
  view::View,
};
use rand_core::OsRng;
use uuid::Uuid;

use crate::{AppState, error::Error, sessions::Session};

// ─── Identity provider ───────────────────────────────────────────────────────

/// Verifies argon2 PHC hashes kept in the store's `accounts` table.
pub struct LocalIdentityProvider<S> {
  store: Arc<S>,
}

impl<S> LocalIdentityProvider<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }
}

/// Hash `password` into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| AuthError::Backend(format!("argon2 error: {e}")))
}

impl<S: CredentialStore> IdentityProvider for LocalIdentityProvider<S> {
  async fn sign_in(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
    let stored = self
      .store
      .credential_hash(email)
      .await
      .map_err(|e| AuthError::Backend(e.to_string()))?
      .ok_or(AuthError::UserNotFound)?;

    let parsed = PasswordHash::new(&stored)
      .map_err(|e| AuthError::Backend(format!("stored hash unreadable: {e}")))?;

    Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .map_err(|_| AuthError::WrongCredentials)?;

    Ok(Principal { email: email.to_owned() })
  }

  async fn sign_up(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
    let hash = hash_password(password)?;
    let inserted = self
      .store
      .insert_credential(email.to_owned(), hash)
      .await
      .map_err(|e| AuthError::Backend(e.to_string()))?;

    if !inserted {
      return Err(AuthError::AccountExists);
    }
    Ok(Principal { email: email.to_owned() })
  }
}

// ─── Session extractor ───────────────────────────────────────────────────────

/// The session behind the request's bearer token.
pub struct CurrentSession {
  pub token:   String,
  pub session: Session,
}

impl CurrentSession {
  pub fn user(&self) -> &UserRecord { self.session.user() }

  pub fn view(&self) -> View { self.session.view() }

  /// Fail with [`Error::Forbidden`] unless the session routes to one of
  /// `views`.
  pub fn require(&self, views: &[View]) -> Result<&UserRecord, Error> {
    if views.contains(&self.view()) {
      Ok(self.user())
    } else {
      tracing::debug!(view = %self.view(), "surface refused");
      Err(Error::Forbidden)
    }
  }

  /// The roster id of the signed-in user. Synthesised and fallback profiles
  /// have none.
  pub fn record_id(&self) -> Result<Uuid, Error> {
    self
      .user()
      .id
      .ok_or_else(|| Error::NotFound("no roster record for this account".to_owned()))
  }
}

/// Extract the token from an `Authorization: Bearer …` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, Error> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .ok_or(Error::Unauthorized)
}

impl<S> FromRequestParts<AppState<S>> for CurrentSession
where
  S: CredentialStore + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers)?.to_owned();
    let session = state.sessions.get(&token).await.ok_or(Error::Unauthorized)?;
    Ok(CurrentSession { token, session })
  }
}

#[cfg(test)]
mod tests {
  use axum::http::{HeaderValue, header};
  use hadir_core::auth::{Directory, Provisioned, provision_admin};
  use hadir_store_sqlite::SqliteStore;

  use super::*;

  async fn provider() -> LocalIdentityProvider<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    LocalIdentityProvider::new(Arc::new(store))
  }

  #[tokio::test]
  async fn sign_up_then_sign_in() {
    let p = provider().await;
    let email = "guru01@mtsdarulhuda.com";

    let created = p.sign_up(email, "rahasia").await.unwrap();
    assert_eq!(created.email, email);

    let signed_in = p.sign_in(email, "rahasia").await.unwrap();
    assert_eq!(signed_in, created);
  }

  #[tokio::test]
  async fn wrong_password_and_unknown_user() {
    let p = provider().await;
    p.sign_up("a@x.com", "right").await.unwrap();

    assert_eq!(p.sign_in("a@x.com", "wrong").await, Err(AuthError::WrongCredentials));
    assert_eq!(p.sign_in("b@x.com", "right").await, Err(AuthError::UserNotFound));
  }

  #[tokio::test]
  async fn second_sign_up_keeps_first_password() {
    let p = provider().await;
    p.sign_up("a@x.com", "first").await.unwrap();

    assert_eq!(p.sign_up("a@x.com", "second").await, Err(AuthError::AccountExists));
    assert!(p.sign_in("a@x.com", "first").await.is_ok());
  }

  #[tokio::test]
  async fn provisioning_admin_twice_keeps_first_password() {
    let p = provider().await;
    let directory = Directory::new("mtsdarulhuda.com", "admin");

    assert_eq!(provision_admin(&p, &directory, "first").await, Ok(Provisioned::Created));
    assert_eq!(provision_admin(&p, &directory, "second").await, Ok(Provisioned::AlreadyPresent));

    let email = directory.admin_email();
    assert!(p.sign_in(&email, "first").await.is_ok());
    assert_eq!(p.sign_in(&email, "second").await, Err(AuthError::WrongCredentials));
  }

  #[test]
  fn bearer_header_parsing() {
    let mut headers = HeaderMap::new();
    assert!(matches!(bearer_token(&headers), Err(Error::Unauthorized)));

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
    assert!(matches!(bearer_token(&headers), Err(Error::Unauthorized)));

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer tok-123"));
    assert_eq!(bearer_token(&headers).unwrap(), "tok-123");
  }
}
