//! The identity-provider boundary.
//!
//! A [`Principal`] is what the provider vouches for: an email-like login
//! identifier. Turning it into an application profile is the job of
//! [`crate::identity`]; this module only signs principals in and provisions
//! accounts.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::AttendanceStore;

// ─── Principal ───────────────────────────────────────────────────────────────

/// An authenticated identity, prior to any profile resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
  pub email: String,
}

impl Principal {
  /// The part of the email before `@`.
  pub fn username(&self) -> &str {
    self.email.split_once('@').map_or(self.email.as_str(), |(user, _)| user)
  }
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Credential and account failures. Shown to users as one generic message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
  #[error("login failed: check username and password")]
  UserNotFound,

  #[error("login failed: check username and password")]
  WrongCredentials,

  #[error("account already exists")]
  AccountExists,

  #[error("identity provider error: {0}")]
  Backend(String),
}

// ─── Directory ───────────────────────────────────────────────────────────────

/// The canonical form of a login username: lowercased, with all whitespace
/// removed. Roster usernames are stored in this form so they match the local
/// part of a signed-in principal.
pub fn normalize_username(username: &str) -> String {
  username
    .chars()
    .filter(|c| !c.is_whitespace())
    .flat_map(char::to_lowercase)
    .collect()
}

/// Maps login usernames onto provider emails for one deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
  pub email_domain:   String,
  pub admin_username: String,
}

impl Directory {
  pub fn new(email_domain: impl Into<String>, admin_username: impl Into<String>) -> Self {
    Self { email_domain: email_domain.into(), admin_username: admin_username.into() }
  }

  /// Normalise the username and append the domain.
  pub fn email_for(&self, username: &str) -> String {
    format!("{}@{}", normalize_username(username), self.email_domain)
  }

  /// The reserved administrator email.
  pub fn admin_email(&self) -> String { self.email_for(&self.admin_username) }

  pub fn is_admin(&self, principal: &Principal) -> bool {
    principal.email == self.admin_email()
  }
}

// ─── Provider traits ─────────────────────────────────────────────────────────

/// An identity provider that can sign principals in and create accounts.
pub trait IdentityProvider: Send + Sync {
  fn sign_in<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<Principal, AuthError>> + Send + 'a;

  /// Create an account. Fails with [`AuthError::AccountExists`] if the email
  /// is taken.
  fn sign_up<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<Principal, AuthError>> + Send + 'a;
}

/// Persistence for password hashes, kept in the same store as the roster.
pub trait CredentialStore: AttendanceStore {
  /// Insert a credential. Returns `false` without writing if the email is
  /// already present.
  fn insert_credential(
    &self,
    email: String,
    password_hash: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn credential_hash<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;
}

// ─── Flows ───────────────────────────────────────────────────────────────────

/// Sign in with a login username. Failures are returned as-is; this never
/// creates accounts.
pub async fn login<P: IdentityProvider>(
  provider: &P,
  directory: &Directory,
  username: &str,
  password: &str,
) -> Result<Principal, AuthError> {
  let email = directory.email_for(username);
  match provider.sign_in(&email, password).await {
    Ok(principal) => {
      tracing::info!(email = %principal.email, "signed in");
      Ok(principal)
    }
    Err(e) => {
      tracing::info!(%email, error = %e, "sign-in rejected");
      Err(e)
    }
  }
}

/// Whether [`provision_admin`] created the account or found it in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
  Created,
  AlreadyPresent,
}

/// Create the administrator account if it does not exist yet.
///
/// Idempotent: an existing account is left untouched, including its password.
pub async fn provision_admin<P: IdentityProvider>(
  provider: &P,
  directory: &Directory,
  password: &str,
) -> Result<Provisioned, AuthError> {
  let email = directory.admin_email();
  match provider.sign_up(&email, password).await {
    Ok(_) => {
      tracing::info!(%email, "administrator account provisioned");
      Ok(Provisioned::Created)
    }
    Err(AuthError::AccountExists) => {
      tracing::info!(%email, "administrator account already present");
      Ok(Provisioned::AlreadyPresent)
    }
    Err(e) => Err(e),
  }
}
