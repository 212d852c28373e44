//! Roster administration: students, teachers and subjects.
//!
//! Students and teachers share the `users` collection and are told apart by
//! role. There is no update; an edit is a delete followed by a create.
//!
//! Deleting requires a [`ConfirmedDelete`], which can only be obtained by
//! calling [`PendingDelete::confirm`]. The check is a guardrail against
//! accidental deletes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result, WriteError,
  auth::normalize_username,
  live::{Live, Snapshot},
  store::{AttendanceStore, Collection},
  subject::Subject,
  user::{NewUser, Role, UserRecord},
};

/// Which roster list an operation targets.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::AsRefStr,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RosterKind {
  Students,
  Teachers,
  Subjects,
}

impl RosterKind {
  /// The user role this list holds; `None` for subjects.
  pub fn role(self) -> Option<Role> {
    match self {
      Self::Students => Some(Role::Student),
      Self::Teachers => Some(Role::Teacher),
      Self::Subjects => None,
    }
  }

  fn collection(self) -> Collection {
    match self {
      Self::Students | Self::Teachers => Collection::Users,
      Self::Subjects => Collection::Subjects,
    }
  }
}

/// One row of a roster list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RosterItem {
  User(UserRecord),
  Subject(Subject),
}

impl RosterItem {
  pub fn id(&self) -> Option<Uuid> {
    match self {
      Self::User(u) => u.id,
      Self::Subject(s) => Some(s.id),
    }
  }

  pub fn name(&self) -> &str {
    match self {
      Self::User(u) => &u.name,
      Self::Subject(s) => &s.name,
    }
  }
}

/// Form fields for [`Roster::create`]. Which are required depends on the
/// [`RosterKind`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RosterFields {
  pub name:       Option<String>,
  pub username:   Option<String>,
  pub id_number:  Option<String>,
  pub class_name: Option<String>,
}

fn required(value: Option<String>, field: &'static str) -> Result<String, WriteError> {
  value
    .map(|v| v.trim().to_owned())
    .filter(|v| !v.is_empty())
    .ok_or(WriteError::MissingField(field))
}

/// A delete that has been requested but not yet confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a pending delete does nothing until confirmed"]
pub struct PendingDelete {
  pub kind: RosterKind,
  pub id:   Uuid,
}

impl PendingDelete {
  pub fn confirm(self) -> ConfirmedDelete { ConfirmedDelete { kind: self.kind, id: self.id } }
}

/// A delete the caller has explicitly confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmedDelete {
  kind: RosterKind,
  id:   Uuid,
}

/// Typed CRUD over the roster collections.
pub struct Roster<S> {
  store: Arc<S>,
}

impl<S> Clone for Roster<S> {
  fn clone(&self) -> Self { Self { store: self.store.clone() } }
}

impl<S: AttendanceStore + 'static> Roster<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// A live list of `kind`, re-delivered on every change to its collection.
  pub fn list(&self, kind: RosterKind) -> Live<RosterItem> {
    Live::spawn(self.store.clone(), kind.collection(), move |store| async move {
      fetch(&*store, kind).await
    })
  }

  /// A one-off read of `kind`.
  pub async fn snapshot(&self, kind: RosterKind) -> Result<Snapshot<RosterItem>> {
    fetch(&*self.store, kind)
      .await
      .map(Arc::new)
      .map_err(Error::read)
  }

  /// Validate and persist a new record; returns its id.
  pub async fn create(&self, kind: RosterKind, fields: RosterFields) -> Result<Uuid> {
    let name = required(fields.name, "name")?;

    let id = match kind.role() {
      None => {
        let subject = self
          .store
          .add_subject(name)
          .await
          .map_err(Error::store_write)?;
        subject.id
      }
      Some(role) => {
        let username  = normalize_username(&required(fields.username, "username")?);
        let id_number = required(fields.id_number, "id_number")?;
        let class_name = match role {
          Role::Student => Some(required(fields.class_name, "class_name")?),
          _ => None,
        };
        let user = self
          .store
          .add_user(NewUser { username, name, role, id_number: Some(id_number), class_name })
          .await
          .map_err(Error::store_write)?;
        user.id.ok_or_else(|| {
          WriteError::Store("store returned a user without an id".into())
        })?
      }
    };

    tracing::info!(%kind, %id, "roster record created");
    Ok(id)
  }

  /// Begin deleting `id` from `kind`. Nothing happens until the returned
  /// request is confirmed and passed to [`Roster::delete`].
  pub fn request_delete(&self, kind: RosterKind, id: Uuid) -> PendingDelete {
    PendingDelete { kind, id }
  }

  /// Remove a record. Returns `false` if it did not exist.
  pub async fn delete(&self, confirmed: ConfirmedDelete) -> Result<bool> {
    let ConfirmedDelete { kind, id } = confirmed;
    let removed = match kind.role() {
      Some(role) => self.store.delete_user(id, role).await,
      None => self.store.delete_subject(id).await,
    }
    .map_err(Error::store_write)?;

    tracing::info!(%kind, %id, removed, "roster delete");
    Ok(removed)
  }
}

async fn fetch<S: AttendanceStore>(
  store: &S,
  kind: RosterKind,
) -> Result<Vec<RosterItem>, S::Error> {
  Ok(match kind.role() {
    Some(role) => store
      .list_users(Some(role))
      .await?
      .into_iter()
      .map(RosterItem::User)
      .collect(),
    None => store
      .list_subjects()
      .await?
      .into_iter()
      .map(RosterItem::Subject)
      .collect(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn kinds_map_to_roles() {
    assert_eq!(RosterKind::Students.role(), Some(Role::Student));
    assert_eq!(RosterKind::Teachers.role(), Some(Role::Teacher));
    assert_eq!(RosterKind::Subjects.role(), None);
    assert_eq!("teachers".parse::<RosterKind>().unwrap(), RosterKind::Teachers);
  }

  #[test]
  fn blank_fields_count_as_missing() {
    assert!(matches!(
      required(Some("   ".into()), "name"),
      Err(WriteError::MissingField("name"))
    ));
    assert_eq!(required(Some(" 7A ".into()), "class_name").unwrap(), "7A");
  }

  #[test]
  fn confirm_carries_the_target() {
    let id = Uuid::new_v4();
    let pending = PendingDelete { kind: RosterKind::Subjects, id };
    let confirmed = pending.confirm();
    assert_eq!(confirmed.id, id);
    assert_eq!(confirmed.kind, RosterKind::Subjects);
  }
}
