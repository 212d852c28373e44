//! Subject: a lesson a teacher can take attendance for.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A subject record. The name is fixed at creation; renaming is
/// delete-and-recreate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
  pub id:         Uuid,
  pub name:       String,
  pub created_at: DateTime<Utc>,
}
