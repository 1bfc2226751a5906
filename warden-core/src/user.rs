//! Account read model shared by the enforcement and sweep paths.
//!
//! Users are synced into the account database from the tenant server; this
//! core only reads them. The fields that matter here are the activity flag and
//! `password_reset_done`, which together define the population the expiry
//! sweeps scan, plus the email/name used for notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::generate_prefixed_id;

/// A unique, stable identifier for a specific user.
///
/// Treated as opaque; tenant-synced accounts carry the ID minted by the tenant
/// server, which may not look like a locally generated one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: &str) -> Self {
        UserId(id.to_string())
    }

    pub fn new_random() -> Self {
        UserId(generate_prefixed_id("usr"))
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Representation of an account in warden.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    // The unique identifier for the user.
    pub id: UserId,

    // The display name of the user, when the tenant provided one.
    pub name: Option<String>,

    // The email notifications are sent to.
    pub email: String,

    // Deactivated accounts are excluded from sweeps and cannot log in.
    pub is_active: bool,

    // Whether the user has completed their initial forced password reset.
    pub password_reset_done: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether this account belongs to the expiry-sweep population.
    pub fn is_sweepable(&self) -> bool {
        self.is_active && self.password_reset_done
    }
}
