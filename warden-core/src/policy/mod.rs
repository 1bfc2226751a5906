//! Tenant password policy: the remotely owned rule document and its source.
//!
//! The policy is configured on the tenant server and fetched over HTTP by a
//! [`PolicyProvider`] implementation; this module only defines the shape and
//! the caching wrapper. Every snapshot is immutable — dependents receive the
//! policy as an argument, never through ambient lookup, which keeps the rule
//! functions pure.

pub mod cache;

pub use cache::CachedPolicyProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Error;

/// The tenant's password and lockout rules, as one immutable snapshot.
///
/// The remote document is camelCase JSON. Missing fields default to the
/// disabled/zero value, so a partial document never fails to decode.
///
/// A value of `0` consistently means "this rule is off": no history window,
/// no minimum/maximum age, no warning window, no forgiveness window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PasswordPolicy {
    pub enable_password_policy: bool,
    pub min_password_length: u32,
    pub require_upper_case: bool,
    pub require_lower_case: bool,
    pub require_numeric: bool,
    pub require_non_alpha_numeric: bool,
    /// Recent password hashes checked for reuse; 0 disables the check.
    pub enforced_password_history: u32,
    /// Days a password must be kept before a voluntary change.
    pub min_password_age: u32,
    /// Days until a password expires; 0 means it never expires.
    pub max_password_age: u32,
    /// Days of advance warning before expiry; 0 disables warnings.
    pub password_change_warning: u32,

    pub enable_lockout_policy: bool,
    /// Failed attempts before a lock triggers.
    ///
    /// The tenant document spells this `maxLockoutThresholdAge`.
    #[serde(rename = "maxLockoutThresholdAge")]
    pub max_lockout_threshold: u32,
    /// Base lock duration in minutes; scales linearly with the user's
    /// cumulative lock count.
    pub lockout_duration: u32,
    /// Minutes of inactivity after which prior failed attempts are forgiven;
    /// 0 means failures accumulate forever.
    pub reset_lockout_threshold: u32,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            enable_password_policy: false,
            min_password_length: 0,
            require_upper_case: false,
            require_lower_case: false,
            require_numeric: false,
            require_non_alpha_numeric: false,
            enforced_password_history: 0,
            min_password_age: 0,
            max_password_age: 0,
            password_change_warning: 0,
            enable_lockout_policy: false,
            max_lockout_threshold: 1,
            lockout_duration: 0,
            reset_lockout_threshold: 0,
        }
    }
}

impl PasswordPolicy {
    /// A policy with both rule families switched off.
    pub fn disabled() -> Self {
        Self::default()
    }
}

/// Source of the active tenant password policy.
///
/// `Ok(None)` means the tenant has no policy configured; `Err` means the
/// fetch itself failed. Both degrade to "policy disabled" at the cache
/// boundary — a config-service outage never blocks a user's login.
#[async_trait]
pub trait PolicyProvider: Send + Sync + 'static {
    async fn fetch_policy(&self) -> Result<Option<PasswordPolicy>, Error>;
}
