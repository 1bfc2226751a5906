//! Account lockout service with progressive lock durations.
//!
//! Tracks failed login attempts per user and locks the account once the
//! policy threshold is reached. The lock duration grows linearly with the
//! user's cumulative lock count, so repeat offenders wait longer each time;
//! only an explicit successful login resets that count.
//!
//! Lock expiry is lazy: there is no timer. An expired lock is reconciled on
//! the next [`LockoutService::check_lockout`] call, which clears the
//! attempt counter and the lock window while keeping the cumulative count.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::{
    Error, UserId,
    policy::PasswordPolicy,
    repositories::{LockoutRecord, LockoutRepository},
};

/// The lockout state reported to the login path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockoutStatus {
    pub locked: bool,
    pub locked_until: Option<DateTime<Utc>>,
    /// Human-readable remaining-time message, present while locked.
    pub message: Option<String>,
}

impl LockoutStatus {
    fn clear() -> Self {
        Self {
            locked: false,
            locked_until: None,
            message: None,
        }
    }
}

/// Service owning all [`LockoutRecord`] mutation.
///
/// Thread-safe; the repository handles concurrent access. A policy of `None`
/// (unknown) or one with the lockout family disabled turns every operation
/// into a pass/no-op.
pub struct LockoutService<R: LockoutRepository> {
    repository: Arc<R>,
}

impl<R: LockoutRepository> LockoutService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Report whether the user is currently locked out.
    ///
    /// An expired lock is cleared here, on read: `failed_attempts` goes back
    /// to zero and the lock window is removed, while `lockout_count` is kept
    /// for progressive duration. A still-active lock leaves
    /// `failed_attempts` untouched.
    pub async fn check_lockout(
        &self,
        user_id: &UserId,
        policy: Option<&PasswordPolicy>,
    ) -> Result<LockoutStatus, Error> {
        let Some(policy) = policy else {
            return Ok(LockoutStatus::clear());
        };
        if !policy.enable_lockout_policy {
            return Ok(LockoutStatus::clear());
        }

        let Some(mut record) = self.repository.find_by_user(user_id).await? else {
            return Ok(LockoutStatus::clear());
        };

        let now = Utc::now();
        match record.locked_until {
            Some(locked_until) if now < locked_until => {
                let minutes_remaining = remaining_minutes(locked_until, now);
                Ok(LockoutStatus {
                    locked: true,
                    locked_until: Some(locked_until),
                    message: Some(format!(
                        "Account is locked. Please try again after {minutes_remaining} minute(s)"
                    )),
                })
            }
            Some(_) => {
                record.failed_attempts = 0;
                record.locked_until = None;
                self.repository.save(&record).await?;
                tracing::debug!(user_id = %record.user_id, "expired lockout cleared");
                Ok(LockoutStatus::clear())
            }
            None => Ok(LockoutStatus::clear()),
        }
    }

    /// Record a failed login attempt, locking the account when the policy
    /// threshold is reached.
    ///
    /// A long gap between failures (at least `reset_lockout_threshold`
    /// minutes) forgives the prior attempts before this one is counted.
    pub async fn record_failure(
        &self,
        user_id: &UserId,
        policy: Option<&PasswordPolicy>,
    ) -> Result<(), Error> {
        let Some(policy) = policy else {
            return Ok(());
        };
        if !policy.enable_lockout_policy {
            return Ok(());
        }

        let mut record = self
            .repository
            .find_by_user(user_id)
            .await?
            .unwrap_or_else(|| LockoutRecord::new(user_id.clone()));

        let now = Utc::now();

        if let Some(last_attempt) = record.last_failed_attempt_at {
            if policy.reset_lockout_threshold > 0 {
                let minutes_since = (now - last_attempt).num_minutes();
                if minutes_since >= i64::from(policy.reset_lockout_threshold) {
                    record.failed_attempts = 0;
                }
            }
        }

        record.failed_attempts += 1;
        record.last_failed_attempt_at = Some(now);

        if record.failed_attempts >= policy.max_lockout_threshold {
            record.lockout_count += 1;
            let lock_minutes = i64::from(policy.lockout_duration) * i64::from(record.lockout_count);
            record.locked_until = Some(now + Duration::minutes(lock_minutes));
            record.failed_attempts = 0;
            tracing::info!(
                user_id = %record.user_id,
                lockout_count = record.lockout_count,
                lock_minutes,
                "account locked after repeated failed logins"
            );
        }

        self.repository.save(&record).await
    }

    /// Reset all lockout state after a successful login.
    ///
    /// This is the only path that resets `lockout_count`.
    pub async fn record_success(&self, user_id: &UserId) -> Result<(), Error> {
        self.repository.clear(user_id).await
    }
}

/// Whole minutes remaining until `until`, rounded up.
fn remaining_minutes(until: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let remaining_ms = (until - now).num_milliseconds();
    (remaining_ms + 59_999) / 60_000
}
