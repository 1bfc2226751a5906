//! Policy enforcement orchestration for the login and password-change flows.
//!
//! This service decides; the caller acts. Password hashing and credential
//! storage stay with the caller, which must follow the contract:
//!
//! - Login: [`PolicyEnforcementService::pre_login_check`] → credential
//!   verification → [`PolicyEnforcementService::on_login_failure`] on a bad
//!   credential, or [`PolicyEnforcementService::check_expiry_and_warning`] +
//!   [`PolicyEnforcementService::on_login_success`] on a good one.
//! - Password change: [`PolicyEnforcementService::evaluate_password_change`]
//!   before persisting the new hash,
//!   [`PolicyEnforcementService::on_password_changed`] after.

use std::sync::Arc;

use chrono::Utc;

use crate::{
    Error, UserId,
    policy::CachedPolicyProvider,
    repositories::{LockoutRepository, PasswordHistoryRecord, PasswordHistoryRepository},
    rules,
    services::lockout::LockoutService,
};

/// Whether a password set is a forced reset or a voluntary change.
///
/// Reset flows bypass the minimum-age check — a forced reset must always be
/// permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Reset,
    Change,
}

/// Gate decision for a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginGate {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl LoginGate {
    fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }
}

/// Verdict on a proposed new password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordChangeVerdict {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl PasswordChangeVerdict {
    fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn denied(reason: Option<String>) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }
}

/// Combined expiry and warning state for a user's current password.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordExpiryStatus {
    pub expired: bool,
    pub warning: bool,
    pub days_until_expiry: Option<i64>,
}

/// Orchestrates the cached policy, the rule functions, the lockout service,
/// and the password history to answer "may this proceed".
///
/// Absent policy (fetch failed or none configured) degrades every decision
/// to a pass — a config-service outage never blocks a user.
pub struct PolicyEnforcementService<L, H>
where
    L: LockoutRepository,
    H: PasswordHistoryRepository,
{
    policy_cache: Arc<CachedPolicyProvider>,
    lockouts: LockoutService<L>,
    history: Arc<H>,
}

impl<L, H> PolicyEnforcementService<L, H>
where
    L: LockoutRepository,
    H: PasswordHistoryRepository,
{
    pub fn new(
        policy_cache: Arc<CachedPolicyProvider>,
        lockout_repository: Arc<L>,
        history_repository: Arc<H>,
    ) -> Self {
        Self {
            policy_cache,
            lockouts: LockoutService::new(lockout_repository),
            history: history_repository,
        }
    }

    /// Gate a login attempt on the user's lockout state.
    pub async fn pre_login_check(&self, user_id: &UserId) -> Result<LoginGate, Error> {
        let policy = self.policy_cache.get().await;
        let status = self.lockouts.check_lockout(user_id, policy.as_ref()).await?;

        if status.locked {
            return Ok(LoginGate {
                allowed: false,
                reason: status.message,
            });
        }

        Ok(LoginGate::allowed())
    }

    /// Record an invalid-credential outcome. Call for every failed login
    /// once `pre_login_check` has passed.
    pub async fn on_login_failure(&self, user_id: &UserId) -> Result<(), Error> {
        let policy = self.policy_cache.get().await;
        self.lockouts.record_failure(user_id, policy.as_ref()).await
    }

    /// Clear lockout state. Call exactly once per successful login, after
    /// all other checks pass.
    pub async fn on_login_success(&self, user_id: &UserId) -> Result<(), Error> {
        self.lockouts.record_success(user_id).await
    }

    /// Decide whether a proposed new password is acceptable.
    ///
    /// Check order is fixed — minimum age (voluntary changes only), then
    /// strength, then reuse — and the first failure wins, so users see
    /// deterministic messages.
    pub async fn evaluate_password_change(
        &self,
        user_id: &UserId,
        new_password: &str,
        kind: ChangeKind,
    ) -> Result<PasswordChangeVerdict, Error> {
        let Some(policy) = self.policy_cache.get().await else {
            return Ok(PasswordChangeVerdict::allowed());
        };

        if kind == ChangeKind::Change {
            let last_changed_at = self
                .history
                .find_latest(user_id)
                .await?
                .map(|record| record.changed_at);
            let age = rules::check_minimum_age(last_changed_at, &policy);
            if !age.valid {
                return Ok(PasswordChangeVerdict::denied(age.message));
            }
        }

        let strength = rules::validate_strength(new_password, &policy);
        if !strength.valid {
            return Ok(PasswordChangeVerdict::denied(strength.message));
        }

        if policy.enable_password_policy && policy.enforced_password_history > 0 {
            let recent = self
                .history
                .find_recent(user_id, policy.enforced_password_history)
                .await?;
            let hashes: Vec<String> = recent
                .into_iter()
                .map(|record| record.hashed_password)
                .collect();
            let reuse = rules::check_reuse(new_password, &hashes, &policy);
            if !reuse.valid {
                return Ok(PasswordChangeVerdict::denied(reuse.message));
            }
        }

        Ok(PasswordChangeVerdict::allowed())
    }

    /// Append the new hash to the user's password history. Call after the
    /// caller has persisted the password itself. History is never pruned
    /// here.
    pub async fn on_password_changed(&self, user_id: &UserId, new_hash: &str) -> Result<(), Error> {
        let record = PasswordHistoryRecord {
            user_id: user_id.clone(),
            hashed_password: new_hash.to_string(),
            changed_at: Utc::now(),
        };
        self.history.append(&record).await
    }

    /// Expiry and warning state of the user's current password, from the
    /// most recent history entry. Used inline at login to force a reset,
    /// and by the scheduled sweeps.
    pub async fn check_expiry_and_warning(
        &self,
        user_id: &UserId,
    ) -> Result<PasswordExpiryStatus, Error> {
        let Some(policy) = self.policy_cache.get().await else {
            return Ok(PasswordExpiryStatus {
                expired: false,
                warning: false,
                days_until_expiry: None,
            });
        };

        let last_changed_at = self
            .history
            .find_latest(user_id)
            .await?
            .map(|record| record.changed_at);

        let expiry = rules::check_maximum_age(last_changed_at, &policy);
        let warning = rules::check_expiry_warning(&expiry, &policy);

        Ok(PasswordExpiryStatus {
            expired: expiry.expired,
            warning: warning.warning,
            days_until_expiry: expiry.days_until_expiry,
        })
    }
}
