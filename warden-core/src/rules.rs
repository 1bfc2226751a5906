//! Pure password rule evaluation.
//!
//! Every function here is a pure computation over a [`PasswordPolicy`] and
//! the inputs it is handed — no storage access, no side effects. History
//! sequences arrive pre-sorted most-recent-first and pre-limited by the
//! caller. A disabled policy short-circuits every check to a pass.
//!
//! All elapsed-day computations use the wall clock at the evaluation instant,
//! in UTC. Elapsed days are whole days: floor of elapsed milliseconds over
//! one day.

use chrono::{DateTime, Utc};

use crate::policy::PasswordPolicy;

/// Outcome of a single pass/fail rule, carrying the first failing reason.
///
/// Callers surface `message` verbatim, so checks report one reason at a
/// time rather than collecting all failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleCheck {
    pub valid: bool,
    pub message: Option<String>,
}

impl RuleCheck {
    fn pass() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }
}

/// Outcome of the minimum-age check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinimumAgeCheck {
    pub valid: bool,
    pub message: Option<String>,
    /// Days until the password may be changed, when the check fails.
    pub remaining_days: Option<i64>,
}

impl MinimumAgeCheck {
    fn pass() -> Self {
        Self {
            valid: true,
            message: None,
            remaining_days: None,
        }
    }
}

/// Outcome of the maximum-age check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordExpiry {
    pub expired: bool,
    /// Days left before expiry, clamped to >= 0. `None` when no maximum age
    /// applies.
    pub days_until_expiry: Option<i64>,
}

impl PasswordExpiry {
    fn not_expired() -> Self {
        Self {
            expired: false,
            days_until_expiry: None,
        }
    }
}

/// Outcome of the expiry-warning check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryWarning {
    pub warning: bool,
    pub days_until_expiry: Option<i64>,
}

/// Check a candidate password against the policy's strength requirements.
///
/// Checks run in a fixed order — length, uppercase, lowercase, digit,
/// special character — and the first failure wins.
pub fn validate_strength(password: &str, policy: &PasswordPolicy) -> RuleCheck {
    if !policy.enable_password_policy {
        return RuleCheck::pass();
    }

    let length = password.chars().count();
    if length < policy.min_password_length as usize {
        return RuleCheck::fail(format!(
            "Password must be at least {} characters long",
            policy.min_password_length
        ));
    }

    if policy.require_upper_case && !password.chars().any(|c| c.is_ascii_uppercase()) {
        return RuleCheck::fail("Password must contain at least one uppercase letter");
    }

    if policy.require_lower_case && !password.chars().any(|c| c.is_ascii_lowercase()) {
        return RuleCheck::fail("Password must contain at least one lowercase letter");
    }

    if policy.require_numeric && !password.chars().any(|c| c.is_ascii_digit()) {
        return RuleCheck::fail("Password must contain at least one number");
    }

    if policy.require_non_alpha_numeric && !password.chars().any(|c| !c.is_ascii_alphanumeric()) {
        return RuleCheck::fail("Password must contain at least one special character");
    }

    RuleCheck::pass()
}

/// Check a candidate password against the user's recent password hashes.
///
/// `recent_hashes` must be ordered most-recent-first and already limited to
/// the policy's history window. Matching is password verification against
/// each stored hash, never raw string equality.
pub fn check_reuse(new_password: &str, recent_hashes: &[String], policy: &PasswordPolicy) -> RuleCheck {
    if !policy.enable_password_policy || policy.enforced_password_history == 0 {
        return RuleCheck::pass();
    }

    for hash in recent_hashes {
        if password_auth::verify_password(new_password, hash).is_ok() {
            return RuleCheck::fail(format!(
                "You cannot reuse your last {} password(s)",
                policy.enforced_password_history
            ));
        }
    }

    RuleCheck::pass()
}

/// Check whether the current password is old enough to be changed.
///
/// Passes when no minimum age applies or the user has never set a password.
pub fn check_minimum_age(
    last_changed_at: Option<DateTime<Utc>>,
    policy: &PasswordPolicy,
) -> MinimumAgeCheck {
    if !policy.enable_password_policy || policy.min_password_age == 0 {
        return MinimumAgeCheck::pass();
    }

    let Some(changed_at) = last_changed_at else {
        return MinimumAgeCheck::pass();
    };

    let elapsed_days = (Utc::now() - changed_at).num_days();
    if elapsed_days < i64::from(policy.min_password_age) {
        let remaining_days = i64::from(policy.min_password_age) - elapsed_days;
        return MinimumAgeCheck {
            valid: false,
            message: Some(format!(
                "You cannot change your password for {remaining_days} more day(s)"
            )),
            remaining_days: Some(remaining_days),
        };
    }

    MinimumAgeCheck::pass()
}

/// Check whether the current password has outlived the maximum age.
///
/// Not expired when no maximum age applies or the user has never set a
/// password. `days_until_expiry` is clamped to zero for reporting.
pub fn check_maximum_age(
    last_changed_at: Option<DateTime<Utc>>,
    policy: &PasswordPolicy,
) -> PasswordExpiry {
    if !policy.enable_password_policy || policy.max_password_age == 0 {
        return PasswordExpiry::not_expired();
    }

    let Some(changed_at) = last_changed_at else {
        return PasswordExpiry::not_expired();
    };

    let elapsed_days = (Utc::now() - changed_at).num_days();
    let days_until_expiry = i64::from(policy.max_password_age) - elapsed_days;

    PasswordExpiry {
        expired: elapsed_days >= i64::from(policy.max_password_age),
        days_until_expiry: Some(days_until_expiry.max(0)),
    }
}

/// Decide whether an expiry warning is due, given a maximum-age outcome.
///
/// An already-expired password always warns, with zero days left.
pub fn check_expiry_warning(expiry: &PasswordExpiry, policy: &PasswordPolicy) -> ExpiryWarning {
    if policy.password_change_warning == 0 {
        return ExpiryWarning {
            warning: false,
            days_until_expiry: None,
        };
    }

    if expiry.expired {
        return ExpiryWarning {
            warning: true,
            days_until_expiry: Some(0),
        };
    }

    let warning = expiry
        .days_until_expiry
        .is_some_and(|days| days <= i64::from(policy.password_change_warning));

    ExpiryWarning {
        warning,
        days_until_expiry: expiry.days_until_expiry,
    }
}
