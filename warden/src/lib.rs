//! # Warden
//!
//! Warden is the password-policy enforcement and account-lockout core of a
//! multi-tenant account backend. Each tenant configures its password rules on
//! the tenant server; warden fetches and caches that policy, validates new
//! passwords against it (strength, reuse, minimum age), computes password
//! expiry, and tracks failed logins with progressively longer lockouts.
//!
//! Warden decides; your application acts. Credential verification, password
//! hashing, and HTTP surface stay with the caller, which follows this
//! contract:
//!
//! - Login: [`Warden::pre_login_check`] → verify credentials →
//!   [`Warden::on_login_failure`] on a bad credential, or
//!   [`Warden::check_expiry_and_warning`] + [`Warden::on_login_success`] on a
//!   good one (an expired password should force a reset).
//! - Password change: [`Warden::evaluate_password_change`] before persisting
//!   the new hash, [`Warden::on_password_changed`] after.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use warden::WardenBuilder;
//! use warden_policy_remote::RemotePolicySource;
//!
//! # struct LogNotifier;
//! # #[async_trait::async_trait]
//! # impl warden_core::ExpiryNotifier for LogNotifier {
//! #     async fn send_expiry_warning(&self, _: &str, _: Option<&str>, _: i64) -> Result<(), warden_core::Error> { Ok(()) }
//! #     async fn send_password_expired(&self, _: &str, _: Option<&str>) -> Result<(), warden_core::Error> { Ok(()) }
//! # }
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let warden = WardenBuilder::new()
//!         .with_sqlite("sqlite::memory:")
//!         .await?
//!         .with_policy_provider(Arc::new(RemotePolicySource::new(
//!             "https://tenant.example.com/api",
//!             "company-secret",
//!         )))
//!         .with_notifier(Arc::new(LogNotifier))
//!         .build()
//!         .await?;
//!
//!     let gate = warden.pre_login_check(&"usr_123".into()).await?;
//!     if !gate.allowed {
//!         // surface gate.reason to the client
//!     }
//!     Ok(())
//! }
//! ```

mod builder;

pub use builder::{NoStorage, WardenBuilder, WardenBuilderError, WithStorage};

use std::sync::Arc;

use warden_core::{
    CachedPolicyProvider, ExpirySweepService, PolicyEnforcementService, RepositoryProvider,
    repositories::{
        LockoutRepositoryAdapter, PasswordHistoryRepositoryAdapter, UserRepositoryAdapter,
    },
};

/// Re-export core types from warden_core
///
/// These types are commonly used when working with the Warden API.
pub use warden_core::{
    ChangeKind, Error, ExpiryNotifier, LoginGate, NewUser, PasswordChangeVerdict,
    PasswordExpiryStatus, PasswordPolicy, PolicyProvider, SweepReport, User, UserId,
};

/// Re-export storage backends
///
/// These implementations are available when the corresponding feature is
/// enabled.
#[cfg(feature = "sqlite")]
pub use warden_storage_sqlite::SqliteRepositoryProvider;

#[cfg(feature = "remote-policy")]
pub use warden_policy_remote::RemotePolicySource;

type Enforcement<R> =
    PolicyEnforcementService<LockoutRepositoryAdapter<R>, PasswordHistoryRepositoryAdapter<R>>;
type Sweep<R> = ExpirySweepService<
    LockoutRepositoryAdapter<R>,
    PasswordHistoryRepositoryAdapter<R>,
    UserRepositoryAdapter<R>,
>;

/// The assembled enforcement core: repositories, cached policy, and the
/// services wired over them.
pub struct Warden<R: RepositoryProvider> {
    repositories: Arc<R>,
    policy: Arc<CachedPolicyProvider>,
    enforcement: Arc<Enforcement<R>>,
    sweep: Arc<Sweep<R>>,
}

impl<R: RepositoryProvider> Warden<R> {
    /// Wire the services over the given repositories, policy source, and
    /// notifier. Prefer [`WardenBuilder`] unless you already hold the parts.
    pub fn new(
        repositories: Arc<R>,
        policy: Arc<CachedPolicyProvider>,
        notifier: Arc<dyn ExpiryNotifier>,
    ) -> Self {
        let enforcement = Arc::new(PolicyEnforcementService::new(
            policy.clone(),
            Arc::new(LockoutRepositoryAdapter::new(repositories.clone())),
            Arc::new(PasswordHistoryRepositoryAdapter::new(repositories.clone())),
        ));
        let sweep = Arc::new(ExpirySweepService::new(
            enforcement.clone(),
            Arc::new(UserRepositoryAdapter::new(repositories.clone())),
            notifier,
        ));

        Self {
            repositories,
            policy,
            enforcement,
            sweep,
        }
    }

    /// Access the underlying repositories (user sync, test setup).
    pub fn repositories(&self) -> Arc<R> {
        self.repositories.clone()
    }

    /// Create or update the storage schema.
    pub async fn migrate(&self) -> Result<(), Error> {
        self.repositories.migrate().await
    }

    /// Verify storage is reachable.
    pub async fn health_check(&self) -> Result<(), Error> {
        self.repositories.health_check().await
    }

    /// Drop the cached policy so the next check re-fetches it.
    pub async fn invalidate_policy_cache(&self) {
        self.policy.invalidate().await;
    }

    /// Gate a login attempt on the user's lockout state.
    pub async fn pre_login_check(&self, user_id: &UserId) -> Result<LoginGate, Error> {
        self.enforcement.pre_login_check(user_id).await
    }

    /// Record an invalid-credential outcome.
    pub async fn on_login_failure(&self, user_id: &UserId) -> Result<(), Error> {
        self.enforcement.on_login_failure(user_id).await
    }

    /// Clear lockout state after a successful login.
    pub async fn on_login_success(&self, user_id: &UserId) -> Result<(), Error> {
        self.enforcement.on_login_success(user_id).await
    }

    /// Decide whether a proposed new password is acceptable.
    pub async fn evaluate_password_change(
        &self,
        user_id: &UserId,
        new_password: &str,
        kind: ChangeKind,
    ) -> Result<PasswordChangeVerdict, Error> {
        self.enforcement
            .evaluate_password_change(user_id, new_password, kind)
            .await
    }

    /// Append the persisted hash to the user's password history.
    pub async fn on_password_changed(&self, user_id: &UserId, new_hash: &str) -> Result<(), Error> {
        self.enforcement.on_password_changed(user_id, new_hash).await
    }

    /// Expiry and warning state of the user's current password.
    pub async fn check_expiry_and_warning(
        &self,
        user_id: &UserId,
    ) -> Result<PasswordExpiryStatus, Error> {
        self.enforcement.check_expiry_and_warning(user_id).await
    }

    /// Send expiry warnings to every user inside the warning window.
    pub async fn run_warning_sweep(&self) -> Result<SweepReport, Error> {
        self.sweep.run_warning_sweep().await
    }

    /// Notify every user whose password has expired.
    pub async fn run_expired_sweep(&self) -> Result<SweepReport, Error> {
        self.sweep.run_expired_sweep().await
    }

    /// Run both sweeps on their own schedules until `shutdown` fires.
    ///
    /// Returns the task handles; cadence is a deployment decision.
    pub fn start_sweep_tasks(
        &self,
        warning_interval: std::time::Duration,
        expired_interval: std::time::Duration,
        shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> Vec<tokio::task::JoinHandle<()>> {
        vec![
            self.sweep.spawn_warning_task(warning_interval, shutdown.clone()),
            self.sweep.spawn_expired_task(expired_interval, shutdown),
        ]
    }
}
