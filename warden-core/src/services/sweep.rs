//! Scheduled sweeps over the user population for expiry notifications.
//!
//! Two independent jobs: one warns users whose password is inside the
//! warning window, one notifies users whose password has already expired.
//! Neither forces a reset — that happens lazily the next time the user logs
//! in. Both re-send on every run in which the condition still holds; no
//! "already notified" state is kept.
//!
//! A failure on one user (expiry check or notification transport) is logged
//! and counted, and the batch moves on.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::{
    Error,
    repositories::{LockoutRepository, PasswordHistoryRepository, UserRepository},
    services::enforcement::PolicyEnforcementService,
    services::notifier::ExpiryNotifier,
};

/// Counters from a single sweep run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub notified: usize,
    pub failed: usize,
}

/// Runs the warning and expired sweeps against the sweepable population.
pub struct ExpirySweepService<L, H, U>
where
    L: LockoutRepository,
    H: PasswordHistoryRepository,
    U: UserRepository,
{
    enforcement: Arc<PolicyEnforcementService<L, H>>,
    users: Arc<U>,
    notifier: Arc<dyn ExpiryNotifier>,
}

impl<L, H, U> ExpirySweepService<L, H, U>
where
    L: LockoutRepository,
    H: PasswordHistoryRepository,
    U: UserRepository,
{
    pub fn new(
        enforcement: Arc<PolicyEnforcementService<L, H>>,
        users: Arc<U>,
        notifier: Arc<dyn ExpiryNotifier>,
    ) -> Self {
        Self {
            enforcement,
            users,
            notifier,
        }
    }

    /// Send an expiry warning to every user inside the warning window.
    pub async fn run_warning_sweep(&self) -> Result<SweepReport, Error> {
        tracing::info!("starting password expiry warning sweep");

        let users = self.users.find_sweepable().await?;
        let mut report = SweepReport {
            scanned: users.len(),
            ..SweepReport::default()
        };

        for user in users {
            let status = match self.enforcement.check_expiry_and_warning(&user.id).await {
                Ok(status) => status,
                Err(e) => {
                    tracing::error!(user_id = %user.id, error = %e, "expiry check failed");
                    report.failed += 1;
                    continue;
                }
            };

            if !status.warning {
                continue;
            }

            let days_until_expiry = status.days_until_expiry.unwrap_or(0);
            match self
                .notifier
                .send_expiry_warning(&user.email, user.name.as_deref(), days_until_expiry)
                .await
            {
                Ok(()) => {
                    report.notified += 1;
                    tracing::info!(
                        email = %user.email,
                        days_until_expiry,
                        "password expiry warning sent"
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(email = %user.email, error = %e, "failed to send expiry warning");
                }
            }
        }

        tracing::info!(
            scanned = report.scanned,
            notified = report.notified,
            failed = report.failed,
            "password expiry warning sweep completed"
        );
        Ok(report)
    }

    /// Notify every user whose password has already expired.
    pub async fn run_expired_sweep(&self) -> Result<SweepReport, Error> {
        tracing::info!("starting expired password sweep");

        let users = self.users.find_sweepable().await?;
        let mut report = SweepReport {
            scanned: users.len(),
            ..SweepReport::default()
        };

        for user in users {
            let status = match self.enforcement.check_expiry_and_warning(&user.id).await {
                Ok(status) => status,
                Err(e) => {
                    tracing::error!(user_id = %user.id, error = %e, "expiry check failed");
                    report.failed += 1;
                    continue;
                }
            };

            if !status.expired {
                continue;
            }

            match self
                .notifier
                .send_password_expired(&user.email, user.name.as_deref())
                .await
            {
                Ok(()) => {
                    report.notified += 1;
                    tracing::info!(email = %user.email, "password expired notification sent");
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(email = %user.email, error = %e, "failed to send expired notification");
                }
            }
        }

        tracing::info!(
            scanned = report.scanned,
            notified = report.notified,
            failed = report.failed,
            "expired password sweep completed"
        );
        Ok(report)
    }

    /// Run the warning sweep on an interval until `shutdown` fires.
    ///
    /// Cadence is a deployment decision (daily by convention), not a
    /// correctness requirement.
    pub fn spawn_warning_task(
        self: &Arc<Self>,
        interval: std::time::Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let sweep = Arc::clone(self);

        tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);

            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        if let Err(e) = sweep.run_warning_sweep().await {
                            tracing::error!(error = %e, "expiry warning sweep failed");
                        }
                    }
                    _ = shutdown.changed() => {
                        tracing::info!("shutting down expiry warning task");
                        break;
                    }
                }
            }
        })
    }

    /// Run the expired sweep on an interval until `shutdown` fires.
    pub fn spawn_expired_task(
        self: &Arc<Self>,
        interval: std::time::Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let sweep = Arc::clone(self);

        tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);

            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        if let Err(e) = sweep.run_expired_sweep().await {
                            tracing::error!(error = %e, "expired password sweep failed");
                        }
                    }
                    _ = shutdown.changed() => {
                        tracing::info!("shutting down expired password task");
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotificationError;
    use crate::policy::{CachedPolicyProvider, PasswordPolicy, PolicyProvider};
    use crate::repositories::{
        LockoutRecord, NewUser, PasswordHistoryRecord, PasswordHistoryRepository,
    };
    use crate::{User, UserId};
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FixedPolicyProvider {
        policy: PasswordPolicy,
    }

    #[async_trait]
    impl PolicyProvider for FixedPolicyProvider {
        async fn fetch_policy(&self) -> Result<Option<PasswordPolicy>, Error> {
            Ok(Some(self.policy.clone()))
        }
    }

    #[derive(Default)]
    struct MockLockoutRepository {
        records: Mutex<HashMap<UserId, LockoutRecord>>,
    }

    #[async_trait]
    impl LockoutRepository for MockLockoutRepository {
        async fn find_by_user(&self, user_id: &UserId) -> Result<Option<LockoutRecord>, Error> {
            Ok(self.records.lock().unwrap().get(user_id).cloned())
        }

        async fn save(&self, record: &LockoutRecord) -> Result<(), Error> {
            self.records
                .lock()
                .unwrap()
                .insert(record.user_id.clone(), record.clone());
            Ok(())
        }

        async fn clear(&self, _user_id: &UserId) -> Result<(), Error> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockHistoryRepository {
        records: Mutex<Vec<PasswordHistoryRecord>>,
    }

    impl MockHistoryRepository {
        fn seed_hash(&self, user_id: &UserId, changed_at: DateTime<Utc>) {
            self.records.lock().unwrap().push(PasswordHistoryRecord {
                user_id: user_id.clone(),
                hashed_password: "hash".to_string(),
                changed_at,
            });
        }
    }

    #[async_trait]
    impl PasswordHistoryRepository for MockHistoryRepository {
        async fn append(&self, record: &PasswordHistoryRecord) -> Result<(), Error> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn find_recent(
            &self,
            user_id: &UserId,
            limit: u32,
        ) -> Result<Vec<PasswordHistoryRecord>, Error> {
            let mut matching: Vec<_> = self
                .records
                .lock()
                .unwrap()
                .iter()
                .filter(|r| &r.user_id == user_id)
                .cloned()
                .collect();
            matching.sort_by(|a, b| b.changed_at.cmp(&a.changed_at));
            matching.truncate(limit as usize);
            Ok(matching)
        }

        async fn find_latest(
            &self,
            user_id: &UserId,
        ) -> Result<Option<PasswordHistoryRecord>, Error> {
            Ok(self.find_recent(user_id, 1).await?.into_iter().next())
        }
    }

    #[derive(Default)]
    struct MockUserRepository {
        users: Mutex<Vec<User>>,
    }

    impl MockUserRepository {
        fn seed(&self, user: NewUser) -> User {
            let user = User {
                id: user.id,
                name: user.name,
                email: user.email,
                is_active: user.is_active,
                password_reset_done: user.password_reset_done,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            self.users.lock().unwrap().push(user.clone());
            user
        }
    }

    #[async_trait]
    impl UserRepository for MockUserRepository {
        async fn create(&self, user: NewUser) -> Result<User, Error> {
            Ok(self.seed(user))
        }

        async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| &u.id == id)
                .cloned())
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.email == email)
                .cloned())
        }

        async fn find_sweepable(&self) -> Result<Vec<User>, Error> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .filter(|u| u.is_sweepable())
                .cloned()
                .collect())
        }

        async fn set_password_reset_done(&self, id: &UserId) -> Result<(), Error> {
            if let Some(user) = self.users.lock().unwrap().iter_mut().find(|u| &u.id == id) {
                user.password_reset_done = true;
            }
            Ok(())
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Sent {
        Warning { to: String, days: i64 },
        Expired { to: String },
    }

    #[derive(Default)]
    struct MockNotifier {
        sent: Mutex<Vec<Sent>>,
        fail_for: Mutex<Option<String>>,
    }

    impl MockNotifier {
        fn sent(&self) -> Vec<Sent> {
            self.sent.lock().unwrap().clone()
        }

        fn fail_for(&self, email: &str) {
            *self.fail_for.lock().unwrap() = Some(email.to_string());
        }
    }

    #[async_trait]
    impl ExpiryNotifier for MockNotifier {
        async fn send_expiry_warning(
            &self,
            to: &str,
            _user_name: Option<&str>,
            days_until_expiry: i64,
        ) -> Result<(), Error> {
            if self.fail_for.lock().unwrap().as_deref() == Some(to) {
                return Err(NotificationError::Transport("mailbox on fire".to_string()).into());
            }
            self.sent.lock().unwrap().push(Sent::Warning {
                to: to.to_string(),
                days: days_until_expiry,
            });
            Ok(())
        }

        async fn send_password_expired(
            &self,
            to: &str,
            _user_name: Option<&str>,
        ) -> Result<(), Error> {
            if self.fail_for.lock().unwrap().as_deref() == Some(to) {
                return Err(NotificationError::Transport("mailbox on fire".to_string()).into());
            }
            self.sent
                .lock()
                .unwrap()
                .push(Sent::Expired { to: to.to_string() });
            Ok(())
        }
    }

    fn expiry_policy() -> PasswordPolicy {
        PasswordPolicy {
            enable_password_policy: true,
            max_password_age: 90,
            password_change_warning: 7,
            ..PasswordPolicy::default()
        }
    }

    type Sweep = ExpirySweepService<MockLockoutRepository, MockHistoryRepository, MockUserRepository>;

    fn build_sweep(
        policy: PasswordPolicy,
    ) -> (
        Sweep,
        Arc<MockUserRepository>,
        Arc<MockHistoryRepository>,
        Arc<MockNotifier>,
    ) {
        let cache = Arc::new(CachedPolicyProvider::new(Arc::new(FixedPolicyProvider {
            policy,
        })));
        let lockouts = Arc::new(MockLockoutRepository::default());
        let history = Arc::new(MockHistoryRepository::default());
        let users = Arc::new(MockUserRepository::default());
        let notifier = Arc::new(MockNotifier::default());
        let enforcement = Arc::new(PolicyEnforcementService::new(
            cache,
            lockouts,
            history.clone(),
        ));
        let sweep = ExpirySweepService::new(enforcement, users.clone(), notifier.clone());
        (sweep, users, history, notifier)
    }

    #[tokio::test]
    async fn test_warning_sweep_notifies_users_in_window() {
        let (sweep, users, history, notifier) = build_sweep(expiry_policy());

        let warned = users.seed(NewUser::new("warned@example.com").password_reset_done(true));
        history.seed_hash(&warned.id, Utc::now() - Duration::days(85));

        let fresh = users.seed(NewUser::new("fresh@example.com").password_reset_done(true));
        history.seed_hash(&fresh.id, Utc::now() - Duration::days(10));

        let report = sweep.run_warning_sweep().await.unwrap();

        assert_eq!(report.scanned, 2);
        assert_eq!(report.notified, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(
            notifier.sent(),
            vec![Sent::Warning {
                to: "warned@example.com".to_string(),
                days: 5
            }]
        );
    }

    #[tokio::test]
    async fn test_expired_sweep_sends_distinct_notification() {
        let (sweep, users, history, notifier) = build_sweep(expiry_policy());

        let expired = users.seed(NewUser::new("expired@example.com").password_reset_done(true));
        history.seed_hash(&expired.id, Utc::now() - Duration::days(120));

        let report = sweep.run_expired_sweep().await.unwrap();

        assert_eq!(report.notified, 1);
        assert_eq!(
            notifier.sent(),
            vec![Sent::Expired {
                to: "expired@example.com".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_sweep_skips_users_outside_population() {
        let (sweep, users, history, notifier) = build_sweep(expiry_policy());

        let inactive = users.seed(NewUser::new("inactive@example.com").password_reset_done(true));
        users.users.lock().unwrap().last_mut().unwrap().is_active = false;
        history.seed_hash(&inactive.id, Utc::now() - Duration::days(120));

        let pending = users.seed(NewUser::new("pending@example.com"));
        history.seed_hash(&pending.id, Utc::now() - Duration::days(120));

        let report = sweep.run_expired_sweep().await.unwrap();

        assert_eq!(report.scanned, 0);
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_notifier_failure_does_not_stop_the_batch() {
        let (sweep, users, history, notifier) = build_sweep(expiry_policy());

        let first = users.seed(NewUser::new("first@example.com").password_reset_done(true));
        history.seed_hash(&first.id, Utc::now() - Duration::days(120));

        let second = users.seed(NewUser::new("second@example.com").password_reset_done(true));
        history.seed_hash(&second.id, Utc::now() - Duration::days(120));

        notifier.fail_for("first@example.com");

        let report = sweep.run_expired_sweep().await.unwrap();

        assert_eq!(report.scanned, 2);
        assert_eq!(report.notified, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(
            notifier.sent(),
            vec![Sent::Expired {
                to: "second@example.com".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_sweeps_resend_on_every_run() {
        let (sweep, users, history, notifier) = build_sweep(expiry_policy());

        let warned = users.seed(NewUser::new("warned@example.com").password_reset_done(true));
        history.seed_hash(&warned.id, Utc::now() - Duration::days(85));

        sweep.run_warning_sweep().await.unwrap();
        sweep.run_warning_sweep().await.unwrap();

        // No de-duplication state: both runs notify.
        assert_eq!(notifier.sent().len(), 2);
    }
}
