//! Core functionality for the warden project
//!
//! This crate holds the password-policy enforcement and account-lockout core
//! of the warden account backend: the tenant policy types and cache, the pure
//! password rules, the lockout state machine, and the services that
//! orchestrate them on the login/change-password path and from the scheduled
//! expiry sweeps.
//!
//! Storage backends implement the traits in [`repositories`]; the remote
//! policy source implements [`PolicyProvider`]. The crate itself talks no
//! HTTP and no SQL.

pub mod error;
pub mod id;
pub mod policy;
pub mod repositories;
pub mod rules;
pub mod services;
pub mod user;

pub use error::Error;
pub use policy::{CachedPolicyProvider, PasswordPolicy, PolicyProvider};
pub use repositories::{
    LockoutRecord, LockoutRepository, NewUser, PasswordHistoryRecord, PasswordHistoryRepository,
    RepositoryProvider, UserRepository,
};
pub use services::{
    ChangeKind, ExpiryNotifier, ExpirySweepService, LoginGate, LockoutService, LockoutStatus,
    PasswordChangeVerdict, PasswordExpiryStatus, PolicyEnforcementService, SweepReport,
};
pub use user::{User, UserId};
