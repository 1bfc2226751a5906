//! Services orchestrating policy, lockout, and sweep behavior over the
//! repository traits.

pub mod enforcement;
pub mod lockout;
pub mod notifier;
pub mod sweep;

pub use enforcement::{
    ChangeKind, LoginGate, PasswordChangeVerdict, PasswordExpiryStatus, PolicyEnforcementService,
};
pub use lockout::{LockoutService, LockoutStatus};
pub use notifier::ExpiryNotifier;
pub use sweep::{ExpirySweepService, SweepReport};
