//! Notification seam for the expiry sweeps.
//!
//! The transport (SMTP, file drop, a queue) lives outside this core;
//! implementations only need to render and send the two expiry emails.

use async_trait::async_trait;

use crate::Error;

#[async_trait]
pub trait ExpiryNotifier: Send + Sync {
    /// Notify a user their password expires in `days_until_expiry` days.
    async fn send_expiry_warning(
        &self,
        to: &str,
        user_name: Option<&str>,
        days_until_expiry: i64,
    ) -> Result<(), Error>;

    /// Notify a user their password has expired and must be reset at next
    /// login.
    async fn send_password_expired(&self, to: &str, user_name: Option<&str>) -> Result<(), Error>;
}
