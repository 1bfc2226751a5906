//! Remote tenant-config policy source.
//!
//! Each tenant configures its password policy on the tenant server; this
//! crate fetches it over HTTP with a shared-secret header and decodes the
//! camelCase document into [`PasswordPolicy`]. Transport failures, timeouts,
//! and unexpected statuses surface as [`PolicyError::Unavailable`] so the
//! policy cache can degrade to "no policy known" without blocking logins.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use warden_core::{Error, PasswordPolicy, PolicyProvider, error::PolicyError};

/// Path of the policy document on the tenant server.
pub const POLICY_PATH: &str = "/password-policy/password-policy-company-server";

/// Header carrying the per-company shared secret.
const SECRET_HEADER: &str = "x-api-key";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// [`PolicyProvider`] backed by the tenant-config endpoint.
pub struct RemotePolicySource {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl RemotePolicySource {
    /// Create a source for the given tenant base URL and company API key.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = reqwest::ClientBuilder::new()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .expect("Client should build");

        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Create a source from the `TENANT_BASE_URL` and `COMPANY_API_KEY`
    /// environment variables.
    pub fn from_env() -> Result<Self, Error> {
        let base_url = std::env::var("TENANT_BASE_URL").map_err(|_| {
            warden_core::error::ValidationError::MissingField("TENANT_BASE_URL".to_string())
        })?;
        let api_key = std::env::var("COMPANY_API_KEY").map_err(|_| {
            warden_core::error::ValidationError::MissingField("COMPANY_API_KEY".to_string())
        })?;
        Ok(Self::new(base_url, api_key))
    }

    fn policy_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), POLICY_PATH)
    }
}

#[async_trait]
impl PolicyProvider for RemotePolicySource {
    async fn fetch_policy(&self) -> Result<Option<PasswordPolicy>, Error> {
        let url = self.policy_url();

        let response = self
            .client
            .get(&url)
            .header(SECRET_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| PolicyError::Unavailable(e.to_string()))?;

        let status = response.status();
        // Tenants without a policy answer 404 or an empty body; both mean
        // "no policy configured", not an outage.
        if status == StatusCode::NOT_FOUND || status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(PolicyError::Unavailable(format!("unexpected status {status}")).into());
        }

        let body = response
            .text()
            .await
            .map_err(|e| PolicyError::Unavailable(e.to_string()))?;
        if body.trim().is_empty() || body.trim() == "null" {
            return Ok(None);
        }

        let policy: PasswordPolicy =
            serde_json::from_str(&body).map_err(|e| PolicyError::Malformed(e.to_string()))?;

        tracing::debug!(url = %url, "fetched tenant password policy");
        Ok(Some(policy))
    }
}
