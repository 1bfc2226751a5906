//! Builder pattern for constructing [`Warden`] instances
//!
//! The builder uses a type-state pattern so a storage backend must be chosen
//! before `build` is reachable; the policy source and notifier are checked at
//! build time.
//!
//! # Example
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
//!         .with_policy_provider(Arc::new(RemotePolicySource::from_env()?))
//!         .with_notifier(Arc::new(LogNotifier))
//!         .apply_schema(true)
//!         .build()
//!         .await?;
//!     # let _ = warden;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use chrono::Duration;

use warden_core::{
    CachedPolicyProvider, ExpiryNotifier, PolicyProvider, RepositoryProvider,
};

use crate::Warden;

/// Errors that can occur when building a Warden instance.
#[derive(Debug, thiserror::Error)]
pub enum WardenBuilderError {
    /// Failed to connect to the storage backend
    #[error("Storage connection failed: {0}")]
    StorageConnection(String),

    /// Failed to create the storage schema
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Marker type indicating no storage has been configured yet.
///
/// This is the initial state of [`WardenBuilder`].
pub struct NoStorage;

/// Marker type indicating storage has been configured.
pub struct WithStorage<R: RepositoryProvider> {
    repositories: Arc<R>,
}

/// A type-safe builder for constructing [`Warden`] instances.
pub struct WardenBuilder<S> {
    storage: S,
    policy_provider: Option<Arc<dyn PolicyProvider>>,
    policy_cache_ttl: Duration,
    notifier: Option<Arc<dyn ExpiryNotifier>>,
    apply_schema: bool,
}

impl WardenBuilder<NoStorage> {
    pub fn new() -> Self {
        Self {
            storage: NoStorage,
            policy_provider: None,
            policy_cache_ttl: Duration::minutes(5),
            notifier: None,
            apply_schema: true,
        }
    }

    /// Use an already-constructed repository provider.
    pub fn with_repository_provider<R: RepositoryProvider>(
        self,
        repositories: Arc<R>,
    ) -> WardenBuilder<WithStorage<R>> {
        WardenBuilder {
            storage: WithStorage { repositories },
            policy_provider: self.policy_provider,
            policy_cache_ttl: self.policy_cache_ttl,
            notifier: self.notifier,
            apply_schema: self.apply_schema,
        }
    }

    /// Connect to a SQLite database at the given URL.
    #[cfg(feature = "sqlite")]
    pub async fn with_sqlite(
        self,
        url: &str,
    ) -> Result<WardenBuilder<WithStorage<warden_storage_sqlite::SqliteRepositoryProvider>>, WardenBuilderError>
    {
        let provider = warden_storage_sqlite::SqliteRepositoryProvider::connect(url)
            .await
            .map_err(|e| WardenBuilderError::StorageConnection(e.to_string()))?;
        Ok(self.with_repository_provider(Arc::new(provider)))
    }
}

impl Default for WardenBuilder<NoStorage> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RepositoryProvider> WardenBuilder<WithStorage<R>> {
    /// Set the source the policy cache fetches from.
    pub fn with_policy_provider(mut self, provider: Arc<dyn PolicyProvider>) -> Self {
        self.policy_provider = Some(provider);
        self
    }

    /// Override the 5-minute policy cache TTL.
    pub fn with_policy_cache_ttl(mut self, ttl: Duration) -> Self {
        self.policy_cache_ttl = ttl;
        self
    }

    /// Set the notifier the expiry sweeps send through.
    pub fn with_notifier(mut self, notifier: Arc<dyn ExpiryNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Whether `build` creates the storage schema (default `true`).
    pub fn apply_schema(mut self, apply: bool) -> Self {
        self.apply_schema = apply;
        self
    }

    pub async fn build(self) -> Result<Warden<R>, WardenBuilderError> {
        let policy_provider = self.policy_provider.ok_or_else(|| {
            WardenBuilderError::InvalidConfiguration("a policy provider is required".to_string())
        })?;
        let notifier = self.notifier.ok_or_else(|| {
            WardenBuilderError::InvalidConfiguration("a notifier is required".to_string())
        })?;

        let repositories = self.storage.repositories;
        if self.apply_schema {
            repositories
                .migrate()
                .await
                .map_err(|e| WardenBuilderError::Migration(e.to_string()))?;
            tracing::debug!("storage schema ready");
        }

        let policy_cache = Arc::new(CachedPolicyProvider::with_ttl(
            policy_provider,
            self.policy_cache_ttl,
        ));

        Ok(Warden::new(repositories, policy_cache, notifier))
    }
}
