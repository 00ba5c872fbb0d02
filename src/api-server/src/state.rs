use crate::db;
use crate::server::ServerConfig;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use vaultkeeper_audit::{
    AuditRecorder, AuditStore, InMemoryAuditStore, PostgresAuditStore, RequestContext, UserId,
};
use vaultkeeper_vault::{
    AesGcmCipher, InMemoryVaultRepository, ListFailurePolicy, PostgresVaultRepository,
    VaultKey, VaultRepository, VaultStore,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Owner-scoped vault operations
    pub vault: Arc<VaultStore>,

    /// Best-effort audit trail
    pub audit: AuditRecorder,

    /// Write audit rows from a detached task instead of inline
    pub detached_audit: bool,

    /// Take the client ip from `x-forwarded-for` (behind a trusted proxy only)
    pub trust_forwarded_for: bool,

    /// Server start time for uptime calculation
    pub start_time: Instant,

    /// Application version
    pub version: String,
}

impl AppState {
    pub fn new(vault: VaultStore, audit: AuditRecorder) -> Self {
        Self {
            vault: Arc::new(vault),
            audit,
            detached_audit: false,
            trust_forwarded_for: false,
            start_time: Instant::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn with_detached_audit(mut self, detached: bool) -> Self {
        self.detached_audit = detached;
        self
    }

    pub fn with_trusted_proxy(mut self, trusted: bool) -> Self {
        self.trust_forwarded_for = trusted;
        self
    }

    /// State backed by in-memory storage
    pub fn in_memory(key: &VaultKey) -> Self {
        let vault = VaultStore::new(
            Arc::new(InMemoryVaultRepository::new()),
            Arc::new(AesGcmCipher::new(key)),
        );
        Self::new(vault, AuditRecorder::new(Arc::new(InMemoryAuditStore::new())))
    }

    /// Wire storage, cipher and recorder from server configuration
    ///
    /// Without a database URL both stores live in memory.
    pub async fn from_config(config: &ServerConfig) -> Result<Self> {
        let key = config
            .vault_key
            .as_ref()
            .context("A vault key is required (APP_KEY)")?;

        let (repository, audit_store): (Arc<dyn VaultRepository>, Arc<dyn AuditStore>) =
            match &config.database_url {
                Some(url) => {
                    let pool = db::connect(url).await?;
                    db::run_migrations(&pool).await?;
                    (
                        Arc::new(PostgresVaultRepository::new(pool.clone())),
                        Arc::new(PostgresAuditStore::new(pool)),
                    )
                }
                None => {
                    warn!("DATABASE_URL not set, vault and audit data will not survive a restart");
                    (
                        Arc::new(InMemoryVaultRepository::new()),
                        Arc::new(InMemoryAuditStore::new()),
                    )
                }
            };

        let list_policy = if config.skip_corrupt_items {
            ListFailurePolicy::SkipCorrupt
        } else {
            ListFailurePolicy::FailFast
        };

        let vault = VaultStore::new(repository, Arc::new(AesGcmCipher::new(key)))
            .with_list_policy(list_policy);

        info!(
            list_policy = ?list_policy,
            detached_audit = config.detached_audit,
            trust_forwarded_for = config.trust_forwarded_for,
            "Application state initialized"
        );

        Ok(Self::new(vault, AuditRecorder::new(audit_store))
            .with_detached_audit(config.detached_audit)
            .with_trusted_proxy(config.trust_forwarded_for))
    }

    /// Record an audit row after a successful action
    ///
    /// The outcome is already logged by the recorder and is dropped here.
    pub async fn audit(
        &self,
        actor: Option<UserId>,
        action: impl Into<String>,
        description: impl Into<String>,
        context: &RequestContext,
    ) {
        if self.detached_audit {
            self.audit.spawn_record(actor, action, description, context);
        } else {
            self.audit.record(actor, action, description, context).await;
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultkeeper_audit::AuditAction;

    #[tokio::test]
    async fn test_from_config_requires_key() {
        let config = ServerConfig::default();
        let err = AppState::from_config(&config).await.err().unwrap();
        assert!(err.to_string().contains("vault key"));
    }

    #[tokio::test]
    async fn test_from_config_in_memory() {
        let config = ServerConfig {
            vault_key: Some(VaultKey::generate()),
            skip_corrupt_items: true,
            detached_audit: true,
            ..ServerConfig::default()
        };

        let state = AppState::from_config(&config).await.unwrap();
        assert_eq!(state.vault.list_policy(), ListFailurePolicy::SkipCorrupt);
        assert!(state.detached_audit);
        assert!(!state.trust_forwarded_for);
    }

    #[tokio::test]
    async fn test_from_config_trusted_proxy() {
        let config = ServerConfig {
            vault_key: Some(VaultKey::generate()),
            trust_forwarded_for: true,
            ..ServerConfig::default()
        };

        let state = AppState::from_config(&config).await.unwrap();
        assert!(state.trust_forwarded_for);
    }

    #[tokio::test]
    async fn test_inline_audit_is_visible_immediately() {
        let state = AppState::in_memory(&VaultKey::generate());

        state
            .audit(Some(1), AuditAction::UserLogin, "User logged in", &RequestContext::default())
            .await;

        assert_eq!(state.audit.list(1).await.unwrap().len(), 1);
    }
}
