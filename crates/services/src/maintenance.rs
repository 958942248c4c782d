//! Backup, restore and storage statistics.

use caseload_core::error::CoreError;
use caseload_store::StoreStats;

use crate::context::ServiceContext;

#[derive(Debug, Clone)]
pub struct MaintenanceService {
    ctx: ServiceContext,
}

impl MaintenanceService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Snapshot every collection. Returns the backup identifier.
    pub async fn create_backup(&self) -> Result<String, CoreError> {
        let backup_id = self.ctx.store.create_backup().await?;
        tracing::info!(backup_id = %backup_id, "Backup created");
        Ok(backup_id)
    }

    /// Backup identifiers, newest first.
    pub async fn list_backups(&self) -> Result<Vec<String>, CoreError> {
        Ok(self.ctx.store.list_backups().await?)
    }

    /// Replace every collection with the contents of `backup_id`.
    pub async fn restore_backup(&self, backup_id: &str) -> Result<(), CoreError> {
        if backup_id.trim().is_empty() {
            return Err(CoreError::invalid_field("backup_id", "'backup_id' is required"));
        }
        self.ctx.store.restore_backup(backup_id).await?;
        tracing::warn!(backup_id = %backup_id, "Storage restored from backup");
        Ok(())
    }

    pub async fn get_storage_stats(&self) -> Result<StoreStats, CoreError> {
        Ok(self.ctx.store.stats().await?)
    }
}
