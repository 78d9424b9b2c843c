//! Port for per-account aggregator quota bookkeeping.
//!
//! The aggregator restricts each external account to a small fixed number
//! of data pulls per rolling 24-hour window. Keeping the counter behind a
//! port lets single-instance deployments use the in-memory adapter while a
//! horizontally scaled deployment can back the same port with shared
//! storage.

use async_trait::async_trait;

/// Port for consuming and inspecting the per-account pull quota.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SyncQuota: Send + Sync {
    /// Whether a pull is currently permitted for the key; consumes one
    /// unit of quota when it is.
    async fn check_and_consume(&self, key: &str) -> bool;

    /// Remaining pulls in the current window, without consuming.
    async fn remaining(&self, key: &str) -> u32;

    /// Clear the counter for a key. Test and operational hook.
    async fn reset(&self, key: &str);
}

/// Fixture quota that always permits pulls.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnlimitedSyncQuota;

#[async_trait]
impl SyncQuota for UnlimitedSyncQuota {
    async fn check_and_consume(&self, _key: &str) -> bool {
        true
    }

    async fn remaining(&self, _key: &str) -> u32 {
        u32::MAX
    }

    async fn reset(&self, _key: &str) {}
}
