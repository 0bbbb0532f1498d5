use anyhow::Result;
use uuid::Uuid;

pub mod local;
pub mod store_redis;

/// Proof that the holder is the only cycle running for `subscription_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleLease {
    pub subscription_id: Uuid,
    pub token: String,
}

/// Serializes billing cycles per subscription.
#[async_trait::async_trait]
pub trait CycleLocks: Send + Sync {
    /// `None` when another cycle already holds the subscription.
    async fn try_acquire(&self, subscription_id: Uuid) -> Result<Option<CycleLease>>;

    async fn release(&self, lease: CycleLease) -> Result<()>;
}
