use crate::lock::{CycleLease, CycleLocks};
use anyhow::Result;
use dashmap::DashMap;
use uuid::Uuid;

/// Process-local cycle locks for single-instance deployments and tests.
#[derive(Default)]
pub struct LocalCycleLocks {
    held: DashMap<Uuid, String>,
}

impl LocalCycleLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self, subscription_id: Uuid) -> bool {
        self.held.contains_key(&subscription_id)
    }
}

#[async_trait::async_trait]
impl CycleLocks for LocalCycleLocks {
    async fn try_acquire(&self, subscription_id: Uuid) -> Result<Option<CycleLease>> {
        let token = Uuid::new_v4().to_string();
        match self.held.entry(subscription_id) {
            dashmap::mapref::entry::Entry::Occupied(_) => Ok(None),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(token.clone());
                Ok(Some(CycleLease {
                    subscription_id,
                    token,
                }))
            }
        }
    }

    async fn release(&self, lease: CycleLease) -> Result<()> {
        self.held
            .remove_if(&lease.subscription_id, |_, token| *token == lease.token);
        Ok(())
    }
}
