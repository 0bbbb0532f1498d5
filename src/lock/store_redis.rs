use crate::lock::{CycleLease, CycleLocks};
use anyhow::Result;
use uuid::Uuid;

const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

/// Cycle locks shared by every process pointed at the same Redis.
///
/// Leases expire after `ttl_ms` so a crashed worker cannot pin a subscription forever.
#[derive(Clone)]
pub struct RedisCycleLocks {
    pub client: redis::Client,
    pub ttl_ms: u64,
}

impl RedisCycleLocks {
    pub fn new(client: redis::Client, ttl_ms: u64) -> Self {
        Self { client, ttl_ms }
    }

    fn lock_key(subscription_id: Uuid) -> String {
        format!("rebilling:cycle_lock:{}", subscription_id)
    }
}

#[async_trait::async_trait]
impl CycleLocks for RedisCycleLocks {
    async fn try_acquire(&self, subscription_id: Uuid) -> Result<Option<CycleLease>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let token = Uuid::new_v4().to_string();
        let acquired: Option<String> = redis::cmd("SET")
            .arg(Self::lock_key(subscription_id))
            .arg(&token)
            .arg("NX")
            .arg("PX")
            .arg(self.ttl_ms)
            .query_async(&mut conn)
            .await?;

        Ok(acquired.map(|_| CycleLease {
            subscription_id,
            token,
        }))
    }

    async fn release(&self, lease: CycleLease) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: i64 = redis::Script::new(RELEASE_SCRIPT)
            .key(Self::lock_key(lease.subscription_id))
            .arg(&lease.token)
            .invoke_async(&mut conn)
            .await?;
        Ok(())
    }
}
