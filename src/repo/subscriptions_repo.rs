use crate::domain::billing_log::NewBillingLogEntry;
use crate::domain::subscription::Subscription;
use crate::repo::subscription_logs_repo::SubscriptionLogsRepo;
use crate::repo::subscription_store::SubscriptionStore;
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Clone)]
pub struct SubscriptionsRepo {
    pub pool: PgPool,
}

impl SubscriptionsRepo {
    pub async fn insert(&self, subscription: &Subscription) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, status, amount, retry_attempts, remaining_balance, next_retry_at, created_at, updated_at
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
            "#,
        )
        .bind(subscription.id)
        .bind(subscription.status.as_str())
        .bind(subscription.amount)
        .bind(subscription.retry_attempts)
        .bind(subscription.remaining_balance)
        .bind(subscription.next_retry_at)
        .bind(subscription.created_at)
        .bind(subscription.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Subscription>> {
        let row = sqlx::query(
            r#"
            SELECT id, status, amount, retry_attempts, remaining_balance, next_retry_at, created_at, updated_at
            FROM subscriptions
            WHERE id=$1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| map_row(&r)).transpose()
    }
}

fn map_row(row: &PgRow) -> Result<Subscription> {
    let status: String = row.get("status");
    Ok(Subscription {
        id: row.get("id"),
        status: status.parse()?,
        amount: row.get("amount"),
        retry_attempts: row.get("retry_attempts"),
        remaining_balance: row.get("remaining_balance"),
        next_retry_at: row.get("next_retry_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait::async_trait]
impl SubscriptionStore for SubscriptionsRepo {
    async fn find(&self, id: Uuid) -> Result<Option<Subscription>> {
        self.get(id).await
    }

    async fn commit_cycle(&self, subscription: &Subscription, entries: &[NewBillingLogEntry]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for entry in entries {
            SubscriptionLogsRepo::insert_tx(&mut tx, entry).await?;
        }

        sqlx::query(
            r#"
            UPDATE subscriptions
            SET status=$2, retry_attempts=$3, remaining_balance=$4, next_retry_at=$5, updated_at=now()
            WHERE id=$1
            "#,
        )
        .bind(subscription.id)
        .bind(subscription.status.as_str())
        .bind(subscription.retry_attempts)
        .bind(subscription.remaining_balance)
        .bind(subscription.next_retry_at)
        .execute(tx.as_mut())
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn due_ids(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<Uuid>> {
        let rows = sqlx::query(
            r#"
            SELECT id
            FROM subscriptions
            WHERE status='pending' AND next_retry_at <= $1
            ORDER BY next_retry_at ASC
            LIMIT $2
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.get("id")).collect())
    }
}
