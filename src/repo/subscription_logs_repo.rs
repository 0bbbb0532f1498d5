use crate::domain::billing_log::{BillingLogRow, NewBillingLogEntry};
use anyhow::Result;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

#[derive(Clone)]
pub struct SubscriptionLogsRepo {
    pub pool: PgPool,
}

impl SubscriptionLogsRepo {
    pub async fn insert_tx(tx: &mut Transaction<'_, Postgres>, entry: &NewBillingLogEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO subscription_logs (subscription_id, amount, status, created_at)
            VALUES ($1,$2,$3,$4)
            "#,
        )
        .bind(entry.subscription_id)
        .bind(entry.amount)
        .bind(&entry.status)
        .bind(entry.created_at)
        .execute(tx.as_mut())
        .await?;

        Ok(())
    }

    pub async fn list_by_subscription_id(&self, subscription_id: Uuid) -> Result<Vec<BillingLogRow>> {
        let rows = sqlx::query(
            r#"
            SELECT id, subscription_id, amount, status, created_at
            FROM subscription_logs
            WHERE subscription_id=$1
            ORDER BY id ASC
            "#,
        )
        .bind(subscription_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| BillingLogRow {
                id: row.get("id"),
                subscription_id: row.get("subscription_id"),
                amount: row.get("amount"),
                status: row.get("status"),
                created_at: row.get("created_at"),
            })
            .collect())
    }
}
