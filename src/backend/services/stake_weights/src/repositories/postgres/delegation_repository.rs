use async_trait::async_trait;
use anyhow::Result;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::models::stake::Stake;
use crate::repositories::traits::DelegationRepository;

pub struct PostgresDelegationRepository {
    pool: PgPool,
}

impl PostgresDelegationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DelegationRepository for PostgresDelegationRepository {
    async fn list_accounts(&self) -> Result<Vec<String>> {
        let accounts = sqlx::query_scalar::<_, String>(
            r#"
            SELECT ss58
            FROM account
            ORDER BY ss58
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(accounts)
    }

    async fn update_stake(&self, account: &str, stake: Option<Stake>) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE account
            SET stake = $1, updated_at = now()
            WHERE ss58 = $2
            "#,
        )
        .bind(stake.map(|s| Decimal::from(s.0)))
        .bind(account)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
