use async_trait::async_trait;
use anyhow::Result;
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::{PgPool, Row};
use std::str::FromStr;

use crate::models::stake::{DelegatorRecord, Stake};
use crate::models::weights::{SubnetId, WeightVector};
use crate::repositories::traits::StakeSnapshot;
use crate::utils::errors::WeightError;

pub struct PostgresStakeSnapshot {
    pool: PgPool,
}

impl PostgresStakeSnapshot {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StakeSnapshot for PostgresStakeSnapshot {
    async fn delegator_records(&self) -> Result<Vec<DelegatorRecord>> {
        // Both partitions must come from the same point in time.
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let rows = sqlx::query(
            r#"
            SELECT a.ss58, a.stake, latest.weights
            FROM account a
            LEFT JOIN LATERAL (
                SELECT uw.weights
                FROM user_weights uw
                WHERE uw.connected_account = a.ss58
                ORDER BY uw.created_at DESC
                LIMIT 1
            ) latest ON TRUE
            WHERE a.stake IS NOT NULL
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let account: String = row.try_get("ss58")?;
            let stake: Decimal = row.try_get("stake")?;
            let weights: Option<Value> = row.try_get("weights")?;

            let weights = match weights {
                Some(value) => decode_weights(&value)?,
                None => None,
            };
            records.push(DelegatorRecord {
                account,
                stake: Stake::try_from(stake)?,
                weights,
            });
        }

        Ok(records)
    }
}

/// Decodes a stored declaration such as `{"Subnet 3": 40, "7": 60.5}`.
///
/// Keys are subnet labels, values percentages (numbers or numeric strings).
/// JSON `null` means no declaration.
pub fn decode_weights(value: &Value) -> Result<Option<WeightVector>, WeightError> {
    let entries = match value {
        Value::Null => return Ok(None),
        Value::Object(entries) => entries,
        other => {
            return Err(WeightError::MalformedWeightVector(format!(
                "expected an object, found {}",
                other
            )))
        }
    };

    let mut percentages = Vec::with_capacity(entries.len());
    for (key, raw) in entries {
        let subnet = SubnetId::from_str(key)?;
        let text = match raw {
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.trim().to_string(),
            other => {
                return Err(WeightError::MalformedWeightVector(format!(
                    "subnet {} has non-numeric weight {}",
                    subnet, other
                )))
            }
        };
        let percent = Decimal::from_str(&text)
            .or_else(|_| Decimal::from_scientific(&text))
            .map_err(|_| {
                WeightError::MalformedWeightVector(format!("subnet {} has unparsable weight {}", subnet, text))
            })?;
        percentages.push((subnet, percent));
    }

    WeightVector::from_percentages(percentages).map(Some)
}
