use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

use crate::models::aggregate::AggregateState;
use crate::models::stake::{DelegatorRecord, Stake};
use crate::models::weights::{SubnetId, Weight, WeightVector};
use crate::utils::errors::{Result, WeightError};

/// Computes the stake-weighted mean vector over delegators with a declaration
/// and the stake total of those without one.
///
/// A subnet missing from a delegator's vector counts as zero for that
/// delegator. The result does not depend on record order.
pub fn compute_aggregate(records: &[DelegatorRecord]) -> Result<AggregateState> {
    let mut stake_with_weights = Stake::ZERO;
    let mut stake_without_weights = Stake::ZERO;
    let mut weighted_sums: BTreeMap<SubnetId, Decimal> = BTreeMap::new();
    let mut declaring = 0usize;

    for record in records {
        match record.declared_weights() {
            Some(weights) => {
                declaring += 1;
                stake_with_weights = stake_with_weights.checked_add(record.stake)?;
                let stake = record.stake.as_decimal();
                for (subnet, weight) in weights.iter() {
                    let contribution = weight
                        .fraction()
                        .checked_mul(stake)
                        .ok_or(WeightError::StakeOverflow)?;
                    let sum = weighted_sums.entry(subnet).or_insert(Decimal::ZERO);
                    *sum = sum.checked_add(contribution).ok_or(WeightError::StakeOverflow)?;
                }
            }
            None => {
                stake_without_weights = stake_without_weights.checked_add(record.stake)?;
            }
        }
    }

    let weights = if stake_with_weights.is_zero() {
        WeightVector::new()
    } else {
        let denominator = stake_with_weights.as_decimal();
        weighted_sums
            .into_iter()
            .map(|(subnet, sum)| (subnet, Weight::derived(sum / denominator)))
            .collect()
    };

    debug!(
        delegators = records.len(),
        declaring,
        subnets = weights.len(),
        %stake_with_weights,
        %stake_without_weights,
        "Computed stake-weighted aggregate"
    );

    Ok(AggregateState {
        weights,
        stake_with_weights,
        stake_without_weights,
    })
}
