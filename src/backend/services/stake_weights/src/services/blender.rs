use tracing::debug;

use crate::models::aggregate::{AggregateState, BlendedVector};
use crate::models::stake::Stake;
use crate::models::weights::WeightVector;
use crate::utils::errors::{Result, WeightError};

/// Combines the aggregate (for stake with declarations) and the operator's
/// vector (for stake without) into one distribution over total stake.
///
/// Each side is scaled by its partition's share of total stake. A partition
/// holding no stake contributes no entries at all, so the degenerate cases
/// reduce exactly to the other side.
pub fn blend(aggregate: &AggregateState, new_weights: &WeightVector) -> Result<BlendedVector> {
    let total_stake = aggregate.total_stake()?;
    if total_stake.is_zero() {
        return Err(WeightError::EmptyStake);
    }

    let mut blended = WeightVector::new();
    add_partition(&mut blended, &aggregate.weights, aggregate.stake_with_weights, total_stake)?;
    add_partition(&mut blended, new_weights, aggregate.stake_without_weights, total_stake)?;

    debug!(
        subnets = blended.len(),
        %total_stake,
        "Blended aggregate with operator weights"
    );

    Ok(BlendedVector {
        weights: blended,
        total_stake,
    })
}

fn add_partition(
    blended: &mut WeightVector,
    weights: &WeightVector,
    partition_stake: Stake,
    total_stake: Stake,
) -> Result<()> {
    if partition_stake.is_zero() {
        return Ok(());
    }

    let partition = partition_stake.as_decimal();
    let total = total_stake.as_decimal();
    for (subnet, weight) in weights.iter() {
        let scaled = weight
            .fraction()
            .checked_mul(partition)
            .ok_or(WeightError::StakeOverflow)?
            / total;
        blended.accumulate(subnet, scaled);
    }
    Ok(())
}
