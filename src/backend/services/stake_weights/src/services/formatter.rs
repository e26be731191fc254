use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::aggregate::{AggregateState, BlendedVector};
use crate::models::weights::{SubnetId, WeightVector};
use crate::utils::errors::{Result, WeightError};

/// Largest accepted distance between an operator vector's sum and 1 (inclusive).
pub const WEIGHT_SUM_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 4);

/// Decimal places shown for percentages.
pub const DISPLAY_DECIMALS: u32 = 4;

/// Rejects operator vectors that do not sum to 1 within tolerance.
pub fn validate_new_vector(new_weights: &WeightVector) -> Result<()> {
    let sum = new_weights.sum();
    if (sum - Decimal::ONE).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(WeightError::InvalidWeightSum { sum });
    }
    Ok(())
}

/// One output row: a subnet and its percentage rounded for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedWeight {
    pub subnet: SubnetId,
    pub percent: Decimal,
}

impl fmt::Display for FormattedWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}%", self.subnet, self.percent)
    }
}

/// The only rounding step in the pipeline: half-to-even at 4 places, always
/// rendered with 4 digits.
pub fn round_percent(percent: Decimal) -> Decimal {
    let mut rounded = percent.round_dp_with_strategy(DISPLAY_DECIMALS, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(DISPLAY_DECIMALS);
    rounded
}

/// Renders the blended vector in ascending subnet order.
pub fn format(blended: &BlendedVector) -> Vec<FormattedWeight> {
    format_vector(&blended.weights)
}

pub fn format_vector(weights: &WeightVector) -> Vec<FormattedWeight> {
    weights
        .iter()
        .map(|(subnet, weight)| FormattedWeight {
            subnet,
            percent: round_percent(weight.as_percent()),
        })
        .collect()
}

/// Everything an operator needs to submit a new allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationReport {
    pub stake_with_weights: Decimal,
    pub stake_without_weights: Decimal,
    pub total_stake: Decimal,
    pub weights: Vec<FormattedWeight>,
}

impl AllocationReport {
    pub fn new(aggregate: &AggregateState, blended: &BlendedVector) -> Self {
        Self {
            stake_with_weights: aggregate.stake_with_weights.as_tokens(),
            stake_without_weights: aggregate.stake_without_weights.as_tokens(),
            total_stake: blended.total_stake.as_tokens(),
            weights: format(blended),
        }
    }

    /// Comma-separated netuids, in output order.
    pub fn netuids_csv(&self) -> String {
        self.weights
            .iter()
            .map(|row| row.subnet.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Comma-separated percentages, aligned with [`Self::netuids_csv`].
    pub fn weights_csv(&self) -> String {
        self.weights
            .iter()
            .map(|row| row.percent.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}
