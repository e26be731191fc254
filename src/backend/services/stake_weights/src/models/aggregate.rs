use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::stake::Stake;
use crate::models::weights::{SubnetId, WeightVector};
use crate::utils::errors::Result;

/// Stake-weighted mean over declaring delegators, plus both partition totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateState {
    /// Empty when no stake carries a declaration.
    pub weights: WeightVector,
    pub stake_with_weights: Stake,
    pub stake_without_weights: Stake,
}

impl AggregateState {
    pub fn total_stake(&self) -> Result<Stake> {
        self.stake_with_weights.checked_add(self.stake_without_weights)
    }

    pub fn percentages(&self) -> BTreeMap<SubnetId, Decimal> {
        self.weights.percentages()
    }
}

/// Network-wide distribution over the union of aggregate and operator subnets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlendedVector {
    pub weights: WeightVector,
    pub total_stake: Stake,
}

impl BlendedVector {
    pub fn percentages(&self) -> BTreeMap<SubnetId, Decimal> {
        self.weights.percentages()
    }

    /// Sum of all percentages; 100 up to decimal precision.
    pub fn percent_total(&self) -> Decimal {
        self.percentages().values().copied().sum()
    }
}
