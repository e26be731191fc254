use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::weights::WeightVector;
use crate::utils::errors::{Result, WeightError};

/// Base units in one whole token.
pub const RAO_PER_TOKEN: u64 = 1_000_000_000;

/// Delegated stake in indivisible base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stake(pub u64);

impl Stake {
    pub const ZERO: Stake = Stake(0);

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Stake) -> Result<Stake> {
        self.0
            .checked_add(other.0)
            .map(Stake)
            .ok_or(WeightError::StakeOverflow)
    }

    pub fn as_decimal(&self) -> Decimal {
        Decimal::from(self.0)
    }

    /// Stake in whole tokens, for display.
    pub fn as_tokens(&self) -> Decimal {
        self.as_decimal() / Decimal::from(RAO_PER_TOKEN)
    }

    /// Sum a sequence of stakes, failing instead of wrapping.
    pub fn total<I: IntoIterator<Item = Stake>>(stakes: I) -> Result<Stake> {
        stakes
            .into_iter()
            .try_fold(Stake::ZERO, |acc, stake| acc.checked_add(stake))
    }
}

impl TryFrom<Decimal> for Stake {
    type Error = WeightError;

    /// Stored stake columns are NUMERIC; only non-negative whole values are stake.
    fn try_from(value: Decimal) -> Result<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(WeightError::MalformedStake(format!("negative stake {}", value)));
        }
        if !value.fract().is_zero() {
            return Err(WeightError::MalformedStake(format!("fractional stake {}", value)));
        }
        value
            .to_u64()
            .map(Stake)
            .ok_or_else(|| WeightError::MalformedStake(format!("stake {} out of range", value)))
    }
}

impl fmt::Display for Stake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One delegator as seen by the aggregation, with its latest declaration already resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegatorRecord {
    pub account: String,
    pub stake: Stake,
    pub weights: Option<WeightVector>,
}

impl DelegatorRecord {
    pub fn new(account: impl Into<String>, stake: Stake, weights: Option<WeightVector>) -> Self {
        Self {
            account: account.into(),
            stake,
            weights,
        }
    }

    /// Only a present, non-empty vector counts as a declaration.
    pub fn declared_weights(&self) -> Option<&WeightVector> {
        self.weights.as_ref().filter(|weights| !weights.is_empty())
    }
}
