use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeightError {
    #[error("Weights must sum to 1 (got {sum})")]
    InvalidWeightSum { sum: Decimal },

    #[error("Total stake is zero, nothing to allocate")]
    EmptyStake,

    #[error("Malformed weight vector: {0}")]
    MalformedWeightVector(String),

    #[error("Invalid subnet id: {0}")]
    InvalidSubnetId(String),

    #[error("Malformed stake: {0}")]
    MalformedStake(String),

    #[error("Stake total overflowed")]
    StakeOverflow,
}

pub type Result<T> = std::result::Result<T, WeightError>;
