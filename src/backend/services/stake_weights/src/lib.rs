//! Stake-weighted subnet allocation.
//!
//! Aggregates the subnet weight vectors declared by delegators into a single
//! stake-weighted distribution and blends an operator-supplied vector into
//! the stake that has no declared preference.

pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;

pub use models::{
    aggregate::{AggregateState, BlendedVector},
    stake::{DelegatorRecord, Stake, RAO_PER_TOKEN},
    weights::{SubnetId, Weight, WeightVector, PERCENT_SCALE},
};
pub use utils::errors::{Result, WeightError};
