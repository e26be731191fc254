use async_trait::async_trait;
use anyhow::Result;

use crate::models::stake::{DelegatorRecord, Stake};

/// Source of a consistent view of every tracked delegator.
#[async_trait]
pub trait StakeSnapshot: Send + Sync {
    /// Current stake per delegator with its latest declared vector, if any.
    async fn delegator_records(&self) -> Result<Vec<DelegatorRecord>>;
}

/// Stored stake per delegating account.
#[async_trait]
pub trait DelegationRepository: Send + Sync {
    async fn list_accounts(&self) -> Result<Vec<String>>;
    /// `None` clears the stored stake.
    async fn update_stake(&self, account: &str, stake: Option<Stake>) -> Result<()>;
}

/// Remote stake ledger.
#[async_trait]
pub trait StakeLedger: Send + Sync {
    /// Stake `account` has delegated to `validator_hotkey`, or `None` when it
    /// does not delegate to that validator.
    async fn stake_for(&self, account: &str, validator_hotkey: &str) -> Result<Option<Stake>>;
}
