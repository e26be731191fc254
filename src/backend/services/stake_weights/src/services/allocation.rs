use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::models::aggregate::AggregateState;
use crate::models::stake::DelegatorRecord;
use crate::models::weights::WeightVector;
use crate::repositories::traits::StakeSnapshot;
use crate::services::{aggregator, blender, formatter};
use crate::services::formatter::AllocationReport;
use crate::utils::errors;

/// Runs the aggregate → validate → blend → format pipeline over a snapshot.
pub struct AllocationService<S: StakeSnapshot> {
    snapshot: Arc<S>,
}

impl<S: StakeSnapshot> AllocationService<S> {
    pub fn new(snapshot: Arc<S>) -> Self {
        Self { snapshot }
    }

    /// Aggregate over the delegators as they are right now.
    pub async fn current(&self) -> Result<AggregateState> {
        let records = self.snapshot.delegator_records().await?;
        Ok(aggregator::compute_aggregate(&records)?)
    }

    /// Reads the snapshot once so the aggregate shown and a later blend agree.
    pub async fn snapshot(&self) -> Result<AllocationSnapshot> {
        let records = self.snapshot.delegator_records().await?;
        let aggregate = aggregator::compute_aggregate(&records)?;
        Ok(AllocationSnapshot { records, aggregate })
    }

    /// Blend `new_weights` into the current snapshot.
    pub async fn rebalance(&self, new_weights: &WeightVector) -> Result<AllocationReport> {
        let records = self.snapshot.delegator_records().await?;
        let report = allocate(&records, new_weights)?;
        info!(
            subnets = report.weights.len(),
            total_stake = %report.total_stake,
            "Computed new subnet allocation"
        );
        Ok(report)
    }
}

/// Delegator records read at one point in time, with their aggregate.
#[derive(Debug, Clone)]
pub struct AllocationSnapshot {
    records: Vec<DelegatorRecord>,
    aggregate: AggregateState,
}

impl AllocationSnapshot {
    pub fn aggregate(&self) -> &AggregateState {
        &self.aggregate
    }

    pub fn records(&self) -> &[DelegatorRecord] {
        &self.records
    }

    /// Blends `new_weights` against these records without reading again.
    pub fn allocate(&self, new_weights: &WeightVector) -> errors::Result<AllocationReport> {
        allocate(&self.records, new_weights)
    }
}

/// Pure entry point: no I/O, same input always gives the same report.
pub fn allocate(records: &[DelegatorRecord], new_weights: &WeightVector) -> errors::Result<AllocationReport> {
    formatter::validate_new_vector(new_weights)?;
    let aggregate = aggregator::compute_aggregate(records)?;
    let blended = blender::blend(&aggregate, new_weights)?;
    Ok(AllocationReport::new(&aggregate, &blended))
}
