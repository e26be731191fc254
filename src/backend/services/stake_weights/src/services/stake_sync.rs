use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::repositories::traits::{DelegationRepository, StakeLedger};

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Accounts whose stake was written from the ledger.
    pub updated: usize,
    /// Accounts no longer delegating to the validator; stored stake cleared.
    pub cleared: usize,
    /// Accounts the ledger could not answer for; left untouched.
    pub failed: usize,
}

/// Reconciles stored delegation stake against the ledger for one validator.
pub struct StakeSyncService<R: DelegationRepository, L: StakeLedger> {
    repository: Arc<R>,
    ledger: Arc<L>,
    validator_hotkey: String,
}

impl<R: DelegationRepository, L: StakeLedger> StakeSyncService<R, L> {
    pub fn new(repository: Arc<R>, ledger: Arc<L>, validator_hotkey: impl Into<String>) -> Self {
        Self {
            repository,
            ledger,
            validator_hotkey: validator_hotkey.into(),
        }
    }

    pub fn validator_hotkey(&self) -> &str {
        &self.validator_hotkey
    }

    /// Walks every stored account once.
    ///
    /// A ledger failure for one account is logged and counted, never turned
    /// into a cleared stake; repository failures abort the pass.
    pub async fn reconcile_once(&self) -> Result<SyncReport> {
        let accounts = self.repository.list_accounts().await?;
        info!(
            accounts = accounts.len(),
            validator = %self.validator_hotkey,
            "Reconciling delegation stake"
        );

        let mut report = SyncReport::default();
        for account in &accounts {
            match self.ledger.stake_for(account, &self.validator_hotkey).await {
                Ok(Some(stake)) => {
                    debug!(%account, %stake, "Updating stake");
                    self.repository.update_stake(account, Some(stake)).await?;
                    report.updated += 1;
                }
                Ok(None) => {
                    debug!(%account, "No delegation to validator, clearing stake");
                    self.repository.update_stake(account, None).await?;
                    report.cleared += 1;
                }
                Err(e) => {
                    warn!(%account, error = %e, "Ledger lookup failed, keeping stored stake");
                    report.failed += 1;
                }
            }
        }

        info!(
            updated = report.updated,
            cleared = report.cleared,
            failed = report.failed,
            "Finished reconciliation pass"
        );
        Ok(report)
    }

    /// Repeats [`Self::reconcile_once`] every `period` until `shutdown` turns true.
    pub async fn run(&self, period: Duration, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.reconcile_once().await {
                        warn!(error = %e, "Reconciliation pass failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Stopping stake reconciliation");
                        return Ok(());
                    }
                }
            }
        }
    }
}
