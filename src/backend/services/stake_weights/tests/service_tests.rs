use anyhow::{anyhow, Result};
use async_trait::async_trait;
use mockall::mock;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use stake_weights::{
    models::stake::DelegatorRecord,
    repositories::traits::*,
    services::{
        allocation::AllocationService,
        stake_sync::{StakeSyncService, SyncReport},
    },
    Stake, SubnetId, WeightError, WeightVector,
};

// Mock collaborators
mock! {
    pub Snapshot {}
    #[async_trait]
    impl StakeSnapshot for Snapshot {
        async fn delegator_records(&self) -> Result<Vec<DelegatorRecord>>;
    }
}

mock! {
    pub DelegationRepo {}
    #[async_trait]
    impl DelegationRepository for DelegationRepo {
        async fn list_accounts(&self) -> Result<Vec<String>>;
        async fn update_stake(&self, account: &str, stake: Option<Stake>) -> Result<()>;
    }
}

mock! {
    pub Ledger {}
    #[async_trait]
    impl StakeLedger for Ledger {
        async fn stake_for(&self, account: &str, validator_hotkey: &str) -> Result<Option<Stake>>;
    }
}

// Test helpers
fn snapshot_records() -> Vec<DelegatorRecord> {
    let declared = WeightVector::from_percentages(vec![
        (SubnetId(1), Decimal::from(25)),
        (SubnetId(2), Decimal::from(75)),
    ])
    .unwrap();
    vec![
        DelegatorRecord::new("5Declared", Stake(3_000_000_000), Some(declared)),
        DelegatorRecord::new("5Silent", Stake(1_000_000_000), None),
    ]
}

fn operator_weights() -> WeightVector {
    WeightVector::from_fractions(vec![(SubnetId(2), Decimal::ONE)]).unwrap()
}

#[tokio::test]
async fn test_current_aggregate_from_snapshot() -> Result<()> {
    let mut snapshot = MockSnapshot::new();
    snapshot.expect_delegator_records()
        .times(1)
        .returning(|| Ok(snapshot_records()));

    let service = AllocationService::new(Arc::new(snapshot));
    let aggregate = service.current().await?;

    assert_eq!(aggregate.stake_with_weights, Stake(3_000_000_000));
    assert_eq!(aggregate.stake_without_weights, Stake(1_000_000_000));
    assert_eq!(aggregate.percentages()[&SubnetId(2)], Decimal::from(75));

    Ok(())
}

#[tokio::test]
async fn test_rebalance_reports_blended_weights() -> Result<()> {
    let mut snapshot = MockSnapshot::new();
    snapshot.expect_delegator_records()
        .times(1)
        .returning(|| Ok(snapshot_records()));

    let service = AllocationService::new(Arc::new(snapshot));
    let report = service.rebalance(&operator_weights()).await?;

    assert_eq!(report.netuids_csv(), "1,2");
    assert_eq!(report.weights_csv(), "18.7500,81.2500");
    assert_eq!(report.total_stake, Decimal::from(4));
    assert_eq!(report.stake_with_weights, Decimal::from(3));
    assert_eq!(report.stake_without_weights, Decimal::ONE);

    Ok(())
}

#[tokio::test]
async fn test_snapshot_reads_once_for_display_and_blend() -> Result<()> {
    let mut snapshot = MockSnapshot::new();
    snapshot.expect_delegator_records()
        .times(1)
        .returning(|| Ok(snapshot_records()));

    let service = AllocationService::new(Arc::new(snapshot));
    let view = service.snapshot().await?;
    let report = view.allocate(&operator_weights())?;

    assert_eq!(view.records().len(), 2);
    assert_eq!(report.stake_with_weights, view.aggregate().stake_with_weights.as_tokens());
    assert_eq!(report.stake_without_weights, view.aggregate().stake_without_weights.as_tokens());
    assert_eq!(report.total_stake, view.aggregate().total_stake()?.as_tokens());
    assert_eq!(report.weights_csv(), "18.7500,81.2500");

    // A second blend over the same view does not touch the snapshot again.
    let again = view.allocate(&operator_weights())?;
    assert_eq!(again.weights_csv(), report.weights_csv());

    Ok(())
}

#[tokio::test]
async fn test_rebalance_surfaces_typed_errors() {
    let mut snapshot = MockSnapshot::new();
    snapshot.expect_delegator_records()
        .returning(|| Ok(vec![]));

    let service = AllocationService::new(Arc::new(snapshot));

    let err = service.rebalance(&operator_weights()).await.unwrap_err();
    assert!(matches!(err.downcast_ref::<WeightError>(), Some(WeightError::EmptyStake)));

    let short = WeightVector::from_fractions(vec![(SubnetId(2), Decimal::from_str("0.5").unwrap())]).unwrap();
    let err = service.rebalance(&short).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<WeightError>(),
        Some(WeightError::InvalidWeightSum { .. })
    ));
}

#[tokio::test]
async fn test_snapshot_failure_propagates() {
    let mut snapshot = MockSnapshot::new();
    snapshot.expect_delegator_records()
        .returning(|| Err(anyhow!("connection refused")));

    let service = AllocationService::new(Arc::new(snapshot));

    assert!(service.current().await.is_err());
}

#[tokio::test]
async fn test_reconcile_updates_clears_and_skips() -> Result<()> {
    let mut repo = MockDelegationRepo::new();
    repo.expect_list_accounts()
        .times(1)
        .returning(|| Ok(vec!["alice".to_string(), "bob".to_string(), "carol".to_string()]));
    repo.expect_update_stake()
        .withf(|account, stake| account.to_string() == "alice" && stake == &Some(Stake(5_000)))
        .times(1)
        .returning(|_, _| Ok(()));
    repo.expect_update_stake()
        .withf(|account, stake| account.to_string() == "bob" && stake.is_none())
        .times(1)
        .returning(|_, _| Ok(()));

    let mut ledger = MockLedger::new();
    ledger.expect_stake_for()
        .withf(|_, hotkey| hotkey.to_string() == "5Validator")
        .times(3)
        .returning(|account, _| match account {
            "alice" => Ok(Some(Stake(5_000))),
            "bob" => Ok(None),
            _ => Err(anyhow!("rpc timeout")),
        });

    let service = StakeSyncService::new(Arc::new(repo), Arc::new(ledger), "5Validator");
    let report = service.reconcile_once().await?;

    assert_eq!(
        report,
        SyncReport {
            updated: 1,
            cleared: 1,
            failed: 1,
        }
    );
    assert_eq!(service.validator_hotkey(), "5Validator");

    Ok(())
}

#[tokio::test]
async fn test_reconcile_aborts_on_repository_failure() {
    let mut repo = MockDelegationRepo::new();
    repo.expect_list_accounts()
        .returning(|| Err(anyhow!("database unavailable")));

    let ledger = MockLedger::new();

    let service = StakeSyncService::new(Arc::new(repo), Arc::new(ledger), "5Validator");

    assert!(service.reconcile_once().await.is_err());
}

#[tokio::test]
async fn test_run_stops_on_shutdown() {
    let mut repo = MockDelegationRepo::new();
    repo.expect_list_accounts()
        .returning(|| Ok(vec![]));

    let service = StakeSyncService::new(Arc::new(repo), Arc::new(MockLedger::new()), "5Validator");
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    shutdown_tx.send(true).unwrap();

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        service.run(Duration::from_millis(10), shutdown_rx),
    )
    .await;

    let outcome = tokio_test::assert_ok!(result);
    tokio_test::assert_ok!(outcome);
}

#[tokio::test]
async fn test_run_reconciles_on_tick_until_shutdown() {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);

    let mut repo = MockDelegationRepo::new();
    let signal = shutdown_tx.clone();
    repo.expect_list_accounts()
        .times(1..)
        .returning(move || {
            signal.send(true).ok();
            Ok(vec!["alice".to_string()])
        });
    repo.expect_update_stake()
        .withf(|account, stake| account.to_string() == "alice" && stake == &Some(Stake(7)))
        .times(1..)
        .returning(|_, _| Ok(()));

    let mut ledger = MockLedger::new();
    ledger.expect_stake_for()
        .times(1..)
        .returning(|_, _| Ok(Some(Stake(7))));

    let service = StakeSyncService::new(Arc::new(repo), Arc::new(ledger), "5Validator");

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        service.run(Duration::from_millis(10), shutdown_rx),
    )
    .await;

    let outcome = tokio_test::assert_ok!(result);
    tokio_test::assert_ok!(outcome);
    assert!(*shutdown_tx.borrow());
}
