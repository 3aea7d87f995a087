mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use purchase_cron::clock::FixedClock;
use purchase_cron::driver::RoundLifecycleDriver;
use purchase_cron::error::{DriverError, ExecError, LedgerError, TickError};
use purchase_cron::ledger::RoundSnapshot;
use purchase_cron::scheduler::{ChainOutcome, Scheduler};
use purchase_cron::task::{PurchaseTask, StaticTaskSource};

const END: i64 = 1_000;
const WINDOW: i64 = 500;
const BUDGET: u64 = 1_000_000_000;

fn scheduler(
    chains: Vec<purchase_cron::config::ChainEntry>,
    deployments: &[&str],
    connector: MockConnector,
    task: Option<PurchaseTask>,
    now: i64,
) -> Scheduler {
    Scheduler::new(
        cron_config(chains),
        Arc::new(MapDeployments::of(deployments)),
        Arc::new(connector),
        Arc::new(StaticTaskSource::new(task)),
        Arc::new(FixedClock(now)),
    )
}

fn single_chain(ledger: Arc<MockLedger>, task: Option<PurchaseTask>, now: i64) -> Scheduler {
    scheduler(
        vec![configured("devnet")],
        &["devnet"],
        MockConnector::default().with("devnet", ledger),
        task,
        now,
    )
}

#[tokio::test]
async fn purchases_once_inside_window() {
    let ledger = MockLedger::with_round(END, WINDOW, BUDGET);
    let report = single_chain(ledger.clone(), Some(task(SOL_0_01, SOL_0_02)), 1_200)
        .tick()
        .await;

    assert_eq!(report.attempts(), 1);
    assert!(matches!(
        report.outcome("devnet"),
        Some(ChainOutcome::Attempted { round_id: 1, .. })
    ));
    assert_eq!(
        ledger.purchases(),
        vec![Purchase {
            round_id: 1,
            prize_index: 0,
            value: SOL_0_01,
            cap: SOL_0_02,
        }]
    );
}

#[tokio::test]
async fn no_purchase_after_window() {
    let ledger = MockLedger::with_round(END, WINDOW, BUDGET);
    let report = single_chain(ledger.clone(), Some(task(SOL_0_01, SOL_0_02)), 1_600)
        .tick()
        .await;

    assert_eq!(report.attempts(), 0);
    assert!(matches!(
        report.outcome("devnet"),
        Some(ChainOutcome::WindowClosed { round_id: 1 })
    ));
    assert!(ledger.purchases().is_empty());
}

#[tokio::test]
async fn gate_edges_through_a_full_tick() {
    for (now, expect) in [(999, false), (1_000, true), (1_500, true), (1_501, false)] {
        let ledger = MockLedger::with_round(END, WINDOW, BUDGET);
        let report = single_chain(ledger.clone(), Some(task(SOL_0_01, SOL_0_02)), now)
            .tick()
            .await;
        assert_eq!(report.attempts() == 1, expect, "now = {now}");
        assert_eq!(ledger.purchases().len(), usize::from(expect), "now = {now}");
    }
}

#[tokio::test]
async fn over_cap_task_never_reaches_the_ledger() {
    let ledger = MockLedger::with_round(END, WINDOW, BUDGET);
    let report = single_chain(ledger.clone(), Some(task(SOL_0_05, SOL_0_02)), 1_200)
        .tick()
        .await;

    match report.outcome("devnet") {
        Some(ChainOutcome::Failed(TickError::ExecutionFailure(ExecError::CapExceeded {
            price,
            cap,
        }))) => {
            assert_eq!(*price, SOL_0_05);
            assert_eq!(*cap, SOL_0_02);
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(ledger.purchases().is_empty());
    // only the oracle read; the executor bailed before its fresh read
    assert_eq!(ledger.round_reads(), 1);

    let ledger = MockLedger::with_round(END, WINDOW, BUDGET);
    let report = single_chain(ledger.clone(), Some(task(SOL_0_05, SOL_0_02)), 1_600)
        .tick()
        .await;
    assert_eq!(report.attempts(), 0);
    assert!(ledger.purchases().is_empty());
}

#[tokio::test]
async fn no_task_means_no_write() {
    let ledger = MockLedger::with_round(END, WINDOW, BUDGET);
    let report = single_chain(ledger.clone(), None, 1_200).tick().await;

    assert!(matches!(
        report.outcome("devnet"),
        Some(ChainOutcome::NoTaskAvailable { round_id: 1 })
    ));
    assert!(ledger.purchases().is_empty());
    assert!(ledger.writes().is_empty());
}

#[tokio::test]
async fn read_failure_skips_the_chain() {
    let ledger = MockLedger::with_round(END, WINDOW, BUDGET);
    ledger.state.lock().unwrap().fail_reads = true;
    let report = single_chain(ledger.clone(), Some(task(SOL_0_01, SOL_0_02)), 1_200)
        .tick()
        .await;

    assert!(matches!(
        report.outcome("devnet"),
        Some(ChainOutcome::Failed(TickError::ReadFailure(LedgerError::Rpc(_))))
    ));
    assert!(ledger.purchases().is_empty());
}

#[tokio::test]
async fn no_round_yet_is_a_read_failure() {
    let ledger = Arc::new(MockLedger::default());
    let report = single_chain(ledger.clone(), Some(task(SOL_0_01, SOL_0_02)), 1_200)
        .tick()
        .await;

    assert!(matches!(
        report.outcome("devnet"),
        Some(ChainOutcome::Failed(TickError::ReadFailure(LedgerError::NoRound)))
    ));
}

#[tokio::test]
async fn failing_chain_does_not_block_the_next() {
    let broken = MockLedger::with_round(END, WINDOW, BUDGET);
    broken.state.lock().unwrap().fail_reads = true;
    let healthy = MockLedger::with_round(END, WINDOW, BUDGET);

    let report = scheduler(
        vec![configured("alpha"), configured("beta")],
        &["alpha", "beta"],
        MockConnector::default()
            .with("alpha", broken.clone())
            .with("beta", healthy.clone()),
        Some(task(SOL_0_01, SOL_0_02)),
        1_200,
    )
    .tick()
    .await;

    assert!(matches!(report.outcome("alpha"), Some(ChainOutcome::Failed(_))));
    assert!(report.outcome("beta").is_some_and(ChainOutcome::attempted));
    assert!(broken.purchases().is_empty());
    assert_eq!(healthy.purchases().len(), 1);
}

#[tokio::test]
async fn submission_failure_does_not_block_the_next() {
    let rejecting = MockLedger::with_round(END, WINDOW, BUDGET);
    rejecting.state.lock().unwrap().fail_submissions = true;
    let healthy = MockLedger::with_round(END, WINDOW, BUDGET);

    let report = scheduler(
        vec![configured("alpha"), configured("beta")],
        &["alpha", "beta"],
        MockConnector::default()
            .with("alpha", rejecting)
            .with("beta", healthy.clone()),
        Some(task(SOL_0_01, SOL_0_02)),
        1_200,
    )
    .tick()
    .await;

    assert!(matches!(
        report.outcome("alpha"),
        Some(ChainOutcome::Failed(TickError::ExecutionFailure(ExecError::Submission(_))))
    ));
    assert_eq!(healthy.purchases().len(), 1);
}

#[tokio::test]
async fn unconfigured_chain_is_skipped() {
    let ledger = MockLedger::with_round(END, WINDOW, BUDGET);
    let report = scheduler(
        vec![unconfigured("mainnet"), configured("devnet")],
        &["mainnet", "devnet"],
        MockConnector::default().with("devnet", ledger.clone()),
        Some(task(SOL_0_01, SOL_0_02)),
        1_200,
    )
    .tick()
    .await;

    assert!(matches!(
        report.outcome("mainnet"),
        Some(ChainOutcome::Failed(TickError::ConfigurationMissing(_)))
    ));
    assert!(report.outcome("devnet").is_some_and(ChainOutcome::attempted));
}

#[tokio::test]
async fn missing_deployment_record_is_configuration_missing() {
    let ledger = MockLedger::with_round(END, WINDOW, BUDGET);
    let report = scheduler(
        vec![configured("devnet")],
        &[],
        MockConnector::default().with("devnet", ledger.clone()),
        Some(task(SOL_0_01, SOL_0_02)),
        1_200,
    )
    .tick()
    .await;

    assert!(matches!(
        report.outcome("devnet"),
        Some(ChainOutcome::Failed(TickError::ConfigurationMissing(_)))
    ));
    assert_eq!(ledger.round_reads(), 0);
}

#[tokio::test]
async fn exhausted_budget_is_not_spent_again() {
    let ledger = MockLedger::with_round(END, WINDOW, SOL_0_02);
    ledger.update_round(1, |r| r.spent = 15_000_000);

    let report = single_chain(ledger.clone(), Some(task(SOL_0_01, SOL_0_02)), 1_200)
        .tick()
        .await;

    assert!(matches!(
        report.outcome("devnet"),
        Some(ChainOutcome::Failed(TickError::ExecutionFailure(
            ExecError::BudgetExhausted { remaining: 5_000_000, .. }
        )))
    ));
    assert!(ledger.purchases().is_empty());
}

#[tokio::test]
async fn fresh_read_before_submission_wins() {
    let ledger = MockLedger::with_round(END, WINDOW, BUDGET);
    // oracle sees budget; the executor's re-read sees it spent
    let snapshot = ledger.state.lock().unwrap().rounds[&1].clone();
    {
        let mut s = ledger.state.lock().unwrap();
        s.scripted_reads.push_back(snapshot.clone());
        s.scripted_reads.push_back(RoundSnapshot {
            spent: BUDGET,
            ..snapshot
        });
    }

    let report = single_chain(ledger.clone(), Some(task(SOL_0_01, SOL_0_02)), 1_200)
        .tick()
        .await;

    assert!(matches!(
        report.outcome("devnet"),
        Some(ChainOutcome::Failed(TickError::ExecutionFailure(
            ExecError::BudgetExhausted { remaining: 0, .. }
        )))
    ));
    assert_eq!(ledger.round_reads(), 2);
    assert!(ledger.purchases().is_empty());
}

#[tokio::test]
async fn consecutive_ticks_fill_consecutive_prize_slots() {
    let ledger = MockLedger::with_round(END, WINDOW, BUDGET);
    let sched = single_chain(ledger.clone(), Some(task(SOL_0_01, SOL_0_02)), 1_200);

    sched.tick().await;
    sched.tick().await;

    let slots: Vec<u32> = ledger.purchases().iter().map(|p| p.prize_index).collect();
    assert_eq!(slots, vec![0, 1]);
}

#[tokio::test(start_paused = true)]
async fn slow_chain_defers_the_rest_of_the_tick() {
    let slow = MockLedger::with_round(END, WINDOW, BUDGET);
    slow.state.lock().unwrap().read_delay = Some(Duration::from_secs(60));
    let later = MockLedger::with_round(END, WINDOW, BUDGET);

    let report = scheduler(
        vec![configured("alpha"), configured("beta")],
        &["alpha", "beta"],
        MockConnector::default()
            .with("alpha", slow.clone())
            .with("beta", later.clone()),
        Some(task(SOL_0_01, SOL_0_02)),
        1_200,
    )
    .tick()
    .await;

    assert!(report.outcome("alpha").is_some_and(ChainOutcome::attempted));
    assert!(matches!(report.outcome("beta"), Some(ChainOutcome::Deferred)));
    assert!(later.purchases().is_empty());
    assert_eq!(later.round_reads(), 0);
}

#[tokio::test]
async fn early_next_round_cannot_skip_the_purchase_window() {
    let ledger = MockLedger::with_round(END, WINDOW, BUDGET);

    let at_end = FixedClock(END);
    let err = RoundLifecycleDriver::new(ledger.as_ref(), &at_end)
        .start_next_round()
        .await
        .unwrap_err();
    assert!(matches!(err, DriverError::PreviousRoundOpen { round_id: 1, .. }));

    let report = single_chain(ledger.clone(), Some(task(SOL_0_01, SOL_0_02)), 1_200)
        .tick()
        .await;
    assert!(matches!(
        report.outcome("devnet"),
        Some(ChainOutcome::Attempted { round_id: 1, .. })
    ));
    assert_eq!(ledger.purchases().len(), 1);
    assert_eq!(ledger.purchases()[0].round_id, 1);
}
