//! One tick: for every chain, read the round, evaluate the purchase gate, and
//! make at most one purchase attempt.

use std::sync::Arc;

use lottery::utils::purchase_window_open;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::config::{ChainEntry, CronConfig};
use crate::deployment::DeploymentSource;
use crate::error::TickError;
use crate::executor::PurchaseExecutor;
use crate::ledger::{LedgerConnector, RoundSnapshot, TxReceipt};
use crate::oracle::RoundOracle;
use crate::task::TaskSource;

/// Purchase gate: `end <= now <= end + purchase_window`, inclusive at both ends.
pub fn should_attempt_purchase(round: &RoundSnapshot, purchase_window: i64, now: i64) -> bool {
    purchase_window_open(round.end, purchase_window, now)
}

#[derive(Debug)]
pub enum ChainOutcome {
    Attempted { round_id: u64, receipt: TxReceipt },
    WindowClosed { round_id: u64 },
    NoTaskAvailable { round_id: u64 },
    Failed(TickError),
    /// Tick budget ran out before this chain's turn.
    Deferred,
}

impl ChainOutcome {
    pub fn attempted(&self) -> bool {
        matches!(self, ChainOutcome::Attempted { .. })
    }
}

#[derive(Debug, Default)]
pub struct TickReport {
    pub outcomes: Vec<(String, ChainOutcome)>,
}

impl TickReport {
    pub fn outcome(&self, chain: &str) -> Option<&ChainOutcome> {
        self.outcomes
            .iter()
            .find(|(c, _)| c == chain)
            .map(|(_, o)| o)
    }

    pub fn attempts(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.attempted()).count()
    }
}

pub struct Scheduler {
    config: CronConfig,
    deployments: Arc<dyn DeploymentSource>,
    connector: Arc<dyn LedgerConnector>,
    tasks: Arc<dyn TaskSource>,
    clock: Arc<dyn Clock>,
}

impl Scheduler {
    pub fn new(
        config: CronConfig,
        deployments: Arc<dyn DeploymentSource>,
        connector: Arc<dyn LedgerConnector>,
        tasks: Arc<dyn TaskSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            deployments,
            connector,
            tasks,
            clock,
        }
    }

    pub fn config(&self) -> &CronConfig {
        &self.config
    }

    /// Chains run one after another; a failure on one is recorded and the
    /// next chain still runs.
    pub async fn tick(&self) -> TickReport {
        let started = Instant::now();
        let mut report = TickReport::default();

        for entry in &self.config.chains {
            if started.elapsed() >= self.config.tick_budget {
                warn!(chain = %entry.chain, "tick budget exhausted, deferring to next tick");
                report.outcomes.push((entry.chain.clone(), ChainOutcome::Deferred));
                continue;
            }

            let outcome = self.process_chain(entry).await;
            log_outcome(&entry.chain, &outcome);
            report.outcomes.push((entry.chain.clone(), outcome));
        }

        report
    }

    async fn process_chain(&self, entry: &ChainEntry) -> ChainOutcome {
        let credentials = match &entry.credentials {
            Ok(c) => c,
            Err(e) => return ChainOutcome::Failed(TickError::ConfigurationMissing(e.clone())),
        };
        let deployment = match self.deployments.load(&entry.chain) {
            Ok(d) => d,
            Err(e) => return ChainOutcome::Failed(TickError::ConfigurationMissing(e)),
        };
        let ledger = match self.connector.connect(&deployment, credentials) {
            Ok(l) => l,
            Err(e) => return ChainOutcome::Failed(TickError::ConfigurationMissing(e)),
        };

        let view = match RoundOracle::new(ledger.as_ref()).read().await {
            Ok(v) => v,
            Err(e) => return ChainOutcome::Failed(TickError::ReadFailure(e)),
        };
        let round_id = view.round_id;

        let now = self.clock.now();
        if !should_attempt_purchase(&view.round, view.purchase_window, now) {
            debug!(
                chain = %entry.chain,
                round_id,
                now,
                end = view.round.end,
                window = view.purchase_window,
                "outside purchase window"
            );
            return ChainOutcome::WindowClosed { round_id };
        }

        let Some(task) = self.tasks.next_task(&entry.chain).await else {
            return ChainOutcome::NoTaskAvailable { round_id };
        };

        match PurchaseExecutor::new(self.clock.as_ref())
            .execute(ledger.as_ref(), &entry.chain, round_id, &task)
            .await
        {
            Ok(receipt) => ChainOutcome::Attempted { round_id, receipt },
            Err(e) => ChainOutcome::Failed(TickError::ExecutionFailure(e)),
        }
    }
}

fn log_outcome(chain: &str, outcome: &ChainOutcome) {
    match outcome {
        ChainOutcome::Attempted { round_id, receipt } => {
            info!(chain, round_id, signature = %receipt.signature, "purchase submitted")
        }
        ChainOutcome::WindowClosed { round_id } => {
            debug!(chain, round_id, "purchase window closed, nothing to do")
        }
        ChainOutcome::NoTaskAvailable { round_id } => {
            info!(chain, round_id, "purchase window open but no task available")
        }
        ChainOutcome::Failed(TickError::ExecutionFailure(e)) => {
            error!(chain, error = %e, "purchase attempt failed")
        }
        ChainOutcome::Failed(e) => warn!(chain, error = %e, "chain skipped this tick"),
        ChainOutcome::Deferred => {}
    }
}
