use tracing::{info, warn};

use crate::amount::format_sol;
use crate::clock::Clock;
use crate::error::ExecError;
use crate::ledger::{Ledger, TxReceipt};
use crate::scheduler::should_attempt_purchase;
use crate::task::PurchaseTask;

/// Submits a single funded purchase against a round's budget.
pub struct PurchaseExecutor<'a> {
    clock: &'a dyn Clock,
}

impl<'a> PurchaseExecutor<'a> {
    pub fn new(clock: &'a dyn Clock) -> Self {
        Self { clock }
    }

    /// Rejects over-cap tasks before touching the ledger, then re-reads the
    /// round and re-checks the gate and remaining budget right before sending.
    pub async fn execute(
        &self,
        ledger: &dyn Ledger,
        chain: &str,
        round_id: u64,
        task: &PurchaseTask,
    ) -> Result<TxReceipt, ExecError> {
        if task.native_price > task.max_native_spend {
            return Err(ExecError::CapExceeded {
                price: task.native_price,
                cap: task.max_native_spend,
            });
        }

        let round = ledger.round(round_id).await.map_err(ExecError::Read)?;
        let window = ledger.purchase_window().await.map_err(ExecError::Read)?;
        if !should_attempt_purchase(&round, window, self.clock.now()) {
            return Err(ExecError::WindowClosed { round_id });
        }

        let remaining = round.remaining_budget();
        if task.native_price > remaining {
            return Err(ExecError::BudgetExhausted {
                price: task.native_price,
                remaining,
            });
        }

        info!(
            chain,
            round_id,
            task = %task.fingerprint(),
            value = %format_sol(task.native_price),
            cap = %format_sol(task.max_native_spend),
            prize_index = round.prize_count,
            "submitting marketplace purchase"
        );
        match ledger
            .execute_marketplace_purchase(round_id, round.prize_count, task)
            .await
        {
            Ok(receipt) => Ok(receipt),
            Err(e) => {
                warn!(chain, round_id, task = %task.fingerprint(), error = %e, "purchase submission failed");
                Err(ExecError::Submission(e))
            }
        }
    }
}
