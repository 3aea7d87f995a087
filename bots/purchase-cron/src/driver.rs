//! Operator actions on round lifecycle. Each one checks its preconditions
//! against a fresh read before sending; the program checks them again.

use lottery::state::RoundPhase;
use tracing::info;

use crate::clock::Clock;
use crate::error::DriverError;
use crate::ledger::{Ledger, RoundSnapshot, TxReceipt};

pub struct RoundLifecycleDriver<'a> {
    ledger: &'a dyn Ledger,
    clock: &'a dyn Clock,
}

impl<'a> RoundLifecycleDriver<'a> {
    pub fn new(ledger: &'a dyn Ledger, clock: &'a dyn Clock) -> Self {
        Self { ledger, clock }
    }

    /// Round must be past its purchase window and not finalized.
    async fn closed_round(&self, round_id: u64) -> Result<RoundSnapshot, DriverError> {
        let round = self.ledger.round(round_id).await?;
        let window = self.ledger.purchase_window().await?;
        match round.phase(window, self.clock.now()) {
            RoundPhase::Closed => Ok(round),
            RoundPhase::Finalized => Err(DriverError::AlreadyFinalized { round_id }),
            RoundPhase::InPurchaseWindow => Err(DriverError::PurchaseWindowOpen { round_id }),
            RoundPhase::Open => Err(DriverError::RoundNotClosed { round_id }),
        }
    }

    pub async fn request_draw(&self, round_id: u64) -> Result<TxReceipt, DriverError> {
        let round = self.closed_round(round_id).await?;
        if round.draw_requested {
            return Err(DriverError::DrawAlreadyRequested { round_id });
        }
        let receipt = self.ledger.request_draw(round_id).await?;
        info!(round_id, signature = %receipt.signature, "draw requested");
        Ok(receipt)
    }

    /// `batch_size == 0` resolves every remaining slot.
    pub async fn draw_winners(&self, round_id: u64, batch_size: u32) -> Result<TxReceipt, DriverError> {
        let round = self.closed_round(round_id).await?;
        if !round.draw_requested {
            return Err(DriverError::DrawNotRequested { round_id });
        }
        if !round.randomness_ready {
            return Err(DriverError::RandomnessPending { round_id });
        }
        let remaining = round.undrawn_slots();
        if remaining == 0 {
            return Err(DriverError::NothingToDraw { round_id });
        }
        let receipt = self.ledger.draw_winners(round_id, batch_size).await?;
        info!(
            round_id,
            batch_size,
            remaining,
            signature = %receipt.signature,
            "winners drawn"
        );
        Ok(receipt)
    }

    pub async fn finalize_round(&self, round_id: u64) -> Result<TxReceipt, DriverError> {
        let round = self.closed_round(round_id).await?;
        if !round.draw_requested {
            return Err(DriverError::DrawNotRequested { round_id });
        }
        let remaining = round.undrawn_slots();
        if remaining > 0 {
            return Err(DriverError::WinnersPending { round_id, remaining });
        }
        let receipt = self.ledger.finalize_round(round_id).await?;
        info!(round_id, signature = %receipt.signature, "round finalized");
        Ok(receipt)
    }

    /// Only once the current round (if any) is past its purchase window.
    pub async fn start_next_round(&self) -> Result<TxReceipt, DriverError> {
        let current = self.ledger.current_round_id().await?;
        if current > 0 {
            let round = self.ledger.round(current).await?;
            let window = self.ledger.purchase_window().await?;
            match round.phase(window, self.clock.now()) {
                RoundPhase::Closed | RoundPhase::Finalized => {}
                RoundPhase::Open | RoundPhase::InPurchaseWindow => {
                    return Err(DriverError::PreviousRoundOpen {
                        round_id: current,
                        closes_at: round.end.saturating_add(window),
                    });
                }
            }
        }
        let receipt = self.ledger.start_next_round().await?;
        info!(round_id = current + 1, signature = %receipt.signature, "round started");
        Ok(receipt)
    }
}
