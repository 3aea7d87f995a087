use crate::error::LedgerError;
use crate::ledger::{Ledger, RoundSnapshot};

/// The current round together with the deployment's purchase window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundView {
    pub round_id: u64,
    pub round: RoundSnapshot,
    pub purchase_window: i64,
}

/// Read-only view of a chain's round state.
pub struct RoundOracle<'a> {
    ledger: &'a dyn Ledger,
}

impl<'a> RoundOracle<'a> {
    pub fn new(ledger: &'a dyn Ledger) -> Self {
        Self { ledger }
    }

    pub async fn read(&self) -> Result<RoundView, LedgerError> {
        let round_id = self.ledger.current_round_id().await?;
        if round_id == 0 {
            return Err(LedgerError::NoRound);
        }
        let round = self.ledger.round(round_id).await?;
        let purchase_window = self.ledger.purchase_window().await?;
        Ok(RoundView {
            round_id,
            round,
            purchase_window,
        })
    }
}
