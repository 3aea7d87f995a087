//! Port to the on-chain lottery program.

use std::sync::Arc;

use async_trait::async_trait;
use lottery::state::{Prize, PrizeKind, Round, RoundPhase};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;

use crate::config::ChainCredentials;
use crate::deployment::ChainDeployment;
use crate::error::{ConfigError, LedgerError};
use crate::task::PurchaseTask;

/// Decoded round state as the cron sees it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoundSnapshot {
    pub round_id: u64,
    pub start: i64,
    pub end: i64,
    pub deposited: u64,
    pub purchase_budget: u64,
    pub owner_amount: u64,
    pub spent: u64,
    pub total_tickets: u64,
    pub closed: bool,
    pub finalized: bool,
    pub draw_requested: bool,
    pub randomness_ready: bool,
    pub prize_count: u32,
    pub winners_drawn: u32,
}

impl RoundSnapshot {
    pub fn phase(&self, purchase_window: i64, now: i64) -> RoundPhase {
        RoundPhase::at(self.end, purchase_window, now, self.finalized)
    }

    pub fn remaining_budget(&self) -> u64 {
        self.purchase_budget.saturating_sub(self.spent)
    }

    pub fn undrawn_slots(&self) -> u32 {
        self.prize_count.saturating_sub(self.winners_drawn)
    }
}

impl From<&Round> for RoundSnapshot {
    fn from(r: &Round) -> Self {
        Self {
            round_id: r.round_id,
            start: r.start_ts,
            end: r.end_ts,
            deposited: r.deposited,
            purchase_budget: r.purchase_budget,
            owner_amount: r.owner_amount,
            spent: r.spent,
            total_tickets: r.total_tickets,
            closed: r.closed != 0,
            finalized: r.finalized != 0,
            draw_requested: r.draw_requested != 0,
            randomness_ready: r.randomness_ready != 0,
            prize_count: r.prize_count,
            winners_drawn: r.winners_drawn,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrizeSnapshot {
    pub round_id: u64,
    pub index: u32,
    pub kind: PrizeKind,
    /// `None` for native prizes.
    pub asset_mint: Option<Pubkey>,
    pub amount: u64,
    pub drawn: bool,
    pub claimed: bool,
    /// Set once the slot is drawn.
    pub owner: Option<Pubkey>,
}

impl PrizeSnapshot {
    pub fn from_account(prize: &Prize) -> Option<Self> {
        let kind = prize.prize_kind()?;
        Some(Self {
            round_id: prize.round_id,
            index: prize.index,
            kind,
            asset_mint: (kind != PrizeKind::Native).then_some(prize.asset_mint),
            amount: prize.amount,
            drawn: prize.drawn,
            claimed: prize.claimed,
            owner: prize.drawn.then_some(prize.owner),
        })
    }

    pub fn claimable_by(&self, who: &Pubkey) -> bool {
        self.drawn && !self.claimed && self.owner.as_ref() == Some(who)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub signature: Signature,
}

/// Reads and writes against one chain's lottery deployment.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn current_round_id(&self) -> Result<u64, LedgerError>;

    async fn round(&self, round_id: u64) -> Result<RoundSnapshot, LedgerError>;

    /// Seconds after `end` during which purchases are allowed.
    async fn purchase_window(&self) -> Result<i64, LedgerError>;

    async fn prizes(&self, round_id: u64) -> Result<Vec<PrizeSnapshot>, LedgerError>;

    /// Funds the purchase from the round vault, up to `task.native_price`.
    /// `prize_index` is the slot the bought asset will occupy.
    async fn execute_marketplace_purchase(
        &self,
        round_id: u64,
        prize_index: u32,
        task: &PurchaseTask,
    ) -> Result<TxReceipt, LedgerError>;

    async fn request_draw(&self, round_id: u64) -> Result<TxReceipt, LedgerError>;

    /// `batch_size == 0` draws every remaining slot.
    async fn draw_winners(&self, round_id: u64, batch_size: u32) -> Result<TxReceipt, LedgerError>;

    async fn finalize_round(&self, round_id: u64) -> Result<TxReceipt, LedgerError>;

    async fn start_next_round(&self) -> Result<TxReceipt, LedgerError>;
}

/// Builds a ledger handle for a chain from its deployment and credentials.
pub trait LedgerConnector: Send + Sync {
    fn connect(
        &self,
        deployment: &ChainDeployment,
        credentials: &ChainCredentials,
    ) -> Result<Arc<dyn Ledger>, ConfigError>;
}
