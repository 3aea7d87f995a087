use anchor_lang::prelude::*;

#[event]
pub struct ConfigUpdated {
    pub admin: Pubkey,
    pub purchase_executor: Pubkey,
    pub ticket_price: u64,
    pub round_duration_sec: u32,
    pub purchase_window_sec: u32,
    pub purchase_bps: u16,
    pub owner_bps: u16,
    pub purchase_budget_cap: u64,
    pub paused: bool,
}

#[event]
pub struct AllowlistUpdated {
    pub kind: u8,
    pub key: Pubkey,
    pub allowed: bool,
    pub entries: u32,
}

#[event]
pub struct RoundStarted {
    pub round_id: u64,
    pub round: Pubkey,
    pub vault: Pubkey,
    pub start_ts: i64,
    pub end_ts: i64,
}

#[event]
pub struct TicketsPurchased {
    pub round_id: u64,
    pub user: Pubkey,
    pub tickets_added: u64,
    pub lamports: u64,
    pub participant_index: u16,
    pub deposited_after: u64,
    pub total_tickets_after: u64,
    pub purchase_budget_after: u64,
}

#[event]
pub struct MarketplacePurchaseExecuted {
    pub round_id: u64,
    pub prize_index: u32,
    pub marketplace: Pubkey,
    pub asset_mint: Pubkey,
    pub kind: u8,
    pub amount: u64,
    pub native_price: u64,
    pub native_spent: u64,
    pub spent_after: u64,
}

#[event]
pub struct DrawRequested {
    pub round_id: u64,
    pub prize_count: u32,
    pub jackpot: u64,
    pub randomness_requested: bool,
}

#[event]
pub struct DrawRandomnessReady {
    pub round_id: u64,
}

#[event]
pub struct WinnerDrawn {
    pub round_id: u64,
    pub prize_index: u32,
    pub winning_ticket: u64,
    pub owner: Pubkey,
}

#[event]
pub struct RoundFinalized {
    pub round_id: u64,
    pub owner_amount: u64,
    pub fee_recipient: Pubkey,
    pub winners_drawn: u32,
}

#[event]
pub struct PrizeClaimed {
    pub round_id: u64,
    pub prize_index: u32,
    pub owner: Pubkey,
    pub kind: u8,
    pub amount: u64,
}

impl From<&crate::state::Config> for ConfigUpdated {
    fn from(cfg: &crate::state::Config) -> Self {
        Self {
            admin: cfg.admin,
            purchase_executor: cfg.purchase_executor,
            ticket_price: cfg.ticket_price,
            round_duration_sec: cfg.round_duration_sec,
            purchase_window_sec: cfg.purchase_window_sec,
            purchase_bps: cfg.purchase_bps,
            owner_bps: cfg.owner_bps,
            purchase_budget_cap: cfg.purchase_budget_cap,
            paused: cfg.paused,
        }
    }
}
