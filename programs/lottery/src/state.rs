use anchor_lang::prelude::*;
use bytemuck::{Pod, Zeroable};

use crate::constants::{
    MAX_ALLOWLIST_ENTRIES, MAX_PARTICIPANTS, SEED_ALLOWLIST_ASSET, SEED_ALLOWLIST_MARKETPLACE,
};
use crate::errors::ErrorCode;
use crate::utils::purchase_window_open;

/// Participant table of a round. bytemuck has no Pod impl for arrays this long.
#[derive(Copy, Clone)]
#[repr(C)]
pub struct ParticipantsArray {
    pub data: [[u8; 32]; MAX_PARTICIPANTS],
}

unsafe impl Pod for ParticipantsArray {}
unsafe impl Zeroable for ParticipantsArray {}

/// Fenwick tree over per-participant ticket counts, 1-indexed.
#[derive(Copy, Clone)]
#[repr(C)]
pub struct FenwickTree {
    pub data: [u64; MAX_PARTICIPANTS + 1],
}

unsafe impl Pod for FenwickTree {}
unsafe impl Zeroable for FenwickTree {}

macro_rules! bytemuck_array_idl {
    ($name:ident, $ty:expr) => {
        #[cfg(feature = "idl-build")]
        impl anchor_lang::IdlBuild for $name {
            fn create_type() -> Option<anchor_lang::idl::types::IdlTypeDef> {
                use anchor_lang::idl::types::*;
                Some(IdlTypeDef {
                    name: stringify!($name).to_string(),
                    docs: vec![],
                    serialization: IdlSerialization::Bytemuck,
                    repr: Some(IdlRepr::C(IdlReprModifier {
                        packed: false,
                        align: None,
                    })),
                    generics: vec![],
                    ty: IdlTypeDefTy::Struct {
                        fields: Some(IdlDefinedFields::Named(vec![IdlField {
                            name: "data".to_string(),
                            docs: vec![],
                            ty: $ty,
                        }])),
                    },
                })
            }

            fn insert_types(
                types: &mut std::collections::BTreeMap<String, anchor_lang::idl::types::IdlTypeDef>,
            ) {
                if let Some(ty) = Self::create_type() {
                    types.insert(stringify!($name).to_string(), ty);
                }
            }

            fn get_full_path() -> String {
                stringify!($name).to_string()
            }
        }
    };
}

bytemuck_array_idl!(
    ParticipantsArray,
    IdlType::Array(
        Box::new(IdlType::Array(Box::new(IdlType::U8), IdlArrayLen::Value(32))),
        IdlArrayLen::Value(MAX_PARTICIPANTS),
    )
);
bytemuck_array_idl!(
    FenwickTree,
    IdlType::Array(Box::new(IdlType::U64), IdlArrayLen::Value(MAX_PARTICIPANTS + 1))
);

/// Lifecycle phase of a round at a given instant.
///
/// Every reader of round state (instructions and the off-chain cron alike)
/// goes through [`RoundPhase::at`] so the window boundaries are defined once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// Accepting deposits (`now < end`).
    Open,
    /// `end <= now <= end + purchase_window`: deposits closed, purchases allowed.
    InPurchaseWindow,
    /// Purchase window over; drawing and finalization happen here.
    Closed,
    Finalized,
}

impl RoundPhase {
    pub fn at(end_ts: i64, purchase_window: i64, now: i64, finalized: bool) -> Self {
        if finalized {
            RoundPhase::Finalized
        } else if now < end_ts {
            RoundPhase::Open
        } else if purchase_window_open(end_ts, purchase_window, now) {
            RoundPhase::InPurchaseWindow
        } else {
            RoundPhase::Closed
        }
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrizeKind {
    Native = 0,
    Token = 1,
    Nft = 2,
}

impl PrizeKind {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(PrizeKind::Native),
            1 => Some(PrizeKind::Token),
            2 => Some(PrizeKind::Nft),
            _ => None,
        }
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowlistKind {
    Marketplace = 0,
    Asset = 1,
}

impl AllowlistKind {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(AllowlistKind::Marketplace),
            1 => Some(AllowlistKind::Asset),
            _ => None,
        }
    }

    pub fn seed(self) -> &'static [u8] {
        match self {
            AllowlistKind::Marketplace => SEED_ALLOWLIST_MARKETPLACE,
            AllowlistKind::Asset => SEED_ALLOWLIST_ASSET,
        }
    }
}

#[account]
pub struct Config {
    pub admin: Pubkey,
    pub fee_recipient: Pubkey,
    /// Only signer allowed to spend round budgets on marketplace purchases.
    pub purchase_executor: Pubkey,
    /// Lamports per ticket.
    pub ticket_price: u64,
    pub round_duration_sec: u32,
    pub purchase_window_sec: u32,
    pub purchase_bps: u16,
    pub owner_bps: u16,
    /// Absolute ceiling on a round's purchase budget in lamports. 0 = uncapped.
    pub purchase_budget_cap: u64,
    pub current_round_id: u64,
    pub paused: bool,
    pub bump: u8,
    pub prize_vault_bump: u8,
    pub reserved: [u8; 29],
}

impl Config {
    pub const SPACE: usize = 8
        + 32 + 32 + 32
        + 8
        + 4 + 4
        + 2 + 2
        + 8
        + 8
        + 1 + 1 + 1
        + 29;

    pub fn purchase_window(&self) -> i64 {
        self.purchase_window_sec as i64
    }
}

/// Round account, zero-copy (~8KB).
/// Instructions go through `AccountLoader<'info, Round>` and `.load()` / `.load_mut()`.
#[account(zero_copy)]
#[repr(C)]
pub struct Round {
    pub round_id: u64,
    pub bump: u8,
    pub vault_bump: u8,
    pub closed: u8,
    pub finalized: u8,
    pub draw_requested: u8,
    pub randomness_ready: u8,
    pub participants_count: u16,

    pub start_ts: i64,
    pub end_ts: i64,

    pub deposited: u64,
    pub purchase_budget: u64,
    pub owner_amount: u64,
    pub spent: u64,
    pub total_tickets: u64,

    pub prize_count: u32,
    pub winners_drawn: u32,

    pub randomness: [u8; 32],

    pub participants: ParticipantsArray,
    pub bit: FenwickTree,

    pub reserved: [u8; 64],
}

impl Round {
    pub const SPACE: usize = 8 + core::mem::size_of::<Round>();

    pub fn participant_pubkey(&self, index: usize) -> Pubkey {
        Pubkey::new_from_array(self.participants.data[index])
    }

    /// `closed` is latched lazily, so time alone also closes a round.
    pub fn is_closed(&self, now: i64) -> bool {
        self.closed != 0 || now >= self.end_ts
    }

    pub fn phase(&self, purchase_window: i64, now: i64) -> RoundPhase {
        RoundPhase::at(self.end_ts, purchase_window, now, self.finalized != 0)
    }

    pub fn remaining_budget(&self) -> u64 {
        self.purchase_budget.saturating_sub(self.spent)
    }

    pub fn undrawn_slots(&self) -> u32 {
        self.prize_count.saturating_sub(self.winners_drawn)
    }
}

#[account]
#[derive(Default)]
pub struct Participant {
    pub round: Pubkey,
    pub user: Pubkey,
    pub index: u16,
    pub bump: u8,
    pub tickets: u64,
    pub lamports: u64,
    pub deposits_count: u32,
    pub reserved: [u8; 16],
}

impl Participant {
    pub const SPACE: usize = 8
        + 32 + 32
        + 2 + 1
        + 8 + 8
        + 4
        + 16;
}

/// One entry of a round's append-only prize list, PDA `["prize", round_id, index]`.
#[account]
#[derive(Default)]
pub struct Prize {
    pub round_id: u64,
    pub index: u32,
    pub kind: u8,
    pub bump: u8,
    pub drawn: bool,
    pub claimed: bool,
    /// Mint of the purchased asset. Default pubkey for native prizes.
    pub asset_mint: Pubkey,
    pub amount: u64,
    pub winning_ticket: u64,
    pub owner: Pubkey,
    pub claimed_at: i64,
}

impl Prize {
    pub const SPACE: usize = 8
        + 8 + 4
        + 1 + 1 + 1 + 1
        + 32
        + 8 + 8
        + 32
        + 8;

    pub fn prize_kind(&self) -> Option<PrizeKind> {
        PrizeKind::from_u8(self.kind)
    }

    pub fn is_claimable_by(&self, who: &Pubkey) -> bool {
        self.drawn && !self.claimed && self.owner == *who
    }
}

#[account]
pub struct Allowlist {
    pub kind: u8,
    pub bump: u8,
    pub entries: Vec<Pubkey>,
}

impl Allowlist {
    pub const SPACE: usize = 8 + 1 + 1 + 4 + 32 * MAX_ALLOWLIST_ENTRIES;

    pub fn contains(&self, key: &Pubkey) -> bool {
        self.entries.iter().any(|k| k == key)
    }

    /// Adds or removes `key`. Returns whether the list changed.
    pub fn set(&mut self, key: Pubkey, allowed: bool) -> Result<bool> {
        let position = self.entries.iter().position(|k| *k == key);
        match (allowed, position) {
            (true, None) => {
                require!(
                    self.entries.len() < MAX_ALLOWLIST_ENTRIES,
                    ErrorCode::AllowlistFull
                );
                self.entries.push(key);
                Ok(true)
            }
            (false, Some(i)) => {
                self.entries.swap_remove(i);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_tracks_window_boundaries() {
        let end = 1_000;
        let window = 500;
        assert_eq!(RoundPhase::at(end, window, end - 1, false), RoundPhase::Open);
        assert_eq!(RoundPhase::at(end, window, end, false), RoundPhase::InPurchaseWindow);
        assert_eq!(
            RoundPhase::at(end, window, end + window, false),
            RoundPhase::InPurchaseWindow
        );
        assert_eq!(RoundPhase::at(end, window, end + window + 1, false), RoundPhase::Closed);
    }

    #[test]
    fn finalized_wins_over_time() {
        assert_eq!(RoundPhase::at(1_000, 500, 10, true), RoundPhase::Finalized);
        assert_eq!(RoundPhase::at(1_000, 500, 1_200, true), RoundPhase::Finalized);
    }

    #[test]
    fn zero_window_still_opens_at_end() {
        assert_eq!(RoundPhase::at(1_000, 0, 1_000, false), RoundPhase::InPurchaseWindow);
        assert_eq!(RoundPhase::at(1_000, 0, 1_001, false), RoundPhase::Closed);
    }

    #[test]
    fn round_layout_has_no_padding() {
        assert_eq!(core::mem::size_of::<Round>(), 8184);
        assert_eq!(Round::SPACE, 8192);
    }

    #[test]
    fn allowlist_set_is_idempotent() {
        let mut list = Allowlist {
            kind: AllowlistKind::Asset as u8,
            bump: 255,
            entries: vec![],
        };
        let key = Pubkey::new_unique();
        assert!(list.set(key, true).unwrap());
        assert!(!list.set(key, true).unwrap());
        assert!(list.contains(&key));
        assert!(list.set(key, false).unwrap());
        assert!(!list.set(key, false).unwrap());
        assert!(!list.contains(&key));
    }

    #[test]
    fn allowlist_rejects_past_capacity() {
        let mut list = Allowlist {
            kind: AllowlistKind::Marketplace as u8,
            bump: 255,
            entries: (0..MAX_ALLOWLIST_ENTRIES).map(|_| Pubkey::new_unique()).collect(),
        };
        assert_eq!(
            list.set(Pubkey::new_unique(), true).unwrap_err(),
            ErrorCode::AllowlistFull.into()
        );
    }

    #[test]
    fn allowlist_kinds_map_to_distinct_seeds() {
        assert_eq!(AllowlistKind::from_u8(0), Some(AllowlistKind::Marketplace));
        assert_eq!(AllowlistKind::from_u8(1), Some(AllowlistKind::Asset));
        assert_eq!(AllowlistKind::from_u8(2), None);
        assert_ne!(AllowlistKind::Marketplace.seed(), AllowlistKind::Asset.seed());
    }

    #[test]
    fn prize_claimable_only_by_drawn_owner() {
        let owner = Pubkey::new_unique();
        let mut prize = Prize {
            owner,
            ..Default::default()
        };
        assert!(!prize.is_claimable_by(&owner));
        prize.drawn = true;
        assert!(prize.is_claimable_by(&owner));
        assert!(!prize.is_claimable_by(&Pubkey::new_unique()));
        prize.claimed = true;
        assert!(!prize.is_claimable_by(&owner));
    }
}
