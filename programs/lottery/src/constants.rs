pub const MAX_PARTICIPANTS: usize = 200;
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Upper bound on keys held by one allowlist account.
pub const MAX_ALLOWLIST_ENTRIES: usize = 32;
/// Marketplace instruction data must fit a single transaction next to our own args.
pub const MAX_CALLDATA_LEN: usize = 800;

pub const SEED_CFG: &[u8] = b"cfg";
pub const SEED_ROUND: &[u8] = b"round";
pub const SEED_VAULT: &[u8] = b"vault";
pub const SEED_PARTICIPANT: &[u8] = b"p";
pub const SEED_PRIZE: &[u8] = b"prize";
pub const SEED_PRIZE_VAULT: &[u8] = b"prize_vault";
pub const SEED_ALLOWLIST_MARKETPLACE: &[u8] = b"allowlist_marketplace";
pub const SEED_ALLOWLIST_ASSET: &[u8] = b"allowlist_asset";
