use solana_sdk::pubkey::Pubkey;

use crate::error::LedgerError;
use crate::ledger::{Ledger, PrizeSnapshot};

/// Drawn, unclaimed prizes owned by `owner`. Without `round_id`, every round
/// from 1 to the current one is scanned.
pub async fn claimable_prizes(
    ledger: &dyn Ledger,
    owner: &Pubkey,
    round_id: Option<u64>,
) -> Result<Vec<PrizeSnapshot>, LedgerError> {
    let rounds = match round_id {
        Some(id) => id..=id,
        None => 1..=ledger.current_round_id().await?,
    };

    let mut out = Vec::new();
    for id in rounds {
        out.extend(
            ledger
                .prizes(id)
                .await?
                .into_iter()
                .filter(|p| p.claimable_by(owner)),
        );
    }
    Ok(out)
}
