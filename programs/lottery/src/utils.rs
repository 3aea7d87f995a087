use anchor_lang::prelude::*;
use anchor_lang::solana_program::hash::hashv;
use anchor_lang::solana_program::{program::invoke_signed, system_instruction};

use crate::constants::{BPS_DENOMINATOR, SEED_VAULT};
use crate::errors::ErrorCode;
use crate::state::{PrizeKind, Round, RoundPhase};

pub struct RoundSplit {
    pub purchase_budget: u64,
    pub owner_amount: u64,
}

pub fn checked_add_u64(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b).ok_or(ErrorCode::MathOverflow.into())
}

pub fn checked_add_u32(a: u32, b: u32) -> Result<u32> {
    a.checked_add(b).ok_or(ErrorCode::MathOverflow.into())
}

pub fn checked_add_i64(a: i64, b: i64) -> Result<i64> {
    a.checked_add(b).ok_or(ErrorCode::MathOverflow.into())
}

pub fn checked_sub_u64(a: u64, b: u64) -> Result<u64> {
    a.checked_sub(b).ok_or(ErrorCode::MathOverflow.into())
}

/// Purchase gate: `end <= now <= end + window`, both ends inclusive.
pub fn purchase_window_open(end_ts: i64, purchase_window: i64, now: i64) -> bool {
    now >= end_ts && now <= end_ts.saturating_add(purchase_window)
}

/// On-chain half of the purchase checks: price and cap, window, sealed prize
/// list, remaining budget, next prize slot.
pub fn validate_purchase(
    round: &Round,
    purchase_window: i64,
    now: i64,
    native_price: u64,
    max_native_spend: u64,
    prize_index: u32,
) -> Result<()> {
    require!(native_price > 0, ErrorCode::InvalidPurchasePrice);
    require!(native_price <= max_native_spend, ErrorCode::SpendCapExceeded);
    require!(
        round.phase(purchase_window, now) == RoundPhase::InPurchaseWindow,
        ErrorCode::PurchaseWindowClosed
    );
    // jackpot amount is fixed once the draw is requested
    require!(round.draw_requested == 0, ErrorCode::DrawAlreadyRequested);
    require!(
        native_price <= round.remaining_budget(),
        ErrorCode::PurchaseBudgetExceeded
    );
    require!(prize_index == round.prize_count, ErrorCode::InvalidPrizeIndex);
    Ok(())
}

pub fn validate_splits(purchase_bps: u16, owner_bps: u16) -> Result<()> {
    let total = purchase_bps as u64 + owner_bps as u64;
    require!(total <= BPS_DENOMINATOR, ErrorCode::InvalidSplits);
    Ok(())
}

fn bps_of(amount: u64, bps: u16) -> Result<u64> {
    let value = (amount as u128)
        .checked_mul(bps as u128)
        .ok_or(ErrorCode::MathOverflow)?
        .checked_div(BPS_DENOMINATOR as u128)
        .ok_or(ErrorCode::MathOverflow)?;
    u64::try_from(value).map_err(|_| ErrorCode::MathOverflow.into())
}

/// Budget and owner cut for `deposited` lamports. `cap == 0` leaves the budget uncapped.
pub fn compute_round_split(
    deposited: u64,
    purchase_bps: u16,
    owner_bps: u16,
    cap: u64,
) -> Result<RoundSplit> {
    let mut purchase_budget = bps_of(deposited, purchase_bps)?;
    if cap > 0 {
        purchase_budget = purchase_budget.min(cap);
    }
    let owner_amount = bps_of(deposited, owner_bps)?;
    Ok(RoundSplit {
        purchase_budget,
        owner_amount,
    })
}

/// Native jackpot left for ticket holders once the owner cut and purchases are taken out.
pub fn compute_jackpot(deposited: u64, owner_amount: u64, spent: u64) -> Result<u64> {
    checked_sub_u64(checked_sub_u64(deposited, owner_amount)?, spent)
}

/// Pays `amount` lamports out of the system-owned round vault.
pub fn transfer_from_vault<'info>(
    vault: &AccountInfo<'info>,
    to: &AccountInfo<'info>,
    system_program: &AccountInfo<'info>,
    round_id: u64,
    vault_bump: u8,
    amount: u64,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    let ix = system_instruction::transfer(vault.key, to.key, amount);
    let round_le = round_id.to_le_bytes();
    let signer_seeds: &[&[u8]] = &[SEED_VAULT, &round_le, &[vault_bump]];
    invoke_signed(
        &ix,
        &[vault.clone(), to.clone(), system_program.clone()],
        &[signer_seeds],
    )?;
    Ok(())
}

pub fn prize_kind_for(decimals: u8, received: u64) -> PrizeKind {
    if decimals == 0 && received == 1 {
        PrizeKind::Nft
    } else {
        PrizeKind::Token
    }
}

pub fn bit_add(bit: &mut [u64], mut i: usize, delta: u64) -> Result<()> {
    let n = bit.len() - 1; // 1-indexed
    while i <= n {
        bit[i] = bit[i].checked_add(delta).ok_or(ErrorCode::MathOverflow)?;
        i += i & (!i + 1); // lowbit
    }
    Ok(())
}

/// Smallest 1-based index whose prefix sum reaches `target`.
pub fn bit_find_prefix(bit: &[u64], target: u64) -> Result<usize> {
    let n = bit.len() - 1;
    let mut bit_mask = 1usize;
    while bit_mask <= n {
        bit_mask <<= 1;
    }
    let mut idx = 0usize;
    let mut cur = 0u64;
    let mut step = bit_mask;
    while step > 0 {
        let next = idx + step;
        if next <= n {
            let cand = cur.checked_add(bit[next]).ok_or(ErrorCode::MathOverflow)?;
            if cand < target {
                idx = next;
                cur = cand;
            }
        }
        step >>= 1;
    }
    Ok(idx + 1)
}

/// Winning ticket (1-based) for prize slot `slot`, independent per slot.
pub fn winning_ticket_for_slot(randomness: &[u8; 32], slot: u32, total_tickets: u64) -> Result<u64> {
    require!(total_tickets > 0, ErrorCode::NoTickets);
    let digest = hashv(&[randomness, b"slot", &slot.to_le_bytes()]).to_bytes();
    let mut first = [0u8; 16];
    first.copy_from_slice(&digest[..16]);
    let r = u128::from_le_bytes(first);
    Ok((r % total_tickets as u128) as u64 + 1)
}
