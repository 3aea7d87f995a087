use anchor_lang::prelude::*;
use crate::{
    constants::*,
    errors::ErrorCode,
    events::RoundStarted,
    state::{Config, Round, RoundPhase},
    utils::{checked_add_i64, checked_add_u64},
};

#[derive(Accounts)]
#[instruction(round_id: u64)]
pub struct StartNextRound<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,

    #[account(mut, seeds = [SEED_CFG], bump = config.bump)]
    pub config: Account<'info, Config>,

    /// Round `current_round_id`; omitted only before the first round.
    #[account(
        mut,
        seeds = [SEED_ROUND, &config.current_round_id.to_le_bytes()],
        bump,
    )]
    pub previous_round: Option<AccountLoader<'info, Round>>,

    #[account(
        init,
        payer = payer,
        space = Round::SPACE,
        seeds = [SEED_ROUND, &round_id.to_le_bytes()],
        bump
    )]
    pub round: AccountLoader<'info, Round>,

    /// CHECK: system-owned vault PDA, holds round deposits, no data
    #[account(
        init,
        payer = payer,
        space = 0,
        owner = anchor_lang::solana_program::system_program::ID,
        seeds = [SEED_VAULT, &round_id.to_le_bytes()],
        bump
    )]
    pub vault: UncheckedAccount<'info>,

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<StartNextRound>, round_id: u64) -> Result<()> {
    let cfg = &mut ctx.accounts.config;
    require!(!cfg.paused, ErrorCode::Paused);
    require!(
        round_id == checked_add_u64(cfg.current_round_id, 1)?,
        ErrorCode::InvalidRoundId
    );

    let now = Clock::get()?.unix_timestamp;
    let purchase_window = cfg.purchase_window();

    if cfg.current_round_id > 0 {
        let previous = ctx
            .accounts
            .previous_round
            .as_ref()
            .ok_or(ErrorCode::PreviousRoundRequired)?;
        let mut previous = previous.load_mut()?;
        ensure_previous_settled(&previous, purchase_window, now)?;
        previous.closed = 1;
    }

    let end_ts = checked_add_i64(now, cfg.round_duration_sec as i64)?;
    let round_key = ctx.accounts.round.key();
    let vault_key = ctx.accounts.vault.key();

    let mut round = ctx.accounts.round.load_init()?;
    round.round_id = round_id;
    round.bump = ctx.bumps.round;
    round.vault_bump = ctx.bumps.vault;
    round.start_ts = now;
    round.end_ts = end_ts;
    // everything else starts zeroed

    cfg.current_round_id = round_id;

    emit!(RoundStarted {
        round_id,
        round: round_key,
        vault: vault_key,
        start_ts: now,
        end_ts,
    });

    Ok(())
}

/// Previous round must be past its purchase window (or finalized).
pub(crate) fn ensure_previous_settled(previous: &Round, purchase_window: i64, now: i64) -> Result<()> {
    match previous.phase(purchase_window, now) {
        RoundPhase::Closed | RoundPhase::Finalized => Ok(()),
        RoundPhase::Open | RoundPhase::InPurchaseWindow => err!(ErrorCode::PreviousRoundOpen),
    }
}
