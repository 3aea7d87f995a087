use anchor_lang::prelude::*;
use crate::{
    constants::*,
    errors::ErrorCode,
    events::RoundFinalized,
    state::{Config, Round, RoundPhase},
    utils::transfer_from_vault,
};

#[derive(Accounts)]
#[instruction(round_id: u64)]
pub struct FinalizeRound<'info> {
    pub admin: Signer<'info>,

    #[account(
        seeds = [SEED_CFG],
        bump = config.bump,
        constraint = config.admin == admin.key() @ ErrorCode::Unauthorized,
    )]
    pub config: Account<'info, Config>,

    #[account(
        mut,
        seeds = [SEED_ROUND, &round_id.to_le_bytes()],
        bump,
    )]
    pub round: AccountLoader<'info, Round>,

    /// CHECK: system-owned round vault
    #[account(
        mut,
        seeds = [SEED_VAULT, &round_id.to_le_bytes()],
        bump,
    )]
    pub vault: UncheckedAccount<'info>,

    /// CHECK: receives the owner cut, pinned to config
    #[account(mut, address = config.fee_recipient @ ErrorCode::Unauthorized)]
    pub fee_recipient: UncheckedAccount<'info>,

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<FinalizeRound>, round_id: u64) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let window = ctx.accounts.config.purchase_window();

    let (owner_amount, vault_bump, winners_drawn) = {
        let round = ctx.accounts.round.load()?;
        match round.phase(window, now) {
            RoundPhase::Closed => {}
            RoundPhase::Finalized => return err!(ErrorCode::RoundAlreadyFinalized),
            RoundPhase::Open | RoundPhase::InPurchaseWindow => {
                return err!(ErrorCode::RoundNotClosed)
            }
        }
        require!(round.draw_requested != 0, ErrorCode::DrawNotRequested);
        require!(round.undrawn_slots() == 0, ErrorCode::WinnersNotDrawn);
        (round.owner_amount, round.vault_bump, round.winners_drawn)
    };

    transfer_from_vault(
        &ctx.accounts.vault.to_account_info(),
        &ctx.accounts.fee_recipient.to_account_info(),
        &ctx.accounts.system_program.to_account_info(),
        round_id,
        vault_bump,
        owner_amount,
    )?;

    {
        let mut round = ctx.accounts.round.load_mut()?;
        round.closed = 1;
        round.finalized = 1;
    }

    emit!(RoundFinalized {
        round_id,
        owner_amount,
        fee_recipient: ctx.accounts.fee_recipient.key(),
        winners_drawn,
    });
    Ok(())
}
