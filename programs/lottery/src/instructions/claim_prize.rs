use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};
use crate::{
    constants::*,
    errors::ErrorCode,
    events::PrizeClaimed,
    state::{Config, Prize, PrizeKind, Round},
    utils::transfer_from_vault,
};

#[derive(Accounts)]
#[instruction(round_id: u64, prize_index: u32)]
pub struct ClaimPrize<'info> {
    #[account(mut)]
    pub claimant: Signer<'info>,

    #[account(seeds = [SEED_CFG], bump = config.bump)]
    pub config: Box<Account<'info, Config>>,

    #[account(
        seeds = [SEED_ROUND, &round_id.to_le_bytes()],
        bump,
    )]
    pub round: AccountLoader<'info, Round>,

    #[account(
        mut,
        seeds = [SEED_PRIZE, &round_id.to_le_bytes(), &prize_index.to_le_bytes()],
        bump = prize.bump,
    )]
    pub prize: Box<Account<'info, Prize>>,

    /// CHECK: system-owned round vault, pays native prizes
    #[account(
        mut,
        seeds = [SEED_VAULT, &round_id.to_le_bytes()],
        bump,
    )]
    pub vault: UncheckedAccount<'info>,

    /// CHECK: PDA authority over prize token accounts
    #[account(seeds = [SEED_PRIZE_VAULT], bump = config.prize_vault_bump)]
    pub prize_vault: UncheckedAccount<'info>,

    /// Token and NFT prizes only.
    #[account(mut)]
    pub prize_vault_token_account: Option<Box<Account<'info, TokenAccount>>>,

    /// Token and NFT prizes only. Must be owned by the claimant.
    #[account(mut)]
    pub claimant_token_account: Option<Box<Account<'info, TokenAccount>>>,

    pub token_program: Option<Program<'info, Token>>,
    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<ClaimPrize>, round_id: u64, prize_index: u32) -> Result<()> {
    let prize = &ctx.accounts.prize;
    require!(prize.drawn, ErrorCode::PrizeNotDrawn);
    require!(!prize.claimed, ErrorCode::PrizeAlreadyClaimed);
    require_keys_eq!(prize.owner, ctx.accounts.claimant.key(), ErrorCode::OnlyPrizeOwner);

    let kind = prize.prize_kind().ok_or(ErrorCode::InvalidPrizeAccount)?;
    let amount = prize.amount;
    let asset_mint = prize.asset_mint;

    match kind {
        PrizeKind::Native => {
            let vault_bump = ctx.accounts.round.load()?.vault_bump;
            transfer_from_vault(
                &ctx.accounts.vault.to_account_info(),
                &ctx.accounts.claimant.to_account_info(),
                &ctx.accounts.system_program.to_account_info(),
                round_id,
                vault_bump,
                amount,
            )?;
        }
        PrizeKind::Token | PrizeKind::Nft => {
            let (Some(from), Some(to), Some(token_program)) = (
                ctx.accounts.prize_vault_token_account.as_ref(),
                ctx.accounts.claimant_token_account.as_ref(),
                ctx.accounts.token_program.as_ref(),
            ) else {
                return err!(ErrorCode::MissingTokenAccounts);
            };
            require_keys_eq!(from.mint, asset_mint, ErrorCode::InvalidTokenAccount);
            require_keys_eq!(from.owner, ctx.accounts.prize_vault.key(), ErrorCode::InvalidTokenAccount);
            require_keys_eq!(to.mint, asset_mint, ErrorCode::InvalidTokenAccount);
            require_keys_eq!(to.owner, ctx.accounts.claimant.key(), ErrorCode::InvalidTokenAccount);

            let bump = ctx.accounts.config.prize_vault_bump;
            let signer_seeds: &[&[u8]] = &[SEED_PRIZE_VAULT, &[bump]];
            token::transfer(
                CpiContext::new_with_signer(
                    token_program.to_account_info(),
                    Transfer {
                        from: from.to_account_info(),
                        to: to.to_account_info(),
                        authority: ctx.accounts.prize_vault.to_account_info(),
                    },
                    &[signer_seeds],
                ),
                amount,
            )?;
        }
    }

    let prize = &mut ctx.accounts.prize;
    prize.claimed = true;
    prize.claimed_at = Clock::get()?.unix_timestamp;

    emit!(PrizeClaimed {
        round_id,
        prize_index,
        owner: prize.owner,
        kind: kind as u8,
        amount,
    });
    Ok(())
}
