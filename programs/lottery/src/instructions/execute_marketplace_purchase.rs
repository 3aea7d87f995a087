use anchor_lang::prelude::*;
use anchor_lang::solana_program::{
    instruction::{AccountMeta, Instruction},
    program::invoke_signed,
};
use anchor_spl::associated_token::AssociatedToken;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::{
    constants::*,
    errors::ErrorCode,
    events::MarketplacePurchaseExecuted,
    state::{Allowlist, Config, Prize, Round},
    utils::{checked_add_u32, checked_add_u64, prize_kind_for, validate_purchase},
};

#[derive(Accounts)]
#[instruction(round_id: u64, calldata: Vec<u8>, native_price: u64, max_native_spend: u64, prize_index: u32)]
pub struct ExecuteMarketplacePurchase<'info> {
    #[account(mut)]
    pub executor: Signer<'info>,

    #[account(seeds = [SEED_CFG], bump = config.bump)]
    pub config: Box<Account<'info, Config>>,

    #[account(
        mut,
        seeds = [SEED_ROUND, &round_id.to_le_bytes()],
        bump,
    )]
    pub round: AccountLoader<'info, Round>,

    /// CHECK: system-owned round vault, funds the purchase as CPI signer
    #[account(
        mut,
        seeds = [SEED_VAULT, &round_id.to_le_bytes()],
        bump,
    )]
    pub vault: UncheckedAccount<'info>,

    #[account(seeds = [SEED_ALLOWLIST_MARKETPLACE], bump = marketplace_allowlist.bump)]
    pub marketplace_allowlist: Box<Account<'info, Allowlist>>,

    #[account(seeds = [SEED_ALLOWLIST_ASSET], bump = asset_allowlist.bump)]
    pub asset_allowlist: Box<Account<'info, Allowlist>>,

    /// CHECK: must be executable and allowlisted, checked in handler
    pub marketplace_program: UncheckedAccount<'info>,

    pub prize_mint: Box<Account<'info, Mint>>,

    /// CHECK: PDA authority over prize token accounts
    #[account(seeds = [SEED_PRIZE_VAULT], bump = config.prize_vault_bump)]
    pub prize_vault: UncheckedAccount<'info>,

    #[account(
        init_if_needed,
        payer = executor,
        associated_token::mint = prize_mint,
        associated_token::authority = prize_vault,
    )]
    pub prize_vault_token_account: Box<Account<'info, TokenAccount>>,

    #[account(
        init,
        payer = executor,
        space = Prize::SPACE,
        seeds = [SEED_PRIZE, &round_id.to_le_bytes(), &prize_index.to_le_bytes()],
        bump
    )]
    pub prize: Box<Account<'info, Prize>>,

    pub associated_token_program: Program<'info, AssociatedToken>,
    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

/// Buys one prize asset with round funds.
///
/// `remaining_accounts` are forwarded to the marketplace program as its
/// account list, in order. The round vault may appear there and is signed for.
pub fn handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, ExecuteMarketplacePurchase<'info>>,
    round_id: u64,
    calldata: Vec<u8>,
    native_price: u64,
    max_native_spend: u64,
    prize_index: u32,
) -> Result<()> {
    let cfg = &ctx.accounts.config;
    require!(!cfg.paused, ErrorCode::Paused);
    require_keys_eq!(
        cfg.purchase_executor,
        ctx.accounts.executor.key(),
        ErrorCode::UnauthorizedExecutor
    );
    require!(calldata.len() <= MAX_CALLDATA_LEN, ErrorCode::CalldataTooLong);

    let marketplace = ctx.accounts.marketplace_program.to_account_info();
    require!(marketplace.executable, ErrorCode::MarketplaceNotExecutable);
    require!(
        marketplace.key() != crate::ID
            && ctx.accounts.marketplace_allowlist.contains(&marketplace.key()),
        ErrorCode::MarketplaceNotAllowed
    );
    let prize_mint = ctx.accounts.prize_mint.key();
    require!(
        ctx.accounts.asset_allowlist.contains(&prize_mint),
        ErrorCode::AssetNotAllowed
    );

    let now = Clock::get()?.unix_timestamp;
    let vault_bump = {
        let mut round = ctx.accounts.round.load_mut()?;
        validate_purchase(
            &round,
            cfg.purchase_window(),
            now,
            native_price,
            max_native_spend,
            prize_index,
        )?;
        round.closed = 1;
        round.vault_bump
    };

    let vault = ctx.accounts.vault.to_account_info();
    let rent_floor = Rent::get()?.minimum_balance(0);
    let vault_before = vault.lamports();
    require!(
        vault_before.saturating_sub(rent_floor) >= native_price,
        ErrorCode::InsufficientVaultFunds
    );
    let held_before = ctx.accounts.prize_vault_token_account.amount;

    let metas: Vec<AccountMeta> = ctx
        .remaining_accounts
        .iter()
        .map(|a| AccountMeta {
            pubkey: *a.key,
            is_signer: a.is_signer || *a.key == vault.key(),
            is_writable: a.is_writable,
        })
        .collect();
    let ix = Instruction {
        program_id: marketplace.key(),
        accounts: metas,
        data: calldata,
    };

    let mut infos = ctx.remaining_accounts.to_vec();
    infos.push(vault.clone());
    infos.push(marketplace.clone());

    let round_le = round_id.to_le_bytes();
    let signer_seeds: &[&[u8]] = &[SEED_VAULT, &round_le, &[vault_bump]];
    invoke_signed(&ix, &infos, &[signer_seeds])?;

    let native_spent = vault_before.saturating_sub(vault.lamports());
    require!(native_spent <= native_price, ErrorCode::SpendCapExceeded);

    ctx.accounts.prize_vault_token_account.reload()?;
    let received = ctx
        .accounts
        .prize_vault_token_account
        .amount
        .saturating_sub(held_before);
    require!(received > 0, ErrorCode::PrizeNotReceived);

    let kind = prize_kind_for(ctx.accounts.prize_mint.decimals, received);

    let spent_after = {
        let mut round = ctx.accounts.round.load_mut()?;
        round.spent = checked_add_u64(round.spent, native_spent)?;
        require!(round.spent <= round.purchase_budget, ErrorCode::PurchaseBudgetExceeded);
        round.prize_count = checked_add_u32(round.prize_count, 1)?;
        round.spent
    };

    let prize = &mut ctx.accounts.prize;
    prize.round_id = round_id;
    prize.index = prize_index;
    prize.kind = kind as u8;
    prize.bump = ctx.bumps.prize;
    prize.drawn = false;
    prize.claimed = false;
    prize.asset_mint = prize_mint;
    prize.amount = received;
    prize.winning_ticket = 0;
    prize.owner = Pubkey::default();
    prize.claimed_at = 0;

    emit!(MarketplacePurchaseExecuted {
        round_id,
        prize_index,
        marketplace: marketplace.key(),
        asset_mint: prize_mint,
        kind: kind as u8,
        amount: received,
        native_price,
        native_spent,
        spent_after,
    });

    Ok(())
}
