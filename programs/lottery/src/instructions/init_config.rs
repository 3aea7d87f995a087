use anchor_lang::prelude::*;
use crate::{
    constants::*,
    errors::ErrorCode,
    events::ConfigUpdated,
    state::{Allowlist, AllowlistKind, Config},
    utils::validate_splits,
};

#[derive(AnchorSerialize, AnchorDeserialize, Clone)]
pub struct InitConfigArgs {
    pub fee_recipient: Pubkey,
    pub purchase_executor: Pubkey,
    /// Lamports per ticket.
    pub ticket_price: u64,
    pub round_duration_sec: u32,
    pub purchase_window_sec: u32,
    pub purchase_bps: u16,
    pub owner_bps: u16,
    /// Lamports. 0 = uncapped.
    pub purchase_budget_cap: u64,
}

#[derive(Accounts)]
pub struct InitConfig<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,
    pub admin: Signer<'info>,

    #[account(
        init,
        payer = payer,
        space = Config::SPACE,
        seeds = [SEED_CFG],
        bump
    )]
    pub config: Account<'info, Config>,

    #[account(
        init,
        payer = payer,
        space = Allowlist::SPACE,
        seeds = [SEED_ALLOWLIST_MARKETPLACE],
        bump
    )]
    pub marketplace_allowlist: Account<'info, Allowlist>,

    #[account(
        init,
        payer = payer,
        space = Allowlist::SPACE,
        seeds = [SEED_ALLOWLIST_ASSET],
        bump
    )]
    pub asset_allowlist: Account<'info, Allowlist>,

    /// CHECK: PDA that owns purchased prize token accounts; holds no data.
    #[account(seeds = [SEED_PRIZE_VAULT], bump)]
    pub prize_vault: UncheckedAccount<'info>,

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<InitConfig>, args: InitConfigArgs) -> Result<()> {
    validate_splits(args.purchase_bps, args.owner_bps)?;
    require!(args.ticket_price > 0, ErrorCode::InvalidConfig);
    require!(args.round_duration_sec > 0, ErrorCode::InvalidConfig);
    require!(args.purchase_executor != Pubkey::default(), ErrorCode::InvalidConfig);
    require!(args.fee_recipient != Pubkey::default(), ErrorCode::InvalidConfig);

    let cfg = &mut ctx.accounts.config;
    cfg.admin = ctx.accounts.admin.key();
    cfg.fee_recipient = args.fee_recipient;
    cfg.purchase_executor = args.purchase_executor;
    cfg.ticket_price = args.ticket_price;
    cfg.round_duration_sec = args.round_duration_sec;
    cfg.purchase_window_sec = args.purchase_window_sec;
    cfg.purchase_bps = args.purchase_bps;
    cfg.owner_bps = args.owner_bps;
    cfg.purchase_budget_cap = args.purchase_budget_cap;
    cfg.current_round_id = 0;
    cfg.paused = false;
    cfg.bump = ctx.bumps.config;
    cfg.prize_vault_bump = ctx.bumps.prize_vault;
    cfg.reserved = [0u8; 29];

    let marketplaces = &mut ctx.accounts.marketplace_allowlist;
    marketplaces.kind = AllowlistKind::Marketplace as u8;
    marketplaces.bump = ctx.bumps.marketplace_allowlist;
    marketplaces.entries = Vec::new();

    let assets = &mut ctx.accounts.asset_allowlist;
    assets.kind = AllowlistKind::Asset as u8;
    assets.bump = ctx.bumps.asset_allowlist;
    assets.entries = Vec::new();

    emit!(ConfigUpdated::from(&**cfg));
    Ok(())
}
