use anchor_lang::prelude::*;
use crate::{
    constants::*,
    errors::ErrorCode,
    events::ConfigUpdated,
    state::Config,
    utils::validate_splits,
};

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Default)]
pub struct UpdateConfigArgs {
    pub fee_recipient: Option<Pubkey>,
    pub purchase_executor: Option<Pubkey>,
    pub ticket_price: Option<u64>,
    pub round_duration_sec: Option<u32>,
    /// Applies to every round, including the one currently in its window.
    pub purchase_window_sec: Option<u32>,
    pub purchase_bps: Option<u16>,
    pub owner_bps: Option<u16>,
    pub purchase_budget_cap: Option<u64>,
    pub paused: Option<bool>,
}

#[derive(Accounts)]
pub struct UpdateConfig<'info> {
    pub admin: Signer<'info>,

    #[account(
        mut,
        seeds = [SEED_CFG],
        bump = config.bump,
        constraint = config.admin == admin.key() @ ErrorCode::Unauthorized,
    )]
    pub config: Account<'info, Config>,
}

pub fn handler(ctx: Context<UpdateConfig>, args: UpdateConfigArgs) -> Result<()> {
    let cfg = &mut ctx.accounts.config;

    if let Some(v) = args.fee_recipient {
        require!(v != Pubkey::default(), ErrorCode::InvalidConfig);
        cfg.fee_recipient = v;
    }
    if let Some(v) = args.purchase_executor {
        require!(v != Pubkey::default(), ErrorCode::InvalidConfig);
        cfg.purchase_executor = v;
    }
    if let Some(v) = args.ticket_price {
        require!(v > 0, ErrorCode::InvalidConfig);
        cfg.ticket_price = v;
    }
    if let Some(v) = args.round_duration_sec {
        require!(v > 0, ErrorCode::InvalidConfig);
        cfg.round_duration_sec = v;
    }
    if let Some(v) = args.purchase_window_sec {
        cfg.purchase_window_sec = v;
    }
    if args.purchase_bps.is_some() || args.owner_bps.is_some() {
        let purchase_bps = args.purchase_bps.unwrap_or(cfg.purchase_bps);
        let owner_bps = args.owner_bps.unwrap_or(cfg.owner_bps);
        validate_splits(purchase_bps, owner_bps)?;
        cfg.purchase_bps = purchase_bps;
        cfg.owner_bps = owner_bps;
    }
    if let Some(v) = args.purchase_budget_cap {
        cfg.purchase_budget_cap = v;
    }
    if let Some(v) = args.paused {
        cfg.paused = v;
    }

    emit!(ConfigUpdated::from(&**cfg));
    Ok(())
}
