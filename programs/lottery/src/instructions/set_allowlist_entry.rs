use anchor_lang::prelude::*;
use crate::{
    constants::*,
    errors::ErrorCode,
    events::AllowlistUpdated,
    state::{Allowlist, AllowlistKind, Config},
};

#[derive(Accounts)]
pub struct SetAllowlistEntry<'info> {
    pub admin: Signer<'info>,

    #[account(
        seeds = [SEED_CFG],
        bump = config.bump,
        constraint = config.admin == admin.key() @ ErrorCode::Unauthorized,
    )]
    pub config: Account<'info, Config>,

    /// Either allowlist; the PDA is checked against `kind` in the handler.
    #[account(mut)]
    pub allowlist: Account<'info, Allowlist>,
}

pub fn handler(ctx: Context<SetAllowlistEntry>, kind: u8, key: Pubkey, allowed: bool) -> Result<()> {
    let list_kind = AllowlistKind::from_u8(kind).ok_or(ErrorCode::AllowlistKindMismatch)?;
    let list = &mut ctx.accounts.allowlist;
    require!(list.kind == kind, ErrorCode::AllowlistKindMismatch);

    let expected = Pubkey::create_program_address(&[list_kind.seed(), &[list.bump]], &crate::ID)
        .map_err(|_| ErrorCode::AllowlistKindMismatch)?;
    require_keys_eq!(list.key(), expected, ErrorCode::AllowlistKindMismatch);

    if list.set(key, allowed)? {
        msg!("allowlist {} {} {}", kind, key, if allowed { "+" } else { "-" });
    }

    emit!(AllowlistUpdated {
        kind,
        key,
        allowed,
        entries: list.entries.len() as u32,
    });
    Ok(())
}
