use anchor_lang::prelude::*;
use crate::{
    constants::*,
    errors::ErrorCode,
    events::DrawRandomnessReady,
    instructions::draw_randomness_callback::accept_randomness,
    state::{Config, Round},
};

#[derive(Accounts)]
#[instruction(round_id: u64)]
pub struct MockDrawRandomness<'info> {
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
}

pub fn handler(ctx: Context<MockDrawRandomness>, round_id: u64, randomness: [u8; 32]) -> Result<()> {
    let mut round = ctx.accounts.round.load_mut()?;
    accept_randomness(&mut round, randomness)?;
    emit!(DrawRandomnessReady { round_id });
    Ok(())
}
