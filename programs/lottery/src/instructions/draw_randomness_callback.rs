use anchor_lang::prelude::*;
use crate::{
    constants::*,
    errors::ErrorCode,
    events::DrawRandomnessReady,
    state::{Config, Round},
};

/// Only the VRF program can sign as this PDA.
const VRF_PROGRAM_IDENTITY_BYTES: [u8; 32] =
    ephemeral_vrf_sdk::consts::VRF_PROGRAM_IDENTITY.to_bytes();
pub static VRF_PROGRAM_IDENTITY: Pubkey = Pubkey::new_from_array(VRF_PROGRAM_IDENTITY_BYTES);

#[derive(Accounts)]
pub struct DrawRandomnessCallback<'info> {
    #[account(address = VRF_PROGRAM_IDENTITY)]
    pub vrf_program_identity: Signer<'info>,

    #[account(seeds = [SEED_CFG], bump = config.bump)]
    pub config: Account<'info, Config>,

    /// round_id is not among the callback args, PDA checked in handler
    #[account(mut)]
    pub round: AccountLoader<'info, Round>,
}

pub fn handler(ctx: Context<DrawRandomnessCallback>, randomness: [u8; 32]) -> Result<()> {
    let mut round = ctx.accounts.round.load_mut()?;

    let expected_key = Pubkey::create_program_address(
        &[SEED_ROUND, &round.round_id.to_le_bytes(), &[round.bump]],
        &crate::ID,
    )
    .map_err(|_| ErrorCode::InvalidRound)?;
    require_keys_eq!(ctx.accounts.round.key(), expected_key, ErrorCode::InvalidRound);

    accept_randomness(&mut round, randomness)?;

    emit!(DrawRandomnessReady {
        round_id: round.round_id,
    });
    Ok(())
}

pub(crate) fn accept_randomness(round: &mut Round, randomness: [u8; 32]) -> Result<()> {
    require!(round.draw_requested != 0, ErrorCode::DrawNotRequested);
    require!(round.randomness_ready == 0, ErrorCode::RandomnessAlreadyFulfilled);
    round.randomness = randomness;
    round.randomness_ready = 1;
    Ok(())
}
