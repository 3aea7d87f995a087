use anchor_lang::prelude::*;
use anchor_lang::Discriminator;
use ephemeral_vrf_sdk::instructions::{create_request_randomness_ix, RequestRandomnessParams};
use ephemeral_vrf_sdk::types::SerializableAccountMeta;

use crate::{
    constants::*,
    errors::ErrorCode,
    events::DrawRequested,
    state::{Config, Prize, PrizeKind, Round, RoundPhase},
    utils::{checked_add_u32, compute_jackpot},
};

/// Same 32 bytes, different crate.
fn to_sdk_pubkey(p: &Pubkey) -> ephemeral_vrf_sdk::Pubkey {
    ephemeral_vrf_sdk::Pubkey::new_from_array(p.to_bytes())
}

const VRF_PROGRAM_ID_BYTES: [u8; 32] = ephemeral_vrf_sdk::consts::VRF_PROGRAM_ID.to_bytes();
const DEFAULT_QUEUE_BYTES: [u8; 32] = ephemeral_vrf_sdk::consts::DEFAULT_QUEUE.to_bytes();

pub const VRF_PROGRAM_ID: Pubkey = Pubkey::new_from_array(VRF_PROGRAM_ID_BYTES);
pub const DEFAULT_QUEUE: Pubkey = Pubkey::new_from_array(DEFAULT_QUEUE_BYTES);

#[derive(Accounts)]
#[instruction(round_id: u64, jackpot_index: u32)]
pub struct RequestDraw<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,

    #[account(seeds = [SEED_CFG], bump = config.bump)]
    pub config: Account<'info, Config>,

    #[account(
        mut,
        seeds = [SEED_ROUND, &round_id.to_le_bytes()],
        bump,
    )]
    pub round: AccountLoader<'info, Round>,

    /// Native jackpot prize slot. Passed only when the unspent residual is non-zero.
    #[account(
        init,
        payer = payer,
        space = Prize::SPACE,
        seeds = [SEED_PRIZE, &round_id.to_le_bytes(), &jackpot_index.to_le_bytes()],
        bump
    )]
    pub jackpot: Option<Account<'info, Prize>>,

    /// CHECK: our identity PDA, signs the VRF CPI
    #[account(seeds = [b"identity"], bump)]
    pub program_identity: AccountInfo<'info>,

    /// CHECK: oracle queue
    #[account(mut, address = DEFAULT_QUEUE)]
    pub oracle_queue: AccountInfo<'info>,

    /// CHECK: MagicBlock VRF program
    #[account(address = VRF_PROGRAM_ID)]
    pub vrf_program: AccountInfo<'info>,

    /// CHECK: SlotHashes sysvar
    #[account(address = anchor_lang::solana_program::sysvar::slot_hashes::ID)]
    pub slot_hashes: AccountInfo<'info>,

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<RequestDraw>, round_id: u64, jackpot_index: u32) -> Result<()> {
    let cfg = &ctx.accounts.config;
    let round_key = ctx.accounts.round.key();
    let config_key = cfg.key();
    let now = Clock::get()?.unix_timestamp;

    let (jackpot, prize_count, total_tickets) = {
        let mut round = ctx.accounts.round.load_mut()?;
        match round.phase(cfg.purchase_window(), now) {
            RoundPhase::Closed => {}
            RoundPhase::Finalized => return err!(ErrorCode::RoundAlreadyFinalized),
            RoundPhase::Open | RoundPhase::InPurchaseWindow => return err!(ErrorCode::DrawTooEarly),
        }
        require!(round.draw_requested == 0, ErrorCode::DrawAlreadyRequested);

        let jackpot = compute_jackpot(round.deposited, round.owner_amount, round.spent)?;
        require!(
            ctx.accounts.jackpot.is_some() == (jackpot > 0),
            ErrorCode::JackpotAccountMismatch
        );
        if jackpot > 0 {
            require!(jackpot_index == round.prize_count, ErrorCode::InvalidPrizeIndex);
            round.prize_count = checked_add_u32(round.prize_count, 1)?;
        }

        round.closed = 1;
        round.draw_requested = 1;
        // nothing to draw: mark ready so finalization is not blocked on the oracle
        if round.prize_count == 0 || round.total_tickets == 0 {
            round.randomness_ready = 1;
        }
        (jackpot, round.prize_count, round.total_tickets)
    };

    if let Some(prize) = ctx.accounts.jackpot.as_mut() {
        prize.round_id = round_id;
        prize.index = jackpot_index;
        prize.kind = PrizeKind::Native as u8;
        prize.bump = ctx.bumps.jackpot.unwrap_or_default();
        prize.drawn = false;
        prize.claimed = false;
        prize.asset_mint = Pubkey::default();
        prize.amount = jackpot;
        prize.winning_ticket = 0;
        prize.owner = Pubkey::default();
        prize.claimed_at = 0;
    }

    let randomness_requested = prize_count > 0 && total_tickets > 0;
    if randomness_requested {
        let mut caller_seed = [0u8; 32];
        caller_seed[..8].copy_from_slice(&round_id.to_le_bytes());

        let sdk_ix = create_request_randomness_ix(RequestRandomnessParams {
            payer: to_sdk_pubkey(&ctx.accounts.payer.key()),
            oracle_queue: to_sdk_pubkey(&ctx.accounts.oracle_queue.key()),
            callback_program_id: to_sdk_pubkey(&crate::ID),
            callback_discriminator: crate::instruction::DrawRandomnessCallback::DISCRIMINATOR
                .to_vec(),
            caller_seed,
            accounts_metas: Some(vec![
                SerializableAccountMeta {
                    pubkey: to_sdk_pubkey(&config_key),
                    is_signer: false,
                    is_writable: false,
                },
                SerializableAccountMeta {
                    pubkey: to_sdk_pubkey(&round_key),
                    is_signer: false,
                    is_writable: true,
                },
            ]),
            ..Default::default()
        });

        let ix = {
            use anchor_lang::solana_program::instruction::{AccountMeta, Instruction};
            let accounts: Vec<AccountMeta> = sdk_ix
                .accounts
                .iter()
                .map(|a| {
                    let pubkey = Pubkey::new_from_array(a.pubkey.to_bytes());
                    if a.is_writable {
                        AccountMeta::new(pubkey, a.is_signer)
                    } else {
                        AccountMeta::new_readonly(pubkey, a.is_signer)
                    }
                })
                .collect();
            Instruction {
                program_id: Pubkey::new_from_array(sdk_ix.program_id.to_bytes()),
                accounts,
                data: sdk_ix.data,
            }
        };

        let identity_bump = ctx.bumps.program_identity;
        anchor_lang::solana_program::program::invoke_signed(
            &ix,
            &[
                ctx.accounts.payer.to_account_info(),
                ctx.accounts.program_identity.to_account_info(),
                ctx.accounts.oracle_queue.to_account_info(),
                ctx.accounts.slot_hashes.to_account_info(),
                ctx.accounts.system_program.to_account_info(),
            ],
            &[&[b"identity", &[identity_bump]]],
        )?;
    } else {
        msg!("round {} has nothing to draw, skipping randomness request", round_id);
    }

    emit!(DrawRequested {
        round_id,
        prize_count,
        jackpot,
        randomness_requested,
    });

    Ok(())
}
