use anchor_lang::prelude::*;
use crate::{
    constants::*,
    errors::ErrorCode,
    events::WinnerDrawn,
    state::{Prize, Round},
    utils::{bit_find_prefix, checked_add_u32, winning_ticket_for_slot},
};

#[derive(Accounts)]
#[instruction(round_id: u64)]
pub struct DrawWinners<'info> {
    pub caller: Signer<'info>,

    #[account(
        mut,
        seeds = [SEED_ROUND, &round_id.to_le_bytes()],
        bump,
    )]
    pub round: AccountLoader<'info, Round>,
}

/// Assigns owners to the next undrawn prize slots.
///
/// `remaining_accounts` must hold the Prize PDAs of slots
/// `winners_drawn..winners_drawn + n`, in slot order. `batch_size == 0` draws
/// every remaining slot.
pub fn handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, DrawWinners<'info>>,
    round_id: u64,
    batch_size: u32,
) -> Result<()> {
    let mut round = ctx.accounts.round.load_mut()?;
    require!(round.finalized == 0, ErrorCode::RoundAlreadyFinalized);
    require!(round.randomness_ready != 0, ErrorCode::RandomnessNotReady);

    let remaining = round.undrawn_slots();
    require!(remaining > 0, ErrorCode::AllWinnersDrawn);
    let n = if batch_size == 0 {
        remaining
    } else {
        batch_size.min(remaining)
    };
    require!(
        ctx.remaining_accounts.len() >= n as usize,
        ErrorCode::MissingPrizeAccounts
    );

    let round_le = round_id.to_le_bytes();
    let first_slot = round.winners_drawn;

    for (offset, info) in ctx.remaining_accounts.iter().take(n as usize).enumerate() {
        let slot = first_slot + offset as u32;
        let mut prize: Account<'info, Prize> = Account::try_from(info)?;

        let expected = Pubkey::create_program_address(
            &[SEED_PRIZE, &round_le, &slot.to_le_bytes(), &[prize.bump]],
            &crate::ID,
        )
        .map_err(|_| ErrorCode::InvalidPrizeAccount)?;
        require_keys_eq!(info.key(), expected, ErrorCode::InvalidPrizeAccount);
        require!(
            prize.round_id == round_id && prize.index == slot,
            ErrorCode::InvalidPrizeAccount
        );
        require!(!prize.drawn, ErrorCode::PrizeAlreadyDrawn);

        let ticket = winning_ticket_for_slot(&round.randomness, slot, round.total_tickets)?;
        let owner_idx = bit_find_prefix(&round.bit.data, ticket)?;
        let owner = round.participant_pubkey(owner_idx - 1);

        prize.drawn = true;
        prize.winning_ticket = ticket;
        prize.owner = owner;
        prize.exit(&crate::ID)?;

        emit!(WinnerDrawn {
            round_id,
            prize_index: slot,
            winning_ticket: ticket,
            owner,
        });
    }

    round.winners_drawn = checked_add_u32(round.winners_drawn, n)?;
    Ok(())
}
