use anchor_lang::prelude::*;
use anchor_lang::system_program::{self, Transfer};
use crate::{
    constants::*,
    errors::ErrorCode,
    events::TicketsPurchased,
    state::{Config, Participant, Round},
    utils::{bit_add, checked_add_u64, compute_round_split},
};

#[derive(Accounts)]
#[instruction(round_id: u64)]
pub struct Deposit<'info> {
    #[account(mut)]
    pub user: Signer<'info>,

    #[account(seeds = [SEED_CFG], bump = config.bump)]
    pub config: Account<'info, Config>,

    #[account(
        mut,
        seeds = [SEED_ROUND, &round_id.to_le_bytes()],
        bump,
    )]
    pub round: AccountLoader<'info, Round>,

    #[account(
        init_if_needed,
        payer = user,
        space = Participant::SPACE,
        seeds = [SEED_PARTICIPANT, round.key().as_ref(), user.key().as_ref()],
        bump
    )]
    pub participant: Account<'info, Participant>,

    /// CHECK: system-owned round vault
    #[account(
        mut,
        seeds = [SEED_VAULT, &round_id.to_le_bytes()],
        bump,
    )]
    pub vault: UncheckedAccount<'info>,

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<Deposit>, round_id: u64, tickets: u64) -> Result<()> {
    let cfg = &ctx.accounts.config;
    require!(!cfg.paused, ErrorCode::Paused);
    require!(tickets > 0, ErrorCode::ZeroTickets);

    let lamports = tickets
        .checked_mul(cfg.ticket_price)
        .ok_or(ErrorCode::MathOverflow)?;

    let round_key = ctx.accounts.round.key();
    let participant = &mut ctx.accounts.participant;
    let mut round = ctx.accounts.round.load_mut()?;

    let now = Clock::get()?.unix_timestamp;
    require!(!round.is_closed(now), ErrorCode::RoundClosed);

    if participant.round != round_key {
        let next = round
            .participants_count
            .checked_add(1)
            .ok_or(ErrorCode::MathOverflow)?;
        require!((next as usize) <= MAX_PARTICIPANTS, ErrorCode::MaxParticipantsReached);

        participant.round = round_key;
        participant.user = ctx.accounts.user.key();
        participant.index = next;
        participant.bump = ctx.bumps.participant;
        participant.tickets = 0;
        participant.lamports = 0;
        participant.deposits_count = 0;

        round.participants_count = next;
        round.participants.data[(next - 1) as usize] = ctx.accounts.user.key().to_bytes();
    }

    participant.tickets = checked_add_u64(participant.tickets, tickets)?;
    participant.lamports = checked_add_u64(participant.lamports, lamports)?;
    participant.deposits_count = participant
        .deposits_count
        .checked_add(1)
        .ok_or(ErrorCode::MathOverflow)?;

    round.total_tickets = checked_add_u64(round.total_tickets, tickets)?;
    round.deposited = checked_add_u64(round.deposited, lamports)?;

    let split = compute_round_split(
        round.deposited,
        cfg.purchase_bps,
        cfg.owner_bps,
        cfg.purchase_budget_cap,
    )?;
    round.purchase_budget = split.purchase_budget;
    round.owner_amount = split.owner_amount;

    bit_add(&mut round.bit.data, participant.index as usize, tickets)?;

    let deposited_after = round.deposited;
    let total_tickets_after = round.total_tickets;
    let purchase_budget_after = round.purchase_budget;
    let participant_index = participant.index;

    // release the zero-copy borrow before the CPI
    drop(round);

    system_program::transfer(
        CpiContext::new(
            ctx.accounts.system_program.to_account_info(),
            Transfer {
                from: ctx.accounts.user.to_account_info(),
                to: ctx.accounts.vault.to_account_info(),
            },
        ),
        lamports,
    )?;

    emit!(TicketsPurchased {
        round_id,
        user: ctx.accounts.user.key(),
        tickets_added: tickets,
        lamports,
        participant_index,
        deposited_after,
        total_tickets_after,
        purchase_budget_after,
    });

    Ok(())
}
