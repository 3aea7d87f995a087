use anchor_lang::prelude::*;

pub mod constants;
pub mod errors;
pub mod events;
pub mod state;
pub mod utils;
pub mod instructions;

use instructions::*;

#[cfg(feature = "devnet")]
declare_id!("LotteryDev111111111111111111111111111111111");

#[cfg(not(feature = "devnet"))]
declare_id!("Lottery111111111111111111111111111111111111");

#[program]
pub mod lottery {
    use super::*;

    pub fn init_config(ctx: Context<InitConfig>, args: InitConfigArgs) -> Result<()> {
        init_config::handler(ctx, args)
    }

    pub fn update_config(ctx: Context<UpdateConfig>, args: UpdateConfigArgs) -> Result<()> {
        update_config::handler(ctx, args)
    }

    pub fn set_allowlist_entry(
        ctx: Context<SetAllowlistEntry>,
        kind: u8,
        key: Pubkey,
        allowed: bool,
    ) -> Result<()> {
        set_allowlist_entry::handler(ctx, kind, key, allowed)
    }

    pub fn start_next_round(ctx: Context<StartNextRound>, round_id: u64) -> Result<()> {
        start_next_round::handler(ctx, round_id)
    }

    pub fn deposit(ctx: Context<Deposit>, round_id: u64, tickets: u64) -> Result<()> {
        deposit::handler(ctx, round_id, tickets)
    }

    pub fn execute_marketplace_purchase<'info>(
        ctx: Context<'_, '_, 'info, 'info, ExecuteMarketplacePurchase<'info>>,
        round_id: u64,
        calldata: Vec<u8>,
        native_price: u64,
        max_native_spend: u64,
        prize_index: u32,
    ) -> Result<()> {
        execute_marketplace_purchase::handler(
            ctx,
            round_id,
            calldata,
            native_price,
            max_native_spend,
            prize_index,
        )
    }

    pub fn request_draw(ctx: Context<RequestDraw>, round_id: u64, jackpot_index: u32) -> Result<()> {
        request_draw::handler(ctx, round_id, jackpot_index)
    }

    pub fn draw_randomness_callback(
        ctx: Context<DrawRandomnessCallback>,
        randomness: [u8; 32],
    ) -> Result<()> {
        draw_randomness_callback::handler(ctx, randomness)
    }

    pub fn draw_winners<'info>(
        ctx: Context<'_, '_, 'info, 'info, DrawWinners<'info>>,
        round_id: u64,
        batch_size: u32,
    ) -> Result<()> {
        draw_winners::handler(ctx, round_id, batch_size)
    }

    pub fn finalize_round(ctx: Context<FinalizeRound>, round_id: u64) -> Result<()> {
        finalize_round::handler(ctx, round_id)
    }

    pub fn claim_prize(ctx: Context<ClaimPrize>, round_id: u64, prize_index: u32) -> Result<()> {
        claim_prize::handler(ctx, round_id, prize_index)
    }

    #[cfg(feature = "devnet")]
    pub fn mock_draw_randomness(
        ctx: Context<MockDrawRandomness>,
        round_id: u64,
        randomness: [u8; 32],
    ) -> Result<()> {
        mock_draw_randomness::handler(ctx, round_id, randomness)
    }
}
