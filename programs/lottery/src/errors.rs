use anchor_lang::prelude::*;

#[error_code]
pub enum ErrorCode {
    #[msg("Unauthorized")]
    Unauthorized,
    #[msg("Program is paused")]
    Paused,
    #[msg("Math overflow")]
    MathOverflow,
    #[msg("Invalid config parameter")]
    InvalidConfig,
    #[msg("purchase_bps + owner_bps must not exceed 10000")]
    InvalidSplits,

    #[msg("Round id must be current_round_id + 1")]
    InvalidRoundId,
    #[msg("Previous round account is required")]
    PreviousRoundRequired,
    #[msg("Previous round is still open or inside its purchase window")]
    PreviousRoundOpen,
    #[msg("Round is closed for deposits")]
    RoundClosed,
    #[msg("Round is not closed yet")]
    RoundNotClosed,
    #[msg("Round is already finalized")]
    RoundAlreadyFinalized,
    #[msg("Ticket count must be positive")]
    ZeroTickets,
    #[msg("Max participants reached")]
    MaxParticipantsReached,

    #[msg("Caller is not the purchase executor")]
    UnauthorizedExecutor,
    #[msg("Native price must be positive")]
    InvalidPurchasePrice,
    #[msg("Native price exceeds max native spend")]
    SpendCapExceeded,
    #[msg("Purchase window is not open")]
    PurchaseWindowClosed,
    #[msg("Purchase exceeds remaining purchase budget")]
    PurchaseBudgetExceeded,
    #[msg("Round vault cannot fund the purchase")]
    InsufficientVaultFunds,
    #[msg("Marketplace calldata too long")]
    CalldataTooLong,
    #[msg("Marketplace account is not an executable program")]
    MarketplaceNotExecutable,
    #[msg("Marketplace program is not allowlisted")]
    MarketplaceNotAllowed,
    #[msg("Prize asset is not allowlisted")]
    AssetNotAllowed,
    #[msg("Prize vault received nothing from the purchase")]
    PrizeNotReceived,
    #[msg("Prize index must equal the round prize count")]
    InvalidPrizeIndex,

    #[msg("Allowlist is full")]
    AllowlistFull,
    #[msg("Allowlist kind mismatch")]
    AllowlistKindMismatch,

    #[msg("Purchase window has not ended yet")]
    DrawTooEarly,
    #[msg("Draw already requested for this round")]
    DrawAlreadyRequested,
    #[msg("Jackpot prize account must be passed iff the jackpot is non-zero")]
    JackpotAccountMismatch,
    #[msg("Draw was not requested for this round")]
    DrawNotRequested,
    #[msg("Randomness already fulfilled")]
    RandomnessAlreadyFulfilled,
    #[msg("Randomness not ready")]
    RandomnessNotReady,
    #[msg("All prize slots are already drawn")]
    AllWinnersDrawn,
    #[msg("Not all prize slots are drawn")]
    WinnersNotDrawn,
    #[msg("Missing prize accounts for the requested batch")]
    MissingPrizeAccounts,
    #[msg("Prize account does not match the expected slot")]
    InvalidPrizeAccount,
    #[msg("Prize slot already drawn")]
    PrizeAlreadyDrawn,
    #[msg("Round has no tickets to draw from")]
    NoTickets,

    #[msg("Prize is not drawn yet")]
    PrizeNotDrawn,
    #[msg("Prize already claimed")]
    PrizeAlreadyClaimed,
    #[msg("Only the prize owner can claim")]
    OnlyPrizeOwner,
    #[msg("Token accounts required for this prize kind are missing")]
    MissingTokenAccounts,
    #[msg("Invalid token account")]
    InvalidTokenAccount,
    #[msg("Invalid round account")]
    InvalidRound,
}
