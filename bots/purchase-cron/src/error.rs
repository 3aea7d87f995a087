use std::path::PathBuf;

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// Missing or malformed deployment records and credentials.
///
/// `Clone` so a chain that failed to resolve at start-up can report the same
/// cause on every tick.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("no deployment record for chain `{chain}` at {path}")]
    DeploymentMissing { chain: String, path: PathBuf },
    #[error("deployment record {path} is malformed: {message}")]
    DeploymentMalformed { path: PathBuf, message: String },
    #[error("credential `{0}` is not set")]
    CredentialMissing(String),
    #[error("credential `{0}` is not a valid keypair")]
    InvalidKeypair(String),
    #[error("`{field}` is not a valid address: {value}")]
    InvalidAddress { field: &'static str, value: String },
    #[error("invalid native amount {0:?}")]
    InvalidAmount(String),
    #[error("invalid purchase task: {0}")]
    InvalidTask(String),
    #[error("chain `{0}` is not listed in DEPLOYMENTS")]
    UnknownChain(String),
}

/// Failures talking to the lottery program.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("rpc request failed: {0}")]
    Rpc(String),
    #[error("account {0} not found")]
    AccountNotFound(Pubkey),
    #[error("account {address} is not a valid {what}")]
    Decode { what: &'static str, address: Pubkey },
    #[error("no round has been started yet")]
    NoRound,
    #[error("transaction failed: {0}")]
    Transaction(String),
}

/// Why a purchase was not submitted, or why its submission failed.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("native price {price} exceeds max native spend {cap}")]
    CapExceeded { price: u64, cap: u64 },
    #[error("purchase window of round {round_id} is not open")]
    WindowClosed { round_id: u64 },
    #[error("native price {price} exceeds remaining purchase budget {remaining}")]
    BudgetExhausted { price: u64, remaining: u64 },
    #[error("fresh round read failed: {0}")]
    Read(#[source] LedgerError),
    #[error("purchase submission failed: {0}")]
    Submission(#[source] LedgerError),
}

/// Per-chain failure classes of a scheduler tick. None of them stop the process.
#[derive(Debug, Error)]
pub enum TickError {
    #[error("configuration missing: {0}")]
    ConfigurationMissing(#[source] ConfigError),
    #[error("round read failed: {0}")]
    ReadFailure(#[source] LedgerError),
    #[error("execution failed: {0}")]
    ExecutionFailure(#[source] ExecError),
}

/// Operator action refused before anything was sent, or failed on the ledger.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("round {round_id} is not closed yet")]
    RoundNotClosed { round_id: u64 },
    #[error("round {round_id} is still inside its purchase window")]
    PurchaseWindowOpen { round_id: u64 },
    #[error("round {round_id} is already finalized")]
    AlreadyFinalized { round_id: u64 },
    #[error("draw already requested for round {round_id}")]
    DrawAlreadyRequested { round_id: u64 },
    #[error("draw not requested for round {round_id}")]
    DrawNotRequested { round_id: u64 },
    #[error("randomness for round {round_id} has not arrived")]
    RandomnessPending { round_id: u64 },
    #[error("round {round_id} has no undrawn prize slots")]
    NothingToDraw { round_id: u64 },
    #[error("round {round_id} still has {remaining} undrawn prize slots")]
    WinnersPending { round_id: u64, remaining: u32 },
    #[error("round {round_id} accepts deposits or purchases until {closes_at}")]
    PreviousRoundOpen { round_id: u64, closes_at: i64 },
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
