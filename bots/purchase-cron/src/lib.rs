//! Off-chain side of the lottery: a periodic scheduler that spends each
//! round's purchase budget on marketplace prizes during the purchase window,
//! plus the operator actions that move rounds through their lifecycle.

pub mod amount;
pub mod clock;
pub mod config;
pub mod deployment;
pub mod driver;
pub mod error;
pub mod executor;
pub mod ledger;
pub mod oracle;
pub mod prizes;
pub mod rpc;
pub mod scheduler;
pub mod task;
