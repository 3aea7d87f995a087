pub mod claim_prize;
pub mod deposit;
pub mod draw_randomness_callback;
pub mod draw_winners;
pub mod execute_marketplace_purchase;
pub mod finalize_round;
pub mod init_config;
#[cfg(feature = "devnet")]
pub mod mock_draw_randomness;
pub mod request_draw;
pub mod set_allowlist_entry;
pub mod start_next_round;
pub mod update_config;

pub use claim_prize::*;
pub use deposit::*;
pub use draw_randomness_callback::*;
pub use draw_winners::*;
pub use execute_marketplace_purchase::*;
pub use finalize_round::*;
pub use init_config::*;
#[cfg(feature = "devnet")]
pub use mock_draw_randomness::*;
pub use request_draw::*;
pub use set_allowlist_entry::*;
pub use start_next_round::*;
pub use update_config::*;
