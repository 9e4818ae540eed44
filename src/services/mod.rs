pub mod claim_service;
pub mod lucky_draw_service;
pub mod reward_selector;
pub mod spin_ledger;

pub use claim_service::*;
pub use lucky_draw_service::*;
pub use spin_ledger::*;
