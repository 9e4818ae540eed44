pub mod common;
pub mod lucky_draw;
pub mod pagination;

pub use common::*;
pub use lucky_draw::*;
pub use pagination::*;
