pub mod clock;
pub mod code_generator;
pub mod jwt;
pub mod random;

pub use clock::{Clock, ReferenceZone, SystemClock};
pub use code_generator::{CLAIM_CODE_BYTES, generate_claim_code};
pub use jwt::*;
pub use random::{OsRandom, RandomSource};
