pub mod health;
pub mod lucky_draw;
pub mod user;

pub use health::health_config;
pub use lucky_draw::lucky_draw_config;
pub use user::user_config;
