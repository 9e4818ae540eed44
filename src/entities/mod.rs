pub mod rewards;
pub mod spin_attempts;
pub mod user_rewards;

pub use rewards as reward_entity;
pub use rewards::RewardKind;
pub use spin_attempts as spin_attempt_entity;
pub use user_rewards as user_reward_entity;
pub use user_rewards::AwardStatus;
