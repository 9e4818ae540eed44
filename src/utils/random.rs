use rand::rngs::OsRng;
use rand::{Rng, RngCore};

/// 抽奖与兑奖码使用的随机源
///
/// 奖品有实际价值, 生产环境必须使用操作系统 CSPRNG ([`OsRandom`]),
/// 不可替换为可预测的快速 PRNG。
pub trait RandomSource: Send + Sync {
    /// `[0, 1)` 上的均匀分布
    fn next_unit(&self) -> f64;

    fn fill_bytes(&self, dest: &mut [u8]);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn next_unit(&self) -> f64 {
        OsRng.gen_range(0.0..1.0)
    }

    fn fill_bytes(&self, dest: &mut [u8]) {
        OsRng.fill_bytes(dest);
    }
}
