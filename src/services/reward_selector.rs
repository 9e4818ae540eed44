//! 按权重随机选择奖品
//!
//! 对奖池按固定顺序累加权重, 取 `x ∈ [0, total)` 第一次满足 `x < cumulative` 的奖品。
//! 浮点累加误差导致没有奖品越过 `x` 时, 回退到最后一个奖品。

use crate::entities::reward_entity as rewards;
use crate::utils::RandomSource;

pub trait Weighted {
    fn weight(&self) -> f64;
}

impl Weighted for rewards::Model {
    fn weight(&self) -> f64 {
        self.probability
    }
}

/// 权重之和 (负数按 0 计)
pub fn total_weight<T: Weighted>(pool: &[T]) -> f64 {
    pool.iter().map(|item| item.weight().max(0.0)).sum()
}

/// 用给定的单位随机数 `unit ∈ [0, 1)` 选择; 空奖池或总权重为 0 时返回 None
pub fn select_with_unit<T: Weighted>(pool: &[T], unit: f64) -> Option<&T> {
    let total = total_weight(pool);
    if pool.is_empty() || total <= 0.0 {
        return None;
    }

    let x = unit.clamp(0.0, 1.0) * total;
    let mut cumulative = 0.0;
    for item in pool {
        cumulative += item.weight().max(0.0);
        if x < cumulative {
            return Some(item);
        }
    }

    pool.last()
}

pub fn select<'a, T: Weighted>(pool: &'a [T], rng: &dyn RandomSource) -> Option<&'a T> {
    select_with_unit(pool, rng.next_unit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::OsRandom;

    #[derive(Debug, PartialEq)]
    struct Item(&'static str, f64);

    impl Weighted for Item {
        fn weight(&self) -> f64 {
            self.1
        }
    }

    fn pool() -> Vec<Item> {
        vec![Item("a", 1.0), Item("b", 1.0), Item("c", 2.0)]
    }

    #[test]
    fn test_deterministic_for_fixed_unit() {
        let pool = pool();
        // total = 4: [0,1) -> a, [1,2) -> b, [2,4) -> c
        assert_eq!(select_with_unit(&pool, 0.0).unwrap().0, "a");
        assert_eq!(select_with_unit(&pool, 0.2499).unwrap().0, "a");
        assert_eq!(select_with_unit(&pool, 0.25).unwrap().0, "b");
        assert_eq!(select_with_unit(&pool, 0.4999).unwrap().0, "b");
        assert_eq!(select_with_unit(&pool, 0.5).unwrap().0, "c");
        assert_eq!(select_with_unit(&pool, 0.9999).unwrap().0, "c");

        for _ in 0..10 {
            assert_eq!(select_with_unit(&pool, 0.3), select_with_unit(&pool, 0.3));
        }
    }

    #[test]
    fn test_falls_back_to_last_when_nothing_crosses() {
        let pool = pool();
        // unit 被截断到 1.0 => x == total, 没有 x < cumulative
        assert_eq!(select_with_unit(&pool, 1.0).unwrap().0, "c");
        assert_eq!(select_with_unit(&pool, 7.5).unwrap().0, "c");
    }

    #[test]
    fn test_zero_weight_never_selected() {
        let pool = vec![Item("zero", 0.0), Item("one", 1.0)];
        assert_eq!(select_with_unit(&pool, 0.0).unwrap().0, "one");
    }

    #[test]
    fn test_empty_or_weightless_pool() {
        let empty: Vec<Item> = vec![];
        assert!(select_with_unit(&empty, 0.5).is_none());

        let weightless = vec![Item("a", 0.0), Item("b", 0.0)];
        assert!(select_with_unit(&weightless, 0.5).is_none());
    }

    #[test]
    fn test_frequency_converges_to_weights() {
        let pool = pool();
        let rng = OsRandom;
        let n = 200_000;
        let mut counts = [0usize; 3];
        for _ in 0..n {
            match select(&pool, &rng).unwrap().0 {
                "a" => counts[0] += 1,
                "b" => counts[1] += 1,
                _ => counts[2] += 1,
            }
        }

        let expected = [0.25, 0.25, 0.5];
        for (count, want) in counts.iter().zip(expected) {
            let freq = *count as f64 / n as f64;
            // 标准差约 0.001, 容差 0.01 足够稳定
            assert!((freq - want).abs() < 0.01, "freq {freq} vs {want}");
        }
    }

    #[test]
    fn test_many_tiny_weights_terminate() {
        let pool: Vec<Item> = (0..1000).map(|_| Item("x", 0.1)).collect();
        for unit in [0.0, 0.5, 0.999_999_999_999] {
            assert!(select_with_unit(&pool, unit).is_some());
        }
    }
}
