//! The generator's single random stream
//!
//! A level is a pure function of `(seed, config)`: every phase of every
//! attempt draws from one `GameRng`, so retries never reseed.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seeded ChaCha8 stream with the dice helpers the phases roll with
#[derive(Debug, Clone)]
pub struct GameRng {
    rng: ChaCha8Rng,
    seed: u64,
}

impl GameRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Stream for an unseeded run; the seed stays readable through [`Self::seed`]
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    /// Seed the stream started from, reported back in every `Level`
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform in `0..n`, or 0 for an empty range
    pub fn rn2(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        self.rng.gen_range(0..n)
    }

    /// Uniform in `1..=n`, or 0 for an empty range
    pub fn rnd(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        self.rng.gen_range(1..=n)
    }

    /// Uniform in `lo..=hi`; `lo` when `hi <= lo`
    pub fn range(&mut self, lo: i32, hi: i32) -> i32 {
        if hi <= lo {
            return lo;
        }
        self.rng.gen_range(lo..=hi)
    }

    pub fn one_in(&mut self, n: u32) -> bool {
        self.rn2(n) == 0
    }

    /// Roll against a `*_pct` config value
    pub fn percent(&mut self, pct: u32) -> bool {
        self.rn2(100) < pct
    }

    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        let i = self.rn2(items.len() as u32) as usize;
        items.get(i)
    }

    /// Fisher-Yates, drawing through `rn2` so shuffles stay on the stream
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.rn2(i as u32 + 1) as usize;
            items.swap(i, j);
        }
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helpers_stay_in_range() {
        let mut rng = GameRng::new(42);
        for _ in 0..1000 {
            assert!(rng.rn2(10) < 10);
            assert!((1..=6).contains(&rng.rnd(6)));
            assert!((-3..=4).contains(&rng.range(-3, 4)));
        }
        assert_eq!(rng.range(5, 5), 5);
        assert_eq!(rng.range(9, 2), 9);
        assert_eq!((rng.rn2(0), rng.rnd(0)), (0, 0));
    }

    #[test]
    fn test_percent_extremes() {
        let mut rng = GameRng::new(1);
        assert!((0..200).all(|_| rng.percent(100)));
        assert!((0..200).all(|_| !rng.percent(0)));
        assert!((0..200).all(|_| rng.one_in(1)));
    }

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = GameRng::new(7);
        let mut b = GameRng::new(7);
        let mut xs: Vec<u32> = (0..30).collect();
        let mut ys = xs.clone();
        a.shuffle(&mut xs);
        b.shuffle(&mut ys);
        assert_eq!(xs, ys);
        assert_eq!(a.choose(&xs), b.choose(&ys));
        assert_eq!(a.seed(), 7);
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let mut rng = GameRng::new(3);
        let mut items: Vec<u32> = (0..20).collect();
        rng.shuffle(&mut items);
        assert_ne!(items, (0..20).collect::<Vec<_>>());
        items.sort_unstable();
        assert_eq!(items, (0..20).collect::<Vec<_>>());
        assert!(rng.choose::<u8>(&[]).is_none());
    }
}
