//! Seeded deterministic RNG shared by every composition phase.
//!
//! One `SeededRng` is created per region run and handed by `&mut` to each
//! phase in a fixed order. The sequence of draws is part of the determinism
//! contract: drawing one extra number anywhere changes every later placement,
//! even with the same seed. The tests at the bottom pin the raw sequence.

/// Simple deterministic 32-bit generator (mulberry32).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededRng {
    state: u32,
}

impl SeededRng {
    /// Create a generator from a 64-bit seed (folded to 32 bits).
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            state: (seed as u32) ^ ((seed >> 32) as u32),
        }
    }

    /// Next raw 32-bit value.
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Uniform float in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }

    /// Uniform integer in `[min, max)`. Returns `min` for an empty range
    /// without consuming a draw.
    pub fn range(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = u64::from(max.abs_diff(min));
        min + ((u64::from(self.next_u32()) * span) >> 32) as i32
    }

    /// Uniform float in `[min, max)`.
    pub fn range_f64(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_f64() * (max - min)
    }

    /// `true` with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Pick an element uniformly. `None` for an empty slice (no draw).
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.range(0, items.len() as i32) as usize;
        items.get(idx)
    }

    /// Fisher-Yates shuffle, walking from the back.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.range(0, i as i32 + 1) as usize;
            items.swap(i, j);
        }
    }

    /// Draw a seed for a sub-layout that owns its own generator.
    pub fn derive_seed(&mut self) -> u64 {
        u64::from(self.next_u32())
    }
}

/// 64-bit FNV-1a hash, used to derive stable per-region seeds from ids.
#[must_use]
pub fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_sequence_is_pinned() {
        let mut rng = SeededRng::new(42);
        let draws: Vec<u32> = (0..5).map(|_| rng.next_u32()).collect();
        assert_eq!(
            draws,
            vec![2_581_720_956, 1_925_393_290, 3_661_312_704, 2_876_485_805, 750_819_978]
        );
    }

    #[test]
    fn test_seed_folding() {
        // High and low halves are xor-folded, so these two seeds collide.
        let mut a = SeededRng::new(0x0000_0001_0000_0000);
        let mut b = SeededRng::new(0x0000_0000_0000_0001);
        assert_eq!(a.next_u32(), b.next_u32());
    }

    #[test]
    fn test_range_bounds() {
        let mut rng = SeededRng::new(7);
        for _ in 0..1000 {
            let v = rng.range(-3, 4);
            assert!((-3..4).contains(&v));
        }
    }

    #[test]
    fn test_empty_range_does_not_draw() {
        let mut a = SeededRng::new(9);
        let mut b = SeededRng::new(9);
        assert_eq!(a.range(5, 5), 5);
        assert_eq!(a.next_u32(), b.next_u32());
    }

    #[test]
    fn test_next_f64_unit_interval() {
        let mut rng = SeededRng::new(123);
        for _ in 0..1000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_shuffle_is_permutation_and_deterministic() {
        let mut a = SeededRng::new(5);
        let mut b = SeededRng::new(5);
        let mut xs = [0, 1, 2, 3, 4, 5, 6, 7];
        let mut ys = xs;
        a.shuffle(&mut xs);
        b.shuffle(&mut ys);
        assert_eq!(xs, ys);
        let mut sorted = xs;
        sorted.sort_unstable();
        assert_eq!(sorted, [0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_fnv1a_known_value() {
        assert_eq!(fnv1a(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a(b"a"), 0xaf63_dc4c_8601_ec8c);
    }
}
