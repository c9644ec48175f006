//! Small seedable PRNG used for question and answer shuffling.

/// PCG-style generator seeded from the OS, or from a fixed seed for replays and tests.
#[derive(Debug, Clone)]
pub struct QuizRng {
    state: u64,
}

impl QuizRng {
    pub fn new() -> Self {
        let mut seed_bytes = [0u8; 8];
        getrandom::getrandom(&mut seed_bytes).unwrap_or_else(|_| {
            // Fallback: use a static counter if getrandom fails
            static COUNTER: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1);
            let counter = COUNTER.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            seed_bytes = counter.to_le_bytes();
        });
        Self::with_seed(u64::from_le_bytes(seed_bytes))
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(1),
        }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let xorshifted = (((self.state >> 18) ^ self.state) >> 27) as u32;
        let rot = (self.state >> 59) as u32;
        (xorshifted.rotate_right(rot)) as u64
    }

    /// Uniform-ish index in `0..bound`. `bound` must be non-zero.
    pub fn next_index(&mut self, bound: usize) -> usize {
        (self.next_u64() as usize) % bound
    }

    /// Fisher-Yates shuffle in place
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.next_index(i + 1);
            slice.swap(i, j);
        }
    }
}

impl Default for QuizRng {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_order() {
        let mut a: Vec<u32> = (0..20).collect();
        let mut b = a.clone();
        QuizRng::with_seed(7).shuffle(&mut a);
        QuizRng::with_seed(7).shuffle(&mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut values: Vec<u32> = (0..50).collect();
        QuizRng::with_seed(42).shuffle(&mut values);
        let mut sorted = values.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_shuffle_handles_tiny_slices() {
        let mut rng = QuizRng::with_seed(1);
        let mut empty: Vec<u8> = Vec::new();
        rng.shuffle(&mut empty);
        let mut one = vec![9];
        rng.shuffle(&mut one);
        assert_eq!(one, vec![9]);
    }
}
