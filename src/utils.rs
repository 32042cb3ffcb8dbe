//! Random number helpers shared by the learning blocks.

use rand::Rng;

/// Generate a random unsigned integer in range [min, max] (inclusive).
///
/// # Examples
///
/// ```
/// use statelet::utils::rand_uint;
/// use rand::SeedableRng;
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(0);
/// let val = rand_uint(10, 20, &mut rng);
/// assert!(val >= 10 && val <= 20);
/// ```
#[inline]
pub fn rand_uint<R: Rng>(min: u32, max: u32, rng: &mut R) -> u32 {
    rng.gen_range(min..=max)
}

/// Pick a uniformly random index in `[beg, end)`.
///
/// A single-element range returns `beg` without consuming randomness, so
/// one-statelet columns do not perturb the generator's sequence.
#[inline]
pub fn rand_index<R: Rng>(beg: usize, end: usize, rng: &mut R) -> usize {
    debug_assert!(beg < end, "empty range");
    if end - beg == 1 {
        beg
    } else {
        rand_uint(beg as u32, (end - 1) as u32, rng) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_rand_uint() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        for _ in 0..100 {
            let val = rand_uint(10, 20, &mut rng);
            assert!((10..=20).contains(&val));
        }
    }

    #[test]
    fn test_rand_index_single() {
        let mut rng1 = rand::rngs::StdRng::seed_from_u64(7);
        let mut rng2 = rand::rngs::StdRng::seed_from_u64(7);

        assert_eq!(rand_index(4, 5, &mut rng1), 4);

        // Generator untouched by the single-element draw
        assert_eq!(rand_uint(0, 1000, &mut rng1), rand_uint(0, 1000, &mut rng2));
    }

    #[test]
    fn test_rand_index_deterministic() {
        let mut rng1 = rand::rngs::StdRng::seed_from_u64(42);
        let mut rng2 = rand::rngs::StdRng::seed_from_u64(42);

        for _ in 0..50 {
            let a = rand_index(8, 16, &mut rng1);
            let b = rand_index(8, 16, &mut rng2);
            assert_eq!(a, b);
            assert!((8..16).contains(&a));
        }
    }
}
