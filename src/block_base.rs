//! BlockBase - Initialization flag and seeded RNG of a block.
//!
//! The RNG is the only source of randomness a block uses. It is seeded once
//! at construction and handed out by `&mut` to every operation that draws
//! from it, so a run is replayable from its seed and input sequence.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Common state shared by all blocks.
///
/// # Examples
///
/// ```
/// use statelet::BlockBase;
///
/// let mut base = BlockBase::new(42);
/// assert!(!base.is_initialized());
/// base.set_initialized(true);
/// assert!(base.is_initialized());
/// assert_eq!(base.seed(), 42);
/// ```
#[derive(Clone, Debug)]
pub struct BlockBase {
    init_flag: bool,
    rng: StdRng,
    seed: u64,
}

impl BlockBase {
    /// Create a BlockBase with an RNG seeded from `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            init_flag: false,
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Seed the RNG was created from.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Whether `init()` has completed.
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.init_flag
    }

    /// Set the initialization flag.
    #[inline]
    pub fn set_initialized(&mut self, flag: bool) {
        self.init_flag = flag;
    }

    /// Mutable access to the block's RNG.
    #[inline]
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}
