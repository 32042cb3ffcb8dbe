//! BlockMemory - Dendrites, receptors and permanence learning.
//!
//! Every dendrite owns `num_rpd` receptors. A receptor is an address into
//! the context bit space plus a permanence byte. Receptors at or above
//! `perm_thr` are connected; a dendrite's overlap with a state is the number
//! of connected receptors whose addressed bit is active.
//!
//! # Learning
//!
//! `learn_move()` is the only learning rule the sequence learner needs:
//!
//! - Live receptors (permanence > 0) move toward the state: `+perm_inc` if
//!   their bit is active, `-perm_dec` otherwise, saturating at both ends
//! - Dead receptors (permanence 0) are relocated onto an active state bit
//!   that no live receptor of the same dendrite already covers, and restart
//!   at `perm_thr`
//!
//! Memory starts with random addresses and all permanences at zero, so a
//! dendrite's receptors are placed by its first `learn_move()` call.
//!
//! # Examples
//!
//! ```
//! use statelet::{BitArray, BlockMemory};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let mut rng = StdRng::seed_from_u64(0);
//! let mut memory = BlockMemory::new(4, 8, 20, 2, 1);
//! memory.init(64, &mut rng);
//!
//! let mut context = BitArray::new(64);
//! context.set_acts(&[1, 9, 17, 25, 33, 41, 49, 57]);
//!
//! assert_eq!(memory.overlap(0, &context), 0);
//! memory.learn_move(0, &context, &mut rng);
//! assert_eq!(memory.overlap(0, &context), 8);
//! ```

use crate::bitarray::BitArray;
use crate::error::{Result, StateletError};
use rand::rngs::StdRng;
use rand::Rng;

/// Minimum permanence value
pub const PERM_MIN: u8 = u8::MIN;

/// Maximum permanence value
pub const PERM_MAX: u8 = u8::MAX;

/// Receptor storage and learning for a fixed pool of dendrites.
pub struct BlockMemory {
    /// Dendrite-active scratch state, rebuilt every step
    pub state: BitArray,

    num_i: usize,
    num_d: usize,
    num_rpd: usize,
    perm_thr: u8,
    perm_inc: u8,
    perm_dec: u8,

    // Flattened [num_d][num_rpd]
    r_addrs: Vec<u32>,
    r_perms: Vec<u8>,

    // Reused by learn_move to track relocation targets
    available: BitArray,

    init_flag: bool,
}

impl BlockMemory {
    /// Create memory for `num_d` dendrites of `num_rpd` receptors each.
    ///
    /// Call `init()` once the context width is known.
    pub fn new(num_d: usize, num_rpd: usize, perm_thr: u8, perm_inc: u8, perm_dec: u8) -> Self {
        assert!(num_d > 0, "num_d must be > 0");
        assert!(num_rpd > 0, "num_rpd must be > 0");

        let num_r = num_d * num_rpd;

        Self {
            state: BitArray::new(num_d),
            num_i: 0,
            num_d,
            num_rpd,
            perm_thr,
            perm_inc,
            perm_dec,
            r_addrs: vec![0; num_r],
            r_perms: vec![PERM_MIN; num_r],
            available: BitArray::new(0),
            init_flag: false,
        }
    }

    /// Size the address space to `num_i` context bits.
    ///
    /// Addresses are scattered at random and every permanence is zero.
    pub fn init(&mut self, num_i: usize, rng: &mut StdRng) {
        assert!(num_i > 0, "num_i must be > 0");
        assert!(num_i <= u32::MAX as usize, "num_i must fit in u32");

        self.num_i = num_i;
        for addr in self.r_addrs.iter_mut() {
            *addr = rng.gen_range(0..num_i as u32);
        }
        self.r_perms.fill(PERM_MIN);
        self.available.resize(num_i);
        self.state.clear_all();
        self.init_flag = true;
    }

    /// Count connected receptors of dendrite `d` whose bit is active in `input`.
    #[inline]
    pub fn overlap(&self, d: usize, input: &BitArray) -> usize {
        assert!(self.init_flag, "must call init() first");
        debug_assert!(d < self.num_d, "dendrite index out of bounds");

        let r = self.receptor_range(d);
        self.r_addrs[r.clone()]
            .iter()
            .zip(&self.r_perms[r])
            .filter(|&(&addr, &perm)| perm >= self.perm_thr && input.get_bit(addr as usize))
            .count()
    }

    /// Reinforce dendrite `d` toward `input` and relocate its dead receptors.
    ///
    /// Relocation starts its search at a uniformly random context bit and
    /// takes the next active bit (wrapping) not covered by a live receptor
    /// of this dendrite, so a dendrite never holds two live receptors on the
    /// same bit. A fresh start is drawn after every successful move. When no
    /// uncovered active bit remains, dead receptors stay where they are.
    ///
    /// Targets are always active bits, and the choice among them is not
    /// uniform: a candidate is picked with probability proportional to the
    /// gap of inactive bits preceding it, so bits after long empty runs are
    /// favored.
    pub fn learn_move(&mut self, d: usize, input: &BitArray, rng: &mut StdRng) {
        assert!(self.init_flag, "must call init() first");
        debug_assert!(d < self.num_d, "dendrite index out of bounds");
        debug_assert_eq!(input.num_bits(), self.num_i, "input width mismatch");

        let mut next_addr = rng.gen_range(0..self.num_i);
        let r_range = self.receptor_range(d);

        self.available.words_mut().copy_from_slice(input.words());
        for r in r_range.clone() {
            if self.r_perms[r] > PERM_MIN {
                self.available.clear_bit(self.r_addrs[r] as usize);
            }
        }
        let mut exhausted = self.available.num_set() == 0;

        for r in r_range {
            let perm = self.r_perms[r];
            if perm > PERM_MIN {
                self.r_perms[r] = if input.get_bit(self.r_addrs[r] as usize) {
                    perm.saturating_add(self.perm_inc)
                } else {
                    perm.saturating_sub(self.perm_dec)
                };
            } else if !exhausted {
                match self.available.find_next_set_bit(next_addr) {
                    Some(addr) => {
                        self.r_addrs[r] = addr as u32;
                        self.r_perms[r] = self.perm_thr.max(1);
                        self.available.clear_bit(addr);
                        next_addr = rng.gen_range(0..self.num_i);
                    }
                    None => exhausted = true,
                }
            }
        }
    }

    /// Clear the dendrite-active scratch state.
    pub fn clear(&mut self) {
        self.state.clear_all();
    }

    /// Whether `init()` has run.
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.init_flag
    }

    /// Number of dendrites.
    #[inline]
    pub fn num_dendrites(&self) -> usize {
        self.num_d
    }

    /// Receptors per dendrite.
    #[inline]
    pub fn num_rpd(&self) -> usize {
        self.num_rpd
    }

    /// Width of the context address space.
    #[inline]
    pub fn num_inputs(&self) -> usize {
        self.num_i
    }

    /// Receptor addresses of dendrite `d`.
    pub fn addrs(&self, d: usize) -> &[u32] {
        &self.r_addrs[self.receptor_range(d)]
    }

    /// Receptor permanences of dendrite `d`.
    pub fn perms(&self, d: usize) -> &[u8] {
        &self.r_perms[self.receptor_range(d)]
    }

    /// All receptor addresses, dendrite-major.
    pub fn receptor_addrs(&self) -> &[u32] {
        &self.r_addrs
    }

    /// All receptor permanences, dendrite-major.
    pub fn receptor_perms(&self) -> &[u8] {
        &self.r_perms
    }

    /// Replace every receptor with a previously saved image.
    ///
    /// Lengths and addresses are checked first; on error nothing changes.
    pub fn restore(&mut self, addrs: Vec<u32>, perms: Vec<u8>) -> Result<()> {
        assert!(self.init_flag, "must call init() first");

        let num_r = self.r_addrs.len();
        for len in [addrs.len(), perms.len()] {
            if len != num_r {
                return Err(StateletError::InvalidInputSize {
                    expected: num_r,
                    actual: len,
                });
            }
        }
        if let Some(&bad) = addrs.iter().find(|&&a| a as usize >= self.num_i) {
            return Err(StateletError::InvalidParameter(format!(
                "receptor address {} outside context width {}",
                bad, self.num_i
            )));
        }

        self.r_addrs = addrs;
        self.r_perms = perms;
        Ok(())
    }

    /// Estimate memory usage in bytes.
    pub fn memory_usage(&self) -> usize {
        let mut bytes = std::mem::size_of::<Self>();
        bytes += self.state.memory_usage();
        bytes += self.available.memory_usage();
        bytes += self.r_addrs.capacity() * std::mem::size_of::<u32>();
        bytes += self.r_perms.capacity() * std::mem::size_of::<u8>();
        bytes
    }

    #[inline]
    fn receptor_range(&self, d: usize) -> std::ops::Range<usize> {
        let beg = d * self.num_rpd;
        beg..beg + self.num_rpd
    }
}
