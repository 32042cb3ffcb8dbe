//! DendriteUsage - Per-statelet allocation cursors and per-dendrite used flags.
//!
//! Dendrites are an arena: statelet `s` owns the contiguous slots
//! `[s * num_dps, (s + 1) * num_dps)`, and `next_sd[s]` indexes the next slot
//! to hand out. Cursors only move forward and stop at the last slot; once a
//! statelet's budget is spent its final dendrite is reused for every new
//! transition. Used flags are set by learning and never cleared.

use crate::bitarray::BitArray;
use crate::error::{Result, StateletError};

/// Allocation bookkeeping for a learner's dendrite pool.
#[derive(Clone, Debug)]
pub struct DendriteUsage {
    num_dps: usize,
    next_sd: Vec<u32>,
    d_used: BitArray,
}

impl DendriteUsage {
    /// Track `num_s` statelets with `num_dps` dendrites each.
    pub fn new(num_s: usize, num_dps: usize) -> Self {
        assert!(num_dps > 0, "num_dps must be > 0");
        assert!(num_dps <= u32::MAX as usize, "num_dps must fit in u32");

        Self {
            num_dps,
            next_sd: vec![0; num_s],
            d_used: BitArray::new(num_s * num_dps),
        }
    }

    /// Hand out statelet `s`'s next dendrite, activating it in `d_state`.
    ///
    /// Returns the dendrite index. The cursor saturates at `num_dps - 1`.
    #[inline]
    pub fn allocate_or_touch(&mut self, s: usize, d_state: &mut BitArray) -> usize {
        let cursor = self.next_sd[s];
        let d = s * self.num_dps + cursor as usize;
        d_state.set_bit(d);

        if (cursor as usize) < self.num_dps - 1 {
            self.next_sd[s] = cursor + 1;
        }
        d
    }

    /// Cursor of statelet `s`.
    #[inline]
    pub fn next_dendrite(&self, s: usize) -> usize {
        self.next_sd[s] as usize
    }

    /// Whether statelet `s` has had at least one dendrite handed out.
    #[inline]
    pub fn is_historical(&self, s: usize) -> bool {
        self.next_sd[s] > 0
    }

    /// Number of statelets with at least one allocated dendrite.
    pub fn historical_count(&self) -> usize {
        self.next_sd.iter().filter(|&&n| n > 0).count()
    }

    /// Mark dendrite `d` as used.
    #[inline]
    pub fn mark_used(&mut self, d: usize) {
        self.d_used.set_bit(d);
    }

    /// Whether dendrite `d` has ever learned.
    #[inline]
    pub fn is_used(&self, d: usize) -> bool {
        self.d_used.get_bit(d)
    }

    /// Used flags for every dendrite.
    pub fn used_flags(&self) -> &BitArray {
        &self.d_used
    }

    /// Cursors for every statelet.
    pub fn cursors(&self) -> &[u32] {
        &self.next_sd
    }

    /// Replace flags and cursors with a saved image.
    ///
    /// Sizes and cursor bounds are checked first; on error nothing changes.
    pub fn restore(&mut self, d_used: BitArray, next_sd: Vec<u32>) -> Result<()> {
        if d_used.num_bits() != self.d_used.num_bits() {
            return Err(StateletError::InvalidInputSize {
                expected: self.d_used.num_bits(),
                actual: d_used.num_bits(),
            });
        }
        if d_used.num_words() != self.d_used.num_words() {
            return Err(StateletError::InvalidInputSize {
                expected: self.d_used.num_words(),
                actual: d_used.num_words(),
            });
        }
        if !d_used.tail_is_clear() {
            return Err(StateletError::InvalidParameter(
                "usage flags set past dendrite count".to_string(),
            ));
        }
        if next_sd.len() != self.next_sd.len() {
            return Err(StateletError::InvalidInputSize {
                expected: self.next_sd.len(),
                actual: next_sd.len(),
            });
        }
        if let Some(&bad) = next_sd.iter().find(|&&n| n as usize >= self.num_dps) {
            return Err(StateletError::InvalidParameter(format!(
                "dendrite cursor {} exceeds budget {}",
                bad, self.num_dps
            )));
        }

        self.d_used = d_used;
        self.next_sd = next_sd;
        Ok(())
    }

    /// Estimate memory usage in bytes.
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.next_sd.capacity() * std::mem::size_of::<u32>()
            + self.d_used.memory_usage()
    }
}
