//! BlockOutput - Output pattern plus a ring buffer of past patterns.
//!
//! A block writes its result into `state`, then `store()` commits it into the
//! current history slot and records whether it differs from the previous
//! slot. Downstream `BlockInput`s (including a learner's own context) read
//! history slots by relative offset and use the change flags to skip work.
//!
//! # Time-based Indexing
//!
//! - `CURR` (0) - slot written by the most recent `store()`
//! - `PREV` (1) - the slot before it
//!
//! # Examples
//!
//! ```
//! use statelet::BlockOutput;
//!
//! let mut output = BlockOutput::new();
//! output.setup(2, 64);
//!
//! output.state.set_bit(10);
//! output.store();
//! assert!(output.has_changed());
//!
//! output.step();
//! output.store();
//! assert!(!output.has_changed());
//! assert!(output.get_bitarray(statelet::PREV).get_bit(10));
//! ```

use crate::bitarray::BitArray;

/// Time constant for current time step (t=0)
pub const CURR: usize = 0;

/// Time constant for previous time step (t=1)
pub const PREV: usize = 1;

/// Working output state with a circular history buffer and change flags.
#[derive(Clone, Debug)]
pub struct BlockOutput {
    /// Working state for the step being computed
    pub state: BitArray,

    history: Vec<BitArray>,
    changes: Vec<bool>,
    changed_flag: bool,
    curr_idx: usize,
}

impl BlockOutput {
    /// Create an empty BlockOutput. Call `setup()` before use.
    pub fn new() -> Self {
        Self {
            state: BitArray::new(0),
            history: Vec::new(),
            changes: Vec::new(),
            changed_flag: false,
            curr_idx: 0,
        }
    }

    /// Allocate `num_t` history slots of `num_b` bits each.
    ///
    /// Every slot starts cleared and flagged as changed, so the first step
    /// after setup always propagates.
    ///
    /// # Panics
    ///
    /// Panics if `num_t` < 2 or `num_b` == 0.
    pub fn setup(&mut self, num_t: usize, num_b: usize) {
        assert!(num_t >= 2, "num_t must be >= 2");
        assert!(num_b > 0, "num_b must be > 0");

        self.state.resize(num_b);
        self.history.clear();
        self.history.resize(num_t, BitArray::new(num_b));
        self.changes.clear();
        self.changes.resize(num_t, true);
        self.curr_idx = 0;
        self.changed_flag = true;
    }

    /// Clear state and all history, marking every slot changed.
    pub fn clear(&mut self) {
        self.state.clear_all();
        self.changed_flag = true;
        for (slot, changed) in self.history.iter_mut().zip(self.changes.iter_mut()) {
            slot.clear_all();
            *changed = true;
        }
    }

    /// Advance the ring buffer by one slot.
    #[inline]
    pub fn step(&mut self) {
        self.curr_idx = (self.curr_idx + 1) % self.history.len();
    }

    /// Commit `state` into the current slot, recording whether it changed.
    pub fn store(&mut self) {
        let prev_idx = self.idx(PREV);
        self.changed_flag = self.state != self.history[prev_idx];

        let curr = &mut self.history[self.curr_idx];
        curr.words_mut().copy_from_slice(self.state.words());
        self.changes[self.curr_idx] = self.changed_flag;
    }

    /// History slot at relative offset `time` (0=current, 1=previous, ...).
    #[inline]
    pub fn get_bitarray(&self, time: usize) -> &BitArray {
        &self.history[self.idx(time)]
    }

    /// Whether the last `store()` changed the output.
    #[inline]
    pub fn has_changed(&self) -> bool {
        self.changed_flag
    }

    /// Whether the slot at relative offset `time` differed from its predecessor.
    #[inline]
    pub fn has_changed_at(&self, time: usize) -> bool {
        self.changes[self.idx(time)]
    }

    /// Number of history slots.
    #[inline]
    pub fn num_t(&self) -> usize {
        self.history.len()
    }

    /// Estimate memory usage in bytes.
    pub fn memory_usage(&self) -> usize {
        let mut bytes = std::mem::size_of::<Self>();
        bytes += self.state.memory_usage();
        bytes += self.history.iter().map(BitArray::memory_usage).sum::<usize>();
        bytes += self.changes.capacity() * std::mem::size_of::<bool>();
        bytes
    }

    #[inline]
    fn idx(&self, ts: usize) -> usize {
        debug_assert!(ts < self.history.len(), "time offset out of bounds");
        let num_t = self.history.len();
        (self.curr_idx + num_t - ts) % num_t
    }
}

impl Default for BlockOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup() {
        let mut output = BlockOutput::new();
        output.setup(3, 100);

        assert_eq!(output.num_t(), 3);
        assert_eq!(output.state.num_bits(), 100);
        assert!(output.has_changed_at(CURR));
        assert!(output.has_changed_at(PREV));
    }

    #[test]
    #[should_panic(expected = "num_t must be >= 2")]
    fn test_setup_requires_prev_slot() {
        let mut output = BlockOutput::new();
        output.setup(1, 32);
    }

    #[test]
    fn test_step_wraps() {
        let mut output = BlockOutput::new();
        output.setup(3, 32);

        assert_eq!(output.idx(CURR), 0);
        assert_eq!(output.idx(PREV), 2);
        output.step();
        output.step();
        assert_eq!(output.idx(CURR), 2);
        output.step();
        assert_eq!(output.idx(CURR), 0);
    }

    #[test]
    fn test_store_detects_change() {
        let mut output = BlockOutput::new();
        output.setup(2, 32);

        output.state.set_bit(5);
        output.store();
        assert!(output.has_changed());

        output.step();
        output.store();
        assert!(!output.has_changed());

        output.step();
        output.state.set_bit(6);
        output.store();
        assert!(output.has_changed());
    }

    #[test]
    fn test_history_offsets() {
        let mut output = BlockOutput::new();
        output.setup(3, 32);

        output.state.set_bit(1);
        output.store();
        output.step();
        output.state.clear_all();
        output.state.set_bit(2);
        output.store();

        assert_eq!(output.get_bitarray(CURR).get_acts(), vec![2]);
        assert_eq!(output.get_bitarray(PREV).get_acts(), vec![1]);
        assert_eq!(output.get_bitarray(2).num_set(), 0);
    }

    #[test]
    fn test_clear() {
        let mut output = BlockOutput::new();
        output.setup(2, 32);
        output.state.set_bit(3);
        output.store();
        output.step();
        output.store();

        output.clear();
        assert_eq!(output.state.num_set(), 0);
        assert_eq!(output.get_bitarray(PREV).num_set(), 0);
        assert!(output.has_changed_at(CURR));
    }
}
