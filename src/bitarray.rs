//! BitArray - Sparse binary state packed into 32-bit words.
//!
//! `BitArray` is the container every block reads and writes: column
//! activations, statelet outputs, context history and the per-step
//! dendrite-active scratch state.
//!
//! # Design
//!
//! - Storage is `Vec<u32>`; bit `b` lives in word `b >> 5` at offset `b & 31`
//! - Bits past `num_bits` in the last word are always zero, so word-level
//!   equality is bit-level equality
//! - Set bits are enumerated with `trailing_zeros`, costing O(words + active)
//!
//! # Examples
//!
//! ```
//! use statelet::BitArray;
//!
//! let mut ba = BitArray::new(100);
//! ba.set_bit(3);
//! ba.set_bit(64);
//! assert_eq!(ba.num_set(), 2);
//! assert_eq!(ba.get_acts(), vec![3, 64]);
//! assert!(ba.get_bit(64));
//! ```

use serde::{Deserialize, Serialize};

/// Word type for bit storage
pub type Word = u32;

/// Number of bits per word
pub const BITS_PER_WORD: usize = 32;

#[inline(always)]
const fn word_idx(b: usize) -> usize {
    b >> 5
}

#[inline(always)]
const fn bit_mask(b: usize) -> Word {
    1 << (b & 31)
}

#[inline(always)]
const fn words_for(n: usize) -> usize {
    (n + BITS_PER_WORD - 1) / BITS_PER_WORD
}

/// Fixed-size binary state with word-level storage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitArray {
    words: Vec<Word>,
    num_bits: usize,
}

impl BitArray {
    /// Create a BitArray of `n` cleared bits.
    pub fn new(n: usize) -> Self {
        Self {
            words: vec![0; words_for(n)],
            num_bits: n,
        }
    }

    /// Resize to `n` bits. All bits are cleared.
    pub fn resize(&mut self, n: usize) {
        self.words.clear();
        self.words.resize(words_for(n), 0);
        self.num_bits = n;
    }

    /// Number of addressable bits.
    #[inline]
    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    /// Number of storage words.
    #[inline]
    pub fn num_words(&self) -> usize {
        self.words.len()
    }

    /// Set bit `b`.
    #[inline]
    pub fn set_bit(&mut self, b: usize) {
        debug_assert!(b < self.num_bits, "bit {} out of bounds ({})", b, self.num_bits);
        self.words[word_idx(b)] |= bit_mask(b);
    }

    /// Read bit `b`.
    #[inline]
    pub fn get_bit(&self, b: usize) -> bool {
        debug_assert!(b < self.num_bits, "bit {} out of bounds ({})", b, self.num_bits);
        self.words[word_idx(b)] & bit_mask(b) != 0
    }

    /// Clear bit `b`.
    #[inline]
    pub fn clear_bit(&mut self, b: usize) {
        debug_assert!(b < self.num_bits, "bit {} out of bounds ({})", b, self.num_bits);
        self.words[word_idx(b)] &= !bit_mask(b);
    }

    /// Clear every bit without releasing storage.
    #[inline]
    pub fn clear_all(&mut self) {
        self.words.fill(0);
    }

    /// Clear, then set every index in `idxs`.
    pub fn set_acts(&mut self, idxs: &[usize]) {
        self.clear_all();
        for &b in idxs {
            self.set_bit(b);
        }
    }

    /// Indices of set bits in ascending order.
    pub fn get_acts(&self) -> Vec<usize> {
        self.iter_acts().collect()
    }

    /// Iterate set bit indices in ascending order.
    pub fn iter_acts(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(w, &word)| {
            let base = w * BITS_PER_WORD;
            let mut rest = word;
            std::iter::from_fn(move || {
                if rest == 0 {
                    return None;
                }
                let offset = rest.trailing_zeros() as usize;
                rest &= rest - 1;
                Some(base + offset)
            })
        })
    }

    /// First set bit at or after `beg`, wrapping around to index 0.
    pub fn find_next_set_bit(&self, beg: usize) -> Option<usize> {
        debug_assert!(beg < self.num_bits.max(1));
        self.iter_acts()
            .find(|&b| b >= beg)
            .or_else(|| self.iter_acts().next())
    }

    /// Population count.
    #[inline]
    pub fn num_set(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Whether every bit past `num_bits` in the last word is zero.
    ///
    /// Always true for arrays built through this API; decoded arrays may
    /// violate it.
    pub fn tail_is_clear(&self) -> bool {
        let rem = self.num_bits % BITS_PER_WORD;
        match self.words.last() {
            Some(&last) if rem != 0 => last & !(bit_mask(rem) - 1) == 0,
            _ => true,
        }
    }

    /// Raw storage words.
    #[inline]
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Mutable raw storage words.
    #[inline]
    pub fn words_mut(&mut self) -> &mut [Word] {
        &mut self.words
    }

    /// Estimate memory usage in bytes.
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>() + self.words.capacity() * std::mem::size_of::<Word>()
    }
}

/// Copy `num_words` words from `src` into `dst` starting at `dst_word_offset`.
///
/// Used by `BlockInput::pull()` to lay child outputs side by side.
#[inline]
pub fn bitarray_copy_words(
    dst: &mut BitArray,
    src: &BitArray,
    dst_word_offset: usize,
    num_words: usize,
) {
    let dst_end = dst_word_offset + num_words;
    debug_assert!(dst_end <= dst.words.len(), "dst word overflow");
    debug_assert!(num_words <= src.words.len(), "src word overflow");
    dst.words[dst_word_offset..dst_end].copy_from_slice(&src.words[..num_words]);
}
