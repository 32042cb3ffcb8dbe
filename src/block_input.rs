//! BlockInput - Concatenates child outputs into a single input state.
//!
//! Children are shared `Rc<RefCell<BlockOutput>>` handles read at a fixed
//! history offset. `add_child()` only records metadata; `pull()` copies a
//! child's words into place and skips children whose slot did not change.
//!
//! Each child occupies a whole number of words in the concatenated state.
//! With a single child the state width equals the child's width exactly.
//!
//! # Examples
//!
//! ```
//! use statelet::{BlockInput, BlockOutput};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let mut output = BlockOutput::new();
//! output.setup(2, 32);
//! output.state.set_bit(5);
//! output.store();
//! let output = Rc::new(RefCell::new(output));
//!
//! let mut input = BlockInput::new();
//! input.add_child(Rc::clone(&output), 0);
//! input.pull();
//! assert!(input.state.get_bit(5));
//! ```

use crate::bitarray::{bitarray_copy_words, BitArray, BITS_PER_WORD};
use crate::block_output::BlockOutput;
use std::cell::RefCell;
use std::rc::Rc;

struct Child {
    output: Rc<RefCell<BlockOutput>>,
    time: usize,
    word_offset: usize,
    num_words: usize,
}

/// Input state assembled from one or more child outputs.
pub struct BlockInput {
    /// Concatenated input state
    pub state: BitArray,

    children: Vec<Child>,
}

impl BlockInput {
    /// Create an input with no children.
    pub fn new() -> Self {
        Self {
            state: BitArray::new(0),
            children: Vec::new(),
        }
    }

    /// Connect `child` read at history offset `time`.
    ///
    /// The child must already be set up so its width is known.
    ///
    /// # Panics
    ///
    /// Panics if `time` is not a valid offset into the child's history.
    pub fn add_child(&mut self, child: Rc<RefCell<BlockOutput>>, time: usize) {
        let (num_words, child_bits) = {
            let c = child.borrow();
            assert!(
                time < c.num_t(),
                "time offset {} out of bounds for child with num_t={}",
                time,
                c.num_t()
            );
            (c.state.num_words(), c.state.num_bits())
        };

        let word_offset = self
            .children
            .last()
            .map_or(0, |last| last.word_offset + last.num_words);

        self.children.push(Child {
            output: child,
            time,
            word_offset,
            num_words,
        });

        self.state.resize(word_offset * BITS_PER_WORD + child_bits);
    }

    /// Copy changed child slots into `state`.
    pub fn pull(&mut self) {
        for child in &self.children {
            let out = child.output.borrow();
            if !out.has_changed_at(child.time) {
                continue;
            }
            bitarray_copy_words(
                &mut self.state,
                out.get_bitarray(child.time),
                child.word_offset,
                child.num_words,
            );
        }
    }

    /// Whether any child's observed slot changed since its predecessor.
    #[inline]
    pub fn children_changed(&self) -> bool {
        self.children
            .iter()
            .any(|c| c.output.borrow().has_changed_at(c.time))
    }

    /// Clear the concatenated state.
    pub fn clear(&mut self) {
        self.state.clear_all();
    }

    /// Number of connected children.
    #[inline]
    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    /// Width of the concatenated state in bits.
    #[inline]
    pub fn num_bits(&self) -> usize {
        self.state.num_bits()
    }

    /// Estimate memory usage in bytes.
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.state.memory_usage()
            + self.children.capacity() * std::mem::size_of::<Child>()
    }
}

impl Default for BlockInput {
    fn default() -> Self {
        Self::new()
    }
}
