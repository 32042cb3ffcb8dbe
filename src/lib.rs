//! Statelet - Online sequence memory with anomaly scoring
//!
//! Statelet learns, one time step at a time, which temporal context each
//! active input bit appears in. Input bits are *columns*; every column owns
//! a group of *statelets*, and the learner's output activates the statelets
//! that match the context the column was seen in. Columns whose context was
//! never seen before are *surprised* and drive the anomaly score.
//!
//! # Architecture
//!
//! - **BitArray**: packed binary state with O(active) enumeration
//! - **Block system**: `Block` lifecycle trait, `BlockInput` concatenation,
//!   `BlockOutput` history with change tracking
//! - **BlockMemory**: dendrite receptors, overlap and permanence learning
//! - **DendriteUsage**: per-statelet allocation cursors and used flags
//! - **SequenceLearner**: recognition, surprise, learning and persistence
//!
//! # Examples
//!
//! ```
//! use statelet::{Block, BlockOutput, SequenceLearner};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let mut source = BlockOutput::new();
//! source.setup(2, 4);
//! let source = Rc::new(RefCell::new(source));
//!
//! let mut learner = SequenceLearner::new(4, 2, 2, 4, 2, 20, 2, 1, 2, false, 0);
//! learner.input.add_child(Rc::clone(&source), 0);
//! learner.init().unwrap();
//!
//! source.borrow_mut().state.set_bit(0);
//! source.borrow_mut().store();
//! learner.execute(true).unwrap();
//!
//! // Nothing has been learned yet, so the column is surprised
//! assert_eq!(learner.get_anomaly_score(), 1.0);
//! assert_eq!(learner.output.borrow().state.num_set(), 1);
//! ```
//!
//! # Safety
//!
//! Contract violations (zero sizes, `d_thresh >= num_rpd`, computing before
//! `init()`) panic. Only persistence and configuration return errors.

pub mod bitarray;
pub mod block;
pub mod block_base;
pub mod block_input;
pub mod block_memory;
pub mod block_output;
pub mod blocks;
pub mod config;
pub mod dendrite_usage;
pub mod error;
pub mod utils;

pub use bitarray::{bitarray_copy_words, BitArray, Word, BITS_PER_WORD};
pub use block::Block;
pub use block_base::BlockBase;
pub use block_input::BlockInput;
pub use block_memory::{BlockMemory, PERM_MAX, PERM_MIN};
pub use block_output::{BlockOutput, CURR, PREV};
pub use blocks::{SequenceLearner, StepAction};
pub use config::SequenceLearnerConfig;
pub use dendrite_usage::DendriteUsage;
pub use error::{Result, StateletError};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
