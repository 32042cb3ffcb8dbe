//! Block trait - Lifecycle shared by every computational block.
//!
//! # Lifecycle Methods
//!
//! - `init()` - Size internal memory from connected inputs
//! - `step()` - Advance the output history by one slot
//! - `pull()` - Copy child outputs into input state(s)
//! - `compute()` - Turn input state(s) into the output state
//! - `store()` - Commit the output state into history
//! - `learn()` - Update memories from the current step
//! - `clear()` - Reset transient state (learned memory is kept)
//! - `save()`/`load()` - Persist learned memory
//!
//! `execute(learn_flag)` runs one full time step:
//! step → pull → compute → store → [learn].

use crate::error::Result;
use std::path::Path;

/// Core trait for all statelet blocks.
pub trait Block {
    /// Initialize the block based on input connections.
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    /// Save learned memory to `path`.
    fn save(&self, path: &Path) -> Result<()>;

    /// Load learned memory from `path`.
    fn load(&mut self, path: &Path) -> Result<()>;

    /// Clear input, output and scratch state.
    fn clear(&mut self);

    /// Advance time step.
    fn step(&mut self);

    /// Pull data from child outputs.
    fn pull(&mut self);

    /// Compute output from input.
    fn compute(&mut self);

    /// Update internal memories.
    fn learn(&mut self) {}

    /// Store current output to history.
    fn store(&mut self);

    /// Estimate memory usage in bytes.
    fn memory_usage(&self) -> usize;

    /// Run one time step, learning if `learn_flag` is set.
    fn execute(&mut self, learn_flag: bool) -> Result<()> {
        self.step();
        self.pull();
        self.compute();
        self.store();
        if learn_flag {
            self.learn();
        }
        Ok(())
    }
}
