//! Learning blocks.

pub mod sequence_learner;

pub use sequence_learner::{update_action, SequenceLearner, StepAction};
