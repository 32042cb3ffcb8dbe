//! Anomaly detection on a repeating label sequence.
//!
//! The pattern `a a a a a b c d e f` repeats three times; in the last repeat
//! `d` is replaced by `g`. After the first pass the learner recognizes the
//! sequence and only the broken transitions score high.
//!
//! Run with `cargo run --example anomaly_labels`.

use anyhow::Context;
use statelet::config::SequenceLearnerConfig;
use statelet::{Block, BlockOutput, SequenceLearner};
use std::cell::RefCell;
use std::rc::Rc;

const NUM_LABELS: usize = 26;
const BITS_PER_LABEL: usize = 8;

fn main() -> anyhow::Result<()> {
    let values = "aaaaabcdefaaaaabcdefaaaaabcgef";

    // Labels occupy disjoint blocks of columns
    let num_c = NUM_LABELS * BITS_PER_LABEL;
    let mut labels = BlockOutput::new();
    labels.setup(2, num_c);
    let labels = Rc::new(RefCell::new(labels));

    let config = SequenceLearnerConfig {
        num_c,
        ..Default::default()
    };
    let mut learner = SequenceLearner::from_config(&config)?;
    learner.input.add_child(Rc::clone(&labels), 0);
    learner.init()?;

    let mut scores = Vec::with_capacity(values.len());
    for value in values.chars() {
        let label = (value as u8 - b'a') as usize;
        {
            let mut out = labels.borrow_mut();
            out.step();
            let acts: Vec<usize> = (label * BITS_PER_LABEL..(label + 1) * BITS_PER_LABEL).collect();
            out.state.set_acts(&acts);
            out.store();
        }

        learner.execute(true)?;
        scores.push(learner.get_anomaly_score());
    }

    println!("val, scr");
    for (value, score) in values.chars().zip(&scores) {
        println!("{:>3}, {:.1}", value, score);
    }

    let path = std::env::temp_dir().join("statelet_anomaly_labels.bin");
    learner
        .save(&path)
        .with_context(|| format!("saving learner to {}", path.display()))?;
    println!("saved learner memory to {}", path.display());

    Ok(())
}
