//! Tests for SequenceLearner block

use statelet::{Block, BlockOutput, SequenceLearner};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

fn connect(learner: &mut SequenceLearner) -> Rc<RefCell<BlockOutput>> {
    let mut source = BlockOutput::new();
    source.setup(2, learner.num_c());
    let source = Rc::new(RefCell::new(source));
    learner.input.add_child(Rc::clone(&source), 0);
    learner.init().unwrap();
    source
}

fn feed(source: &Rc<RefCell<BlockOutput>>, acts: &[usize]) {
    let mut src = source.borrow_mut();
    src.step();
    src.state.set_acts(acts);
    src.store();
}

fn output_acts(learner: &SequenceLearner) -> Vec<usize> {
    learner.output.borrow().state.get_acts()
}

#[test]
fn test_sequence_learner_new() {
    let learner = SequenceLearner::new(
        512,   // num_c
        4,     // num_spc
        8,     // num_dps
        32,    // num_rpd
        20,    // d_thresh
        20,    // perm_thr
        2,     // perm_inc
        1,     // perm_dec
        2,     // num_t
        false, // always_update
        0,     // seed
    );

    assert_eq!(learner.num_c(), 512);
    assert_eq!(learner.num_spc(), 4);
    assert_eq!(learner.num_dps(), 8);
    assert_eq!(learner.num_rpd(), 32);
    assert_eq!(learner.d_thresh(), 20);
    assert_eq!(learner.get_anomaly_score(), 0.0);
    assert_eq!(learner.get_historical_count(), 0);
}

#[test]
fn test_small_scenario_first_step() {
    // num_c=2, num_spc=2, num_dps=2, num_rpd=4, d_thresh=2
    let mut learner = SequenceLearner::new(2, 2, 2, 4, 2, 20, 2, 1, 2, true, 0);
    let source = connect(&mut learner);

    feed(&source, &[0]);
    learner.execute(true).unwrap();

    let acts = output_acts(&learner);
    assert_eq!(acts.len(), 1);
    assert!(acts[0] < 2);
    assert_eq!(learner.get_anomaly_score(), 1.0);

    // Exactly one dendrite allocated, on the chosen statelet
    assert_eq!(learner.next_dendrite(acts[0]), 1);
    assert_eq!(learner.get_historical_count(), 1);
    assert!(learner.is_dendrite_used(acts[0] * 2));
}

#[test]
fn test_constant_input_settles() {
    // A single connected receptor is enough to recognize
    let mut learner = SequenceLearner::new(2, 2, 2, 4, 1, 20, 2, 1, 2, true, 0);
    let source = connect(&mut learner);

    let mut anomalies = Vec::new();
    for _ in 0..50 {
        feed(&source, &[0]);
        learner.execute(true).unwrap();
        anomalies.push(learner.get_anomaly_score());
        assert!(!output_acts(&learner).is_empty());
    }

    // Empty context, then fresh dendrites, then every later step recognized
    assert_eq!(&anomalies[..2], &[1.0, 1.0]);
    assert!(
        anomalies[2..].iter().all(|&a| a == 0.0),
        "anomaly must stay at zero once recognized: {:?}",
        anomalies
    );
}

#[test]
fn test_replay_is_recognized() {
    // One statelet per column keeps the output deterministic
    let mut learner = SequenceLearner::new(4, 1, 2, 4, 1, 20, 2, 1, 2, true, 3);
    let source = connect(&mut learner);

    let mut anomalies = Vec::new();
    for _ in 0..6 {
        feed(&source, &[2]);
        learner.execute(true).unwrap();
        anomalies.push(learner.get_anomaly_score());
    }

    // Empty context, then a fresh dendrite learns context {2}, then replay
    assert_eq!(&anomalies[..2], &[1.0, 1.0]);
    assert!(anomalies[2..].iter().all(|&a| a == 0.0), "{:?}", anomalies);
    assert_eq!(output_acts(&learner), vec![2]);
}

#[test]
fn test_repeated_sequence_reduces_anomaly() {
    let mut learner = SequenceLearner::new(16, 4, 4, 8, 3, 20, 2, 1, 2, false, 42);
    let source = connect(&mut learner);

    let patterns: Vec<Vec<usize>> = (0..4).map(|v| (v * 4..v * 4 + 4).collect()).collect();

    let mut anomalies = Vec::new();
    for _ in 0..10 {
        for pattern in &patterns {
            feed(&source, pattern);
            learner.execute(true).unwrap();
            anomalies.push(learner.get_anomaly_score());
        }
    }

    // First pass sees every column for the first time
    assert!(anomalies[..4].iter().all(|&a| a == 1.0));

    let early_avg: f64 = anomalies[..4].iter().sum::<f64>() / 4.0;
    let late_avg: f64 = anomalies[36..].iter().sum::<f64>() / 4.0;
    assert!(
        late_avg < early_avg,
        "average anomaly should decrease with learning: early={:.3}, late={:.3}",
        early_avg,
        late_avg
    );
    assert!(late_avg <= 0.5, "late anomaly too high: {:.3}", late_avg);
}

#[test]
fn test_broken_sequence_raises_anomaly() {
    let mut learner = SequenceLearner::new(16, 4, 4, 8, 3, 20, 2, 1, 2, false, 42);
    let source = connect(&mut learner);

    let patterns: Vec<Vec<usize>> = (0..4).map(|v| (v * 4..v * 4 + 4).collect()).collect();

    for _ in 0..10 {
        for pattern in &patterns {
            feed(&source, pattern);
            learner.execute(true).unwrap();
        }
    }

    // 0 -> 1 -> 3 was never observed
    feed(&source, &patterns[0]);
    learner.execute(true).unwrap();
    feed(&source, &patterns[1]);
    learner.execute(true).unwrap();
    let expected = learner.get_anomaly_score();

    feed(&source, &patterns[3]);
    learner.execute(true).unwrap();
    let broken = learner.get_anomaly_score();

    assert!(
        broken > expected,
        "unseen transition should be anomalous: expected={}, broken={}",
        expected,
        broken
    );
}

#[test]
fn test_surprise_reactivates_historical_statelets() {
    let mut learner = SequenceLearner::new(2, 4, 4, 4, 3, 20, 2, 1, 2, true, 11);
    let source = connect(&mut learner);

    let mut surprises = 0;
    for _ in 0..8 {
        let hist: BTreeSet<usize> = (0..4).filter(|&s| learner.next_dendrite(s) > 0).collect();

        feed(&source, &[0]);
        learner.execute(true).unwrap();

        if learner.get_anomaly_score() == 1.0 {
            surprises += 1;
            let acts: BTreeSet<usize> = output_acts(&learner).into_iter().collect();
            assert!(hist.is_subset(&acts), "hist {:?} not in output {:?}", hist, acts);

            // Output is the historical set plus the random pick
            let fresh = acts.difference(&hist).count();
            assert!(fresh <= 1, "at most one non-historical statelet: {:?}", acts);
            assert!(!acts.is_empty());
        }
    }
    assert!(surprises >= 2);
}

#[test]
fn test_single_dendrite_budget_never_reactivates() {
    // With num_dps=1 the cursor never moves, so no statelet is historical
    let mut learner = SequenceLearner::new(3, 4, 1, 4, 3, 20, 2, 1, 2, true, 5);
    let source = connect(&mut learner);

    for _ in 0..10 {
        feed(&source, &[1]);
        learner.execute(true).unwrap();
        if learner.get_anomaly_score() > 0.0 {
            assert_eq!(output_acts(&learner).len(), 1);
        }
        assert_eq!(learner.get_historical_count(), 0);
    }
}

#[test]
fn test_budget_exhaustion_is_silent() {
    let mut learner = SequenceLearner::new(2, 1, 3, 4, 3, 20, 2, 1, 2, true, 0);
    let source = connect(&mut learner);

    // Alternating single-column inputs never reach d_thresh=3
    for i in 0..20 {
        feed(&source, &[i % 2]);
        learner.execute(true).unwrap();
        assert!(learner.next_dendrite(0) <= 2);
        assert!(learner.next_dendrite(1) <= 2);
    }
    assert_eq!(learner.next_dendrite(0), 2);
    assert_eq!(learner.next_dendrite(1), 2);
}

#[test]
fn test_anomaly_fraction_of_columns() {
    let mut learner = SequenceLearner::new(8, 2, 2, 4, 1, 20, 2, 1, 2, true, 0);
    let source = connect(&mut learner);

    feed(&source, &[0, 3, 5, 7]);
    learner.execute(true).unwrap();

    assert_eq!(learner.get_anomaly_score(), 1.0);
    let acts = output_acts(&learner);
    let cols: BTreeSet<usize> = acts.iter().map(|s| s / 2).collect();
    assert_eq!(cols, BTreeSet::from([0, 3, 5, 7]));
}

#[test]
fn test_same_seed_same_run() {
    let run = |seed: u64| {
        let mut learner = SequenceLearner::new(8, 4, 3, 6, 2, 20, 2, 1, 2, false, seed);
        let source = connect(&mut learner);
        let mut trace = Vec::new();
        for i in 0..30 {
            feed(&source, &[i % 8, (i * 3) % 8]);
            learner.execute(true).unwrap();
            trace.push((output_acts(&learner), learner.get_anomaly_score()));
        }
        trace
    };

    assert_eq!(run(17), run(17));
}

#[test]
fn test_higher_order_context_width() {
    let mut learner = SequenceLearner::new(4, 8, 2, 4, 2, 20, 2, 1, 3, true, 0);
    let source = connect(&mut learner);

    // Two history slots of 32 statelets each
    assert_eq!(learner.context.num_bits(), 64);
    assert_eq!(learner.memory.num_inputs(), 64);

    feed(&source, &[1]);
    learner.execute(true).unwrap();
    feed(&source, &[2]);
    learner.execute(true).unwrap();
    feed(&source, &[3]);
    learner.execute(true).unwrap();

    // Context now holds the previous two outputs side by side
    let prev = learner.output.borrow().get_bitarray(1).get_acts();
    let prev2 = learner.output.borrow().get_bitarray(2).get_acts();
    let mut expected = prev;
    expected.extend(prev2.iter().map(|s| s + 32));
    assert_eq!(learner.context.state.get_acts(), expected);
}
