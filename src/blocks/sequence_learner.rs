//! SequenceLearner - Learns which temporal context each active column occurs in.
//!
//! Every input bit is a column of `num_spc` statelets. The learner's output
//! activates statelets rather than columns, and which statelets it picks
//! encodes the context the column appeared in. Context is the learner's own
//! previous output, so the output distinguishes "B after A" from "B after C".
//!
//! # Algorithm
//!
//! For each active column:
//! 1. **Recognition**: every used dendrite of the column is overlapped with
//!    the context. Dendrites reaching `d_thresh` activate, and so do their
//!    statelets.
//! 2. **Surprise**: when no dendrite activated, the column counts toward the
//!    anomaly score. One random statelet plus every statelet that already owns
//!    a dendrite are activated, and each is handed its next dendrite.
//! 3. **Learning**: every active dendrite is reinforced toward the context
//!    and marked used.
//!
//! # Architecture
//!
//! ```text
//! output           memory (showing statelet 15 dendrites)
//! -----------      +----------------------------+
//! 0 0 0 0 0[0] --> | addr[0]: {00 00 00 00 ...} |
//! 0 0 0 0 0 0      | perm[0]: {00 00 00 00 ...} |
//! 0 0 0 0 0 0      | addr[1]: {00 00 00 00 ...} |
//!                  | perm[1]: {00 00 00 00 ...} |
//! context          | addr[2]: {00 00 00 00 ...} |
//! (prev output)    | perm[2]: {00 00 00 00 ...} |
//! -----------      |  ...                       |
//! 0 0 0 0 0 0      +----------------------------+
//! 0 0 0 0 0 0          ^
//! 0 0 0 0 0 0          | (self-feedback loop)
//!      ----------------+
//! input
//! (column activations)
//! -----------
//! 0 0 0 0 0 0
//! ```
//!
//! # Examples
//!
//! ```
//! use statelet::{Block, BlockOutput, SequenceLearner};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let mut source = BlockOutput::new();
//! source.setup(2, 8);
//! let source = Rc::new(RefCell::new(source));
//!
//! let mut learner = SequenceLearner::new(8, 4, 4, 8, 3, 20, 2, 1, 2, false, 0);
//! learner.input.add_child(Rc::clone(&source), 0);
//! learner.init().unwrap();
//!
//! for &value in &[0usize, 1, 2, 0, 1, 2] {
//!     {
//!         let mut src = source.borrow_mut();
//!         src.step();
//!         src.state.clear_all();
//!         src.state.set_bit(value);
//!         src.store();
//!     }
//!     learner.execute(true).unwrap();
//!     let anomaly = learner.get_anomaly_score();
//!     assert!((0.0..=1.0).contains(&anomaly));
//! }
//! ```

use crate::bitarray::BitArray;
use crate::config::SequenceLearnerConfig;
use crate::dendrite_usage::DendriteUsage;
use crate::error::{Result, StateletError};
use crate::utils;
use crate::{Block, BlockBase, BlockInput, BlockMemory, BlockOutput};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

/// Whether a time step recomputes or keeps the previous output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAction {
    /// Run recognition, surprise and learning
    Run,
    /// Keep the previous output and memory untouched
    Skip,
}

/// Skip policy: recompute only when forced or when input or context changed.
///
/// # Examples
///
/// ```
/// use statelet::blocks::{update_action, StepAction};
///
/// assert_eq!(update_action(false, false, false), StepAction::Skip);
/// assert_eq!(update_action(false, false, true), StepAction::Run);
/// assert_eq!(update_action(true, false, false), StepAction::Run);
/// ```
#[inline]
pub fn update_action(always_update: bool, input_changed: bool, context_changed: bool) -> StepAction {
    if always_update || input_changed || context_changed {
        StepAction::Run
    } else {
        StepAction::Skip
    }
}

#[derive(Serialize)]
struct MemoryImageRef<'a> {
    r_addrs: &'a [u32],
    r_perms: &'a [u8],
    d_used: &'a BitArray,
    next_sd: &'a [u32],
}

#[derive(Deserialize)]
struct MemoryImage {
    r_addrs: Vec<u32>,
    r_perms: Vec<u8>,
    d_used: BitArray,
    next_sd: Vec<u32>,
}

/// Learns temporal context of column activations and scores anomalies.
pub struct SequenceLearner {
    base: BlockBase,

    /// Column activations
    pub input: BlockInput,

    /// Previous outputs (connected to own history at offsets 1..num_t)
    pub context: BlockInput,

    /// Statelet output with history
    pub output: Rc<RefCell<BlockOutput>>,

    /// Dendrite receptors and the dendrite-active scratch state
    pub memory: BlockMemory,

    usage: DendriteUsage,

    // Architecture parameters
    num_c: usize,
    num_spc: usize,
    num_dps: usize,
    num_dpc: usize, // num_spc * num_dps
    num_rpd: usize,
    num_s: usize,
    num_d: usize,
    d_thresh: u32,
    num_t: usize,

    // Learning parameters
    perm_thr: u8,
    perm_inc: u8,
    perm_dec: u8,

    always_update: bool,
    anomaly_score: f64,
    action: StepAction,

    // Working buffers reused across steps
    input_acts: Vec<usize>,
    d_acts: Vec<usize>,
}

impl SequenceLearner {
    /// Create a new SequenceLearner wired to its own output history.
    ///
    /// # Arguments
    ///
    /// * `num_c` - Number of columns
    /// * `num_spc` - Statelets per column
    /// * `num_dps` - Dendrites per statelet
    /// * `num_rpd` - Receptors per dendrite
    /// * `d_thresh` - Overlap needed for a dendrite to activate
    /// * `perm_thr` - Permanence at which a receptor is connected
    /// * `perm_inc` - Permanence increment
    /// * `perm_dec` - Permanence decrement
    /// * `num_t` - Output history depth; context spans offsets `1..max(num_t, 2)`
    /// * `always_update` - Recompute even when nothing changed
    /// * `seed` - RNG seed
    ///
    /// # Panics
    ///
    /// Panics if any size is zero or `d_thresh >= num_rpd`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        num_c: usize,
        num_spc: usize,
        num_dps: usize,
        num_rpd: usize,
        d_thresh: u32,
        perm_thr: u8,
        perm_inc: u8,
        perm_dec: u8,
        num_t: usize,
        always_update: bool,
        seed: u64,
    ) -> Self {
        assert!(num_c > 0, "num_c must be > 0");
        assert!(num_spc > 0, "num_spc must be > 0");
        assert!(num_dps > 0, "num_dps must be > 0");
        assert!(num_rpd > 0, "num_rpd must be > 0");
        assert!((d_thresh as usize) < num_rpd, "d_thresh must be < num_rpd");
        assert!(num_t > 0, "num_t must be > 0");

        let num_s = num_c * num_spc;
        let num_d = num_s * num_dps;
        let num_dpc = num_spc * num_dps;
        let history = num_t.max(2);

        let output = Rc::new(RefCell::new(BlockOutput::new()));
        output.borrow_mut().setup(history, num_s);

        let mut context = BlockInput::new();
        for t in 1..history {
            context.add_child(Rc::clone(&output), t);
        }

        Self {
            base: BlockBase::new(seed),
            input: BlockInput::new(),
            context,
            output,
            memory: BlockMemory::new(num_d, num_rpd, perm_thr, perm_inc, perm_dec),
            usage: DendriteUsage::new(num_s, num_dps),
            num_c,
            num_spc,
            num_dps,
            num_dpc,
            num_rpd,
            num_s,
            num_d,
            d_thresh,
            num_t,
            perm_thr,
            perm_inc,
            perm_dec,
            always_update,
            anomaly_score: 0.0,
            action: StepAction::Skip,
            input_acts: Vec::with_capacity(num_c),
            d_acts: Vec::new(),
        }
    }

    /// Build a learner from a validated configuration.
    pub fn from_config(config: &SequenceLearnerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            config.num_c,
            config.num_spc,
            config.num_dps,
            config.num_rpd,
            config.d_thresh,
            config.perm_thr,
            config.perm_inc,
            config.perm_dec,
            config.num_t,
            config.always_update,
            config.seed,
        ))
    }

    /// Export the construction parameters.
    pub fn to_config(&self) -> SequenceLearnerConfig {
        SequenceLearnerConfig {
            num_c: self.num_c,
            num_spc: self.num_spc,
            num_dps: self.num_dps,
            num_rpd: self.num_rpd,
            d_thresh: self.d_thresh,
            perm_thr: self.perm_thr,
            perm_inc: self.perm_inc,
            perm_dec: self.perm_dec,
            num_t: self.num_t,
            always_update: self.always_update,
            seed: self.base.seed(),
        }
    }

    /// Fraction of the last computed step's active columns that were surprised.
    ///
    /// 0.0 when every column was recognized (or no column was active),
    /// 1.0 when every column was surprised.
    pub fn get_anomaly_score(&self) -> f64 {
        self.anomaly_score
    }

    /// Number of statelets that own at least one allocated dendrite.
    pub fn get_historical_count(&self) -> usize {
        self.usage.historical_count()
    }

    /// Allocation cursor of statelet `s`.
    pub fn next_dendrite(&self, s: usize) -> usize {
        self.usage.next_dendrite(s)
    }

    /// Whether dendrite `d` has learned at least once.
    pub fn is_dendrite_used(&self, d: usize) -> bool {
        self.usage.is_used(d)
    }

    /// Whether `init()` has run.
    pub fn is_initialized(&self) -> bool {
        self.base.is_initialized()
    }

    /// Number of columns.
    pub fn num_c(&self) -> usize {
        self.num_c
    }

    /// Statelets per column.
    pub fn num_spc(&self) -> usize {
        self.num_spc
    }

    /// Dendrites per statelet.
    pub fn num_dps(&self) -> usize {
        self.num_dps
    }

    /// Receptors per dendrite.
    pub fn num_rpd(&self) -> usize {
        self.num_rpd
    }

    /// Total statelets.
    pub fn num_s(&self) -> usize {
        self.num_s
    }

    /// Total dendrites.
    pub fn num_d(&self) -> usize {
        self.num_d
    }

    /// Dendrite activation threshold.
    pub fn d_thresh(&self) -> u32 {
        self.d_thresh
    }

    /// Activate statelets whose dendrites match the context.
    ///
    /// Returns true if at least one dendrite of column `c` activated.
    fn recognition(&mut self, c: usize) -> bool {
        let d_beg = c * self.num_dpc;
        let d_end = d_beg + self.num_dpc;
        let mut output = self.output.borrow_mut();
        let mut recognized = false;

        for d in d_beg..d_end {
            if !self.usage.is_used(d) {
                continue;
            }
            if self.memory.overlap(d, &self.context.state) >= self.d_thresh as usize {
                self.memory.state.set_bit(d);
                output.state.set_bit(d / self.num_dps);
                recognized = true;
            }
        }

        recognized
    }

    /// Activate statelets of an unpredicted column and allocate their dendrites.
    fn surprise(&mut self, c: usize) {
        let s_beg = c * self.num_spc;
        let s_end = s_beg + self.num_spc;
        let s_rand = utils::rand_index(s_beg, s_end, self.base.rng());

        let mut output = self.output.borrow_mut();
        output.state.set_bit(s_rand);
        self.usage.allocate_or_touch(s_rand, &mut self.memory.state);

        let mut num_hist = 0;
        for s in s_beg..s_end {
            if s != s_rand && self.usage.is_historical(s) {
                output.state.set_bit(s);
                self.usage.allocate_or_touch(s, &mut self.memory.state);
                num_hist += 1;
            }
        }

        trace!(
            "surprise: column {} statelet {} with {} historical statelets",
            c,
            s_rand,
            num_hist
        );
    }
}

impl Block for SequenceLearner {
    fn init(&mut self) -> Result<()> {
        assert_eq!(
            self.input.num_bits(),
            self.num_c,
            "input size must equal num_c"
        );

        let num_i = self.context.num_bits();
        self.memory.init(num_i, self.base.rng());
        self.base.set_initialized(true);

        debug!(
            "sequence learner initialized: {} columns, {} statelets, {} dendrites, context width {}",
            self.num_c, self.num_s, self.num_d, num_i
        );
        Ok(())
    }

    fn save(&self, path: &Path) -> Result<()> {
        if !self.base.is_initialized() {
            return Err(StateletError::NotInitialized);
        }

        let image = MemoryImageRef {
            r_addrs: self.memory.receptor_addrs(),
            r_perms: self.memory.receptor_perms(),
            d_used: self.usage.used_flags(),
            next_sd: self.usage.cursors(),
        };
        let bytes = bincode::serialize(&image)?;
        std::fs::write(path, &bytes)?;

        debug!("saved {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        let bytes = std::fs::read(path)?;
        let image: MemoryImage = bincode::deserialize(&bytes)?;
        self.check_image(&image)?;

        if !self.base.is_initialized() {
            self.init()?;
        }

        self.memory.restore(image.r_addrs, image.r_perms)?;
        self.usage.restore(image.d_used, image.next_sd)?;

        debug!("loaded {} bytes from {}", bytes.len(), path.display());
        Ok(())
    }

    fn clear(&mut self) {
        self.input.clear();
        self.context.clear();
        self.output.borrow_mut().clear();
        self.memory.clear();
        self.anomaly_score = 0.0;
        self.input_acts.clear();
        self.d_acts.clear();
    }

    fn step(&mut self) {
        self.output.borrow_mut().step();
    }

    fn pull(&mut self) {
        self.input.pull();
        self.context.pull();
    }

    fn compute(&mut self) {
        assert!(self.base.is_initialized(), "must call init() first");

        self.action = update_action(
            self.always_update,
            self.input.children_changed(),
            self.context.children_changed(),
        );
        if self.action == StepAction::Skip {
            return;
        }

        self.input_acts.clear();
        self.input_acts.extend(self.input.state.iter_acts());

        self.output.borrow_mut().state.clear_all();
        self.memory.clear();

        let mut surprised = 0usize;
        for k in 0..self.input_acts.len() {
            let c = self.input_acts[k];
            if !self.recognition(c) {
                self.surprise(c);
                surprised += 1;
            }
        }

        // Single division keeps all-surprised exactly 1.0
        self.anomaly_score = if self.input_acts.is_empty() {
            0.0
        } else {
            surprised as f64 / self.input_acts.len() as f64
        };
    }

    fn learn(&mut self) {
        assert!(self.base.is_initialized(), "must call init() first");

        if self.action == StepAction::Skip {
            return;
        }

        self.d_acts.clear();
        self.d_acts.extend(self.memory.state.iter_acts());

        for &d in &self.d_acts {
            self.memory.learn_move(d, &self.context.state, self.base.rng());
            self.usage.mark_used(d);
        }
    }

    fn store(&mut self) {
        self.output.borrow_mut().store();
    }

    fn memory_usage(&self) -> usize {
        let mut bytes = std::mem::size_of::<Self>();
        bytes += self.input.memory_usage();
        bytes += self.context.memory_usage();
        bytes += self.output.borrow().memory_usage();
        bytes += self.memory.memory_usage();
        bytes += self.usage.memory_usage();
        bytes += self.input_acts.capacity() * std::mem::size_of::<usize>();
        bytes += self.d_acts.capacity() * std::mem::size_of::<usize>();
        bytes
    }
}

impl SequenceLearner {
    /// Validate a decoded memory image against this learner's geometry.
    fn check_image(&self, image: &MemoryImage) -> Result<()> {
        let num_r = self.num_d * self.num_rpd;
        let sizes = [
            (num_r, image.r_addrs.len()),
            (num_r, image.r_perms.len()),
            (self.num_d, image.d_used.num_bits()),
            (self.num_s, image.next_sd.len()),
        ];
        if let Some(&(expected, actual)) = sizes.iter().find(|(e, a)| e != a) {
            return Err(StateletError::InvalidInputSize { expected, actual });
        }

        let num_i = self.context.num_bits();
        if image.r_addrs.iter().any(|&a| a as usize >= num_i) {
            return Err(StateletError::InvalidParameter(format!(
                "receptor address outside context width {}",
                num_i
            )));
        }
        if image.next_sd.iter().any(|&n| n as usize >= self.num_dps) {
            return Err(StateletError::InvalidParameter(format!(
                "dendrite cursor outside budget {}",
                self.num_dps
            )));
        }
        if image.d_used.num_words() != BitArray::new(self.num_d).num_words() {
            return Err(StateletError::InvalidInputSize {
                expected: BitArray::new(self.num_d).num_words(),
                actual: image.d_used.num_words(),
            });
        }
        if !image.d_used.tail_is_clear() {
            return Err(StateletError::InvalidParameter(
                "usage flags set past dendrite count".to_string(),
            ));
        }
        Ok(())
    }
}
