//! SequenceLearner configuration.
//!
//! `SequenceLearnerConfig` carries every construction parameter of a
//! `SequenceLearner` and round-trips through JSON (human-edited files) or
//! bincode (compact embedding). `validate()` reports the same conditions the
//! constructor asserts, as errors instead of panics.
//!
//! # Example
//!
//! ```
//! use statelet::config::SequenceLearnerConfig;
//!
//! let json = r#"{
//!     "num_c": 26, "num_spc": 10, "num_dps": 10, "num_rpd": 12,
//!     "d_thresh": 6, "perm_thr": 20, "perm_inc": 2, "perm_dec": 1,
//!     "num_t": 2, "always_update": false, "seed": 0
//! }"#;
//!
//! let config = SequenceLearnerConfig::from_json(json).unwrap();
//! assert!(config.validate().is_ok());
//! assert_eq!(config.num_s(), 260);
//! ```

use crate::error::{Result, StateletError};
use serde::{Deserialize, Serialize};

/// Construction parameters of a `SequenceLearner`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SequenceLearnerConfig {
    /// Number of columns (input width)
    pub num_c: usize,
    /// Statelets per column
    pub num_spc: usize,
    /// Dendrites per statelet
    pub num_dps: usize,
    /// Receptors per dendrite
    pub num_rpd: usize,
    /// Overlap needed for a dendrite to activate
    pub d_thresh: u32,
    /// Permanence at which a receptor is connected
    pub perm_thr: u8,
    /// Permanence increment for receptors on active bits
    pub perm_inc: u8,
    /// Permanence decrement for receptors on inactive bits
    pub perm_dec: u8,
    /// Output history depth
    pub num_t: usize,
    /// Recompute even when input and context are unchanged
    pub always_update: bool,
    /// RNG seed
    pub seed: u64,
}

impl Default for SequenceLearnerConfig {
    fn default() -> Self {
        Self {
            num_c: 512,
            num_spc: 10,
            num_dps: 10,
            num_rpd: 12,
            d_thresh: 6,
            perm_thr: 20,
            perm_inc: 2,
            perm_dec: 1,
            num_t: 2,
            always_update: false,
            seed: 0,
        }
    }
}

impl SequenceLearnerConfig {
    /// Check every parameter constraint.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("num_c", self.num_c),
            ("num_spc", self.num_spc),
            ("num_dps", self.num_dps),
            ("num_rpd", self.num_rpd),
            ("num_t", self.num_t),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, v)| *v == 0) {
            return Err(StateletError::InvalidParameter(format!("{} must be > 0", name)));
        }
        if self.d_thresh as usize >= self.num_rpd {
            return Err(StateletError::InvalidParameter(format!(
                "d_thresh ({}) must be < num_rpd ({})",
                self.d_thresh, self.num_rpd
            )));
        }
        Ok(())
    }

    /// Total statelets.
    pub fn num_s(&self) -> usize {
        self.num_c * self.num_spc
    }

    /// Total dendrites.
    pub fn num_d(&self) -> usize {
        self.num_s() * self.num_dps
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to bincode.
    pub fn to_binary(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from bincode.
    pub fn from_binary(data: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SequenceLearnerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_json_round_trip() {
        let config = SequenceLearnerConfig {
            num_c: 26,
            always_update: true,
            seed: 7,
            ..Default::default()
        };
        let json = config.to_json().unwrap();
        assert_eq!(SequenceLearnerConfig::from_json(&json).unwrap(), config);

        let bin = config.to_binary().unwrap();
        assert_eq!(SequenceLearnerConfig::from_binary(&bin).unwrap(), config);
    }

    #[test]
    fn test_rejects_zero_sizes() {
        let config = SequenceLearnerConfig {
            num_spc: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "Invalid parameter: num_spc must be > 0");
    }

    #[test]
    fn test_rejects_threshold_at_receptor_count() {
        let config = SequenceLearnerConfig {
            num_rpd: 8,
            d_thresh: 8,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(StateletError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            SequenceLearnerConfig::from_json("{\"num_c\": 4}"),
            Err(StateletError::Config(_))
        ));
    }
}
