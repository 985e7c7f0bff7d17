// Copyright 2024 Helix Platform
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration for the amplification engine.

use crate::AmplifyError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default configuration values
pub mod defaults {
    /// Draws performed before a mutation is declared exhausted
    pub const DEFAULT_MAX_MUTATION_ATTEMPTS: usize = 1000;

    /// Widest power-set expansion of weakened siblings (2^4 siblings)
    pub const DEFAULT_MAX_WEAKENED_LINES: usize = 4;

    /// Weight of the `valid` category
    pub const DEFAULT_VALID_WEIGHT: u32 = 31;

    /// Weight of the `negative` category
    pub const DEFAULT_NEGATIVE_WEIGHT: u32 = 12;

    /// Weight of the `zero` category
    pub const DEFAULT_ZERO_WEIGHT: u32 = 19;

    /// Weight of the `large` category
    pub const DEFAULT_LARGE_WEIGHT: u32 = 19;

    /// Weight of the `boundary` category
    pub const DEFAULT_BOUNDARY_WEIGHT: u32 = 19;
}

/// Relative weights of the literal categories drawn during mutation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MutationWeights {
    /// Small positive values
    pub valid: u32,
    /// Small negative values
    pub negative: u32,
    /// Exactly zero
    pub zero: u32,
    /// Values between 10^6 and 10^9
    pub large: u32,
    /// Signed 32-bit boundaries
    pub boundary: u32,
}

impl Default for MutationWeights {
    fn default() -> Self {
        Self {
            valid: defaults::DEFAULT_VALID_WEIGHT,
            negative: defaults::DEFAULT_NEGATIVE_WEIGHT,
            zero: defaults::DEFAULT_ZERO_WEIGHT,
            large: defaults::DEFAULT_LARGE_WEIGHT,
            boundary: defaults::DEFAULT_BOUNDARY_WEIGHT,
        }
    }
}

impl MutationWeights {
    /// Weights in category order: valid, negative, zero, large, boundary.
    pub fn as_array(&self) -> [u32; 5] {
        [self.valid, self.negative, self.zero, self.large, self.boundary]
    }

    /// Weight table that always draws zero. Handy for reproducible runs.
    pub fn zero_only() -> Self {
        Self {
            valid: 0,
            negative: 0,
            zero: 1,
            large: 0,
            boundary: 0,
        }
    }

    fn total(&self) -> u64 {
        self.as_array().iter().map(|w| u64::from(*w)).sum()
    }
}

/// Keywords of the test dialect being amplified.
///
/// The defaults describe Mocha/Chai suites driving Hardhat contracts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SuiteDialect {
    /// Declares a single test case (`it`)
    pub test_keyword: String,
    /// Declares a grouping block (`describe`)
    pub group_keyword: String,
    /// Declares the per-test setup block (`beforeEach`)
    pub setup_keyword: String,
    /// Marks a statement as an assertion (`expect`)
    pub assertion_keyword: String,
    /// Constructor call whose first argument is the initial supply (`deploy`)
    pub constructor_call: String,
    /// Unit-conversion calls whose assignments survive weakening (`parseEther`)
    pub conversion_calls: Vec<String>,
    /// Member used to disable a declaration (`it.skip`)
    pub skip_suffix: String,
}

impl Default for SuiteDialect {
    fn default() -> Self {
        Self {
            test_keyword: "it".to_string(),
            group_keyword: "describe".to_string(),
            setup_keyword: "beforeEach".to_string(),
            assertion_keyword: "expect".to_string(),
            constructor_call: "deploy".to_string(),
            conversion_calls: vec!["parseEther".to_string()],
            skip_suffix: "skip".to_string(),
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AmplifyConfig {
    /// Seed for the random source; `None` seeds from entropy
    pub seed: Option<u64>,
    /// Draws attempted before a mutation is declared exhausted
    pub max_mutation_attempts: usize,
    /// Cap on the number of perturbed lines expanded into weakened siblings
    pub max_weakened_lines: usize,
    /// Literal category weights
    pub weights: MutationWeights,
    /// Dialect keywords
    pub dialect: SuiteDialect,
}

impl Default for AmplifyConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_mutation_attempts: defaults::DEFAULT_MAX_MUTATION_ATTEMPTS,
            max_weakened_lines: defaults::DEFAULT_MAX_WEAKENED_LINES,
            weights: MutationWeights::default(),
            dialect: SuiteDialect::default(),
        }
    }
}

impl AmplifyConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, AmplifyError> {
        let config: AmplifyConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_file(path: &Path) -> Result<Self, AmplifyError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Builder-style seed override
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check invariants the engine relies on.
    pub fn validate(&self) -> Result<(), AmplifyError> {
        if self.weights.total() == 0 {
            return Err(AmplifyError::ConfigError(
                "at least one mutation weight must be positive".to_string(),
            ));
        }
        if self.max_mutation_attempts == 0 {
            return Err(AmplifyError::ConfigError(
                "max_mutation_attempts must be at least 1".to_string(),
            ));
        }
        if !(1..=16).contains(&self.max_weakened_lines) {
            return Err(AmplifyError::ConfigError(
                "max_weakened_lines must be between 1 and 16".to_string(),
            ));
        }

        let d = &self.dialect;
        let keywords = [
            ("test_keyword", &d.test_keyword),
            ("group_keyword", &d.group_keyword),
            ("setup_keyword", &d.setup_keyword),
            ("assertion_keyword", &d.assertion_keyword),
            ("constructor_call", &d.constructor_call),
            ("skip_suffix", &d.skip_suffix),
        ];
        for (name, value) in keywords {
            if value.trim().is_empty() {
                return Err(AmplifyError::ConfigError(format!("{} cannot be empty", name)));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AmplifyConfig::default();
        assert_eq!(config.max_mutation_attempts, 1000);
        assert_eq!(config.weights.as_array(), [31, 12, 19, 19, 19]);
        assert_eq!(config.dialect.assertion_keyword, "expect");
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_valid_is_plurality_by_default() {
        let weights = MutationWeights::default().as_array();
        assert!(weights[1..].iter().all(|w| *w < weights[0]));
        assert!(weights.iter().all(|w| *w > 0));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = AmplifyConfig::from_json_str(r#"{"seed": 7, "weights": {"zero": 5}}"#).unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.weights.zero, 5);
        assert_eq!(config.weights.valid, 31);
        assert_eq!(config.dialect.test_keyword, "it");
    }

    #[test]
    fn test_rejects_zero_weights() {
        let json = r#"{"weights": {"valid": 0, "negative": 0, "zero": 0, "large": 0, "boundary": 0}}"#;
        let err = AmplifyConfig::from_json_str(json).unwrap_err();
        assert!(matches!(err, AmplifyError::ConfigError(_)));
    }

    #[test]
    fn test_rejects_empty_keyword() {
        let mut config = AmplifyConfig::default();
        config.dialect.assertion_keyword = "  ".to_string();
        assert!(matches!(config.validate(), Err(AmplifyError::ConfigError(msg)) if msg.contains("assertion_keyword")));
    }

    #[test]
    fn test_rejects_expansion_width_out_of_range() {
        for width in [0, 17] {
            let config = AmplifyConfig {
                max_weakened_lines: width,
                ..AmplifyConfig::default()
            };
            assert!(config.validate().is_err());
        }
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_mutation_attempts": 10}}"#).unwrap();

        let config = AmplifyConfig::from_file(file.path()).unwrap();
        assert_eq!(config.max_mutation_attempts, 10);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = AmplifyConfig::from_file(Path::new("/nonexistent/amplify.json")).unwrap_err();
        assert!(matches!(err, AmplifyError::IoError(_)));
    }
}
