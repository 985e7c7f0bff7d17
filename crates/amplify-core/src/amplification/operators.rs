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

//! Literal categories and the weighted draw used by mutation

use super::Number;
use crate::config::MutationWeights;
use crate::AmplifyError;
use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

/// Category a replacement literal is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueCategory {
    /// 1..=100
    Valid,
    /// -100..=-1
    Negative,
    /// Exactly 0
    Zero,
    /// 10^6..=10^9
    Large,
    /// `i32::MAX` or `i32::MIN`
    Boundary,
}

impl ValueCategory {
    /// Categories in weight-table order
    pub const ALL: [ValueCategory; 5] = [
        ValueCategory::Valid,
        ValueCategory::Negative,
        ValueCategory::Zero,
        ValueCategory::Large,
        ValueCategory::Boundary,
    ];

    /// Draw a concrete value of this category.
    pub fn draw(&self, rng: &mut dyn RngCore) -> Number {
        let value = match self {
            ValueCategory::Valid => rng.gen_range(1..=100),
            ValueCategory::Negative => rng.gen_range(-100..=-1),
            ValueCategory::Zero => 0,
            ValueCategory::Large => rng.gen_range(1_000_000..=1_000_000_000),
            ValueCategory::Boundary => {
                if rng.gen::<bool>() {
                    i128::from(i32::MAX)
                } else {
                    i128::from(i32::MIN)
                }
            }
        };
        Number::Int(value)
    }
}

/// Source of replacement literals
pub trait ValueSampler: Send + Sync {
    /// Draw one replacement value and the category it came from
    fn sample(&self, rng: &mut dyn RngCore) -> (ValueCategory, Number);
}

/// Weighted "smart" values: edge cases, invalid inputs and boundaries
pub struct SmartValueGenerator {
    weights: MutationWeights,
    index: WeightedIndex<u32>,
}

impl SmartValueGenerator {
    pub fn new(weights: MutationWeights) -> Result<Self, AmplifyError> {
        let index = WeightedIndex::new(weights.as_array())
            .map_err(|e| AmplifyError::ConfigError(format!("invalid mutation weights: {}", e)))?;
        Ok(Self { weights, index })
    }

    pub fn weights(&self) -> &MutationWeights {
        &self.weights
    }
}

impl ValueSampler for SmartValueGenerator {
    fn sample(&self, rng: &mut dyn RngCore) -> (ValueCategory, Number) {
        let category = ValueCategory::ALL[self.index.sample(rng)];
        (category, category.draw(rng))
    }
}
