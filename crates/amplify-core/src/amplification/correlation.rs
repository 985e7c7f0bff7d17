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

//! Discovers numeric dependencies between input and assertion statements

use super::{Correlation, Number, Relation, TestCase};
use crate::AmplifyError;

/// Finds `Direct` and `SubFromInitial` correlations inside one test case
pub struct CorrelationAnalyzer {
    assertion_keyword: String,
}

impl CorrelationAnalyzer {
    pub fn new(assertion_keyword: impl Into<String>) -> Self {
        Self {
            assertion_keyword: assertion_keyword.into(),
        }
    }

    /// Every correlation between an input literal and an assertion literal,
    /// deduplicated.
    pub fn analyze(&self, test_case: &TestCase, initial_supply: Option<i128>) -> Vec<Correlation> {
        let mut inputs: Vec<(usize, Number)> = Vec::new();
        let mut outputs: Vec<(usize, Number)> = Vec::new();

        for (line, statement) in test_case.statements.iter().enumerate() {
            let target = if statement.is_assertion(&self.assertion_keyword) {
                &mut outputs
            } else {
                &mut inputs
            };
            target.extend(statement.literals().iter().map(|l| (line, l.value)));
        }

        let mut correlations = Vec::new();
        for &(assert_line, assert_value) in &outputs {
            for &(input_line, input_value) in &inputs {
                if assert_value == input_value {
                    correlations.push(Correlation {
                        input_line,
                        assert_line,
                        relation: Relation::Direct,
                        input_value,
                        assert_value,
                        initial_supply: None,
                    });
                }
                if let Some(supply) = initial_supply {
                    if input_value.subtracted_from(supply) == assert_value {
                        correlations.push(Correlation {
                            input_line,
                            assert_line,
                            relation: Relation::SubFromInitial,
                            input_value,
                            assert_value,
                            initial_supply: Some(supply),
                        });
                    }
                }
            }
        }

        let found = correlations.len();
        let correlations = dedup_correlations(correlations);
        tracing::debug!(found, kept = correlations.len(), "Analyzed correlations");
        correlations
    }
}

/// Collapse structurally identical correlations, keeping first occurrences.
pub fn dedup_correlations(correlations: Vec<Correlation>) -> Vec<Correlation> {
    let mut unique: Vec<Correlation> = Vec::with_capacity(correlations.len());
    for correlation in correlations {
        if !unique.contains(&correlation) {
            unique.push(correlation);
        }
    }
    unique
}

/// Correlations whose line indices fit `test_case`. Others are dropped with
/// a warning.
pub fn valid_correlations<'a>(test_case: &TestCase, correlations: &'a [Correlation]) -> Vec<&'a Correlation> {
    correlations
        .iter()
        .filter(|c| {
            let fits = c.input_line < test_case.len() && c.assert_line < test_case.len();
            if !fits {
                let mismatch = AmplifyError::CorrelationMismatch {
                    line: c.input_line.max(c.assert_line),
                    len: test_case.len(),
                };
                tracing::warn!(error = %mismatch, "Skipping correlation");
            }
            fits
        })
        .collect()
}
