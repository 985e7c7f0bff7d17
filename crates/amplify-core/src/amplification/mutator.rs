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

//! Correlation-guided mutation of a single numeric literal

use super::correlation::valid_correlations;
use super::expectation::ExpectationRewriter;
use super::lexer::{replace_first_literal, replace_literals};
use super::operators::{SmartValueGenerator, ValueSampler};
use super::{Correlation, MutationRecord, Number, Statement, TestCase};
use crate::config::AmplifyConfig;
use crate::AmplifyError;
use rand::seq::SliceRandom;
use rand::RngCore;
use uuid::Uuid;

/// Siblings produced from one test case
#[derive(Debug, Clone)]
pub struct MutationOutcome {
    /// Sibling variants; a lone unchanged copy when nothing could be mutated
    pub variants: Vec<TestCase>,
    /// What was changed, if anything
    pub record: Option<MutationRecord>,
}

impl MutationOutcome {
    fn passthrough(test_case: &TestCase) -> Self {
        Self {
            variants: vec![test_case.clone()],
            record: None,
        }
    }
}

/// Main mutator that rewrites one literal along a tracked correlation
pub struct Mutator {
    sampler: Box<dyn ValueSampler>,
    rewriter: ExpectationRewriter,
    max_attempts: usize,
    max_weakened_lines: usize,
}

impl Mutator {
    pub fn new(
        sampler: Box<dyn ValueSampler>,
        rewriter: ExpectationRewriter,
        max_attempts: usize,
        max_weakened_lines: usize,
    ) -> Self {
        Self {
            sampler,
            rewriter,
            max_attempts,
            max_weakened_lines,
        }
    }

    /// Mutator with the weighted generator and rewriter described by `config`
    pub fn from_config(config: &AmplifyConfig) -> Result<Self, AmplifyError> {
        Ok(Self::new(
            Box::new(SmartValueGenerator::new(config.weights)?),
            ExpectationRewriter::new(config.dialect.clone()),
            config.max_mutation_attempts,
            config.max_weakened_lines,
        ))
    }

    pub fn rewriter(&self) -> &ExpectationRewriter {
        &self.rewriter
    }

    pub fn sampler(&self) -> &dyn ValueSampler {
        self.sampler.as_ref()
    }

    pub fn max_weakened_lines(&self) -> usize {
        self.max_weakened_lines
    }

    /// Mutate `test_case` along one randomly chosen correlation.
    ///
    /// Test cases without usable correlations come back unchanged as a single
    /// variant.
    pub fn mutate(
        &self,
        test_case: &TestCase,
        correlations: &[Correlation],
        rng: &mut dyn RngCore,
    ) -> Result<MutationOutcome, AmplifyError> {
        let usable = valid_correlations(test_case, correlations);
        let Some(chosen) = usable.choose(rng) else {
            return Ok(MutationOutcome::passthrough(test_case));
        };
        let line = chosen.input_line;

        let Some((statement, record)) = self.mutate_statement(&test_case.statements[line], line, rng)? else {
            tracing::warn!(line, "Correlated input line carries no literal");
            return Ok(MutationOutcome::passthrough(test_case));
        };
        tracing::debug!(
            line,
            category = ?record.category,
            original = %record.original,
            substituted = %record.substituted,
            attempts = record.attempts,
            "Mutated input literal"
        );

        let mut mutated = test_case.clone();
        mutated.replace(line, statement);
        let owned: Vec<Correlation> = usable.into_iter().cloned().collect();
        let dependents = propagate(&mut mutated, line, &owned, &record.substituted);

        let variants = expand_siblings(test_case, &mutated, &dependents, &self.rewriter, self.max_weakened_lines);
        Ok(MutationOutcome {
            variants,
            record: Some(record),
        })
    }

    /// Replace the first literal of `statement` with a freshly drawn value,
    /// redrawing until the text changes. `Ok(None)` when there is no literal.
    pub fn mutate_statement(
        &self,
        statement: &Statement,
        line: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Option<(Statement, MutationRecord)>, AmplifyError> {
        let Some(original) = statement.literals().into_iter().next() else {
            return Ok(None);
        };

        for attempt in 1..=self.max_attempts {
            let (category, value) = self.sampler.sample(rng);
            let text = replace_literals(statement.as_str(), std::slice::from_ref(&original), &[value.to_string()]);
            if text != statement.as_str() {
                let record = MutationRecord {
                    id: Uuid::new_v4(),
                    line,
                    category,
                    original: original.value,
                    substituted: value,
                    attempts: attempt,
                };
                return Ok(Some((Statement::new(text), record)));
            }
        }

        Err(AmplifyError::MutationExhausted {
            line,
            attempts: self.max_attempts,
        })
    }
}

/// Push a new input value through every correlation leaving `line`.
/// Returns the assertion lines that were targeted.
pub fn propagate(test_case: &mut TestCase, line: usize, correlations: &[Correlation], value: &Number) -> Vec<usize> {
    let mut dependents = Vec::new();

    for correlation in correlations.iter().filter(|c| c.input_line == line) {
        let Some(target) = test_case.get(correlation.assert_line) else {
            let mismatch = AmplifyError::CorrelationMismatch {
                line: correlation.assert_line,
                len: test_case.len(),
            };
            tracing::warn!(error = %mismatch, "Skipping correlation");
            continue;
        };
        let Some(updated) = correlation.propagated_value(value) else {
            continue;
        };
        if let Some(text) = replace_first_literal(target.as_str(), &updated) {
            test_case.replace(correlation.assert_line, Statement::new(text));
        }
        if !dependents.contains(&correlation.assert_line) {
            dependents.push(correlation.assert_line);
        }
    }

    dependents
}

/// Power-set expansion over the perturbed lines of `mutated`.
///
/// A perturbed line differs from `original` and is not a dependent assertion.
/// Each one is either kept as mutated or passed through the rewriter; bit `j`
/// of the sibling index selects the rewrite for the `j`-th perturbed line, so
/// sibling 0 is the strict variant. Only the first `max_lines` perturbed lines
/// take part; the rest stay strict.
pub fn expand_siblings(
    original: &TestCase,
    mutated: &TestCase,
    dependents: &[usize],
    rewriter: &ExpectationRewriter,
    max_lines: usize,
) -> Vec<TestCase> {
    let perturbed: Vec<usize> = (0..mutated.len())
        .filter(|i| original.get(*i) != mutated.get(*i) && !dependents.contains(i))
        .take(max_lines)
        .collect();

    (0..1usize << perturbed.len())
        .map(|mask| {
            let mut sibling = mutated.clone();
            for (bit, &line) in perturbed.iter().enumerate() {
                if mask & (1 << bit) != 0 {
                    sibling.replace(line, rewriter.rewrite(&mutated.statements[line]));
                }
            }
            sibling
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amplification::correlation::CorrelationAnalyzer;
    use crate::amplification::operators::ValueCategory;
    use crate::config::MutationWeights;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn mutator(weights: MutationWeights) -> Mutator {
        let config = AmplifyConfig {
            weights,
            ..AmplifyConfig::default()
        };
        Mutator::from_config(&config).unwrap()
    }

    fn mint_case() -> TestCase {
        TestCase::from_lines(&["mint(addr, 100);", "assert(balance == 100);"])
    }

    fn mint_correlations(case: &TestCase) -> Vec<Correlation> {
        CorrelationAnalyzer::new("assert").analyze(case, None)
    }

    #[test]
    fn test_zero_mutation_propagates_to_assertion() {
        let case = mint_case();
        let correlations = mint_correlations(&case);
        assert_eq!(correlations.len(), 1);

        let mut rng = StdRng::seed_from_u64(1);
        let outcome = mutator(MutationWeights::zero_only())
            .mutate(&case, &correlations, &mut rng)
            .unwrap();

        let record = outcome.record.unwrap();
        assert_eq!(record.category, ValueCategory::Zero);
        assert!(record.changed());
        assert_eq!(outcome.variants.len(), 2);

        let strict = &outcome.variants[0];
        assert_eq!(strict.lines().collect::<Vec<_>>(), vec!["mint(addr, 0);", "assert(balance == 0);"]);
        assert_ne!(strict.statements[1], case.statements[1]);

        // second sibling weakens the mutated input line, assertion stays updated
        let weak = &outcome.variants[1];
        assert_eq!(weak.statements[0].as_str(), "expect(mint(addr, 0)).to.be.ok;");
        assert_eq!(weak.statements[1].as_str(), "assert(balance == 0);");
    }

    #[test]
    fn test_no_correlations_passthrough() {
        let case = TestCase::from_lines(&["await t.unfreeze();"]);
        let mut rng = StdRng::seed_from_u64(1);
        let outcome = mutator(MutationWeights::default()).mutate(&case, &[], &mut rng).unwrap();
        assert_eq!(outcome.variants, vec![case]);
        assert!(outcome.record.is_none());
    }

    #[test]
    fn test_exhaustion_is_reported() {
        let case = TestCase::from_lines(&["mint(addr, 0);", "assert(balance == 0);"]);
        let correlations = mint_correlations(&case);
        let mut rng = StdRng::seed_from_u64(1);
        let err = mutator(MutationWeights::zero_only())
            .mutate(&case, &correlations, &mut rng)
            .unwrap_err();
        assert!(matches!(err, AmplifyError::MutationExhausted { line: 0, attempts: 1000 }));
    }

    #[test]
    fn test_out_of_range_correlations_skipped() {
        let case = mint_case();
        let stale = Correlation {
            input_line: 7,
            ..mint_correlations(&case)[0].clone()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let outcome = mutator(MutationWeights::default()).mutate(&case, &[stale], &mut rng).unwrap();
        assert_eq!(outcome.variants, vec![case]);
    }

    #[test]
    fn test_sub_from_initial_propagation() {
        let mut case = TestCase::from_lines(&[
            r#"await t.transfer(a, ethers.parseEther("100"));"#,
            r#"expect(await t.balanceOf(o)).to.equal(ethers.parseEther("900"));"#,
        ]);
        let correlations = CorrelationAnalyzer::new("expect").analyze(&case, Some(1000));
        let dependents = propagate(&mut case, 0, &correlations, &Number::Int(250));
        assert_eq!(dependents, vec![1]);
        assert_eq!(
            case.statements[1].as_str(),
            r#"expect(await t.balanceOf(o)).to.equal(ethers.parseEther("750"));"#
        );
    }

    #[test]
    fn test_mutated_value_always_distinct() {
        let case = mint_case();
        let correlations = mint_correlations(&case);
        let mutator = mutator(MutationWeights::default());
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..200 {
            let outcome = mutator.mutate(&case, &correlations, &mut rng).unwrap();
            let record = outcome.record.unwrap();
            assert_ne!(record.substituted, Number::Int(100));
            assert_eq!(
                outcome.variants[0].statements[0].first_literal(),
                outcome.variants[0].statements[1].first_literal()
            );
        }
    }

    #[test]
    fn test_power_set_expansion() {
        let original = TestCase::from_lines(&["a(1);", "b(2);", "c(3);"]);
        let mutated = TestCase::from_lines(&["a(5);", "b(6);", "c(3);"]);
        let siblings = expand_siblings(&original, &mutated, &[], &ExpectationRewriter::default(), 8);
        assert_eq!(siblings.len(), 4);
        assert_eq!(siblings[0], mutated);
        assert_eq!(siblings[1].statements[0].as_str(), "expect(a(5)).to.be.ok;");
        assert_eq!(siblings[1].statements[1].as_str(), "b(6);");
        assert_eq!(siblings[2].statements[0].as_str(), "a(5);");
        assert_eq!(siblings[2].statements[1].as_str(), "expect(b(6)).to.be.ok;");
        assert!(siblings.iter().all(|s| s.statements[2].as_str() == "c(3);"));

        let capped = expand_siblings(&original, &mutated, &[], &ExpectationRewriter::default(), 1);
        assert_eq!(capped.len(), 2);
    }
}
