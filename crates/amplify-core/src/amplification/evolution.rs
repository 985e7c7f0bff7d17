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

//! One amplification generation end to end

use super::assembler::{Assembler, TestNameSequence};
use super::correlation::CorrelationAnalyzer;
use super::crossover::CrossoverOperator;
use super::extractor::StatementExtractor;
use super::mutator::Mutator;
use super::random_search::random_search;
use super::{Correlation, Population, TestCase};
use crate::config::AmplifyConfig;
use crate::AmplifyError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// A test case whose amplification was abandoned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseFailure {
    /// Position among the active test cases of the input suite
    pub test_index: usize,
    pub reason: String,
}

/// Result of one generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutcome {
    /// Assembled output suite
    pub suite: String,
    pub originals: usize,
    pub mutated: usize,
    pub crossed: usize,
    pub failures: Vec<TestCaseFailure>,
}

impl GenerationOutcome {
    /// Number of tests in the output suite
    pub fn total(&self) -> usize {
        self.originals + self.mutated + self.crossed
    }
}

/// Drives extraction, mutation, crossover and reassembly over a suite
pub struct Amplifier {
    config: AmplifyConfig,
    extractor: StatementExtractor,
    analyzer: CorrelationAnalyzer,
    mutator: Mutator,
    crossover: CrossoverOperator,
    assembler: Assembler,
    rng: StdRng,
}

impl Amplifier {
    pub fn new(config: AmplifyConfig) -> Result<Self, AmplifyError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            extractor: StatementExtractor::new(config.dialect.clone()),
            analyzer: CorrelationAnalyzer::new(config.dialect.assertion_keyword.clone()),
            mutator: Mutator::from_config(&config)?,
            crossover: CrossoverOperator::new(),
            assembler: Assembler::new(config.dialect.clone()),
            rng,
            config,
        })
    }

    pub fn config(&self) -> &AmplifyConfig {
        &self.config
    }

    /// Run one generation over `source`.
    ///
    /// The output suite holds the original tests, their mutated siblings and
    /// the crossover children, named from `names`. A test case whose mutation
    /// fails is reported in `failures` and contributes only its original.
    pub fn run_generation(
        &mut self,
        source: &str,
        names: &mut TestNameSequence,
    ) -> Result<GenerationOutcome, AmplifyError> {
        let originals = self.extractor.extract(source)?;
        let initial_supply = self.extractor.initial_supply(source);
        let correlations: Vec<Vec<Correlation>> = originals
            .iter()
            .map(|case| self.analyzer.analyze(case, initial_supply))
            .collect();
        tracing::debug!(tests = originals.len(), ?initial_supply, "Analyzed suite");

        let (mutated, families, failures) = self.mutate_population(&originals, &correlations)?;
        let mutated = self.round_trip(&mutated, source)?;

        let mut crossed = Vec::new();
        let mut offset = 0;
        for (index, size) in families.iter().enumerate() {
            let family = &mutated[offset..offset + size];
            offset += size;
            if family.is_empty() {
                continue;
            }
            crossed.extend(
                self.crossover
                    .crossover(&originals[index], family, &correlations[index], &mut self.rng),
            );
        }
        let crossed = self.round_trip(&crossed, source)?;

        let merged: Population = originals
            .iter()
            .chain(mutated.iter())
            .chain(crossed.iter())
            .cloned()
            .collect();
        let suite = self.assembler.assemble(&merged, source, names)?;

        tracing::info!(
            originals = originals.len(),
            mutated = mutated.len(),
            crossed = crossed.len(),
            failures = failures.len(),
            "Generation complete"
        );

        Ok(GenerationOutcome {
            suite,
            originals: originals.len(),
            mutated: mutated.len(),
            crossed: crossed.len(),
            failures,
        })
    }

    /// Mutated siblings of every test case, the number of siblings each one
    /// produced, and the test cases that had to be abandoned.
    fn mutate_population(
        &mut self,
        originals: &[TestCase],
        correlations: &[Vec<Correlation>],
    ) -> Result<(Population, Vec<usize>, Vec<TestCaseFailure>), AmplifyError> {
        let mut population = Vec::new();
        let mut families = Vec::with_capacity(originals.len());
        let mut failures = Vec::new();

        for (index, (case, case_correlations)) in originals.iter().zip(correlations).enumerate() {
            match self.mutator.mutate(case, case_correlations, &mut self.rng) {
                Ok(outcome) => {
                    families.push(outcome.variants.len());
                    population.extend(outcome.variants);
                }
                Err(e) if e.is_test_case_local() => {
                    tracing::warn!(test_index = index, error = %e, "Abandoning test case");
                    families.push(0);
                    failures.push(TestCaseFailure {
                        test_index: index,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Ok((population, families, failures))
    }

    /// Assemble an intermediate population and extract it back, so later
    /// stages see exactly what a suite file would contain.
    fn round_trip(&self, population: &[TestCase], source: &str) -> Result<Population, AmplifyError> {
        if population.is_empty() {
            return Ok(Vec::new());
        }

        let mut scratch = TestNameSequence::new();
        let text = self.assembler.assemble(population, source, &mut scratch)?;
        let extracted = self.extractor.extract(&text)?;
        if extracted.len() != population.len() {
            return Err(AmplifyError::InternalError(format!(
                "reassembled {} test cases but extracted {}",
                population.len(),
                extracted.len()
            )));
        }
        Ok(extracted)
    }

    /// Random-search generation over `source`: `iterations` redraw rounds,
    /// assembled after the original tests.
    pub fn random_search_generation(
        &mut self,
        source: &str,
        iterations: usize,
        names: &mut TestNameSequence,
    ) -> Result<GenerationOutcome, AmplifyError> {
        let originals = self.extractor.extract(source)?;
        let searched = random_search(&originals, iterations, &self.mutator, &mut self.rng);

        let merged: Population = originals.iter().chain(searched.iter()).cloned().collect();
        let suite = self.assembler.assemble(&merged, source, names)?;
        tracing::info!(
            originals = originals.len(),
            searched = searched.len(),
            "Random search generation complete"
        );

        Ok(GenerationOutcome {
            suite,
            originals: originals.len(),
            mutated: searched.len(),
            crossed: 0,
            failures: Vec::new(),
        })
    }
}
