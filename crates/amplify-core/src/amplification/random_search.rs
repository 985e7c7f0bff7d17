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

//! Unguided baseline: redraw every literal, then weaken the changed lines

use super::lexer::replace_literals;
use super::mutator::{expand_siblings, Mutator};
use super::operators::ValueSampler;
use super::{Population, Statement, TestCase};
use rand::RngCore;

/// Redraw every numeric literal of every statement.
pub fn redraw_literals(test_case: &TestCase, sampler: &dyn ValueSampler, rng: &mut dyn RngCore) -> TestCase {
    let statements = test_case
        .statements
        .iter()
        .map(|statement| {
            let literals = statement.literals();
            if literals.is_empty() {
                return statement.clone();
            }
            let values: Vec<String> = literals.iter().map(|_| sampler.sample(rng).1.to_string()).collect();
            Statement::new(replace_literals(statement.as_str(), &literals, &values))
        })
        .collect();
    TestCase::new(statements)
}

/// `iterations` rounds over every test case; each redrawn case expands into
/// its weakened siblings. No correlation tracking takes place.
pub fn random_search(
    test_cases: &[TestCase],
    iterations: usize,
    mutator: &Mutator,
    rng: &mut dyn RngCore,
) -> Population {
    let mut population = Vec::new();

    for _ in 0..iterations {
        for test_case in test_cases {
            let redrawn = redraw_literals(test_case, mutator.sampler(), rng);
            population.extend(expand_siblings(
                test_case,
                &redrawn,
                &[],
                mutator.rewriter(),
                mutator.max_weakened_lines(),
            ));
        }
    }

    tracing::debug!(iterations, produced = population.len(), "Random search finished");
    population
}
