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

//! Recombination of the perturbed literal between two variants of a test case

use super::correlation::valid_correlations;
use super::lexer::{integer_literals, numeric_literals, replace_literals, NumericLiteral};
use super::mutator::propagate;
use super::{Correlation, Number, Population, Statement, TestCase};
use crate::AmplifyError;
use rand::{Rng, RngCore};

/// Which recombination rule produced a pair of children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossoverKind {
    /// Single literal each side: mean and absolute difference
    Arithmetic,
    /// Several literals: independent per-position pick
    Uniform,
}

/// Recombined literal values for the two children of one pair
#[derive(Debug, Clone, PartialEq)]
pub struct Recombination {
    pub kind: CrossoverKind,
    /// Child placed on the original line text
    pub first: Vec<Number>,
    /// Child placed on the variant line text
    pub second: Vec<Number>,
}

/// Index of the first line that differs between `original` and `variant` and
/// is the input side of some correlation.
pub fn mutated_line(original: &TestCase, variant: &TestCase, correlations: &[Correlation]) -> Option<usize> {
    (0..original.len().min(variant.len()))
        .find(|&i| original.get(i) != variant.get(i) && correlations.iter().any(|c| c.input_line == i))
}

/// `floor((a + b) / 2)` and `|a - b|`
pub fn arithmetic(a: Number, b: Number) -> (Number, Number) {
    match (a, b) {
        (Number::Int(a), Number::Int(b)) => {
            let mean = a.div_euclid(2) + b.div_euclid(2) + (a.rem_euclid(2) + b.rem_euclid(2)) / 2;
            let diff = i128::try_from(a.abs_diff(b))
                .map(Number::Int)
                .unwrap_or_else(|_| Number::Decimal((a as f64 - b as f64).abs()));
            (Number::Int(mean), diff)
        }
        _ => {
            let (a, b) = (a.as_f64(), b.as_f64());
            (Number::Decimal(((a + b) / 2.0).floor()), Number::Decimal((a - b).abs()))
        }
    }
}

/// Crosses the mutated line of each (original, variant) pair
#[derive(Debug, Default)]
pub struct CrossoverOperator;

impl CrossoverOperator {
    pub fn new() -> Self {
        Self
    }

    /// Up to four children from the original and its first two variants.
    ///
    /// Test cases without usable correlations, and test cases where neither
    /// pair can be recombined, come back once unchanged.
    pub fn crossover(
        &self,
        original: &TestCase,
        variants: &[TestCase],
        correlations: &[Correlation],
        rng: &mut dyn RngCore,
    ) -> Population {
        let usable: Vec<Correlation> = valid_correlations(original, correlations).into_iter().cloned().collect();
        if usable.is_empty() {
            return vec![original.clone()];
        }

        let mut children = Vec::new();
        for (pair, variant) in variants.iter().take(2).enumerate() {
            match self.cross_pair(original, variant, &usable, rng) {
                Ok(pair_children) => children.extend(pair_children),
                Err(e) => tracing::warn!(pair, error = %e, "Skipping crossover pair"),
            }
        }

        if children.is_empty() {
            vec![original.clone()]
        } else {
            children
        }
    }

    fn cross_pair(
        &self,
        original: &TestCase,
        variant: &TestCase,
        correlations: &[Correlation],
        rng: &mut dyn RngCore,
    ) -> Result<[TestCase; 2], AmplifyError> {
        let line = mutated_line(original, variant, correlations)
            .ok_or_else(|| AmplifyError::CrossoverIneligible("variant has no perturbed input line".to_string()))?;
        let base = &original.statements[line];
        let other = &variant.statements[line];

        let (base_literals, other_literals) = paired_literals(base, other).ok_or_else(|| {
            AmplifyError::CrossoverIneligible(format!("literal counts differ on line {}", line))
        })?;
        let recombination = recombine(&base_literals, &other_literals, rng);
        tracing::debug!(line, kind = ?recombination.kind, "Crossed over input line");

        Ok([
            child(original, line, base, &base_literals, &recombination.first, correlations),
            child(original, line, other, &other_literals, &recombination.second, correlations),
        ])
    }
}

/// Literals of both lines with matching counts: integers first, then every
/// numeric literal.
fn paired_literals(base: &Statement, other: &Statement) -> Option<(Vec<NumericLiteral>, Vec<NumericLiteral>)> {
    let extractors: [fn(&str) -> Vec<NumericLiteral>; 2] = [integer_literals, numeric_literals];
    extractors.iter().find_map(|extract| {
        let a = extract(base.as_str());
        let b = extract(other.as_str());
        (!a.is_empty() && a.len() == b.len()).then_some((a, b))
    })
}

/// Combine two equally long literal lists into two children.
pub fn recombine(a: &[NumericLiteral], b: &[NumericLiteral], rng: &mut dyn RngCore) -> Recombination {
    if let ([x], [y]) = (a, b) {
        let (mean, diff) = arithmetic(x.value, y.value);
        return Recombination {
            kind: CrossoverKind::Arithmetic,
            first: vec![mean],
            second: vec![diff],
        };
    }

    let mut pick = |x: &NumericLiteral, y: &NumericLiteral| if rng.gen::<bool>() { x.value } else { y.value };
    let first = a.iter().zip(b).map(|(x, y)| pick(x, y)).collect();
    let second = a.iter().zip(b).map(|(x, y)| pick(x, y)).collect();
    Recombination {
        kind: CrossoverKind::Uniform,
        first,
        second,
    }
}

fn child(
    original: &TestCase,
    line: usize,
    statement: &Statement,
    literals: &[NumericLiteral],
    values: &[Number],
    correlations: &[Correlation],
) -> TestCase {
    let replacements: Vec<String> = values.iter().map(Number::to_string).collect();
    let mut child = original.clone();
    child.replace(line, Statement::new(replace_literals(statement.as_str(), literals, &replacements)));
    if let Some(leading) = values.first() {
        propagate(&mut child, line, correlations, leading);
    }
    child
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amplification::correlation::CorrelationAnalyzer;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn mint(value: &str) -> TestCase {
        TestCase::from_lines(&[
            format!("await t.mint(a, {});", value),
            format!("expect(await t.balanceOf(a)).to.equal({});", value),
        ])
    }

    fn correlations(case: &TestCase) -> Vec<Correlation> {
        CorrelationAnalyzer::new("expect").analyze(case, None)
    }

    fn first_values(population: &[TestCase]) -> Vec<Option<Number>> {
        population.iter().map(|c| c.statements[0].first_literal()).collect()
    }

    #[test]
    fn test_arithmetic_formulas() {
        assert_eq!(arithmetic(Number::Int(100), Number::Int(300)), (Number::Int(200), Number::Int(200)));
        assert_eq!(arithmetic(Number::Int(100), Number::Int(250)), (Number::Int(175), Number::Int(150)));
        assert_eq!(arithmetic(Number::Int(-3), Number::Int(0)), (Number::Int(-2), Number::Int(3)));
        let (mean, diff) = arithmetic(Number::Int(i128::MAX), Number::Int(i128::MAX - 2));
        assert_eq!(mean, Number::Int(i128::MAX - 1));
        assert_eq!(diff, Number::Int(2));
    }

    #[test]
    fn test_four_children_with_propagation() {
        let original = mint("100");
        let variants = vec![mint("250"), mint("300")];
        let mut rng = StdRng::seed_from_u64(5);
        let children = CrossoverOperator::new().crossover(&original, &variants, &correlations(&original), &mut rng);

        assert_eq!(children.len(), 4);
        assert_eq!(
            first_values(&children),
            vec![
                Some(Number::Int(175)),
                Some(Number::Int(150)),
                Some(Number::Int(200)),
                Some(Number::Int(200)),
            ]
        );
        for child in &children {
            assert_eq!(child.statements[0].first_literal(), child.statements[1].first_literal());
        }
    }

    #[test]
    fn test_second_child_keeps_variant_text() {
        let original = mint("100");
        let weakened = TestCase::from_lines(&[
            "expect(await t.mint(a, 300)).to.be.ok;",
            "expect(await t.balanceOf(a)).to.equal(300);",
        ]);
        let mut rng = StdRng::seed_from_u64(5);
        let children =
            CrossoverOperator::new().crossover(&original, &[weakened], &correlations(&original), &mut rng);
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].statements[0].as_str(), "await t.mint(a, 200);");
        assert_eq!(children[1].statements[0].as_str(), "expect(await t.mint(a, 200)).to.be.ok;");
        assert_eq!(children[1].statements[1].as_str(), "expect(await t.balanceOf(a)).to.equal(200);");
    }

    #[test]
    fn test_uniform_picks_per_position() {
        let a = numeric_literals("t.transfer(x, 10, 20);");
        let b = numeric_literals("t.transfer(x, 30, 40);");
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let r = recombine(&a, &b, &mut rng);
            assert_eq!(r.kind, CrossoverKind::Uniform);
            for values in [&r.first, &r.second] {
                assert_eq!(values.len(), 2);
                assert!(values[0] == Number::Int(10) || values[0] == Number::Int(30));
                assert!(values[1] == Number::Int(20) || values[1] == Number::Int(40));
            }
        }
    }

    #[test]
    fn test_decimal_fallback() {
        let original = TestCase::from_lines(&["f(2.5);", "expect(g()).to.equal(2.5);"]);
        let variant = TestCase::from_lines(&["f(7);", "expect(g()).to.equal(7);"]);
        let mut rng = StdRng::seed_from_u64(1);
        let children =
            CrossoverOperator::new().crossover(&original, &[variant], &correlations(&original), &mut rng);
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].statements[0].as_str(), "f(4);");
        assert_eq!(children[1].statements[0].as_str(), "f(4.5);");
    }

    #[test]
    fn test_ineligible_pairs_pass_original_through() {
        let original = TestCase::from_lines(&["f(1, 2);", "expect(g()).to.equal(1);"]);
        let variant = TestCase::from_lines(&["f(3);", "expect(g()).to.equal(3);"]);
        let mut rng = StdRng::seed_from_u64(1);
        let population = CrossoverOperator::new().crossover(
            &original,
            &[variant.clone(), variant],
            &correlations(&original),
            &mut rng,
        );
        assert_eq!(population, vec![original]);
    }

    #[test]
    fn test_no_correlations_passthrough() {
        let original = TestCase::from_lines(&["await t.pause();"]);
        let mut rng = StdRng::seed_from_u64(1);
        let population = CrossoverOperator::new().crossover(&original, &[original.clone()], &[], &mut rng);
        assert_eq!(population, vec![original]);
    }

    #[test]
    fn test_mutated_line_requires_correlated_input() {
        let original = TestCase::from_lines(&["x(1);", "f(5);", "expect(g()).to.equal(5);"]);
        let variant = TestCase::from_lines(&["x(2);", "f(9);", "expect(g()).to.equal(9);"]);
        let correlations = correlations(&original);
        assert_eq!(mutated_line(&original, &variant, &correlations), Some(1));
        assert_eq!(mutated_line(&original, &original, &correlations), None);
    }
}
