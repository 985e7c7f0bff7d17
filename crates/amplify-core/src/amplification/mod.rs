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

//! # Genetic Test Amplification
//!
//! Enlarges an existing unit-test suite by perturbing the numeric literals its
//! tests feed into the system under test, while keeping the assertions that
//! depend on those literals consistent.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Generation                            │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌─────────────┐   ┌───────────┐             │
//! │  │ Extractor │──▶│ Correlation │──▶│  Mutator  │──┐          │
//! │  └───────────┘   │  Analyzer   │   └───────────┘  │          │
//! │        ▲         └─────────────┘         │        ▼          │
//! │        │                                 │   ┌───────────┐   │
//! │  ┌───────────┐   ┌─────────────┐         └──▶│ Crossover │   │
//! │  │ Assembler │◀──│ Expectation │◀────────────└───────────┘   │
//! │  └───────────┘   │  Rewriter   │                             │
//! │                  └─────────────┘                             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Components
//!
//! - `lexer.rs`: token stream and numeric-literal pass shared by every stage
//! - `extractor.rs`: suite text to normalized test cases
//! - `correlation.rs`: input/assertion literal dependencies
//! - `operators.rs`: weighted literal categories
//! - `mutator.rs`: single-literal mutation with sibling expansion
//! - `crossover.rs`: arithmetic and uniform recombination
//! - `expectation.rs`: assertion weakening
//! - `assembler.rs`: test cases back to suite text
//! - `evolution.rs`: one generation end to end
//! - `random_search.rs`: unguided baseline operator
//! - `reporting.rs`: runner report scanning and skip marking

pub mod lexer;
pub mod extractor;
pub mod correlation;
pub mod operators;
pub mod mutator;
pub mod crossover;
pub mod expectation;
pub mod assembler;
pub mod evolution;
pub mod random_search;
pub mod reporting;

use operators::ValueCategory;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Numeric literal value as written in a statement
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum Number {
    Int(i128),
    Decimal(f64),
}

impl Number {
    /// Parse `100`, `-3` or `0.25`. Integers too wide for `i128` fall back to
    /// decimals.
    pub fn parse(text: &str) -> Option<Self> {
        if text.contains('.') {
            return text.parse::<f64>().ok().map(Number::Decimal);
        }
        match text.parse::<i128>() {
            Ok(value) => Some(Number::Int(value)),
            Err(_) => text.parse::<f64>().ok().map(Number::Decimal),
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int(v) => *v as f64,
            Number::Decimal(v) => *v,
        }
    }

    /// Whether this value was written without a fractional part
    pub fn is_integer_literal(&self) -> bool {
        matches!(self, Number::Int(_))
    }

    /// `supply - self`, keeping integers integral
    pub fn subtracted_from(&self, supply: i128) -> Number {
        match self {
            Number::Int(v) => supply
                .checked_sub(*v)
                .map(Number::Int)
                .unwrap_or_else(|| Number::Decimal(supply as f64 - *v as f64)),
            Number::Decimal(v) => Number::Decimal(supply as f64 - v),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            _ => self.as_f64() == other.as_f64(),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(v) => write!(f, "{}", v),
            Number::Decimal(v) => write!(f, "{}", v),
        }
    }
}

/// One trimmed, bracket-balanced statement of a test body
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Statement {
    text: String,
}

impl Statement {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether the statement asserts something, i.e. mentions the assertion
    /// keyword as an identifier.
    pub fn is_assertion(&self, keyword: &str) -> bool {
        lexer::contains_identifier(&self.text, keyword)
    }

    /// Numeric literals in source order
    pub fn literals(&self) -> Vec<lexer::NumericLiteral> {
        lexer::numeric_literals(&self.text)
    }

    /// First numeric literal, if any
    pub fn first_literal(&self) -> Option<Number> {
        self.literals().first().map(|l| l.value)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for Statement {
    fn from(text: &str) -> Self {
        Statement::new(text)
    }
}

/// Ordered statements of one test body. Statements are replaced in place,
/// never reordered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TestCase {
    pub statements: Vec<Statement>,
}

impl TestCase {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        Self::new(lines.iter().map(|l| Statement::new(l.as_ref())).collect())
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn get(&self, line: usize) -> Option<&Statement> {
        self.statements.get(line)
    }

    /// Replace the statement at `line`. Out-of-range indices are ignored.
    pub fn replace(&mut self, line: usize, statement: Statement) {
        if let Some(slot) = self.statements.get_mut(line) {
            *slot = statement;
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.statements.iter().map(Statement::as_str)
    }
}

/// Working set of test cases for one stage of a generation
pub type Population = Vec<TestCase>;

/// How an assertion literal depends on an input literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// Assertion value equals the input value
    Direct,
    /// Assertion value equals `initial_supply - input`
    SubFromInitial,
}

/// Numeric dependency between an input statement and an assertion statement
/// of the same test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    pub input_line: usize,
    pub assert_line: usize,
    pub relation: Relation,
    pub input_value: Number,
    pub assert_value: Number,
    pub initial_supply: Option<i128>,
}

impl Correlation {
    /// Assertion value implied by a new input value
    pub fn propagated_value(&self, new_input: &Number) -> Option<Number> {
        match self.relation {
            Relation::Direct => Some(*new_input),
            Relation::SubFromInitial => self.initial_supply.map(|s| new_input.subtracted_from(s)),
        }
    }
}

/// Which literal a mutation changed and what it became
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationRecord {
    /// Unique identifier for this mutation
    pub id: Uuid,
    /// Line index of the mutated statement
    pub line: usize,
    /// Category the substituted value was drawn from
    pub category: ValueCategory,
    pub original: Number,
    pub substituted: Number,
    /// Draws needed to obtain a distinct value
    pub attempts: usize,
}

impl MutationRecord {
    pub fn changed(&self) -> bool {
        self.original.to_string() != self.substituted.to_string()
    }
}

/// Framework version for compatibility tracking
pub const VERSION: &str = "1.0.0";
