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

//! Defines common error types for the amplification engine.

use thiserror::Error;

/// Failures while locating test bodies in suite source text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The suite contains no test declarations at all.
    #[error("no test declarations found")]
    NoTestDeclarations,

    /// A test declaration was found but its body never opens.
    #[error("test declaration at byte {offset} has no body")]
    MissingBody {
        /// Byte offset of the declaration keyword.
        offset: usize,
    },

    /// A test body opens but its braces never balance.
    #[error("unbalanced test body starting at byte {offset}")]
    UnbalancedBody {
        /// Byte offset of the opening brace.
        offset: usize,
    },
}

/// The primary error type for amplification operations.
#[derive(Error, Debug)]
pub enum AmplifyError {
    /// Error related to configuration loading or validation.
    #[error("Configuration Error: {0}")]
    ConfigError(String),

    /// Error during file I/O operations.
    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error during serialization or deserialization (e.g., JSON parsing).
    #[error("Serialization/Deserialization Error: {0}")]
    SerdeError(#[from] serde_json::Error),

    /// The suite text could not be split into test cases.
    #[error("Parse Error: {0}")]
    Parse(#[from] ParseError),

    /// A correlation points past the end of the statement list.
    #[error("Correlation references line {line} but the test case has {len} statements")]
    CorrelationMismatch {
        /// Referenced line index.
        line: usize,
        /// Number of statements in the test case.
        len: usize,
    },

    /// No distinct literal could be drawn for a line.
    #[error("Mutation of line {line} produced no distinct literal after {attempts} attempts")]
    MutationExhausted {
        /// Line index that was being mutated.
        line: usize,
        /// Number of draws performed.
        attempts: usize,
    },

    /// Two variants cannot be recombined.
    #[error("Crossover Ineligible: {0}")]
    CrossoverIneligible(String),

    /// Represents an unexpected internal error.
    #[error("Internal Error: {0}")]
    InternalError(String),
}

impl AmplifyError {
    /// Whether the error only affects a single test case and the rest of the
    /// suite can keep going.
    pub fn is_test_case_local(&self) -> bool {
        matches!(
            self,
            AmplifyError::CorrelationMismatch { .. }
                | AmplifyError::MutationExhausted { .. }
                | AmplifyError::CrossoverIneligible(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_converts() {
        let err: AmplifyError = ParseError::NoTestDeclarations.into();
        assert!(matches!(err, AmplifyError::Parse(ParseError::NoTestDeclarations)));
        assert!(!err.is_test_case_local());
    }

    #[test]
    fn test_local_errors() {
        let err = AmplifyError::MutationExhausted { line: 3, attempts: 1000 };
        assert!(err.is_test_case_local());
        assert!(err.to_string().contains("line 3"));
        assert!(err.to_string().contains("1000 attempts"));
    }
}
