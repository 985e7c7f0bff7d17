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

//! Statement extraction: suite source text to normalized test cases

use super::lexer::{brackets_balanced, significant_tokens, strip_comments, Token, TokenKind};
use super::{Statement, TestCase};
use crate::config::SuiteDialect;
use crate::errors::ParseError;
use std::ops::Range;

/// A test declaration found in suite source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestBlock {
    /// Byte offset of the declaration keyword
    pub declaration: usize,
    /// Byte range between the body braces
    pub body: Range<usize>,
    /// Declared through the skip form (`it.skip(`)
    pub skipped: bool,
}

/// Splits suite source into test cases according to a dialect
pub struct StatementExtractor {
    dialect: SuiteDialect,
}

impl Default for StatementExtractor {
    fn default() -> Self {
        Self::new(SuiteDialect::default())
    }
}

impl StatementExtractor {
    pub fn new(dialect: SuiteDialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> &SuiteDialect {
        &self.dialect
    }

    /// Find every test declaration and its body, skipped ones included.
    pub fn locate_tests(&self, source: &str) -> Result<Vec<TestBlock>, ParseError> {
        let tokens = significant_tokens(source);
        let mut blocks = Vec::new();
        let mut idx = 0;

        while idx < tokens.len() {
            let Some((skipped, paren)) = self.declaration_at(source, &tokens, idx) else {
                idx += 1;
                continue;
            };

            let declaration = tokens[idx].span.start;
            let open = (paren..tokens.len())
                .find(|&i| tokens[i].is_punct('{'))
                .ok_or(ParseError::MissingBody { offset: declaration })?;
            let close = matching_brace(&tokens, open).ok_or(ParseError::UnbalancedBody {
                offset: tokens[open].span.start,
            })?;

            blocks.push(TestBlock {
                declaration,
                body: tokens[open].span.end..tokens[close].span.start,
                skipped,
            });
            idx = close + 1;
        }

        Ok(blocks)
    }

    /// `it(` or `it.skip(` at `idx`, not reached through a member access.
    /// Returns the skip flag and the index of the opening parenthesis.
    fn declaration_at(&self, source: &str, tokens: &[Token], idx: usize) -> Option<(bool, usize)> {
        if !tokens[idx].is_identifier(source, &self.dialect.test_keyword) {
            return None;
        }
        if idx > 0 && tokens[idx - 1].is_punct('.') {
            return None;
        }

        let next = tokens.get(idx + 1)?;
        if next.is_punct('(') {
            return Some((false, idx + 1));
        }
        if next.is_punct('.')
            && tokens.get(idx + 2)?.is_identifier(source, &self.dialect.skip_suffix)
            && tokens.get(idx + 3)?.is_punct('(')
        {
            return Some((true, idx + 3));
        }
        None
    }

    /// Extract the active (non-skipped) test cases of a suite.
    pub fn extract(&self, source: &str) -> Result<Vec<TestCase>, ParseError> {
        let blocks = self.locate_tests(source)?;
        if blocks.is_empty() {
            return Err(ParseError::NoTestDeclarations);
        }

        let cases: Vec<TestCase> = blocks
            .iter()
            .filter(|b| !b.skipped)
            .map(|b| normalize_body(&source[b.body.clone()]))
            .collect();

        tracing::debug!(
            declarations = blocks.len(),
            active = cases.len(),
            "Extracted test cases"
        );
        Ok(cases)
    }

    /// First literal argument of the constructor call inside the setup block,
    /// when it is a bare or quoted base-10 integer.
    pub fn initial_supply(&self, source: &str) -> Option<i128> {
        let tokens = significant_tokens(source);

        let setup = tokens.iter().enumerate().position(|(i, t)| {
            t.is_identifier(source, &self.dialect.setup_keyword)
                && tokens.get(i + 1).map_or(false, |n| n.is_punct('('))
        })?;
        let open = (setup..tokens.len()).find(|&i| tokens[i].is_punct('{'))?;
        let close = matching_brace(&tokens, open)?;

        let call = (open..close).find(|&i| {
            tokens[i].is_identifier(source, &self.dialect.constructor_call)
                && tokens.get(i + 1).map_or(false, |n| n.is_punct('('))
        })?;

        let argument = tokens.get(call + 2)?;
        let follower = tokens.get(call + 3)?;
        if !(follower.is_punct(',') || follower.is_punct(')')) {
            return None;
        }

        let text = argument.text(source);
        let digits = match argument.kind {
            TokenKind::Number => text,
            TokenKind::Str if text.len() >= 2 => &text[1..text.len() - 1],
            _ => return None,
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}

/// Index of the `}` closing the `{` at `open`.
fn matching_brace(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        if token.is_punct('{') {
            depth += 1;
        } else if token.is_punct('}') {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Turn a raw test body into statements: comments and blank lines go,
/// `.`-continuations join the previous statement, and lines accumulate until
/// their brackets balance.
pub fn normalize_body(body: &str) -> TestCase {
    let mut merged: Vec<String> = Vec::new();
    let mut buffer = String::new();
    let body = strip_comments(body);

    for raw in body.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('.') {
            if !buffer.is_empty() {
                buffer.push_str(line);
                if brackets_balanced(&buffer) {
                    merged.push(buffer.trim().to_string());
                    buffer.clear();
                }
                continue;
            }
            if let Some(last) = merged.last_mut() {
                last.push_str(line);
                continue;
            }
        }

        if !buffer.is_empty() {
            buffer.push(' ');
        }
        buffer.push_str(line);

        if brackets_balanced(&buffer) {
            merged.push(buffer.trim().to_string());
            buffer.clear();
        }
    }

    if !buffer.trim().is_empty() {
        merged.push(buffer.trim().to_string());
    }

    TestCase::new(merged.into_iter().map(Statement::new).collect())
}
