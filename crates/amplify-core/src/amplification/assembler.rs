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

//! Test cases back to suite source text

use super::extractor::StatementExtractor;
use super::lexer::significant_tokens;
use super::TestCase;
use crate::config::SuiteDialect;
use crate::errors::ParseError;

/// Monotonic source of `test N` names.
///
/// One sequence is shared by every suite a run emits so that names never
/// repeat. Parallel callers must serialize access to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestNameSequence {
    issued: u64,
}

impl TestNameSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence whose next name is `test {issued + 1}`
    pub fn resume_after(issued: u64) -> Self {
        Self { issued }
    }

    pub fn next_name(&mut self) -> String {
        self.issued += 1;
        format!("test {}", self.issued)
    }

    /// Number of names handed out so far
    pub fn issued(&self) -> u64 {
        self.issued
    }
}

/// Renders populations as suites in the original dialect
pub struct Assembler {
    extractor: StatementExtractor,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new(SuiteDialect::default())
    }
}

impl Assembler {
    pub fn new(dialect: SuiteDialect) -> Self {
        Self {
            extractor: StatementExtractor::new(dialect),
        }
    }

    fn dialect(&self) -> &SuiteDialect {
        self.extractor.dialect()
    }

    /// One named test block
    pub fn render_test(&self, test_case: &TestCase, name: &str) -> String {
        let mut block = format!("  {}(\"{}\", async function () {{\n", self.dialect().test_keyword, name);
        for line in test_case.lines() {
            block.push_str("    ");
            block.push_str(line);
            block.push('\n');
        }
        block.push_str("  });");
        block
    }

    /// Every test block, each followed by a blank line
    pub fn render_tests(&self, test_cases: &[TestCase], names: &mut TestNameSequence) -> String {
        test_cases
            .iter()
            .map(|case| format!("{}\n\n", self.render_test(case, &names.next_name())))
            .collect()
    }

    /// Full suite: the original preamble, the rendered tests and the closing
    /// of the outer group. Group declarations after the first are dropped.
    /// A source without test declarations is returned as is.
    pub fn assemble(
        &self,
        test_cases: &[TestCase],
        original: &str,
        names: &mut TestNameSequence,
    ) -> Result<String, ParseError> {
        let blocks = self.extractor.locate_tests(original)?;
        let Some(first) = blocks.first() else {
            return Ok(original.to_string());
        };

        let preamble = original[..first.declaration].trim_end_matches(|c| c == ' ' || c == '\t');
        let suite = format!(
            "{}\n{}}});",
            preamble,
            self.render_tests(test_cases, names)
        );
        Ok(self.drop_nested_groups(&suite))
    }

    fn drop_nested_groups(&self, suite: &str) -> String {
        let mut seen_group = false;
        let mut out = String::with_capacity(suite.len());

        for line in suite.split('\n') {
            if self.declares_group(line) {
                if seen_group {
                    continue;
                }
                seen_group = true;
            }
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    fn declares_group(&self, line: &str) -> bool {
        let tokens = significant_tokens(line);
        tokens.iter().enumerate().any(|(i, t)| {
            t.is_identifier(line, &self.dialect().group_keyword)
                && (i == 0 || !tokens[i - 1].is_punct('.'))
                && tokens.get(i + 1).map_or(false, |n| n.is_punct('(') || n.is_punct('.'))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUITE: &str = r#"const { expect } = require("chai");

describe("Token", function () {
  let token;

  it("mints", async function () {
    await token.mint(a, 1);
  });

  describe("transfers", function () {
    it("moves", async function () {
      await token.transfer(b, 2);
    });
  });
});
"#;

    fn cases() -> Vec<TestCase> {
        vec![
            TestCase::from_lines(&["await token.mint(a, 5);", "expect(await token.balanceOf(a)).to.equal(5);"]),
            TestCase::from_lines(&["await token.transfer(b, 2);"]),
        ]
    }

    #[test]
    fn test_render_test() {
        let rendered = Assembler::default().render_test(&cases()[1], "test 9");
        assert_eq!(
            rendered,
            "  it(\"test 9\", async function () {\n    await token.transfer(b, 2);\n  });"
        );
    }

    #[test]
    fn test_assemble_keeps_preamble_and_closes_group() {
        let mut names = TestNameSequence::new();
        let suite = Assembler::default().assemble(&cases(), SUITE, &mut names).unwrap();

        assert!(suite.starts_with("const { expect } = require(\"chai\");\n\ndescribe(\"Token\", function () {\n  let token;\n"));
        assert!(suite.contains("  it(\"test 1\", async function () {\n    await token.mint(a, 5);\n"));
        assert!(suite.contains("  it(\"test 2\", async function () {\n"));
        assert!(suite.trim_end().ends_with("});"));
        assert!(!suite.contains("\"mints\""));
        assert_eq!(names.issued(), 2);
    }

    #[test]
    fn test_preamble_cut_at_declaration() {
        let source = "describe(\"T\", function () { it(\"a\", async function () {\n  await t.mint(a, 100);\n});\n});\n";
        let mut names = TestNameSequence::new();
        let suite = Assembler::default().assemble(&cases(), source, &mut names).unwrap();

        assert!(suite.starts_with("describe(\"T\", function () {\n  it(\"test 1\""));
        assert_eq!(StatementExtractor::default().extract(&suite).unwrap(), cases());
    }

    #[test]
    fn test_names_continue_across_suites() {
        let mut names = TestNameSequence::resume_after(4);
        let suite = Assembler::default().assemble(&cases(), SUITE, &mut names).unwrap();
        assert!(suite.contains("\"test 5\""));
        assert!(suite.contains("\"test 6\""));
        assert_eq!(names.next_name(), "test 7");
    }

    #[test]
    fn test_nested_group_dropped() {
        let source = "describe(\"A\", () => {\n  describe(\"B\", () => {\n    it(\"x\", () => {\n      f(1);\n    });\n  });\n});\n";
        let mut names = TestNameSequence::new();
        let suite = Assembler::default().assemble(&cases(), source, &mut names).unwrap();
        assert_eq!(suite.matches("describe(").count(), 1);
        assert!(suite.starts_with("describe(\"A\", () => {\n\n"));
    }

    #[test]
    fn test_member_call_is_not_a_group() {
        let assembler = Assembler::default();
        assert!(assembler.declares_group("describe(\"A\", () => {"));
        assert!(assembler.declares_group("describe.skip(\"A\", () => {"));
        assert!(!assembler.declares_group("mocha.describe(\"A\")"));
        assert!(!assembler.declares_group("const msg = \"describe(x)\";"));
    }

    #[test]
    fn test_reassembled_suite_extracts_back() {
        let mut names = TestNameSequence::new();
        let suite = Assembler::default().assemble(&cases(), SUITE, &mut names).unwrap();
        let extracted = StatementExtractor::default().extract(&suite).unwrap();
        assert_eq!(extracted, cases());
    }

    #[test]
    fn test_source_without_tests_returned_unchanged() {
        let source = "describe(\"empty\", () => {});\n";
        let mut names = TestNameSequence::new();
        let suite = Assembler::default().assemble(&cases(), source, &mut names).unwrap();
        assert_eq!(suite, source);
        assert_eq!(names.issued(), 0);
    }
}
