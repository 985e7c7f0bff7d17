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

//! Runner report scanning and skip marking for generated tests

use crate::config::SuiteDialect;
use crate::AmplifyError;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static FAILING_TEST: Lazy<Regex> = Lazy::new(|| Regex::new(r" test (\d+)\s*$").unwrap());

const PASS_MARK: char = '✔';

/// Failing generated test numbers, one list per suite in report order.
///
/// Scanning starts after the `network:` header when the report has one and
/// stops at the `N passing (…)` summary. Blank lines separate suites; a suite
/// with no failures still yields an empty list.
pub fn parse_failing_tests(report: &str) -> Vec<Vec<u64>> {
    let lines: Vec<&str> = report.lines().collect();
    let start = lines
        .iter()
        .position(|l| l.contains("network:"))
        .map_or(0, |i| i + 1);

    let mut suites = Vec::new();
    let mut current: Vec<u64> = Vec::new();
    let mut in_suite = false;

    for raw in &lines[start..] {
        let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.contains("passing(") {
            break;
        }

        let line = raw.trim();
        if line.is_empty() {
            if in_suite {
                suites.push(std::mem::take(&mut current));
                in_suite = false;
            }
            continue;
        }

        in_suite = true;
        if line.starts_with(PASS_MARK) {
            continue;
        }
        if let Some(number) = FAILING_TEST
            .captures(line)
            .and_then(|c| c[1].parse::<u64>().ok())
        {
            current.push(number);
        }
    }

    if in_suite {
        suites.push(current);
    }

    tracing::debug!(
        suites = suites.len(),
        failing = suites.iter().map(Vec::len).sum::<usize>(),
        "Parsed runner report"
    );
    suites
}

/// Turn every `it("test N"` declaration whose N is in `failing` into the
/// dialect's skip form.
pub fn mark_skipped(suite: &str, failing: &[u64], dialect: &SuiteDialect) -> Result<String, AmplifyError> {
    let pattern = format!(r#"\b{}\((["'])test (\d+)(["'])"#, regex::escape(&dialect.test_keyword));
    let declaration = Regex::new(&pattern).map_err(|e| AmplifyError::InternalError(e.to_string()))?;

    let marked = declaration.replace_all(suite, |caps: &Captures| {
        let skip = caps[2].parse::<u64>().map_or(false, |n| failing.contains(&n));
        if skip && caps[1] == caps[3] {
            format!("{}.{}(\"test {}\"", dialect.test_keyword, dialect.skip_suffix, &caps[2])
        } else {
            caps[0].to_string()
        }
    });
    Ok(marked.into_owned())
}
