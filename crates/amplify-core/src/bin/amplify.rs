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

//! Amplify one test suite file through N generations.

use amplify_core::amplification::reporting::{mark_skipped, parse_failing_tests};
use amplify_core::{Amplifier, AmplifyConfig, TestNameSequence};
use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Genetic amplification of a Mocha/Chai test suite
#[derive(Parser)]
#[command(name = "amplify", version, about = "Amplify a unit-test suite by correlated literal mutation")]
struct Args {
    /// Suite source file
    input: PathBuf,

    /// Write the amplified suite here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of generations; each output feeds the next
    #[arg(short, long, default_value_t = 1)]
    generations: usize,

    /// Seed for reproducible runs (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Runner report whose failing generated tests are skipped before amplifying
    #[arg(long)]
    skip_report: Option<PathBuf>,

    /// Which suite of the runner report belongs to the input file
    #[arg(long, default_value_t = 0, requires = "skip_report")]
    report_suite: usize,

    /// Run random search with this many rounds instead of genetic generations
    #[arg(long)]
    random_search: Option<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AmplifyConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => AmplifyConfig::default(),
    };
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    let mut suite = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;

    if let Some(report_path) = &args.skip_report {
        let report = fs::read_to_string(report_path)
            .with_context(|| format!("failed to read {}", report_path.display()))?;
        let failing = parse_failing_tests(&report)
            .into_iter()
            .nth(args.report_suite)
            .unwrap_or_default();
        tracing::info!(count = failing.len(), "Skipping failing generated tests");
        suite = mark_skipped(&suite, &failing, &config.dialect)?;
    }

    let mut amplifier = Amplifier::new(config)?;
    let mut names = TestNameSequence::new();

    if let Some(iterations) = args.random_search {
        suite = amplifier.random_search_generation(&suite, iterations, &mut names)?.suite;
    } else {
        for generation in 1..=args.generations {
            let outcome = amplifier
                .run_generation(&suite, &mut names)
                .with_context(|| format!("generation {} failed", generation))?;
            for failure in &outcome.failures {
                tracing::warn!(generation, test_index = failure.test_index, reason = %failure.reason, "Test case not amplified");
            }
            tracing::info!(generation, tests = outcome.total(), "Generation finished");
            suite = outcome.suite;
        }
    }

    match &args.output {
        Some(path) => fs::write(path, &suite).with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{}", suite),
    }
    Ok(())
}
