//! Scenario reports: timing statistics and pass/fail summaries.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use colored::Colorize;
use serde::Serialize;

use riskgp_engine::numbers::{u64_to_f64, usize_to_f64};

/// Wall-time statistics over a batch of runs, in milliseconds.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TimingStats {
    pub min_ms: f64,
    pub mean_ms: f64,
    pub median_ms: f64,
    pub max_ms: f64,
}

impl TimingStats {
    #[must_use]
    pub fn from_durations(durations: &[Duration]) -> Self {
        if durations.is_empty() {
            return Self::default();
        }
        let mut ms: Vec<f64> = durations
            .iter()
            .map(|d| u64_to_f64(u64::try_from(d.as_micros()).unwrap_or(u64::MAX)) / 1000.0)
            .collect();
        ms.sort_by(f64::total_cmp);
        let mean = ms.iter().sum::<f64>() / usize_to_f64(ms.len());
        let median = if ms.len() % 2 == 0 {
            (ms[ms.len() / 2 - 1] + ms[ms.len() / 2]) / 2.0
        } else {
            ms[ms.len() / 2]
        };
        Self {
            min_ms: ms[0],
            mean_ms: mean,
            median_ms: median,
            max_ms: ms[ms.len() - 1],
        }
    }
}

/// One scenario's outcome.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub scenario: String,
    pub runs: usize,
    pub failures: usize,
    pub timing: TimingStats,
    pub notes: Vec<String>,
    pub passed: bool,
}

impl ScenarioReport {
    #[must_use]
    pub fn new(scenario: &str, runs: usize, failures: usize, durations: &[Duration]) -> Self {
        Self {
            scenario: scenario.to_string(),
            runs,
            failures,
            timing: TimingStats::from_durations(durations),
            notes: Vec::new(),
            passed: failures == 0,
        }
    }

    pub fn note(&mut self, text: impl Into<String>) {
        self.notes.push(text.into());
    }
}

/// Top-level report document for `--report json`.
#[derive(Debug, Serialize)]
pub struct ReportDocument {
    pub generated_utc: String,
    pub scenarios: Vec<ScenarioReport>,
    pub passed: bool,
}

impl ReportDocument {
    #[must_use]
    pub fn new(scenarios: Vec<ScenarioReport>) -> Self {
        let passed = scenarios.iter().all(|s| s.passed);
        Self {
            generated_utc: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false),
            scenarios,
            passed,
        }
    }

    /// # Errors
    ///
    /// Fails when the report file cannot be written.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self).context("serializing report")?;
        std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
    }

    pub fn print_console(&self) {
        for scenario in &self.scenarios {
            let verdict = if scenario.passed {
                "PASS".green().bold()
            } else {
                "FAIL".red().bold()
            };
            println!(
                "{verdict} {} - {} runs, {} failures",
                scenario.scenario.bold(),
                scenario.runs,
                scenario.failures
            );
            if scenario.runs > 0 {
                let t = scenario.timing;
                println!(
                    "     timing: min {:.1}ms / mean {:.1}ms / median {:.1}ms / max {:.1}ms",
                    t.min_ms, t.mean_ms, t.median_ms, t.max_ms
                );
            }
            for note in &scenario.notes {
                println!("     {note}");
            }
        }
        let overall = if self.passed {
            "ALL SCENARIOS PASSED".green().bold()
        } else {
            "SCENARIO FAILURES".red().bold()
        };
        println!("{overall}");
    }
}
