// Benchmark Report Types — per-run rows, Monte Carlo aggregates, CSV export
// Structured output for comparing the chain and tangle variants

use ledger_arena::{Outcome, Population, Protocol};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::scenarios::Scenario;

// ─── Statistics (per-metric Monte Carlo aggregation) ────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub mean: f64,
    pub std_dev: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub min: f64,
    pub max: f64,
    pub n: usize,
}

impl Stats {
    pub fn from_samples(samples: &[f64]) -> Self {
        let n = samples.len();
        if n == 0 {
            return Self { mean: 0.0, std_dev: 0.0, ci_lower: 0.0, ci_upper: 0.0, min: 0.0, max: 0.0, n: 0 };
        }
        let mean = samples.iter().sum::<f64>() / n as f64;
        let variance = if n > 1 {
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };
        let std_dev = variance.sqrt();
        let half_width = 1.96 * std_dev / (n as f64).sqrt();
        Self {
            mean,
            std_dev,
            ci_lower: mean - half_width,
            ci_upper: mean + half_width,
            min: samples.iter().cloned().fold(f64::INFINITY, f64::min),
            max: samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            n,
        }
    }

    pub fn half_width(&self) -> f64 {
        (self.ci_upper - self.ci_lower) / 2.0
    }
}

// ─── Single-Run Result ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct BenchResult {
    pub scenario: String,
    pub system: &'static str,
    pub seed: u64,
    pub nodes: usize,
    pub corrupt: usize,
    pub rounds: usize,
    pub difficulty: u32,
    pub reach: f64,
    pub elapsed_ms: f64,
    pub sent: usize,
    pub confirmed: usize,
    pub confirmed_pct: f64,
    /// Tangle only.
    pub avg_confidence: Option<f64>,
    /// Tangle only.
    pub above_average: Option<usize>,
    pub winner: Population,
    pub mined: usize,
    pub grafted: usize,
    pub rejected: usize,
    pub delivered: usize,
    pub dropped: usize,
}

impl BenchResult {
    pub fn from_outcome(scenario: &Scenario, outcome: &Outcome) -> Self {
        let summary = outcome.summary();
        let above_average = match outcome {
            Outcome::Chain(_) => None,
            Outcome::Tangle(o) => Some(o.above_average),
        };
        Self {
            scenario: scenario.name.to_string(),
            system: summary.protocol.system(),
            seed: summary.seed,
            nodes: summary.nodes,
            corrupt: summary.corrupt,
            rounds: summary.rounds,
            difficulty: summary.difficulty,
            reach: summary.reach,
            elapsed_ms: summary.duration_ms(),
            sent: summary.sent,
            confirmed: summary.confirmed,
            confirmed_pct: summary.confirmed_percentage,
            avg_confidence: outcome.avg_confidence(),
            above_average,
            winner: summary.winner,
            mined: summary.network.mined,
            grafted: summary.network.grafted,
            rejected: summary.network.rejected,
            delivered: summary.network.delivered,
            dropped: summary.network.dropped,
        }
    }

    /// Share of broadcast copies lost to full receive buffers.
    pub fn loss_ratio(&self) -> f64 {
        let attempts = self.delivered + self.dropped;
        if attempts == 0 {
            0.0
        } else {
            self.dropped as f64 / attempts as f64
        }
    }

    /// One `benchmark_results.csv` row. The chain variant leaves
    /// `AvgConfidence` blank and the tangle variant leaves `Winner` blank.
    pub fn csv_row(&self) -> String {
        let avg_confidence = self
            .avg_confidence
            .map(|c| format!("{c:.2}"))
            .unwrap_or_default();
        let winner = if self.avg_confidence.is_none() {
            self.winner.label()
        } else {
            ""
        };
        format!(
            "{},{},{},{},{},{:.2},{:.2},{},{},{},{}",
            self.system,
            self.nodes,
            self.corrupt,
            self.rounds,
            self.difficulty,
            self.reach,
            self.elapsed_ms,
            self.sent,
            self.confirmed,
            avg_confidence,
            winner,
        )
    }
}

pub const CSV_HEADER: &str = "System,N,C,R,D,p,Time(ms),TxSent,TxConfirmed,AvgConfidence,Winner";

/// Write every run as one CSV row under [`CSV_HEADER`].
pub fn write_csv<'a>(
    path: &Path,
    results: impl IntoIterator<Item = &'a BenchResult>,
) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
    writeln!(file, "{CSV_HEADER}")?;
    for result in results {
        writeln!(file, "{}", result.csv_row())?;
    }
    file.flush()
}

// ─── Monte Carlo Report (per-scenario, per-protocol aggregation) ────────────

#[derive(Debug, Clone, Serialize)]
pub struct MonteCarloReport {
    pub scenario_name: String,
    pub label: String,
    pub category: String,
    pub protocol: Protocol,
    pub n_runs: usize,
    pub honest_win_rate: f64,
    pub sent: Stats,
    pub confirmed: Stats,
    pub confirmed_pct: Stats,
    /// Empty for the chain variant.
    pub avg_confidence: Stats,
    pub elapsed_ms: Stats,
    pub loss_ratio: Stats,
    pub individual_runs: Vec<BenchResult>,
}

// ─── Top-Level Report ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct BenchReport {
    pub timestamp: String,
    pub version: &'static str,
    pub prng: &'static str,
    pub n_runs_per_scenario: usize,
    pub base_seed: u64,
    pub summary: Summary,
    pub scenarios: Vec<MonteCarloReport>,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub reports: usize,
    pub runs: usize,
    pub chain_honest_win_rate: Option<f64>,
    pub tangle_honest_win_rate: Option<f64>,
    pub mean_loss_ratio: f64,
}
