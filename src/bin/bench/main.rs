// Ledger Arena Benchmark Runner — PoW vs DAG under a partitioning adversary
// Monte Carlo over seeds, seedable ChaCha8 PRNG, CSV + JSON + optional JSONL output
//
// Usage:
//   cargo run --release --bin bench                              # All scenarios, both protocols
//   cargo run --release --bin bench -- --runs 10                 # 10 seeds per scenario
//   cargo run --release --bin bench -- load                      # Filter by name/label/category
//   cargo run --release --bin bench -- --protocol tangle         # One protocol only
//   cargo run --release --bin bench -- --nodes 5 --corrupt 2     # Ad-hoc configuration
//   cargo run --release --bin bench -- --verbose --runs 1        # Narrate every run
//   cargo run --release --bin bench -- --jsonl                   # Per-run JSONL log

mod monte_carlo;
mod narrate;
mod report;
mod run_log;
mod scenarios;

use std::path::PathBuf;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use ledger_arena::{Protocol, SimParams};
use tracing_subscriber::EnvFilter;

use report::*;
use run_log::RunLog;
use scenarios::*;

// ─── CLI Parsing ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ProtocolChoice {
    Chain,
    Tangle,
    Both,
}

impl ProtocolChoice {
    fn protocols(self) -> Vec<Protocol> {
        match self {
            Self::Chain => vec![Protocol::Chain],
            Self::Tangle => vec![Protocol::Tangle],
            Self::Both => vec![Protocol::Chain, Protocol::Tangle],
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "bench", version, about = "Benchmark the chain and tangle consensus simulations")]
struct Cli {
    /// Only run built-in scenarios whose name, label or category contains this text
    filter: Option<String>,

    /// Runs per scenario and protocol
    #[arg(long, default_value_t = 5)]
    runs: usize,

    /// Base seed; run i uses seed + i
    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[arg(long, value_enum, default_value_t = ProtocolChoice::Both)]
    protocol: ProtocolChoice,

    /// Total nodes (ad-hoc configuration)
    #[arg(long)]
    nodes: Option<usize>,

    /// Corrupt nodes (ad-hoc configuration)
    #[arg(long)]
    corrupt: Option<usize>,

    /// Transaction rounds (ad-hoc configuration)
    #[arg(long)]
    rounds: Option<usize>,

    /// Leading zero hex digits required of every fingerprint (ad-hoc configuration)
    #[arg(long)]
    difficulty: Option<u32>,

    /// Per-pair transaction probability in [0, 1] (ad-hoc configuration)
    #[arg(long)]
    reach: Option<f64>,

    /// Print every run's chain or confidence table and raise logging to info
    #[arg(long)]
    verbose: bool,

    /// Also write one JSON line per run
    #[arg(long)]
    jsonl: bool,

    /// Output directory for CSV, JSON and JSONL files
    #[arg(long, default_value = "benchmark-results")]
    out: PathBuf,
}

impl Cli {
    fn is_ad_hoc(&self) -> bool {
        self.nodes.is_some()
            || self.corrupt.is_some()
            || self.rounds.is_some()
            || self.difficulty.is_some()
            || self.reach.is_some()
    }

    fn ad_hoc_params(&self) -> SimParams {
        let defaults = SimParams::default();
        SimParams::new(
            self.nodes.unwrap_or(defaults.nodes),
            self.corrupt.unwrap_or(defaults.corrupt),
            self.rounds.unwrap_or(defaults.rounds),
            self.difficulty.unwrap_or(defaults.difficulty),
            self.reach.unwrap_or(defaults.reach),
        )
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let all_scenarios = if cli.is_ad_hoc() {
        let params = cli.ad_hoc_params();
        params.validate().context("invalid ad-hoc configuration")?;
        vec![custom(&params)]
    } else {
        scenarios()
    };

    let to_run: Vec<&Scenario> = match (&cli.filter, cli.is_ad_hoc()) {
        (Some(f), false) => all_scenarios.iter().filter(|s| s.matches(f)).collect(),
        _ => all_scenarios.iter().collect(),
    };

    if to_run.is_empty() {
        bail!("no scenarios match filter: {:?}", cli.filter);
    }
    if cli.runs == 0 {
        bail!("--runs must be at least 1");
    }

    let protocols = cli.protocol.protocols();
    let mut log = cli.jsonl.then(RunLog::new);

    println!("\n  Ledger Arena Benchmark Runner v{}", env!("CARGO_PKG_VERSION"));
    println!("  PRNG: ChaCha8Rng | Runs/scenario: {} | Base seed: {}", cli.runs, cli.seed);
    println!("  Running {} scenario(s) x {} protocol(s)...\n", to_run.len(), protocols.len());
    println!(
        "  {:<28} {:>4} {:>8} {:>8} {:>12} {:>8} {:>7} {:>8}",
        "Scenario", "Sys", "Sent", "Conf", "Conf%", "AvgConf", "Honest", "Time"
    );
    println!("  {}", "-".repeat(92));

    let suite_start = Instant::now();
    let mut mc_reports = Vec::new();

    for scenario in &to_run {
        for &protocol in &protocols {
            let report = monte_carlo::run_monte_carlo(
                scenario,
                protocol,
                cli.runs,
                cli.seed,
                cli.verbose,
                log.as_mut(),
            )
            .with_context(|| format!("{} ({}) failed", scenario.name, protocol.system()))?;

            let avg_conf = if report.avg_confidence.n == 0 {
                "-".to_string()
            } else {
                format!("{:.2}", report.avg_confidence.mean)
            };
            println!(
                "  {:<28} {:>4} {:>8.1} {:>8.1} {:>6.1}±{:<5.1} {:>8} {:>6.0}% {:>6.0}ms",
                report.label,
                protocol.system(),
                report.sent.mean,
                report.confirmed.mean,
                report.confirmed_pct.mean,
                report.confirmed_pct.half_width(),
                avg_conf,
                report.honest_win_rate * 100.0,
                report.elapsed_ms.mean,
            );

            mc_reports.push(report);
        }
    }

    let suite_elapsed = suite_start.elapsed();

    // ─── Summary ────────────────────────────────────────────────────────

    let win_rate = |protocol: Protocol| {
        let rates: Vec<f64> = mc_reports
            .iter()
            .filter(|r| r.protocol == protocol)
            .map(|r| r.honest_win_rate)
            .collect();
        (!rates.is_empty()).then(|| rates.iter().sum::<f64>() / rates.len() as f64)
    };
    let all_runs: Vec<&BenchResult> = mc_reports.iter().flat_map(|r| &r.individual_runs).collect();
    let mean_loss_ratio = Stats::from_samples(&all_runs.iter().map(|r| r.loss_ratio()).collect::<Vec<_>>()).mean;

    let summary = Summary {
        reports: mc_reports.len(),
        runs: all_runs.len(),
        chain_honest_win_rate: win_rate(Protocol::Chain),
        tangle_honest_win_rate: win_rate(Protocol::Tangle),
        mean_loss_ratio,
    };

    println!("  {}", "-".repeat(92));
    println!(
        "  Reports: {}  Runs: {}  Suite time: {:.1}s",
        summary.reports,
        summary.runs,
        suite_elapsed.as_secs_f64()
    );
    if let Some(rate) = summary.chain_honest_win_rate {
        println!("    PoW honest wins:     {:.1}%", rate * 100.0);
    }
    if let Some(rate) = summary.tangle_honest_win_rate {
        println!("    DAG honest wins:     {:.1}%", rate * 100.0);
    }
    println!("    Broadcast loss:      {:.1}%\n", summary.mean_loss_ratio * 100.0);

    // ─── Write Reports ──────────────────────────────────────────────────

    let csv_path = cli.out.join("benchmark_results.csv");
    write_csv(&csv_path, all_runs.iter().copied())
        .with_context(|| format!("failed to write {}", csv_path.display()))?;

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
        .to_string();

    if let Some(log) = &log {
        let path = cli.out.join(format!("runs-{timestamp}.jsonl"));
        log.write_jsonl(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("  {} run(s) logged to: {}", log.len(), path.display());
    }

    let report = BenchReport {
        timestamp: timestamp.clone(),
        version: env!("CARGO_PKG_VERSION"),
        prng: "ChaCha8Rng",
        n_runs_per_scenario: cli.runs,
        base_seed: cli.seed,
        summary,
        scenarios: mc_reports,
    };

    let json_path = cli.out.join(format!("bench-{timestamp}.json"));
    let json = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
    std::fs::write(&json_path, json)
        .with_context(|| format!("failed to write {}", json_path.display()))?;

    println!("  Results saved to: {}", csv_path.display());
    println!("  Report saved to:  {}\n", json_path.display());
    Ok(())
}
