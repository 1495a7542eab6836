// Monte Carlo Infrastructure — N runs per scenario with statistical aggregation
// Run i of a scenario uses seed base+i, so every row of the CSV is reproducible

use ledger_arena::{simulate, Population, Protocol, SimError};
use tracing::info;

use crate::narrate;
use crate::report::*;
use crate::run_log::RunLog;
use crate::scenarios::Scenario;

/// Run a single scenario iteration with a specific seed.
pub fn run_single(
    scenario: &Scenario,
    protocol: Protocol,
    seed: u64,
    verbose: bool,
) -> Result<BenchResult, SimError> {
    let params = scenario.params(seed, verbose);
    let outcome = simulate(protocol, &params)?;
    if verbose {
        narrate::print_outcome(&outcome);
    }
    Ok(BenchResult::from_outcome(scenario, &outcome))
}

/// Run N iterations of a scenario for one protocol and aggregate.
pub fn run_monte_carlo(
    scenario: &Scenario,
    protocol: Protocol,
    n_runs: usize,
    base_seed: u64,
    verbose: bool,
    mut log: Option<&mut RunLog>,
) -> Result<MonteCarloReport, SimError> {
    let mut results = Vec::with_capacity(n_runs);
    for i in 0..n_runs {
        let seed = base_seed.wrapping_add(i as u64);
        if verbose {
            println!(
                "Running {}: N={} C={} R={} D={} p={:.2} seed={}",
                protocol.system(),
                scenario.nodes,
                scenario.corrupt,
                scenario.rounds,
                scenario.difficulty,
                scenario.reach,
                seed,
            );
        }
        let result = run_single(scenario, protocol, seed, verbose)?;
        if let Some(log) = log.as_deref_mut() {
            log.record(&result);
        }
        results.push(result);
    }
    let report = aggregate(scenario, protocol, results);
    info!(
        scenario = scenario.name,
        %protocol,
        runs = report.n_runs,
        honest_win_rate = report.honest_win_rate,
        "scenario finished"
    );
    Ok(report)
}

fn samples(results: &[BenchResult], metric: impl Fn(&BenchResult) -> Option<f64>) -> Stats {
    Stats::from_samples(&results.iter().filter_map(metric).collect::<Vec<_>>())
}

/// Aggregate individual runs into a MonteCarloReport.
fn aggregate(scenario: &Scenario, protocol: Protocol, results: Vec<BenchResult>) -> MonteCarloReport {
    let n = results.len();
    let honest_wins = results.iter().filter(|r| r.winner == Population::Honest).count();
    let honest_win_rate = if n == 0 { 0.0 } else { honest_wins as f64 / n as f64 };

    MonteCarloReport {
        scenario_name: scenario.name.to_string(),
        label: scenario.label.to_string(),
        category: scenario.category.to_string(),
        protocol,
        n_runs: n,
        honest_win_rate,
        sent: samples(&results, |r| Some(r.sent as f64)),
        confirmed: samples(&results, |r| Some(r.confirmed as f64)),
        confirmed_pct: samples(&results, |r| Some(r.confirmed_pct)),
        avg_confidence: samples(&results, |r| r.avg_confidence),
        elapsed_ms: samples(&results, |r| Some(r.elapsed_ms)),
        loss_ratio: samples(&results, |r| Some(r.loss_ratio())),
        individual_runs: results,
    }
}
