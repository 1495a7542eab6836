// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Ledger Arena Consensus Simulation Suite - Simulation Core
//
// A run wires N node actors to their mailboxes and to the broadcast mesh,
// feeds every round of transactions, closes the mailboxes, waits on the
// producer barrier, and only then releases the mesh so receive buffers
// close. Terminal views flow to a collector thread over a channel.

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{bounded, unbounded};
use crossbeam::sync::WaitGroup;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::aggregate::{collect, percentage, Tally, TangleTally, ChainTally, TrackedTransaction};
use crate::chain::ChainLedger;
use crate::network::Mesh;
use crate::node::{Ledger, NodeActor, NodeChannels, NodeStats};
use crate::params::{ConfigError, SimParams};
use crate::tangle::TangleLedger;
use crate::traffic::{stream_rng, TrafficGenerator};
use crate::types::{Block, Population};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("worker for node {node} panicked")]
    WorkerPanicked { node: usize },
    #[error("result collector panicked")]
    CollectorPanicked,
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Chain,
    Tangle,
}

impl Protocol {
    /// Short system label used in reports.
    pub fn system(&self) -> &'static str {
        match self {
            Self::Chain => "PoW",
            Self::Tangle => "DAG",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.system())
    }
}

/// Metrics common to both variants.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub protocol: Protocol,
    pub nodes: usize,
    pub corrupt: usize,
    pub corrupt_percentage: f64,
    pub rounds: usize,
    pub difficulty: u32,
    pub reach: f64,
    pub seed: u64,
    pub sent: usize,
    pub confirmed: usize,
    pub confirmed_percentage: f64,
    pub winner: Population,
    pub duration: Duration,
    pub network: NodeStats,
}

impl RunSummary {
    fn new<T: Tally>(
        protocol: Protocol,
        params: &SimParams,
        harvest: &Harvest<T>,
        confirmed: usize,
        winner: Population,
    ) -> Self {
        Self {
            protocol,
            nodes: params.nodes,
            corrupt: params.corrupt,
            corrupt_percentage: params.corrupt_percentage(),
            rounds: params.rounds,
            difficulty: params.difficulty,
            reach: params.reach,
            seed: params.seed,
            sent: harvest.sent,
            confirmed,
            confirmed_percentage: percentage(confirmed, harvest.sent),
            winner,
            duration: harvest.duration,
            network: *harvest.tally.stats(),
        }
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration.as_secs_f64() * 1000.0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChainOutcome {
    pub summary: RunSummary,
    /// Node whose best chain won; `None` only if no node reported.
    pub winning_node: Option<usize>,
    /// Genesis first.
    pub winning_chain: Vec<Block>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TangleOutcome {
    pub summary: RunSummary,
    pub avg_confidence_honest: f64,
    pub avg_confidence_corrupt: f64,
    pub avg_confidence: f64,
    /// Transactions whose accumulated score reaches the mean score.
    pub above_average: usize,
    /// Descending accumulated score.
    pub ranking: Vec<TrackedTransaction>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "protocol", rename_all = "lowercase")]
pub enum Outcome {
    Chain(ChainOutcome),
    Tangle(TangleOutcome),
}

impl Outcome {
    pub fn summary(&self) -> &RunSummary {
        match self {
            Self::Chain(o) => &o.summary,
            Self::Tangle(o) => &o.summary,
        }
    }

    pub fn avg_confidence(&self) -> Option<f64> {
        match self {
            Self::Chain(_) => None,
            Self::Tangle(o) => Some(o.avg_confidence),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Run the longest-chain variant.
///
/// # Errors
///
/// `SimError::InvalidConfiguration` for rejected parameters; the other
/// variants when a worker thread cannot be spawned or dies.
pub fn simulate_chain(params: &SimParams) -> Result<ChainOutcome, SimError> {
    let harvest = run::<ChainLedger, ChainTally>(Protocol::Chain, params)?;
    let confirmed = harvest.tally.confirmed();
    let winner = harvest
        .tally
        .winner()
        .map(|w| w.population)
        .unwrap_or(Population::Honest);
    let summary = RunSummary::new(Protocol::Chain, params, &harvest, confirmed, winner);
    let (winning_node, winning_chain) = harvest
        .tally
        .into_winner()
        .map(|w| (Some(w.node), w.chain))
        .unwrap_or_default();
    log_summary(params, &summary);
    Ok(ChainOutcome {
        summary,
        winning_node,
        winning_chain,
    })
}

/// Run the tangle variant.
///
/// # Errors
///
/// Same as [`simulate_chain`].
pub fn simulate_tangle(params: &SimParams) -> Result<TangleOutcome, SimError> {
    let harvest = run::<TangleLedger, TangleTally>(Protocol::Tangle, params)?;
    let tally = &harvest.tally;
    let summary = RunSummary::new(
        Protocol::Tangle,
        params,
        &harvest,
        tally.confirmed(),
        tally.winner(),
    );
    log_summary(params, &summary);
    Ok(TangleOutcome {
        avg_confidence_honest: tally.average_confidence(Population::Honest),
        avg_confidence_corrupt: tally.average_confidence(Population::Corrupt),
        avg_confidence: tally.overall_average(),
        above_average: tally.above_average(),
        ranking: tally.ranking(),
        summary,
    })
}

pub fn simulate(protocol: Protocol, params: &SimParams) -> Result<Outcome, SimError> {
    match protocol {
        Protocol::Chain => simulate_chain(params).map(Outcome::Chain),
        Protocol::Tangle => simulate_tangle(params).map(Outcome::Tangle),
    }
}

fn log_summary(params: &SimParams, summary: &RunSummary) {
    if params.verbose {
        info!(
            protocol = %summary.protocol,
            sent = summary.sent,
            confirmed = summary.confirmed,
            confirmed_pct = summary.confirmed_percentage,
            winner = %summary.winner,
            elapsed_ms = summary.duration_ms(),
            "simulation finished"
        );
    } else {
        debug!(
            protocol = %summary.protocol,
            sent = summary.sent,
            confirmed = summary.confirmed,
            "simulation finished"
        );
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct Harvest<T> {
    tally: T,
    sent: usize,
    duration: Duration,
}

fn run<L, T>(protocol: Protocol, params: &SimParams) -> Result<Harvest<T>, SimError>
where
    L: Ledger,
    T: Tally<Summary = L::Summary>,
{
    params.validate()?;
    if params.exceeds_practical_difficulty() {
        warn!(
            difficulty = params.difficulty,
            "mining cost grows as 16^difficulty per artifact; expect a very long run"
        );
    }
    info!(
        %protocol,
        nodes = params.nodes,
        corrupt = params.corrupt,
        rounds = params.rounds,
        difficulty = params.difficulty,
        reach = params.reach,
        seed = params.seed,
        "starting simulation"
    );

    let start = Instant::now();
    let populations: Vec<Population> = (0..params.nodes)
        .map(|i| Population::of_node(i, params.corrupt))
        .collect();
    let (mesh, inbound) = Mesh::<L::Artifact>::new(populations.clone(), params.receiver_capacity());
    let genesis = L::mint_genesis(params.difficulty);
    let producing = WaitGroup::new();

    let (report_tx, report_rx) = unbounded();
    let collector = thread::Builder::new()
        .name("collector".to_string())
        .spawn(move || collect::<T>(report_rx))?;

    let mut mailboxes = Vec::with_capacity(params.nodes);
    let mut workers = Vec::with_capacity(params.nodes);
    for (id, inbound) in inbound.into_iter().enumerate() {
        let (mailbox_tx, mailbox_rx) = bounded(params.mailbox_capacity);
        mailboxes.push(mailbox_tx);
        let channels = NodeChannels {
            mailbox: mailbox_rx,
            inbound,
            mesh: Arc::clone(&mesh),
            producing: producing.clone(),
        };
        let actor = NodeActor::new(
            id,
            params.difficulty,
            L::from_genesis(genesis.clone()),
            channels,
            stream_rng(params.seed, id as u64 + 1),
        );
        let reports = report_tx.clone();
        let handle = thread::Builder::new()
            .name(format!("node-{id}"))
            .spawn(move || {
                // The collector outlives every worker.
                let _ = reports.send(actor.run());
            })?;
        workers.push(handle);
    }
    drop(report_tx);

    let mut traffic = TrafficGenerator::from_params(params);
    for round in 0..params.rounds {
        let batch = traffic.generate_round();
        debug!(round, honest = batch.honest.len(), corrupt = batch.corrupt.len(), "feeding round");
        for (id, mailbox) in mailboxes.iter().enumerate() {
            for tx in batch.for_population(populations[id]) {
                // A closed mailbox means the worker died; join reports it.
                if mailbox.send(tx.clone()).is_err() {
                    break;
                }
            }
        }
    }
    drop(mailboxes);

    producing.wait();
    drop(mesh);

    for (node, handle) in workers.into_iter().enumerate() {
        handle
            .join()
            .map_err(|_| SimError::WorkerPanicked { node })?;
    }
    let tally = collector.join().map_err(|_| SimError::CollectorPanicked)?;

    Ok(Harvest {
        tally,
        sent: traffic.sent_count,
        duration: start.elapsed(),
    })
}
