// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Ledger Arena Consensus Simulation Suite - Simulation Parameters

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Above this difficulty each artifact needs on the order of 16^D hash
/// attempts; runs still work but may take hours. Callers own that cost.
pub const PRACTICAL_DIFFICULTY_LIMIT: u32 = 6;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Rejected parameter combinations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("at least 2 nodes are required, got {nodes}")]
    TooFewNodes { nodes: usize },
    #[error("corrupt count {corrupt} exceeds node count {nodes}")]
    TooManyCorrupt { corrupt: usize, nodes: usize },
    #[error("reach probability must lie in [0, 1], got {reach}")]
    ReachOutOfRange { reach: f64 },
    #[error("receive buffer capacity must be at least 1")]
    ZeroReceiverCapacity,
}

// ---------------------------------------------------------------------------
// SimParams
// ---------------------------------------------------------------------------

/// Inputs of one simulation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimParams {
    /// Total number of nodes (N).
    pub nodes: usize,
    /// Number of corrupt nodes (C); nodes `0..C` are corrupt.
    pub corrupt: usize,
    /// Transaction rounds (R).
    pub rounds: usize,
    /// Leading zero hex characters required of every fingerprint (D).
    pub difficulty: u32,
    /// Probability that an eligible sender/receiver pair transacts in a round (p).
    pub reach: f64,
    /// Base seed for the traffic generator and every node's generator.
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub verbose: bool,
    /// Mailbox buffer per node. 0 makes every submission a hand-off.
    #[serde(default)]
    pub mailbox_capacity: usize,
    /// Receive buffer per node; `None` sizes it to the node count.
    #[serde(default)]
    pub receiver_capacity: Option<usize>,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            nodes: 4,
            corrupt: 1,
            rounds: 1,
            difficulty: 1,
            reach: 1.0,
            seed: 0,
            verbose: false,
            mailbox_capacity: 0,
            receiver_capacity: None,
        }
    }
}

impl SimParams {
    pub fn new(nodes: usize, corrupt: usize, rounds: usize, difficulty: u32, reach: f64) -> Self {
        Self {
            nodes,
            corrupt,
            rounds,
            difficulty,
            reach,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox_capacity = capacity;
        self
    }

    pub fn with_receiver_capacity(mut self, capacity: usize) -> Self {
        self.receiver_capacity = Some(capacity);
        self
    }

    pub fn honest(&self) -> usize {
        self.nodes.saturating_sub(self.corrupt)
    }

    pub fn receiver_capacity(&self) -> usize {
        self.receiver_capacity.unwrap_or(self.nodes)
    }

    /// Upper bound on generated transactions: every ordered pair, every round.
    pub fn max_transactions(&self) -> usize {
        self.nodes * self.nodes.saturating_sub(1) * self.rounds
    }

    /// Corrupt share of the network in percent, rounded to two decimals.
    pub fn corrupt_percentage(&self) -> f64 {
        crate::aggregate::percentage(self.corrupt, self.nodes)
    }

    /// Fail fast on inputs the simulation cannot run with.
    ///
    /// # Errors
    ///
    /// Fewer than two nodes (DAG parent selection needs two distinct
    /// artifacts), more corrupt nodes than nodes, a reach probability
    /// outside `[0, 1]`, or an explicit zero receive buffer.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nodes < 2 {
            return Err(ConfigError::TooFewNodes { nodes: self.nodes });
        }
        if self.corrupt > self.nodes {
            return Err(ConfigError::TooManyCorrupt {
                corrupt: self.corrupt,
                nodes: self.nodes,
            });
        }
        if !(0.0..=1.0).contains(&self.reach) {
            return Err(ConfigError::ReachOutOfRange { reach: self.reach });
        }
        if self.receiver_capacity == Some(0) {
            return Err(ConfigError::ZeroReceiverCapacity);
        }
        Ok(())
    }

    pub fn exceeds_practical_difficulty(&self) -> bool {
        self.difficulty > PRACTICAL_DIFFICULTY_LIMIT
    }
}
