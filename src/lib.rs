// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Ledger Arena Consensus Simulation Suite

//! Concurrent simulation of two ledger consensus mechanisms under a
//! partitioning adversary: a longest-chain proof-of-work protocol and a
//! DAG ("tangle") protocol scored by tip confidence.
//!
//! Nodes `0..C` are corrupt. Corrupt nodes only hear each other; honest
//! nodes hear everyone. Broadcast is lossy: a full receive buffer drops the
//! artifact for that destination.

pub mod types;
pub mod params;
pub mod miner;
pub mod network;
pub mod traffic;
pub mod node;
pub mod chain;
pub mod tangle;
pub mod aggregate;
pub mod simulation;

pub use params::{ConfigError, SimParams};
pub use simulation::{
    simulate, simulate_chain, simulate_tangle, ChainOutcome, Outcome, Protocol, RunSummary,
    SimError, TangleOutcome,
};
pub use types::*;
