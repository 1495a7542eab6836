// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Ledger Arena Consensus Simulation Suite - Node Actor
//
// One actor per participant, each on its own thread. Every iteration of the
// scheduler loop takes the first ready action in priority order:
//
//   1. integrate an inbound artifact from the receive buffer
//   2. queue a new transaction from the mailbox
//   3. mine one unit of queued work and broadcast it
//
// With nothing ready the actor parks on both channels for `IDLE_BACKOFF`.
// After the mailbox closes the actor mines what is still queued, leaves the
// producer barrier, and integrates inbound artifacts until its receive
// buffer is closed and drained.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{Receiver, Select, TryRecvError};
use crossbeam::sync::WaitGroup;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, trace};

use crate::miner::Artifact;
use crate::network::Mesh;
use crate::types::{Population, Transaction};

/// Park time when no input is ready and no work is queued.
pub const IDLE_BACKOFF: Duration = Duration::from_millis(1);

// ---------------------------------------------------------------------------
// Ledger seam
// ---------------------------------------------------------------------------

/// What happened to an inbound artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Integration {
    /// Linked to a known predecessor.
    Accepted,
    /// Predecessor unknown; attached to genesis instead.
    Grafted,
    /// Predecessor unknown; discarded.
    Rejected,
    /// Already present.
    Duplicate,
}

/// A consensus variant as driven by the node actor.
pub trait Ledger: Sized + Send + 'static {
    type Artifact: Artifact;
    /// Genesis state shared by every node of a run.
    type Genesis: Clone + Send + 'static;
    /// Terminal view handed to the aggregator.
    type Summary: Send + 'static;

    fn mint_genesis(difficulty: u32) -> Self::Genesis;

    fn from_genesis(genesis: Self::Genesis) -> Self;

    fn integrate(&mut self, artifact: Self::Artifact) -> Integration;

    /// Mine one unit of work from `queue`, record it locally, and return it
    /// for broadcast. `None` when the queue holds nothing to mine.
    fn mine(
        &mut self,
        queue: &mut VecDeque<Transaction>,
        difficulty: u32,
        rng: &mut ChaCha8Rng,
    ) -> Option<Self::Artifact>;

    fn finalize(self) -> Self::Summary;
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NodeStats {
    pub queued: usize,
    pub mined: usize,
    pub integrated: usize,
    pub grafted: usize,
    pub rejected: usize,
    pub duplicates: usize,
    pub delivered: usize,
    pub dropped: usize,
}

impl NodeStats {
    pub fn absorb(&mut self, other: &NodeStats) {
        self.queued += other.queued;
        self.mined += other.mined;
        self.integrated += other.integrated;
        self.grafted += other.grafted;
        self.rejected += other.rejected;
        self.duplicates += other.duplicates;
        self.delivered += other.delivered;
        self.dropped += other.dropped;
    }
}

/// Terminal state of one node.
#[derive(Debug)]
pub struct NodeReport<S> {
    pub node: usize,
    pub population: Population,
    pub stats: NodeStats,
    pub summary: S,
}

// ---------------------------------------------------------------------------
// NodeActor
// ---------------------------------------------------------------------------

/// Channel ends and shared handles a node is wired with.
pub struct NodeChannels<A> {
    pub mailbox: Receiver<Transaction>,
    pub inbound: Receiver<A>,
    pub mesh: Arc<Mesh<A>>,
    /// Held while the node may still broadcast.
    pub producing: WaitGroup,
}

pub struct NodeActor<L: Ledger> {
    id: usize,
    population: Population,
    difficulty: u32,
    ledger: L,
    mailbox: Receiver<Transaction>,
    inbound: Receiver<L::Artifact>,
    mesh: Option<Arc<Mesh<L::Artifact>>>,
    producing: Option<WaitGroup>,
    rng: ChaCha8Rng,
    queue: VecDeque<Transaction>,
    stats: NodeStats,
}

impl<L: Ledger> NodeActor<L> {
    pub fn new(
        id: usize,
        difficulty: u32,
        ledger: L,
        channels: NodeChannels<L::Artifact>,
        rng: ChaCha8Rng,
    ) -> Self {
        let population = channels.mesh.population(id);
        Self {
            id,
            population,
            difficulty,
            ledger,
            mailbox: channels.mailbox,
            inbound: channels.inbound,
            mesh: Some(channels.mesh),
            producing: Some(channels.producing),
            rng,
            queue: VecDeque::new(),
            stats: NodeStats::default(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Run the scheduler loop to completion and return the terminal view.
    pub fn run(mut self) -> NodeReport<L::Summary> {
        let mut mailbox_open = true;

        loop {
            if let Ok(artifact) = self.inbound.try_recv() {
                self.absorb(artifact);
                continue;
            }

            if mailbox_open {
                match self.mailbox.try_recv() {
                    Ok(tx) => {
                        self.stats.queued += 1;
                        self.queue.push_back(tx);
                        continue;
                    }
                    Err(TryRecvError::Disconnected) => mailbox_open = false,
                    Err(TryRecvError::Empty) => {}
                }
            }

            if !self.queue.is_empty() {
                self.mine_and_broadcast();
                continue;
            }

            if !mailbox_open {
                break;
            }

            let mut select = Select::new();
            select.recv(&self.inbound);
            select.recv(&self.mailbox);
            let _ = select.ready_timeout(IDLE_BACKOFF);
        }

        self.stop_producing();
        while let Ok(artifact) = self.inbound.recv() {
            self.absorb(artifact);
        }

        debug!(
            node = self.id,
            population = %self.population,
            mined = self.stats.mined,
            integrated = self.stats.integrated,
            grafted = self.stats.grafted,
            rejected = self.stats.rejected,
            dropped = self.stats.dropped,
            "node finished"
        );

        NodeReport {
            node: self.id,
            population: self.population,
            stats: self.stats,
            summary: self.ledger.finalize(),
        }
    }

    fn absorb(&mut self, artifact: L::Artifact) {
        let outcome = self.ledger.integrate(artifact);
        trace!(node = self.id, ?outcome, "inbound artifact");
        match outcome {
            Integration::Accepted => self.stats.integrated += 1,
            Integration::Grafted => {
                self.stats.integrated += 1;
                self.stats.grafted += 1;
            }
            Integration::Rejected => self.stats.rejected += 1,
            Integration::Duplicate => self.stats.duplicates += 1,
        }
    }

    fn mine_and_broadcast(&mut self) {
        let Some(artifact) = self.ledger.mine(&mut self.queue, self.difficulty, &mut self.rng) else {
            return;
        };
        self.stats.mined += 1;
        if let Some(mesh) = &self.mesh {
            let delivery = mesh.broadcast(self.id, &artifact);
            trace!(
                node = self.id,
                fingerprint = artifact.fingerprint(),
                delivered = delivery.delivered,
                dropped = delivery.dropped,
                "broadcast"
            );
            self.stats.delivered += delivery.delivered;
            self.stats.dropped += delivery.dropped;
        }
    }

    /// Release the mesh handle and leave the producer barrier.
    fn stop_producing(&mut self) {
        self.mesh = None;
        self.producing = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainLedger;
    use crate::tangle::TangleLedger;
    use crate::traffic::stream_rng;
    use crate::types::Amount;
    use crossbeam::channel::bounded;

    /// Wire node 0 of an all-honest mesh whose buffers hold `capacity`
    /// artifacts, with `cents` already waiting in a closed mailbox.
    fn wire<L: Ledger>(
        nodes: usize,
        capacity: usize,
        cents: &[u64],
    ) -> (NodeActor<L>, Vec<Receiver<L::Artifact>>, WaitGroup) {
        let (mesh, mut inbound) = Mesh::new(vec![Population::Honest; nodes], capacity);
        let (mailbox_tx, mailbox_rx) = bounded(cents.len());
        for &c in cents {
            mailbox_tx
                .send(Transaction::new("honest1", "honest2", Amount::from_cents(c)))
                .expect("mailbox has room");
        }
        drop(mailbox_tx);
        let producing = WaitGroup::new();
        let channels = NodeChannels {
            mailbox: mailbox_rx,
            inbound: inbound.remove(0),
            mesh,
            producing: producing.clone(),
        };
        let ledger = L::from_genesis(L::mint_genesis(0));
        let actor = NodeActor::new(0, 0, ledger, channels, stream_rng(3, 1));
        (actor, inbound, producing)
    }

    #[test]
    fn test_chain_node_batches_mailbox_and_broadcasts() {
        let (actor, peers, producing) = wire::<ChainLedger>(2, 4, &[100, 101]);
        assert_eq!(actor.id(), 0);
        let report = actor.run();
        producing.wait();

        assert_eq!(report.population, Population::Honest);
        assert_eq!(report.stats.queued, 2);
        assert_eq!(report.stats.mined, 1);
        assert_eq!(report.stats.delivered, 1);
        assert_eq!(report.stats.dropped, 0);
        assert_eq!(report.summary.best_length, 1);
        assert_eq!(report.summary.chain[1].transactions.len(), 2);

        let received: Vec<_> = peers[0].try_iter().collect();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].hash, report.summary.chain[1].hash);
    }

    #[test]
    fn test_tangle_node_mines_one_entry_per_transaction() {
        let (actor, peers, _producing) = wire::<TangleLedger>(3, 8, &[100, 101, 102]);
        let report = actor.run();

        assert_eq!(report.stats.mined, 3);
        assert_eq!(report.stats.delivered, 6);
        for peer in &peers {
            assert_eq!(peer.try_iter().count(), 3);
        }
        // Two genesis entries plus the three mined ones.
        assert_eq!(report.summary.scores.len(), 5);
    }

    #[test]
    fn test_full_peer_buffer_drops_instead_of_blocking() {
        let (actor, peers, _producing) = wire::<ChainLedger>(2, 0, &[100]);
        let report = actor.run();
        assert_eq!(report.stats.mined, 1);
        assert_eq!(report.stats.delivered, 0);
        assert_eq!(report.stats.dropped, 1);
        assert!(peers[0].try_recv().is_err());
    }
}
