// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Ledger Arena Consensus Simulation Suite - Broadcast Fabric
//
// Best-effort fan-out over bounded per-node receive buffers. A full buffer
// drops the artifact for that destination: no retry, no queuing. The
// partition policy lives in `Population::can_reach`.

use std::sync::Arc;

use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use serde::Serialize;

use crate::types::Population;

/// Outcome of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub delivered: usize,
    /// Eligible destinations whose buffer was full or gone.
    pub dropped: usize,
}

/// Shared sending side of every node's receive buffer.
///
/// Receive buffers close once the last handle on the mesh is dropped, so
/// a buffer can never be closed while some node may still broadcast.
#[derive(Debug)]
pub struct Mesh<A> {
    buffers: Vec<Sender<A>>,
    populations: Vec<Population>,
}

impl<A: Clone> Mesh<A> {
    /// Build a mesh with one buffer of `capacity` per node; returns the
    /// receiving ends in node order.
    pub fn new(populations: Vec<Population>, capacity: usize) -> (Arc<Self>, Vec<Receiver<A>>) {
        let (buffers, receivers): (Vec<_>, Vec<_>) =
            populations.iter().map(|_| bounded(capacity)).unzip();
        (Arc::new(Self { buffers, populations }), receivers)
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub fn population(&self, node: usize) -> Population {
        self.populations[node]
    }

    /// Offer `artifact` to every node `from` may reach, never to itself,
    /// without blocking.
    pub fn broadcast(&self, from: usize, artifact: &A) -> Delivery {
        let sender = self.populations[from];
        let mut delivery = Delivery::default();
        for (to, buffer) in self.buffers.iter().enumerate() {
            if to == from || !sender.can_reach(self.populations[to]) {
                continue;
            }
            match buffer.try_send(artifact.clone()) {
                Ok(()) => delivery.delivered += 1,
                Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                    delivery.dropped += 1
                }
            }
        }
        delivery
    }
}
