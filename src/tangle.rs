// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Ledger Arena Consensus Simulation Suite - Tangle Variant
//
// Every transaction is its own DAG entry approving two earlier entries.
// A node keeps the full DAG and, once its loop ends, scores each entry by
// the number of tips from which it is transitively reachable. Entries with
// an unknown parent are dropped rather than grafted.

use std::collections::{HashMap, HashSet, VecDeque};

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::trace;

use crate::miner::mine;
use crate::node::{Integration, Ledger};
use crate::types::{Amount, Fingerprint, Transaction};

pub const GENESIS_SENDER: &str = "genesis";
pub const GENESIS_RECEIVER: &str = "network";

/// Node-local DAG.
#[derive(Debug, Clone)]
pub struct TangleLedger {
    entries: HashMap<Fingerprint, Transaction>,
    /// Arrival order; parent selection samples from it.
    order: Vec<Fingerprint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredTransaction {
    pub transaction: Transaction,
    pub confidence: u64,
}

/// Terminal view of a node: every known entry with its confidence.
#[derive(Debug, Clone, Serialize)]
pub struct TangleSummary {
    pub scores: Vec<ScoredTransaction>,
    pub tips: usize,
}

impl TangleLedger {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.entries.contains_key(hash)
    }

    pub fn get(&self, hash: &str) -> Option<&Transaction> {
        self.entries.get(hash)
    }

    fn insert(&mut self, tx: Transaction) {
        self.order.push(tx.hash.clone());
        self.entries.insert(tx.hash.clone(), tx);
    }

    /// Two distinct known entries, chosen uniformly.
    fn pick_parents(&self, rng: &mut ChaCha8Rng) -> Vec<Fingerprint> {
        let n = self.order.len();
        let first = rng.gen_range(0..n);
        let mut second = rng.gen_range(0..n - 1);
        if second >= first {
            second += 1;
        }
        vec![self.order[first].clone(), self.order[second].clone()]
    }

    /// Entries no other known entry names as a parent.
    pub fn tips(&self) -> HashSet<Fingerprint> {
        let referenced: HashSet<&str> = self
            .entries
            .values()
            .flat_map(|tx| tx.parents.iter().map(String::as_str))
            .collect();
        self.entries
            .keys()
            .filter(|hash| !referenced.contains(hash.as_str()))
            .cloned()
            .collect()
    }

    /// Number of distinct tips each entry is reachable from.
    pub fn confidence(&self) -> HashMap<Fingerprint, u64> {
        let mut confidence: HashMap<Fingerprint, u64> = HashMap::with_capacity(self.entries.len());
        for tip in self.tips() {
            let mut visited: HashSet<&str> = HashSet::new();
            let mut stack: Vec<&str> = vec![self.entries[&tip].hash.as_str()];
            while let Some(hash) = stack.pop() {
                if !visited.insert(hash) {
                    continue;
                }
                *confidence.entry(hash.to_string()).or_insert(0) += 1;
                if let Some(tx) = self.entries.get(hash) {
                    stack.extend(
                        tx.parents
                            .iter()
                            .map(String::as_str)
                            .filter(|parent| self.entries.contains_key(*parent)),
                    );
                }
            }
        }
        confidence
    }
}

impl Ledger for TangleLedger {
    type Artifact = Transaction;
    type Genesis = Vec<Transaction>;
    type Summary = TangleSummary;

    /// Two parentless entries (amounts 0.01 and 0.02) every DAG starts from.
    fn mint_genesis(difficulty: u32) -> Vec<Transaction> {
        (1..=2)
            .map(|cents| {
                let tx = Transaction::new(GENESIS_SENDER, GENESIS_RECEIVER, Amount::from_cents(cents));
                mine(tx, difficulty)
            })
            .collect()
    }

    fn from_genesis(genesis: Vec<Transaction>) -> Self {
        let mut ledger = Self {
            entries: HashMap::new(),
            order: Vec::new(),
        };
        for tx in genesis {
            ledger.insert(tx);
        }
        ledger
    }

    fn integrate(&mut self, tx: Transaction) -> Integration {
        if self.entries.contains_key(&tx.hash) {
            return Integration::Duplicate;
        }
        let anchored = tx.parents.len() == 2 && tx.parents.iter().all(|p| self.entries.contains_key(p));
        if !anchored {
            trace!(entry = %tx.hash, "dropping entry with unknown parent");
            return Integration::Rejected;
        }
        self.insert(tx);
        Integration::Accepted
    }

    /// Attach the oldest queued transaction to two random parents.
    fn mine(
        &mut self,
        queue: &mut VecDeque<Transaction>,
        difficulty: u32,
        rng: &mut ChaCha8Rng,
    ) -> Option<Transaction> {
        if self.order.len() < 2 {
            return None;
        }
        let mut tx = queue.pop_front()?;
        tx.parents = self.pick_parents(rng);
        let mined = mine(tx, difficulty);
        self.insert(mined.clone());
        Some(mined)
    }

    fn finalize(self) -> TangleSummary {
        let confidence = self.confidence();
        let tips = self.tips().len();
        let scores = self
            .order
            .iter()
            .filter_map(|hash| {
                let score = confidence.get(hash).copied().unwrap_or(0);
                (score > 0).then(|| ScoredTransaction {
                    transaction: self.entries[hash].clone(),
                    confidence: score,
                })
            })
            .collect();
        TangleSummary { scores, tips }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traffic::stream_rng;
    use proptest::prelude::*;

    fn ledger(difficulty: u32) -> TangleLedger {
        TangleLedger::from_genesis(TangleLedger::mint_genesis(difficulty))
    }

    fn tx(cents: u64) -> Transaction {
        Transaction::new("honest1", "honest2", Amount::from_cents(cents))
    }

    #[test]
    fn test_genesis_entries_are_tips() {
        let node = ledger(1);
        assert_eq!(node.len(), 2);
        assert_eq!(node.tips().len(), 2);
        assert!(node.confidence().values().all(|&c| c == 1));
    }

    #[test]
    fn test_single_entry_over_both_genesis() {
        let mut node = ledger(1);
        let mut rng = stream_rng(0, 1);
        let mut queue = VecDeque::from(vec![tx(100)]);
        let mined = node.mine(&mut queue, 1, &mut rng).expect("two genesis parents");

        let genesis: Vec<Fingerprint> = node.order[..2].to_vec();
        let mut parents = mined.parents.clone();
        parents.sort();
        let mut expected = genesis.clone();
        expected.sort();
        assert_eq!(parents, expected);

        let tips = node.tips();
        assert_eq!(tips.len(), 1);
        assert!(tips.contains(&mined.hash));

        let confidence = node.confidence();
        assert_eq!(confidence[&mined.hash], 1);
        assert_eq!(confidence[&genesis[0]], 1);
        assert_eq!(confidence[&genesis[1]], 1);
    }

    #[test]
    fn test_unknown_parent_is_dropped() {
        let mut miner = ledger(0);
        let mut queue = VecDeque::from(vec![tx(100)]);
        let first = miner.mine(&mut queue, 0, &mut stream_rng(5, 1)).expect("mined");
        let mut child = tx(101);
        child.parents = vec![first.hash.clone(), miner.order[0].clone()];
        let child = mine(child, 0);

        let mut peer = ledger(0);
        assert_eq!(peer.integrate(child.clone()), Integration::Rejected);
        assert!(!peer.contains(&child.hash));
        assert_eq!(peer.integrate(first.clone()), Integration::Accepted);
        assert_eq!(peer.integrate(first), Integration::Duplicate);
        assert_eq!(peer.integrate(child), Integration::Accepted);
        assert_eq!(peer.tips().len(), 2);
    }

    #[test]
    fn test_parentless_entry_is_dropped() {
        let mut peer = ledger(0);
        let stray = mine(tx(100), 0);
        assert_eq!(peer.integrate(stray), Integration::Rejected);
    }

    #[test]
    fn test_mining_takes_oldest_queued() {
        let mut node = ledger(0);
        let mut queue = VecDeque::from(vec![tx(100), tx(101)]);
        let mined = node.mine(&mut queue, 0, &mut stream_rng(1, 1)).expect("mined");
        assert_eq!(mined.amount, Amount::from_cents(100));
        assert_eq!(queue.len(), 1);
        assert!(node.mine(&mut VecDeque::new(), 0, &mut stream_rng(1, 1)).is_none());
    }

    #[test]
    fn test_chain_of_approvals_accumulates_confidence() {
        let genesis = TangleLedger::mint_genesis(0);
        let mut node = TangleLedger::from_genesis(genesis);
        let mut rng = stream_rng(9, 1);
        let mut queue: VecDeque<Transaction> = (100..110).map(tx).collect();
        while node.mine(&mut queue, 0, &mut rng).is_some() {}

        let summary = node.clone().finalize();
        assert_eq!(summary.scores.len(), 12);
        assert_eq!(summary.tips, node.tips().len());
        for scored in &summary.scores {
            assert!(scored.confidence >= 1);
            assert!(scored.confidence <= summary.tips as u64);
        }
    }

    proptest! {
        #[test]
        fn prop_confidence_bounded_by_tips(seed in any::<u64>(), count in 0u64..40) {
            let mut node = ledger(0);
            let mut rng = stream_rng(seed, 1);
            let mut queue: VecDeque<Transaction> = (0..count).map(|i| tx(100 + i)).collect();
            while node.mine(&mut queue, 0, &mut rng).is_some() {}

            let tips = node.tips();
            let confidence = node.confidence();
            prop_assert_eq!(confidence.len(), node.len());
            for (hash, score) in &confidence {
                prop_assert!(*score >= 1);
                prop_assert!(*score <= tips.len() as u64);
                if tips.contains(hash) {
                    prop_assert_eq!(*score, 1);
                }
            }
            for entry in node.entries.values() {
                for parent in &entry.parents {
                    prop_assert!(node.contains(parent));
                }
            }
        }
    }
}
