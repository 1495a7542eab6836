// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Ledger Arena Consensus Simulation Suite - Longest-Chain Variant
//
// Each node keeps every block it has seen together with its chain length
// and follows the longest chain it knows. Reorgs are local: a node moves
// its best tip only when a strictly longer chain appears. A block whose
// predecessor is unknown is grafted onto genesis with length 1.

use std::collections::{HashMap, VecDeque};

use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::trace;

use crate::miner::mine;
use crate::node::{Integration, Ledger};
use crate::types::{Block, Fingerprint, Transaction};

#[derive(Debug, Clone)]
struct ChainEntry {
    block: Block,
    /// Predecessor actually linked to; genesis for grafted blocks.
    parent: Fingerprint,
    length: usize,
}

/// Node-local view of the block tree.
#[derive(Debug, Clone)]
pub struct ChainLedger {
    genesis: Fingerprint,
    entries: HashMap<Fingerprint, ChainEntry>,
    best_tip: Fingerprint,
    best_length: usize,
}

/// Terminal view of a node: its best chain, genesis first.
#[derive(Debug, Clone, Serialize)]
pub struct ChainSummary {
    pub chain: Vec<Block>,
    pub best_length: usize,
}

impl ChainLedger {
    pub fn genesis(&self) -> &str {
        &self.genesis
    }

    pub fn best_tip(&self) -> &str {
        &self.best_tip
    }

    /// Blocks on the best chain, genesis excluded.
    pub fn best_length(&self) -> usize {
        self.best_length
    }

    pub fn length_of(&self, hash: &str) -> Option<usize> {
        self.entries.get(hash).map(|e| e.length)
    }

    pub fn parent_of(&self, hash: &str) -> Option<&str> {
        self.entries.get(hash).map(|e| e.parent.as_str())
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.entries.contains_key(hash)
    }

    /// Known blocks, genesis included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, block: Block, parent: Fingerprint, length: usize) {
        let hash = block.hash.clone();
        if length > self.best_length {
            self.best_tip = hash.clone();
            self.best_length = length;
        }
        self.entries.insert(hash, ChainEntry { block, parent, length });
    }

    /// Walk back from the best tip to genesis, returning blocks oldest first.
    pub fn best_chain(&self) -> Vec<Block> {
        let mut chain = Vec::with_capacity(self.best_length + 1);
        let mut cursor = self.best_tip.as_str();
        // Bounded by the block count so a malformed link can never spin.
        for _ in 0..self.entries.len() {
            let Some(entry) = self.entries.get(cursor) else {
                break;
            };
            chain.push(entry.block.clone());
            if cursor == self.genesis {
                break;
            }
            cursor = entry.parent.as_str();
        }
        chain.reverse();
        chain
    }
}

impl Ledger for ChainLedger {
    type Artifact = Block;
    type Genesis = Block;
    type Summary = ChainSummary;

    fn mint_genesis(difficulty: u32) -> Block {
        mine(Block::candidate(String::new(), Vec::new()), difficulty)
    }

    fn from_genesis(genesis: Block) -> Self {
        let hash = genesis.hash.clone();
        let mut entries = HashMap::new();
        entries.insert(
            hash.clone(),
            ChainEntry {
                block: genesis,
                parent: String::new(),
                length: 0,
            },
        );
        Self {
            genesis: hash.clone(),
            entries,
            best_tip: hash,
            best_length: 0,
        }
    }

    fn integrate(&mut self, block: Block) -> Integration {
        if self.entries.contains_key(&block.hash) {
            return Integration::Duplicate;
        }
        match self.entries.get(&block.prev_hash).map(|e| e.length) {
            Some(prev_length) => {
                let parent = block.prev_hash.clone();
                self.insert(block, parent, prev_length + 1);
                Integration::Accepted
            }
            None => {
                trace!(block = %block.hash, prev = %block.prev_hash, "grafting orphan onto genesis");
                let parent = self.genesis.clone();
                self.insert(block, parent, 1);
                Integration::Grafted
            }
        }
    }

    /// Batch every queued transaction into one block on the best tip.
    fn mine(
        &mut self,
        queue: &mut VecDeque<Transaction>,
        difficulty: u32,
        _rng: &mut ChaCha8Rng,
    ) -> Option<Block> {
        if queue.is_empty() {
            return None;
        }
        let transactions: Vec<Transaction> = queue.drain(..).collect();
        let block = mine(Block::candidate(self.best_tip.clone(), transactions), difficulty);
        let parent = self.best_tip.clone();
        let length = self.best_length + 1;
        self.insert(block.clone(), parent, length);
        Some(block)
    }

    fn finalize(self) -> ChainSummary {
        ChainSummary {
            chain: self.best_chain(),
            best_length: self.best_length,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traffic::stream_rng;
    use crate::types::Amount;

    const DIFFICULTY: u32 = 1;

    fn ledger() -> ChainLedger {
        ChainLedger::from_genesis(ChainLedger::mint_genesis(DIFFICULTY))
    }

    fn queue_of(cents: &[u64]) -> VecDeque<Transaction> {
        cents
            .iter()
            .map(|&c| Transaction::new("honest1", "honest2", Amount::from_cents(c)))
            .collect()
    }

    fn mine_on(ledger: &mut ChainLedger, cents: &[u64]) -> Block {
        let mut queue = queue_of(cents);
        let mut rng = stream_rng(0, 1);
        let block = ledger.mine(&mut queue, DIFFICULTY, &mut rng).expect("queue is non-empty");
        assert!(queue.is_empty());
        block
    }

    #[test]
    fn test_genesis_is_the_initial_tip() {
        let ledger = ledger();
        assert_eq!(ledger.best_tip(), ledger.genesis());
        assert_eq!(ledger.best_length(), 0);
        assert_eq!(ledger.best_chain().len(), 1);
    }

    #[test]
    fn test_mining_batches_queue_and_advances_tip() {
        let mut node = ledger();
        let block = mine_on(&mut node, &[100, 101, 102]);
        assert_eq!(block.transactions.len(), 3);
        assert_eq!(block.prev_hash, node.genesis());
        assert_eq!(node.best_tip(), block.hash);
        assert_eq!(node.best_length(), 1);

        let mut empty = VecDeque::new();
        assert!(node.mine(&mut empty, DIFFICULTY, &mut stream_rng(0, 1)).is_none());
    }

    #[test]
    fn test_racing_blocks_update_peer_once() {
        let genesis = ChainLedger::mint_genesis(DIFFICULTY);
        let mut a = ChainLedger::from_genesis(genesis.clone());
        let mut b = ChainLedger::from_genesis(genesis.clone());
        let mut peer = ChainLedger::from_genesis(genesis);

        let from_a = mine_on(&mut a, &[100]);
        let from_b = mine_on(&mut b, &[101]);

        assert_eq!(peer.integrate(from_a.clone()), Integration::Accepted);
        assert_eq!(peer.best_tip(), from_a.hash);
        assert_eq!(peer.integrate(from_b.clone()), Integration::Accepted);
        // Equal length does not reorg.
        assert_eq!(peer.best_tip(), from_a.hash);
        assert_eq!(peer.length_of(&from_b.hash), Some(1));

        let extension = mine_on(&mut b, &[102]);
        assert_eq!(peer.integrate(extension.clone()), Integration::Accepted);
        assert_eq!(peer.best_tip(), extension.hash);
        assert_eq!(peer.best_length(), 2);
        let hashes: Vec<_> = peer.best_chain().into_iter().map(|b| b.hash).collect();
        assert_eq!(hashes, vec![peer.genesis().to_string(), from_b.hash, extension.hash]);
    }

    #[test]
    fn test_orphan_grafts_onto_genesis() {
        let mut miner = ledger();
        let first = mine_on(&mut miner, &[100]);
        let second = mine_on(&mut miner, &[101]);

        let mut peer = ledger();
        assert_eq!(peer.integrate(second.clone()), Integration::Grafted);
        assert_eq!(peer.length_of(&second.hash), Some(1));
        assert_eq!(peer.parent_of(&second.hash), Some(peer.genesis()));

        // The late predecessor does not re-link the grafted block.
        assert_eq!(peer.integrate(first.clone()), Integration::Accepted);
        assert_eq!(peer.best_tip(), second.hash);
        assert_eq!(peer.best_chain().len(), 2);
    }

    #[test]
    fn test_duplicates_are_ignored() {
        let mut miner = ledger();
        let block = mine_on(&mut miner, &[100]);
        let mut peer = ledger();
        assert_eq!(peer.integrate(block.clone()), Integration::Accepted);
        assert_eq!(peer.integrate(block), Integration::Duplicate);
        assert_eq!(peer.len(), 2);
    }

    #[test]
    fn test_best_length_never_shrinks() {
        let genesis = ChainLedger::mint_genesis(DIFFICULTY);
        let mut long = ChainLedger::from_genesis(genesis.clone());
        let mut short = ChainLedger::from_genesis(genesis.clone());
        let long_blocks: Vec<Block> = (0..3).map(|i| mine_on(&mut long, &[200 + i])).collect();
        let short_block = mine_on(&mut short, &[300]);

        let mut peer = ChainLedger::from_genesis(genesis);
        let mut best_seen = 0;
        for block in long_blocks.into_iter().chain(std::iter::once(short_block)) {
            peer.integrate(block);
            assert!(peer.best_length() >= best_seen);
            best_seen = peer.best_length();
        }
        assert_eq!(best_seen, 3);
    }

    #[test]
    fn test_finalized_chain_matches_best_length() {
        let mut node = ledger();
        for i in 0..4 {
            mine_on(&mut node, &[100 + i]);
        }
        let summary = node.finalize();
        assert_eq!(summary.best_length, 4);
        assert_eq!(summary.chain.len(), 5);
        assert!(summary.chain[0].transactions.is_empty());
        for pair in summary.chain.windows(2) {
            assert_eq!(pair[1].prev_hash, pair[0].hash);
        }
    }
}
