// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Ledger Arena Consensus Simulation Suite - Transaction Workload
//
// Each round walks every ordered pair of distinct nodes. The amount counter
// advances on every pair, so amounts are unique for the whole run; a
// same-population pair transacts with probability `reach`.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::params::SimParams;
use crate::types::{Amount, Population, Transaction};

/// Amount of the first generated transaction (1.00).
pub const FIRST_AMOUNT: Amount = Amount(100);

/// Generator for stream `stream` of `seed`. The traffic generator uses
/// stream 0 and node `i` uses stream `i + 1`.
pub fn stream_rng(seed: u64, stream: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    rng
}

/// Transactions generated in one round, split by population.
#[derive(Debug, Clone, Default)]
pub struct RoundBatch {
    pub honest: Vec<Transaction>,
    pub corrupt: Vec<Transaction>,
}

impl RoundBatch {
    /// The transactions a node of `population` receives in its mailbox.
    pub fn for_population(&self, population: Population) -> &[Transaction] {
        match population {
            Population::Honest => &self.honest,
            Population::Corrupt => &self.corrupt,
        }
    }

    pub fn len(&self) -> usize {
        self.honest.len() + self.corrupt.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct TrafficGenerator {
    rng: ChaCha8Rng,
    nodes: usize,
    corrupt: usize,
    reach: f64,
    next_amount: Amount,
    pub sent_count: usize,
}

impl TrafficGenerator {
    pub fn new(rng: ChaCha8Rng, nodes: usize, corrupt: usize, reach: f64) -> Self {
        Self {
            rng,
            nodes,
            corrupt,
            reach,
            next_amount: FIRST_AMOUNT,
            sent_count: 0,
        }
    }

    pub fn from_params(params: &SimParams) -> Self {
        Self::new(
            stream_rng(params.seed, 0),
            params.nodes,
            params.corrupt,
            params.reach,
        )
    }

    /// Generate one round of transactions.
    pub fn generate_round(&mut self) -> RoundBatch {
        let mut batch = RoundBatch::default();
        for i in 0..self.nodes {
            for j in 0..self.nodes {
                if i == j {
                    continue;
                }
                let amount = self.next_amount;
                self.next_amount = amount.next();

                let population = Population::of_node(i, self.corrupt);
                if population != Population::of_node(j, self.corrupt) {
                    continue;
                }
                if self.rng.gen::<f64>() >= self.reach {
                    continue;
                }

                let tx = Transaction::new(
                    Population::participant(i, self.corrupt),
                    Population::participant(j, self.corrupt),
                    amount,
                );
                match population {
                    Population::Honest => batch.honest.push(tx),
                    Population::Corrupt => batch.corrupt.push(tx),
                }
                self.sent_count += 1;
            }
        }
        batch
    }
}
