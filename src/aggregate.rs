// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Ledger Arena Consensus Simulation Suite - Result Aggregation
//
// Nodes hand their terminal views to a single collector over a channel.
// The collector merges them into a tally under one lock per report; no
// tally is touched while the simulation itself is running.

use std::collections::{HashMap, HashSet};

use crossbeam::channel::Receiver;
use parking_lot::Mutex;
use serde::Serialize;

use crate::chain::ChainSummary;
use crate::node::{NodeReport, NodeStats};
use crate::tangle::TangleSummary;
use crate::types::{Amount, Block, Population, Transaction};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `part / whole` in percent, rounded to two decimals; 0 when `whole` is 0.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round2(100.0 * part as f64 / whole as f64)
}

/// Mean of `total` over `count` samples; 0 when there are none.
pub fn mean(total: u64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

// ---------------------------------------------------------------------------
// Tally
// ---------------------------------------------------------------------------

pub trait Tally: Default + Send + 'static {
    type Summary: Send + 'static;

    fn absorb(&mut self, report: NodeReport<Self::Summary>);

    /// Network counters summed over every absorbed node.
    fn stats(&self) -> &NodeStats;
}

/// Drain `reports` into a fresh tally. Returns once every sender is gone.
pub fn collect<T: Tally>(reports: Receiver<NodeReport<T::Summary>>) -> T {
    let tally = Mutex::new(T::default());
    for report in reports.iter() {
        tally.lock().absorb(report);
    }
    tally.into_inner()
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ChainWinner {
    pub node: usize,
    pub population: Population,
    /// Genesis first.
    pub chain: Vec<Block>,
}

/// Longest candidate chain across nodes; ties keep the first one collected.
#[derive(Debug, Default)]
pub struct ChainTally {
    winner: Option<ChainWinner>,
    stats: NodeStats,
    reports: usize,
}

impl ChainTally {
    pub fn winner(&self) -> Option<&ChainWinner> {
        self.winner.as_ref()
    }

    pub fn reports(&self) -> usize {
        self.reports
    }

    /// Distinct transactions on the winning chain.
    pub fn confirmed(&self) -> usize {
        self.winner
            .as_ref()
            .map(|w| {
                w.chain
                    .iter()
                    .flat_map(|b| b.transactions.iter().map(|tx| tx.amount))
                    .collect::<HashSet<Amount>>()
                    .len()
            })
            .unwrap_or(0)
    }

    pub fn into_winner(self) -> Option<ChainWinner> {
        self.winner
    }
}

impl Tally for ChainTally {
    type Summary = ChainSummary;

    fn absorb(&mut self, report: NodeReport<ChainSummary>) {
        self.reports += 1;
        self.stats.absorb(&report.stats);
        let longer = self
            .winner
            .as_ref()
            .map_or(true, |w| report.summary.chain.len() > w.chain.len());
        if longer {
            self.winner = Some(ChainWinner {
                node: report.node,
                population: report.population,
                chain: report.summary.chain,
            });
        }
    }

    fn stats(&self) -> &NodeStats {
        &self.stats
    }
}

// ---------------------------------------------------------------------------
// Tangle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct TrackedTransaction {
    /// First copy observed.
    pub transaction: Transaction,
    /// Confidence summed over every node that reported the transaction.
    pub score: u64,
    /// Nodes that reported it.
    pub observers: usize,
}

/// Global confidence tracker keyed by transaction amount. Genesis entries
/// belong to neither population and are not tracked.
#[derive(Debug, Default)]
pub struct TangleTally {
    tracker: HashMap<Amount, TrackedTransaction>,
    stats: NodeStats,
    reports: usize,
}

impl TangleTally {
    pub fn get(&self, amount: Amount) -> Option<&TrackedTransaction> {
        self.tracker.get(&amount)
    }

    pub fn reports(&self) -> usize {
        self.reports
    }

    /// Transactions some node reported with non-zero confidence.
    pub fn confirmed(&self) -> usize {
        self.tracker.values().filter(|t| t.score > 0).count()
    }

    /// Mean accumulated score over the transactions sent by `population`.
    pub fn average_confidence(&self, population: Population) -> f64 {
        let (total, count) = self
            .tracker
            .values()
            .filter(|t| t.transaction.population() == Some(population))
            .fold((0u64, 0usize), |(total, count), t| (total + t.score, count + 1));
        mean(total, count)
    }

    /// Mean accumulated score over every tracked transaction.
    pub fn overall_average(&self) -> f64 {
        let total: u64 = self.tracker.values().map(|t| t.score).sum();
        mean(total, self.tracker.len())
    }

    /// Population with the higher average confidence; honest on a tie.
    pub fn winner(&self) -> Population {
        if self.average_confidence(Population::Corrupt) > self.average_confidence(Population::Honest) {
            Population::Corrupt
        } else {
            Population::Honest
        }
    }

    /// Tracked transactions by descending score, then ascending amount.
    pub fn ranking(&self) -> Vec<TrackedTransaction> {
        let mut ranking: Vec<TrackedTransaction> = self.tracker.values().cloned().collect();
        ranking.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then(a.transaction.amount.cmp(&b.transaction.amount))
        });
        ranking
    }

    /// Transactions whose score is at least the mean score.
    pub fn above_average(&self) -> usize {
        let average = self.overall_average();
        self.tracker
            .values()
            .filter(|t| t.score > 0 && t.score as f64 >= average)
            .count()
    }
}

impl Tally for TangleTally {
    type Summary = TangleSummary;

    fn absorb(&mut self, report: NodeReport<TangleSummary>) {
        self.reports += 1;
        self.stats.absorb(&report.stats);
        for scored in report.summary.scores {
            if scored.confidence == 0 || scored.transaction.population().is_none() {
                continue;
            }
            let entry = self
                .tracker
                .entry(scored.transaction.amount)
                .or_insert_with(|| TrackedTransaction {
                    transaction: scored.transaction,
                    score: 0,
                    observers: 0,
                });
            entry.score += scored.confidence;
            entry.observers += 1;
        }
    }

    fn stats(&self) -> &NodeStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tangle::ScoredTransaction;
    use crossbeam::channel::unbounded;

    fn block(cents: &[u64]) -> Block {
        let txs = cents
            .iter()
            .map(|&c| Transaction::new("honest1", "honest2", Amount::from_cents(c)))
            .collect();
        Block::candidate(String::new(), txs)
    }

    fn chain_report(node: usize, population: Population, chain: Vec<Block>) -> NodeReport<ChainSummary> {
        let best_length = chain.len().saturating_sub(1);
        NodeReport {
            node,
            population,
            stats: NodeStats::default(),
            summary: ChainSummary { chain, best_length },
        }
    }

    fn scored(sender: &str, cents: u64, confidence: u64) -> ScoredTransaction {
        ScoredTransaction {
            transaction: Transaction::new(sender, "x1", Amount::from_cents(cents)),
            confidence,
        }
    }

    fn tangle_report(node: usize, scores: Vec<ScoredTransaction>) -> NodeReport<TangleSummary> {
        NodeReport {
            node,
            population: Population::Honest,
            stats: NodeStats::default(),
            summary: TangleSummary { scores, tips: 1 },
        }
    }

    #[test]
    fn test_percentage_and_mean_guard_zero() {
        assert_eq!(percentage(3, 0), 0.0);
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(mean(10, 0), 0.0);
        assert_eq!(mean(10, 4), 2.5);
    }

    #[test]
    fn test_longest_chain_wins_and_ties_keep_first() {
        let mut tally = ChainTally::default();
        tally.absorb(chain_report(3, Population::Honest, vec![block(&[]), block(&[100])]));
        tally.absorb(chain_report(0, Population::Corrupt, vec![block(&[]), block(&[101])]));
        assert_eq!(tally.winner().map(|w| w.node), Some(3));

        tally.absorb(chain_report(
            1,
            Population::Corrupt,
            vec![block(&[]), block(&[101]), block(&[102])],
        ));
        let winner = tally.winner().expect("winner");
        assert_eq!(winner.node, 1);
        assert_eq!(winner.population, Population::Corrupt);
        assert_eq!(tally.reports(), 3);
    }

    #[test]
    fn test_chain_confirmed_counts_distinct_amounts() {
        let mut tally = ChainTally::default();
        tally.absorb(chain_report(
            2,
            Population::Honest,
            vec![block(&[]), block(&[100, 101]), block(&[101, 102])],
        ));
        assert_eq!(tally.confirmed(), 3);
        assert_eq!(ChainTally::default().confirmed(), 0);
    }

    #[test]
    fn test_tangle_accumulates_scores_and_keeps_first_copy() {
        let mut tally = TangleTally::default();
        tally.absorb(tangle_report(0, vec![scored("honest1", 100, 2), scored("genesis", 1, 3)]));
        let mut second = scored("honest1", 100, 1);
        second.transaction.hash = "later".to_string();
        tally.absorb(tangle_report(1, vec![second, scored("corrupt1", 101, 1)]));

        let tracked = tally.get(Amount::from_cents(100)).expect("tracked");
        assert_eq!(tracked.score, 3);
        assert_eq!(tracked.observers, 2);
        assert!(tracked.transaction.hash.is_empty());
        assert!(tally.get(Amount::from_cents(1)).is_none());
        assert_eq!(tally.confirmed(), 2);
    }

    #[test]
    fn test_tangle_averages_and_winner() {
        let mut tally = TangleTally::default();
        assert_eq!(tally.average_confidence(Population::Honest), 0.0);
        assert_eq!(tally.winner(), Population::Honest);

        tally.absorb(tangle_report(
            0,
            vec![
                scored("honest1", 100, 2),
                scored("honest2", 101, 4),
                scored("corrupt1", 102, 5),
            ],
        ));
        assert_eq!(tally.average_confidence(Population::Honest), 3.0);
        assert_eq!(tally.average_confidence(Population::Corrupt), 5.0);
        assert_eq!(tally.winner(), Population::Corrupt);
        // Mean score is 11/3; only 4 and 5 reach it.
        assert_eq!(tally.above_average(), 2);

        let ranking: Vec<u64> = tally.ranking().iter().map(|t| t.score).collect();
        assert_eq!(ranking, vec![5, 4, 2]);
    }

    #[test]
    fn test_collector_drains_channel() {
        let (tx, rx) = unbounded();
        for node in 0..3 {
            tx.send(tangle_report(node, vec![scored("honest1", 100, 1)])).expect("open");
        }
        drop(tx);
        let tally: TangleTally = collect(rx);
        assert_eq!(tally.reports(), 3);
        assert_eq!(tally.get(Amount::from_cents(100)).map(|t| t.score), Some(3));
    }
}
