// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Ledger Arena Consensus Simulation Suite - Type Definitions

use std::fmt;

use serde::{Deserialize, Serialize};

/// Hex text of a SHA-256 digest. Empty for "no predecessor".
pub type Fingerprint = String;

// ─── Population ──────────────────────────────────────────────────────────────

/// Which side of the partition a node (or a transaction's sender) belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Population {
    Honest,
    Corrupt,
}

impl Population {
    /// Nodes `0..corrupt` are corrupt, the rest honest.
    pub fn of_node(index: usize, corrupt: usize) -> Self {
        if index < corrupt {
            Self::Corrupt
        } else {
            Self::Honest
        }
    }

    /// 1-based ordinal of a node within its own population.
    pub fn ordinal(index: usize, corrupt: usize) -> usize {
        if index < corrupt {
            index + 1
        } else {
            index + 1 - corrupt
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Honest => "honest",
            Self::Corrupt => "corrupt",
        }
    }

    /// Participant name used as transaction sender/receiver, e.g. `honest3`.
    pub fn participant(index: usize, corrupt: usize) -> String {
        let population = Self::of_node(index, corrupt);
        format!("{}{}", population.label(), Self::ordinal(index, corrupt))
    }

    /// Recover the population from a participant name. The prefix must be
    /// followed by at least one character, so `genesis` and a bare `honest`
    /// belong to neither side.
    pub fn from_sender(name: &str) -> Option<Self> {
        [Self::Honest, Self::Corrupt].into_iter().find(|p| {
            name.strip_prefix(p.label())
                .map(|rest| !rest.is_empty())
                .unwrap_or(false)
        })
    }

    /// Visibility policy of the partition: corrupt senders only reach
    /// corrupt receivers, honest senders reach everyone.
    pub fn can_reach(&self, receiver: Population) -> bool {
        !(*self == Self::Corrupt && receiver == Self::Honest)
    }
}

impl fmt::Display for Population {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ─── Amount ──────────────────────────────────────────────────────────────────

/// Transaction amount in hundredths. Every transaction of a run carries a
/// distinct amount, so it doubles as the transaction id.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(pub u64);

impl Amount {
    pub fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    pub fn cents(&self) -> u64 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ─── Transaction ─────────────────────────────────────────────────────────────

/// A transfer between two participants. The DAG fields (`parents`, `hash`,
/// `nonce`) stay empty in the chain variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub sender: String,
    pub receiver: String,
    pub amount: Amount,
    #[serde(default)]
    pub parents: Vec<Fingerprint>,
    #[serde(default)]
    pub hash: Fingerprint,
    #[serde(default)]
    pub nonce: u64,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, receiver: impl Into<String>, amount: Amount) -> Self {
        Self {
            sender: sender.into(),
            receiver: receiver.into(),
            amount,
            parents: Vec::new(),
            hash: String::new(),
            nonce: 0,
        }
    }

    pub fn population(&self) -> Option<Population> {
        Population::from_sender(&self.sender)
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {} | Amount: {}", self.sender, self.receiver, self.amount)
    }
}

// ─── Block ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Block {
    pub transactions: Vec<Transaction>,
    pub prev_hash: Fingerprint,
    pub hash: Fingerprint,
    pub nonce: u64,
}

impl Block {
    /// An unmined block; `hash` and `nonce` are filled in by the miner.
    pub fn candidate(prev_hash: Fingerprint, transactions: Vec<Transaction>) -> Self {
        Self {
            transactions,
            prev_hash,
            hash: String::new(),
            nonce: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_population_partition() {
        assert_eq!(Population::of_node(0, 1), Population::Corrupt);
        assert_eq!(Population::of_node(1, 1), Population::Honest);
        assert_eq!(Population::participant(0, 2), "corrupt1");
        assert_eq!(Population::participant(2, 2), "honest1");
        assert_eq!(Population::participant(3, 2), "honest2");
    }

    #[test]
    fn test_sender_prefix() {
        assert_eq!(Population::from_sender("honest12"), Some(Population::Honest));
        assert_eq!(Population::from_sender("corrupt1"), Some(Population::Corrupt));
        assert_eq!(Population::from_sender("honest"), None);
        assert_eq!(Population::from_sender("genesis"), None);
    }

    #[test]
    fn test_visibility_is_one_directional() {
        assert!(Population::Honest.can_reach(Population::Corrupt));
        assert!(Population::Honest.can_reach(Population::Honest));
        assert!(Population::Corrupt.can_reach(Population::Corrupt));
        assert!(!Population::Corrupt.can_reach(Population::Honest));
    }

    #[test]
    fn test_amount_display() {
        assert_eq!(Amount::from_cents(100).to_string(), "1.00");
        assert_eq!(Amount::from_cents(107).to_string(), "1.07");
        assert_eq!(Amount::from_cents(2).to_string(), "0.02");
        assert!((Amount::from_cents(250).as_f64() - 2.5).abs() < 1e-12);
    }
}
