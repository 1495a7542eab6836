// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Ledger Arena Consensus Simulation Suite - Hash-Puzzle Miner
//
// Both consensus variants seal their artifacts here. A fingerprint is the
// lowercase hex SHA-256 of the artifact payload followed by the decimal
// nonce; it is valid when its first D characters are '0'.

use sha2::{Digest, Sha256};

use crate::types::{Block, Fingerprint, Transaction};

// ---------------------------------------------------------------------------
// Artifact
// ---------------------------------------------------------------------------

/// A unit of mined work as seen by the miner.
pub trait Artifact: Clone + Send + 'static {
    /// Content bytes covered by the fingerprint, excluding fingerprint and nonce.
    fn payload(&self) -> Vec<u8>;

    fn fingerprint(&self) -> &str;

    fn nonce(&self) -> u64;

    /// Store the accepted nonce and fingerprint.
    fn seal(&mut self, nonce: u64, fingerprint: Fingerprint);
}

impl Artifact for Block {
    fn payload(&self) -> Vec<u8> {
        // Serializing owned strings and integers cannot fail.
        let mut payload = serde_json::to_vec(&self.transactions).unwrap_or_default();
        payload.extend_from_slice(self.prev_hash.as_bytes());
        payload
    }

    fn fingerprint(&self) -> &str {
        &self.hash
    }

    fn nonce(&self) -> u64 {
        self.nonce
    }

    fn seal(&mut self, nonce: u64, fingerprint: Fingerprint) {
        self.nonce = nonce;
        self.hash = fingerprint;
    }
}

impl Artifact for Transaction {
    fn payload(&self) -> Vec<u8> {
        let mut payload = format!("{}{}{}", self.sender, self.receiver, self.amount).into_bytes();
        for parent in &self.parents {
            payload.extend_from_slice(parent.as_bytes());
        }
        payload
    }

    fn fingerprint(&self) -> &str {
        &self.hash
    }

    fn nonce(&self) -> u64 {
        self.nonce
    }

    fn seal(&mut self, nonce: u64, fingerprint: Fingerprint) {
        self.nonce = nonce;
        self.hash = fingerprint;
    }
}

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

fn digest(payload: &[u8], nonce: u64) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(payload);
    hasher.update(nonce.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// Fingerprint of `artifact` at its current nonce.
pub fn fingerprint<A: Artifact>(artifact: &A) -> Fingerprint {
    digest(&artifact.payload(), artifact.nonce())
}

/// Difficulty predicate: `difficulty` leading '0' characters.
pub fn meets_difficulty(fingerprint: &str, difficulty: u32) -> bool {
    let difficulty = difficulty as usize;
    fingerprint.len() >= difficulty && fingerprint.bytes().take(difficulty).all(|b| b == b'0')
}

/// Search nonces upward from the artifact's current nonce until the
/// fingerprint satisfies `difficulty`. Expected cost is 16^difficulty
/// attempts and there is no upper bound.
pub fn mine<A: Artifact>(mut artifact: A, difficulty: u32) -> A {
    let payload = artifact.payload();
    let mut nonce = artifact.nonce();
    loop {
        let candidate = digest(&payload, nonce);
        if meets_difficulty(&candidate, difficulty) {
            artifact.seal(nonce, candidate);
            return artifact;
        }
        nonce = nonce.wrapping_add(1);
    }
}

/// True when the stored fingerprint matches the content and satisfies `difficulty`.
pub fn verify<A: Artifact>(artifact: &A, difficulty: u32) -> bool {
    artifact.fingerprint() == fingerprint(artifact) && meets_difficulty(artifact.fingerprint(), difficulty)
}
