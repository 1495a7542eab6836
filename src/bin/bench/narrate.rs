// Verbose Narration — human-readable dump of a finished run
// Winning chain or confidence table first, then the parameter/metric block

use ledger_arena::{Block, ChainOutcome, Outcome, RunSummary, TangleOutcome};

pub fn print_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Chain(o) => print_chain(o),
        Outcome::Tangle(o) => print_tangle(o),
    }
}

fn print_chain(outcome: &ChainOutcome) {
    match outcome.winning_node {
        Some(node) => println!("Winning chain held by node {node}"),
        None => println!("No node reported a chain"),
    }
    print_blocks(&outcome.winning_chain);
    print_summary(&outcome.summary);
    println!();
}

pub fn print_blocks(chain: &[Block]) {
    println!("length = {}", chain.len());
    for block in chain {
        println!("\n--- Block ---");
        println!("PrevHash: {}", block.prev_hash);
        println!("Hash: {}", block.hash);
        for tx in &block.transactions {
            println!("{tx}");
        }
    }
}

fn print_tangle(outcome: &TangleOutcome) {
    println!("Transaction Confidence Levels:");
    println!("===============================");
    for tracked in &outcome.ranking {
        println!("Transaction: {}, Confidence: {}", tracked.transaction, tracked.score);
    }
    print_summary(&outcome.summary);
    println!("avgConf_Honest      = {:.2}", outcome.avg_confidence_honest);
    println!("avgConf_Corrupt     = {:.2}", outcome.avg_confidence_corrupt);
    println!("Strongly confirmed  = {}", outcome.above_average);
    println!();
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("Total nodes        = {}", summary.nodes);
    println!("Corrupt nodes      = {}", summary.corrupt);
    println!("Corrupt %          = {}", summary.corrupt_percentage);
    println!("Rounds             = {}", summary.rounds);
    println!("Difficulty         = {}", summary.difficulty);
    println!("Reach              = {:.2}", summary.reach);
    println!("Seed               = {}", summary.seed);
    println!("txSent             = {}", summary.sent);
    println!("txConfirmed        = {}", summary.confirmed);
    println!("txConfirmed %      = {}", summary.confirmed_percentage);
    println!("Winner             = {}", summary.winner);
    println!("Duration (ms)      = {:.2}", summary.duration_ms());
    println!(
        "Broadcasts         = {} delivered, {} dropped",
        summary.network.delivered, summary.network.dropped
    );
}
