// Scenario Definitions — the standard PoW vs DAG comparison grid
// Each scenario fixes (N, C, R, D, p); seeds come from the Monte Carlo runner

use ledger_arena::SimParams;

// ─── Scenario Configuration ─────────────────────────────────────────────────

pub struct Scenario {
    pub name: &'static str,
    pub label: &'static str,
    pub category: &'static str,
    pub nodes: usize,
    pub corrupt: usize,
    pub rounds: usize,
    pub difficulty: u32,
    pub reach: f64,
}

impl Scenario {
    /// Parameters for one run of this scenario.
    pub fn params(&self, seed: u64, verbose: bool) -> SimParams {
        SimParams::new(self.nodes, self.corrupt, self.rounds, self.difficulty, self.reach)
            .with_seed(seed)
            .with_verbose(verbose)
    }

    pub fn matches(&self, filter: &str) -> bool {
        let f = filter.to_lowercase();
        self.name.to_lowercase().contains(&f)
            || self.label.to_lowercase().contains(&f)
            || self.category.to_lowercase().contains(&f)
    }
}

// ─── Scenario Table ─────────────────────────────────────────────────────────

pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "SMALL_HALF_REACH",
            label: "Small net, half reach",
            category: "baseline",
            nodes: 4, corrupt: 1, rounds: 1, difficulty: 1, reach: 0.5,
        },
        Scenario {
            name: "MEDIUM_MIXED",
            label: "Six nodes, two corrupt",
            category: "baseline",
            nodes: 6, corrupt: 2, rounds: 2, difficulty: 2, reach: 0.75,
        },
        Scenario {
            name: "FULL_REACH",
            label: "Eight nodes, full reach",
            category: "load",
            nodes: 8, corrupt: 3, rounds: 3, difficulty: 2, reach: 1.0,
        },
        Scenario {
            name: "MORE_NODES",
            label: "Ten nodes, four corrupt",
            category: "load",
            nodes: 10, corrupt: 4, rounds: 3, difficulty: 2, reach: 0.8,
        },
        Scenario {
            name: "HIGH_DIFFICULTY",
            label: "Difficulty 3, one corrupt",
            category: "difficulty",
            nodes: 6, corrupt: 1, rounds: 3, difficulty: 3, reach: 0.5,
        },
        Scenario {
            name: "CORRUPT_PARITY",
            label: "Half the network corrupt",
            category: "adversary",
            nodes: 4, corrupt: 2, rounds: 1, difficulty: 1, reach: 1.0,
        },
    ]
}

/// A one-off scenario built from command-line parameters.
pub fn custom(params: &SimParams) -> Scenario {
    Scenario {
        name: "CUSTOM",
        label: "Command-line parameters",
        category: "custom",
        nodes: params.nodes,
        corrupt: params.corrupt,
        rounds: params.rounds,
        difficulty: params.difficulty,
        reach: params.reach,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_valid() {
        for scenario in scenarios() {
            assert!(scenario.params(0, false).validate().is_ok(), "{}", scenario.name);
        }
    }

    #[test]
    fn test_filter_matches_name_label_and_category() {
        let table = scenarios();
        assert_eq!(table.iter().filter(|s| s.matches("load")).count(), 2);
        assert_eq!(table.iter().filter(|s| s.matches("parity")).count(), 1);
        assert_eq!(table.iter().filter(|s| s.matches("difficulty 3")).count(), 1);
    }
}
