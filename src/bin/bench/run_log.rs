// Per-Run JSONL Recorder
// Outputs one JSON line per simulation run for independent analysis

use std::io::Write;
use std::path::Path;

use crate::report::BenchResult;

/// Accumulates per-run rows and writes them as JSONL.
pub struct RunLog {
    lines: Vec<String>,
}

impl RunLog {
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    pub fn record(&mut self, result: &BenchResult) {
        // A row of numbers and owned strings always serializes.
        if let Ok(line) = serde_json::to_string(result) {
            self.lines.push(line);
        }
    }

    pub fn write_jsonl(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
        for line in &self.lines {
            writeln!(file, "{line}")?;
        }
        file.flush()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }
}
