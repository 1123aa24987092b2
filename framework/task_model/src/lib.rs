//! Data model for task results.
//!
//! A *task* is one submission to a benchmark execution engine. Each task records a list
//! of *scenario results*; each scenario result records per-iteration measurements,
//! including a tree of timed *atomic actions*, workload-produced output series and the
//! recorded SLA verdicts. This crate owns those shapes, the JSON import/export helpers,
//! and the migration of legacy record shapes into the current ones.
//!
//! Iteration order is part of the data: nothing in this crate reorders iterations or
//! atomic actions.

mod import;
mod types;

pub use import::{load_task_results, load_task_results_str, ResultsError};
pub use types::{
    AtomicAction, Iteration, IterationError, IterationOutput, OutputChart, ScenarioKey,
    ScenarioResult, SlaResult, TaskResult, TaskStatus, VerificationLog,
};

use std::io::Write;
use std::path::PathBuf;

/// Load task results from an exported JSON file
///
/// The file holds a JSON array of scenario result records, as written by
/// [store_task_results]. Records written by older releases are migrated on the way in.
pub fn load_task_results_file(path: PathBuf) -> Result<Vec<ScenarioResult>, ResultsError> {
    let source_label = path.display().to_string();
    let file = std::fs::File::open(&path).map_err(|e| ResultsError::Unreadable {
        source_label: source_label.clone(),
        reason: e.to_string(),
    })?;
    load_task_results(file, &source_label)
}

/// Serialize task results to a writer as pretty-printed JSON
///
/// The output always uses the current record shapes, whatever shape the results were
/// originally loaded from.
pub fn store_task_results<W: Write>(
    results: &[ScenarioResult],
    writer: &mut W,
) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(writer, results)?;
    Ok(())
}
