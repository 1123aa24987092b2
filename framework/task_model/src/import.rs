//! Import of exported task results.
//!
//! Exported files may contain records written by older releases. Two legacy shapes are
//! accepted and migrated here, once, at ingestion: the flat `{name: duration}` object
//! form of `atomic_actions`, and the `scenario_output` field that predates
//! [IterationOutput]. Wire-level error lists are converted to [IterationError] at the
//! same point. Everything downstream of this module only ever sees the current shapes.

use crate::types::{
    AtomicAction, Iteration, IterationError, IterationOutput, OutputChart, ScenarioKey,
    ScenarioResult, SlaResult,
};
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::collections::HashSet;
use std::io::Read;

/// Why a results source was rejected
///
/// Rejection is always per source: a bad record poisons its whole source, but callers
/// holding several sources may carry on with the others.
#[derive(Debug, thiserror::Error)]
pub enum ResultsError {
    /// The source could not be read at all
    #[error("failed to read task results from {source_label}: {reason}")]
    Unreadable { source_label: String, reason: String },
    /// The source is not JSON of the expected shape
    #[error("invalid task results format in {source_label}: {reason}")]
    InvalidFormat { source_label: String, reason: String },
    /// The source parsed but violates a data invariant
    #[error("invalid task results data in {source_label}: {reason}")]
    InvalidData { source_label: String, reason: String },
}

#[derive(Deserialize)]
struct RawScenarioResult {
    key: ScenarioKey,
    result: Vec<RawIteration>,
    sla: Vec<SlaResult>,
    #[serde(default)]
    hooks: Vec<serde_json::Value>,
    load_duration: f64,
    full_duration: f64,
    #[serde(default)]
    created_at: Option<NaiveDateTime>,
}

#[derive(Deserialize)]
struct RawIteration {
    #[serde(default)]
    timestamp: f64,
    duration: f64,
    #[serde(default)]
    idle_duration: f64,
    #[serde(default)]
    atomic_actions: RawAtomicActions,
    #[serde(default)]
    output: Option<IterationOutput>,
    #[serde(default)]
    scenario_output: Option<LegacyScenarioOutput>,
    #[serde(default)]
    error: Option<RawIterationError>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAtomicActions {
    /// Current shape, a list of nested action records
    Tree(Vec<AtomicAction>),
    /// Legacy shape, an ordered name to duration object
    Flat(serde_json::Map<String, serde_json::Value>),
}

impl Default for RawAtomicActions {
    fn default() -> Self {
        RawAtomicActions::Tree(Vec::new())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawIterationError {
    Parts(Vec<String>),
    Typed(IterationError),
}

#[derive(Deserialize)]
struct LegacyScenarioOutput {
    #[serde(default)]
    data: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    #[allow(dead_code)]
    errors: String,
}

impl RawScenarioResult {
    fn normalize(self) -> ScenarioResult {
        ScenarioResult {
            key: self.key,
            iterations: self
                .result
                .into_iter()
                .map(RawIteration::normalize)
                .collect(),
            sla: self.sla,
            hooks: self.hooks,
            load_duration: self.load_duration,
            full_duration: self.full_duration,
            created_at: self.created_at,
        }
    }
}

impl RawIteration {
    fn normalize(self) -> Iteration {
        let atomic_actions = match self.atomic_actions {
            RawAtomicActions::Tree(actions) => actions,
            RawAtomicActions::Flat(map) => flat_actions(map, self.timestamp),
        };
        let output = match (self.output, self.scenario_output) {
            (Some(output), _) => output,
            (None, Some(legacy)) => legacy.into_output(),
            (None, None) => IterationOutput::default(),
        };
        let error = match self.error {
            Some(RawIterationError::Parts(parts)) => IterationError::from_parts(&parts),
            Some(RawIterationError::Typed(error)) => Some(error),
            None => None,
        };
        Iteration {
            timestamp: self.timestamp,
            duration: self.duration,
            idle_duration: self.idle_duration,
            atomic_actions,
            output,
            error,
        }
    }
}

/// Rebuild a flat legacy object as a list of leaf actions
///
/// The legacy format never recorded start times, so the actions are assumed to have run
/// back to back from the start of the iteration.
fn flat_actions(
    map: serde_json::Map<String, serde_json::Value>,
    timestamp: f64,
) -> Vec<AtomicAction> {
    let mut started_at = timestamp;
    map.into_iter()
        .map(|(name, value)| {
            let duration = value.as_f64().unwrap_or(0.0);
            let action = AtomicAction::new(name, duration, started_at);
            started_at += duration;
            action
        })
        .collect()
}

impl LegacyScenarioOutput {
    fn into_output(self) -> IterationOutput {
        if self.data.is_empty() {
            return IterationOutput::default();
        }
        let items = self
            .data
            .into_iter()
            .map(|(name, value)| serde_json::Value::Array(vec![name.into(), value]))
            .collect();
        IterationOutput {
            additive: vec![OutputChart {
                data: serde_json::Value::Array(items),
                title: "Scenario output".to_string(),
                description: String::new(),
                chart_plugin: "StackedArea".to_string(),
            }],
            complete: Vec::new(),
        }
    }
}

/// Load and normalize exported task results from a reader
///
/// `source_label` names the source in any error, typically the file path. A source that
/// fails the schema or an invariant is rejected as a whole; no partial result set is
/// produced from it.
pub fn load_task_results<R: Read>(
    reader: R,
    source_label: &str,
) -> Result<Vec<ScenarioResult>, ResultsError> {
    let raw: Vec<RawScenarioResult> = serde_json::from_reader(std::io::BufReader::new(reader))
        .map_err(|e| ResultsError::InvalidFormat {
            source_label: source_label.to_string(),
            reason: e.to_string(),
        })?;
    log::debug!("Loaded {} scenario result(s) from {source_label}", raw.len());
    let results: Vec<ScenarioResult> = raw.into_iter().map(RawScenarioResult::normalize).collect();
    for result in &results {
        check_result(result).map_err(|reason| ResultsError::InvalidData {
            source_label: source_label.to_string(),
            reason,
        })?;
    }
    Ok(results)
}

/// Load task results from a JSON string, see [load_task_results]
pub fn load_task_results_str(
    json: &str,
    source_label: &str,
) -> Result<Vec<ScenarioResult>, ResultsError> {
    load_task_results(json.as_bytes(), source_label)
}

/// Check the invariants the schema cannot express
fn check_result(result: &ScenarioResult) -> Result<(), String> {
    let scenario = &result.key.name;
    for (field, value) in [
        ("load_duration", result.load_duration),
        ("full_duration", result.full_duration),
    ] {
        if !(value >= 0.0) {
            return Err(format!("scenario {scenario}: {field} must be non-negative"));
        }
    }
    for (idx, itr) in result.iterations.iter().enumerate() {
        for (field, value) in [
            ("duration", itr.duration),
            ("idle_duration", itr.idle_duration),
        ] {
            // Rejects NaN as well as negatives
            if !(value >= 0.0) {
                return Err(format!(
                    "scenario {scenario}: iteration {idx} has a {field} that is not non-negative"
                ));
            }
        }
        check_actions(&itr.atomic_actions, scenario, idx)?;
    }
    Ok(())
}

fn check_actions(actions: &[AtomicAction], scenario: &str, iteration: usize) -> Result<(), String> {
    let mut seen = HashSet::new();
    for action in actions {
        if !(action.duration >= 0.0) {
            return Err(format!(
                "scenario {scenario}: atomic action {:?} in iteration {iteration} has a \
                 duration that is not non-negative",
                action.name
            ));
        }
        if !seen.insert(action.name.as_str()) {
            return Err(format!(
                "scenario {scenario}: atomic action name {:?} repeats among siblings in \
                 iteration {iteration}",
                action.name
            ));
        }
        check_actions(&action.children, scenario, iteration)?;
    }
    Ok(())
}
