use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single timed step recorded inside one iteration
///
/// Atomic actions form a tree. A parent's duration covers whatever the workload chose to
/// time; children are not required to partition it and the tree is not required to cover
/// the whole iteration, so durations of overlapping levels must never be summed blindly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomicAction {
    /// The action name
    ///
    /// Unique among its siblings. The same name may appear again at another depth or
    /// under another parent, where it identifies a different action.
    pub name: String,
    /// Wall-clock duration of this action, in seconds
    pub duration: f64,
    /// Unix timestamp at which the action started, in seconds
    #[serde(default)]
    pub started_at: f64,
    /// Actions recorded while this action was running
    #[serde(default)]
    pub children: Vec<AtomicAction>,
}

impl AtomicAction {
    /// Create a leaf action
    pub fn new(name: impl Into<String>, duration: f64, started_at: f64) -> Self {
        Self {
            name: name.into(),
            duration,
            started_at,
            children: Vec::new(),
        }
    }
}

/// One data series attached to an iteration by the workload itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputChart {
    /// Chart payload, opaque to the reporting pipeline
    ///
    /// Additive series carry `[name, value]` pairs so that values can be aggregated
    /// across iterations. Complete series carry whatever the chart widget expects.
    pub data: serde_json::Value,
    /// Chart title
    ///
    /// Additive series with the same title are aggregated into one table.
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Name of the chart widget expected to draw this series
    pub chart_plugin: String,
}

/// Workload-produced output of one iteration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IterationOutput {
    /// Series aggregated across iterations
    #[serde(default)]
    pub additive: Vec<OutputChart>,
    /// Standalone per-iteration series
    #[serde(default)]
    pub complete: Vec<OutputChart>,
}

impl IterationOutput {
    pub fn is_empty(&self) -> bool {
        self.additive.is_empty() && self.complete.is_empty()
    }
}

/// Failure recorded for one iteration
///
/// Presence of an error is what marks the iteration as failed. The timing fields of a
/// failed iteration are still valid measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationError {
    pub error_type: String,
    pub message: String,
    #[serde(default)]
    pub traceback: String,
}

impl IterationError {
    /// Build from the wire form, a list of up to three strings
    ///
    /// Older writers recorded `[type, message, traceback]` and dropped trailing entries
    /// they had no value for. An empty list means the iteration did not fail.
    pub fn from_parts(parts: &[String]) -> Option<Self> {
        if parts.is_empty() {
            return None;
        }
        let part = |idx: usize, fallback: &str| {
            parts
                .get(idx)
                .cloned()
                .unwrap_or_else(|| fallback.to_string())
        };
        Some(Self {
            error_type: part(0, "unknown"),
            message: part(1, "n/a"),
            traceback: part(2, "no traceback recorded"),
        })
    }
}

/// One measured pass of a scenario's workload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Iteration {
    /// Unix timestamp at which the iteration started, in seconds
    #[serde(default)]
    pub timestamp: f64,
    /// Wall-clock duration of the workload, in seconds
    pub duration: f64,
    /// Time this iteration spent waiting on the runner rather than in the workload
    #[serde(default)]
    pub idle_duration: f64,
    /// Timed steps recorded during this iteration, in document order
    #[serde(default)]
    pub atomic_actions: Vec<AtomicAction>,
    /// Workload-produced output series
    #[serde(default)]
    pub output: IterationOutput,
    /// The error that failed this iteration, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<IterationError>,
}

impl Iteration {
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Identity of one scenario entry within a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioKey {
    /// The scenario name
    pub name: String,
    /// Positional index distinguishing repeated entries of the same scenario
    #[serde(default)]
    pub pos: usize,
    /// The scenario arguments, kept verbatim for display and export
    #[serde(default)]
    pub kw: serde_json::Value,
}

/// Recorded verdict of one SLA criterion
///
/// Criteria are evaluated by the execution engine while the task runs. Only the recorded
/// verdicts flow through the reporting pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlaResult {
    /// The criterion name
    pub criterion: String,
    /// Whether the criterion held
    pub success: bool,
    /// Human-readable explanation of the verdict
    #[serde(default)]
    pub detail: String,
}

/// Everything recorded for one scenario entry of a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Scenario identity within the task
    pub key: ScenarioKey,
    /// Per-iteration measurements, in execution order
    ///
    /// The order is preserved through the whole pipeline. Renderers that show
    /// per-iteration rows show them in exactly this order.
    #[serde(rename = "result")]
    pub iterations: Vec<Iteration>,
    /// Recorded SLA verdicts
    pub sla: Vec<SlaResult>,
    /// Hook results, kept verbatim for export
    #[serde(default)]
    pub hooks: Vec<serde_json::Value>,
    /// Time spent generating load, in seconds
    pub load_duration: f64,
    /// Wall-clock duration of the whole scenario entry, in seconds
    pub full_duration: f64,
    /// When the task containing this entry was submitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
}

impl ScenarioResult {
    /// Number of iterations that did not record an error
    pub fn success_count(&self) -> usize {
        self.iterations.iter().filter(|itr| !itr.failed()).count()
    }

    /// Whether any SLA criterion failed
    pub fn sla_failed(&self) -> bool {
        self.sla.iter().any(|sla| !sla.success)
    }
}

/// Lifecycle state a task ended in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Init,
    Running,
    Finished,
    Aborted,
    Crashed,
    ValidationFailed,
}

impl TaskStatus {
    /// Whether results recorded under this status can be reported
    ///
    /// An aborted task still carries the measurements taken up to the abort, so it is
    /// reportable alongside finished tasks.
    pub fn is_reportable(self) -> bool {
        matches!(self, TaskStatus::Finished | TaskStatus::Aborted)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            TaskStatus::Init => "init",
            TaskStatus::Running => "running",
            TaskStatus::Finished => "finished",
            TaskStatus::Aborted => "aborted",
            TaskStatus::Crashed => "crashed",
            TaskStatus::ValidationFailed => "validation_failed",
        };
        f.write_str(tag)
    }
}

/// A task bundle as handed over by the execution engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    /// The status the task ended in
    pub status: TaskStatus,
    /// Scenario results recorded by the task, in execution order
    #[serde(default)]
    pub results: Vec<ScenarioResult>,
    /// Failure report for tasks that never got to produce results
    ///
    /// Set for crashed tasks and tasks that failed validation. The content is a JSON
    /// document, see [TaskResult::verification].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_log: Option<String>,
}

/// Parsed form of [TaskResult::verification_log]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationLog {
    /// The failure type
    #[serde(default)]
    pub etype: String,
    /// The failure message
    #[serde(default)]
    pub msg: String,
    /// The failure traceback
    #[serde(default)]
    pub trace: String,
}

impl TaskResult {
    /// Parse the verification log, tolerating missing or malformed content
    pub fn verification(&self) -> Option<VerificationLog> {
        let raw = self.verification_log.as_deref()?;
        match serde_json::from_str(raw) {
            Ok(log) => Some(log),
            Err(e) => {
                log::debug!("Discarding unparseable verification log: {e}");
                None
            }
        }
    }
}
