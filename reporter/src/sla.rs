//! Summaries of recorded SLA verdicts.
//!
//! Criteria are evaluated while a task runs; this module only collects the recorded
//! verdicts into something a gate script or a human can act on.

use gust_task_model::ScenarioResult;
use itertools::Itertools;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// One verdict row of an [SlaCheck]
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct SlaCheckRow {
    #[tabled(rename = "Scenario")]
    pub scenario: String,
    #[tabled(rename = "Pos")]
    pub pos: usize,
    #[tabled(rename = "Criterion")]
    pub criterion: String,
    #[tabled(rename = "Status", display = "pass_fail")]
    pub success: bool,
    #[tabled(rename = "Detail")]
    pub detail: String,
}

fn pass_fail(success: &bool) -> String {
    if *success { "PASS" } else { "FAIL" }.to_string()
}

/// Every recorded SLA verdict across a set of scenario entries
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlaCheck {
    pub rows: Vec<SlaCheckRow>,
    /// Number of criteria that failed
    ///
    /// Meant to feed an exit code: zero means every recorded criterion held.
    pub failed: usize,
}

/// Collect the SLA verdicts of every scenario entry
///
/// Rows keep the scenario order; within one scenario the criteria are sorted by name so
/// repeated checks line up between runs.
pub fn sla_check(results: &[ScenarioResult]) -> SlaCheck {
    let mut rows = Vec::new();
    for result in results {
        for sla in result
            .sla
            .iter()
            .sorted_by(|a, b| a.criterion.cmp(&b.criterion))
        {
            rows.push(SlaCheckRow {
                scenario: result.key.name.clone(),
                pos: result.key.pos,
                criterion: sla.criterion.clone(),
                success: sla.success,
                detail: sla.detail.clone(),
            });
        }
    }
    let failed = rows.iter().filter(|row| !row.success).count();
    SlaCheck { rows, failed }
}

impl SlaCheck {
    /// Plain-text table of the verdicts
    pub fn to_table(&self) -> String {
        let mut table = Table::new(&self.rows);
        table.with(Style::modern());
        table.to_string()
    }

    /// JSON rendering of the verdicts
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
