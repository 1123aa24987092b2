//! Plain-text rendering.

use crate::assemble::{assemble, ReportDocument, ScenarioReport};
use crate::render::{opt_float3, opt_percent, RenderOptions};
use crate::stats::{OutputStatsRow, StatsRow};
use gust_task_model::TaskResult;
use std::fmt::Write as _;
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::{Table, Tabled};

const RULE_WIDTH: usize = 80;

/// One display row of the response-times table
#[derive(Tabled)]
struct ResponseTimesRow {
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Min (sec)", display = "opt_float3")]
    min: Option<f64>,
    #[tabled(rename = "Max (sec)", display = "opt_float3")]
    max: Option<f64>,
    #[tabled(rename = "Avg (sec)", display = "opt_float3")]
    avg: Option<f64>,
    #[tabled(rename = "90%ile (sec)", display = "opt_float3")]
    p90: Option<f64>,
    #[tabled(rename = "95%ile (sec)", display = "opt_float3")]
    p95: Option<f64>,
    #[tabled(rename = "Success", display = "opt_percent")]
    success: Option<f64>,
    #[tabled(rename = "Count")]
    count: usize,
}

impl From<&StatsRow> for ResponseTimesRow {
    fn from(row: &StatsRow) -> Self {
        Self {
            action: row.action.clone(),
            min: row.stats.min,
            max: row.stats.max,
            avg: row.stats.avg,
            p90: row.stats.p90,
            p95: row.stats.p95,
            success: row.success_rate,
            count: row.stats.count,
        }
    }
}

/// One display row of an additive output table
#[derive(Tabled)]
struct OutputRow {
    #[tabled(rename = "Key")]
    name: String,
    #[tabled(rename = "Min", display = "opt_float3")]
    min: Option<f64>,
    #[tabled(rename = "Max", display = "opt_float3")]
    max: Option<f64>,
    #[tabled(rename = "Avg", display = "opt_float3")]
    avg: Option<f64>,
    #[tabled(rename = "90%ile", display = "opt_float3")]
    p90: Option<f64>,
    #[tabled(rename = "95%ile", display = "opt_float3")]
    p95: Option<f64>,
    #[tabled(rename = "Count")]
    count: usize,
}

impl From<&OutputStatsRow> for OutputRow {
    fn from(row: &OutputStatsRow) -> Self {
        Self {
            name: row.name.clone(),
            min: row.stats.min,
            max: row.stats.max,
            avg: row.stats.avg,
            p90: row.stats.p90,
            p95: row.stats.p95,
            count: row.stats.count,
        }
    }
}

/// Render the document as plain-text tables
pub fn report(document: &ReportDocument, options: &RenderOptions) -> anyhow::Result<String> {
    let mut out = String::new();
    for scenario in &document.scenarios {
        scenario_details(&mut out, scenario, options)?;
    }
    Ok(out)
}

/// Text details of one task bundle
///
/// Tasks that crashed or failed validation never produced results; for those the
/// verification log is shown instead of result tables.
pub fn task_details(task: &TaskResult, options: &RenderOptions) -> anyhow::Result<String> {
    let mut out = String::new();
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(out, "Task status: {}", task.status)?;
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(out)?;

    if !task.status.is_reportable() {
        match task.verification() {
            Some(verification) => {
                writeln!(out, "{}: {}", verification.etype, verification.msg)?;
                if options.verbose && !verification.trace.is_empty() {
                    writeln!(out, "{}", verification.trace)?;
                }
            }
            None => {
                writeln!(out, "No verification details were recorded for this task.")?;
            }
        }
        writeln!(out)?;
        return Ok(out);
    }

    let document = assemble(task.results.iter().cloned());
    out.push_str(&report(&document, options)?);
    Ok(out)
}

fn scenario_details(
    out: &mut String,
    scenario: &ScenarioReport,
    options: &RenderOptions,
) -> anyhow::Result<()> {
    let result = &scenario.result;
    let key = &result.key;

    writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
    writeln!(out, "Scenario {} (pos {})", key.name, key.pos)?;
    writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
    writeln!(out)?;
    writeln!(out, "Arguments:")?;
    writeln!(out, "{}", serde_json::to_string_pretty(&key.kw)?)?;
    writeln!(out)?;

    error_block(out, scenario, options)?;

    writeln!(out, "Response Times (sec):")?;
    let rows: Vec<ResponseTimesRow> = scenario.stats.rows.iter().map(Into::into).collect();
    writeln!(out, "{}", styled(Table::new(rows)))?;
    writeln!(out)?;

    if options.iterations_data && !result.iterations.is_empty() {
        writeln!(out, "Atomics per iteration:")?;
        writeln!(out, "{}", iterations_table(scenario))?;
        writeln!(out)?;
    }

    for output in &scenario.outputs {
        writeln!(out, "{}:", output.title)?;
        if !output.description.is_empty() {
            writeln!(out, "{}", output.description)?;
        }
        let rows: Vec<OutputRow> = output.rows.iter().map(Into::into).collect();
        writeln!(out, "{}", styled(Table::new(rows)))?;
        writeln!(out)?;
    }

    writeln!(out, "Load duration: {:.3}", result.load_duration)?;
    writeln!(out, "Full duration: {:.3}", result.full_duration)?;
    writeln!(out)?;
    Ok(())
}

fn error_block(
    out: &mut String,
    scenario: &ScenarioReport,
    options: &RenderOptions,
) -> anyhow::Result<()> {
    let errors: Vec<_> = scenario
        .result
        .iterations
        .iter()
        .filter_map(|itr| itr.error.as_ref())
        .collect();
    if errors.is_empty() {
        return Ok(());
    }

    writeln!(out, "Scenario has {} error(s):", errors.len())?;
    writeln!(out)?;
    for error in errors {
        writeln!(out, "{}: {}", error.error_type, error.message)?;
        if options.verbose && !error.traceback.is_empty() {
            writeln!(out, "{}", error.traceback)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// The per-iteration breakdown, one column per canonical atomic action
fn iterations_table(scenario: &ScenarioReport) -> Table {
    let mut builder = Builder::default();

    let mut header = vec!["iteration".to_string(), "duration".to_string()];
    header.extend(
        scenario
            .merged
            .names()
            .iter()
            .enumerate()
            .map(|(idx, name)| format!("{}. {name}", idx + 1)),
    );
    builder.push_record(header);

    for (idx, iteration) in scenario.result.iterations.iter().enumerate() {
        let mut record = vec![(idx + 1).to_string(), format!("{:.3}", iteration.duration)];
        record.extend(
            scenario
                .merged
                .durations_for(iteration)
                .into_iter()
                .map(|duration| format!("{duration:.3}")),
        );
        builder.push_record(record);
    }

    styled(builder.build())
}

fn styled(mut table: Table) -> Table {
    table.with(Style::modern());
    table
}
