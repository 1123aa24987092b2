//! Turns stored task results into reports.
//!
//! The input is the JSON produced by a benchmark run, loaded through
//! [`gust_task_model`]. From there the pipeline is
//! [`assemble::assemble`] to build a [`ReportDocument`] and then one of
//! the renderers in [`render`] to produce text, HTML or JUnit output.
//! [`sla_check`] and [`trends`] cover the two views that do not go
//! through the document at all.

use gust_task_model::{ScenarioResult, TaskResult};

pub mod assemble;
pub mod merge;
pub mod render;
pub mod sla;
pub mod stats;

pub use assemble::{assemble, ReportDocument, ScenarioReport};
pub use render::html::{ChartAssets, TrendOptions};
pub use render::{RenderOptions, ReportFormat, UnknownFormatError};
pub use sla::{sla_check, SlaCheck};
pub use stats::TrendStatistic;

/// Renders scenario results in the requested format.
///
/// The format must already be parsed: callers are expected to reject an
/// unknown format tag before any result is loaded or processed.
pub fn render_report(
    results: Vec<ScenarioResult>,
    format: ReportFormat,
    options: &RenderOptions,
) -> anyhow::Result<String> {
    let document = assemble(results);
    render::render(&document, format, options)
}

/// Renders the trends page for repeated runs of the same scenarios.
pub fn trends(results: &[ScenarioResult], options: &TrendOptions) -> anyhow::Result<String> {
    render::html::trends(results, options)
}

/// Renders a whole task, including tasks that never produced results.
pub fn task_report(task: &TaskResult, options: &RenderOptions) -> anyhow::Result<String> {
    render::text::task_details(task, options)
}

/// Serialises scenario results back to their stored JSON form.
///
/// The output is the data itself rather than a report, so it has no
/// [`ReportFormat`] variant.
pub fn export_results_json(results: &[ScenarioResult]) -> anyhow::Result<String> {
    let mut out = Vec::new();
    gust_task_model::store_task_results(results, &mut out)?;
    Ok(String::from_utf8(out)?)
}
