//! HTML rendering.
//!
//! The report is a single self-contained document: inline styling, data tables, and one
//! embedded JSON payload carrying every chart series. Drawing is delegated to a chart
//! script; with [ChartAssets::Offline] the script is omitted and the tables plus the
//! payload still carry every value the charts would have shown.

use crate::assemble::{ReportDocument, ScenarioReport};
use crate::render::{opt_float3, opt_percent};
use crate::stats::{SeriesStats, TrendStatistic};
use gust_task_model::ScenarioResult;
use itertools::Itertools;
use std::collections::HashMap;
use std::fmt::Write as _;

/// Where the document gets its chart script from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartAssets {
    /// Load the chart library from its CDN and draw charts in the browser
    #[default]
    Cdn,
    /// Emit no external references at all
    Offline,
}

/// Options for the trend report
#[derive(Debug, Clone, Copy, Default)]
pub struct TrendOptions {
    /// The statistic plotted for each scenario
    pub statistic: TrendStatistic,
    /// Chart script delivery, as for the main report
    pub assets: ChartAssets,
}

const CHART_SCRIPT_URL: &str =
    "https://cdn.jsdelivr.net/npm/chart.js@4.4.1/dist/chart.umd.min.js";

const STYLE: &str = "\
body { font-family: sans-serif; margin: 2em auto; max-width: 72em; color: #222; }
h1 { border-bottom: 2px solid #444; padding-bottom: 0.2em; }
section.scenario { margin-bottom: 3em; }
table { border-collapse: collapse; margin: 0.5em 0; }
th, td { border: 1px solid #bbb; padding: 0.3em 0.7em; text-align: left; }
th { background: #eee; }
td.num { text-align: right; }
pre { background: #f6f6f6; padding: 0.6em; overflow-x: auto; }
p.note { color: #666; font-style: italic; }
.fail { color: #a00; font-weight: bold; }
.pass { color: #070; }
div.chart { max-width: 64em; }
";

const GLUE_SCRIPT: &str = "\
(function () {
  var holder = document.getElementById('report-data');
  if (!holder || typeof Chart === 'undefined') { return; }
  var data = JSON.parse(holder.textContent);
  (data.scenarios || []).forEach(function (scenario, idx) {
    var canvas = document.getElementById('chart-' + idx);
    if (!canvas) { return; }
    var labels = scenario.durations.map(function (_, i) { return i + 1; });
    var datasets = [{ label: 'duration', data: scenario.durations }];
    scenario.atomic_names.forEach(function (name, n) {
      datasets.push({
        label: name,
        data: scenario.atomic_durations.map(function (row) { return row[n]; })
      });
    });
    new Chart(canvas, { type: 'line', data: { labels: labels, datasets: datasets } });
  });
  (data.trends || []).forEach(function (trend, idx) {
    var canvas = document.getElementById('trend-chart-' + idx);
    if (!canvas) { return; }
    new Chart(canvas, {
      type: 'line',
      data: {
        labels: trend.labels,
        datasets: [{ label: trend.statistic, data: trend.values }]
      }
    });
  });
})();
";

/// Render the document as a single HTML page
pub fn report(document: &ReportDocument, assets: ChartAssets) -> anyhow::Result<String> {
    let mut sections = String::new();
    if document.scenarios.is_empty() {
        sections.push_str("<p class=\"note\">No scenario results to report.</p>\n");
    }
    for (idx, scenario) in document.scenarios.iter().enumerate() {
        section(&mut sections, idx, scenario, assets)?;
    }
    let payload = payload_json(document)?;
    Ok(page("Benchmark report", &sections, &payload, assets))
}

/// Render the cross-task trend report
///
/// Results from any number of tasks are grouped by scenario name; each group becomes
/// one chart plotting the chosen statistic of the iteration durations per task
/// submission, ordered by submission time. Entries without a submission time keep
/// their input order and sort before dated ones.
pub fn trends(results: &[ScenarioResult], options: &TrendOptions) -> anyhow::Result<String> {
    let mut names: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&ScenarioResult>> = HashMap::new();
    for result in results {
        let name = result.key.name.as_str();
        if !groups.contains_key(name) {
            names.push(name);
        }
        groups.entry(name).or_default().push(result);
    }

    let mut sections = String::new();
    if names.is_empty() {
        sections.push_str("<p class=\"note\">No scenario results to plot.</p>\n");
    }
    let mut payload_trends = Vec::new();
    for (idx, name) in names.iter().enumerate() {
        let mut entries = groups[name].clone();
        entries.sort_by_key(|result| result.created_at);

        let mut labels = Vec::new();
        let mut values = Vec::new();
        for (run, result) in entries.iter().enumerate() {
            let durations: Vec<f64> =
                result.iterations.iter().map(|itr| itr.duration).collect();
            let stats = SeriesStats::from_values(&durations);
            let success_rate = (!result.iterations.is_empty())
                .then(|| result.success_count() as f64 / result.iterations.len() as f64);
            labels.push(match result.created_at {
                Some(created_at) => created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                None => format!("run {}", run + 1),
            });
            values.push(options.statistic.pick(&stats, success_rate));
        }

        trend_section(&mut sections, idx, name, &labels, &values, options)?;
        payload_trends.push(serde_json::json!({
            "name": name,
            "statistic": options.statistic.label(),
            "labels": labels,
            "values": values,
        }));
    }

    let payload = serde_json::to_string(&serde_json::json!({ "trends": payload_trends }))?;
    Ok(page(
        "Benchmark trends",
        &sections,
        &escape_payload(payload),
        options.assets,
    ))
}

fn section(
    out: &mut String,
    idx: usize,
    scenario: &ScenarioReport,
    assets: ChartAssets,
) -> anyhow::Result<()> {
    let result = &scenario.result;
    let key = &result.key;

    writeln!(out, "<section class=\"scenario\" id=\"scenario-{idx}\">")?;
    writeln!(
        out,
        "<h2>{} <small>(pos {})</small></h2>",
        html_escape(&key.name),
        key.pos
    )?;
    writeln!(
        out,
        "<details><summary>Arguments</summary><pre>{}</pre></details>",
        html_escape(&serde_json::to_string_pretty(&key.kw)?)
    )?;

    let errors: Vec<_> = result
        .iterations
        .iter()
        .filter_map(|itr| itr.error.as_ref())
        .collect();
    if !errors.is_empty() {
        writeln!(out, "<h3>Errors ({})</h3>", errors.len())?;
        writeln!(out, "<table><tr><th>Type</th><th>Message</th></tr>")?;
        for error in errors {
            writeln!(
                out,
                "<tr><td>{}</td><td>{}</td></tr>",
                html_escape(&error.error_type),
                html_escape(&error.message)
            )?;
        }
        writeln!(out, "</table>")?;
    }

    writeln!(out, "<h3>Response times (sec)</h3>")?;
    stats_table(out, scenario)?;

    if assets == ChartAssets::Cdn {
        writeln!(
            out,
            "<div class=\"chart\"><canvas id=\"chart-{idx}\"></canvas></div>"
        )?;
    }

    for output in &scenario.outputs {
        writeln!(out, "<h3>{}</h3>", html_escape(&output.title))?;
        if !output.description.is_empty() {
            writeln!(out, "<p>{}</p>", html_escape(&output.description))?;
        }
        writeln!(
            out,
            "<table><tr><th>Key</th><th>Min</th><th>Max</th><th>Avg</th>\
             <th>90%ile</th><th>95%ile</th><th>Count</th></tr>"
        )?;
        for row in &output.rows {
            writeln!(
                out,
                "<tr><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td>\
                 <td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td>\
                 <td class=\"num\">{}</td></tr>",
                html_escape(&row.name),
                opt_float3(&row.stats.min),
                opt_float3(&row.stats.max),
                opt_float3(&row.stats.avg),
                opt_float3(&row.stats.p90),
                opt_float3(&row.stats.p95),
                row.stats.count
            )?;
        }
        writeln!(out, "</table>")?;
    }

    let complete_titles = result
        .iterations
        .iter()
        .flat_map(|itr| itr.output.complete.iter())
        .map(|chart| chart.title.as_str())
        .unique()
        .join(", ");
    if !complete_titles.is_empty() {
        writeln!(
            out,
            "<p class=\"note\">Per-iteration charts recorded: {}</p>",
            html_escape(&complete_titles)
        )?;
    }

    if !result.sla.is_empty() {
        writeln!(out, "<h3>SLA</h3>")?;
        writeln!(
            out,
            "<table><tr><th>Criterion</th><th>Status</th><th>Detail</th></tr>"
        )?;
        for sla in &result.sla {
            let (class, status) = if sla.success {
                ("pass", "PASS")
            } else {
                ("fail", "FAIL")
            };
            writeln!(
                out,
                "<tr><td>{}</td><td class=\"{class}\">{status}</td><td>{}</td></tr>",
                html_escape(&sla.criterion),
                html_escape(&sla.detail)
            )?;
        }
        writeln!(out, "</table>")?;
    }

    writeln!(
        out,
        "<p>Load duration: {:.3} s. Full duration: {:.3} s.</p>",
        result.load_duration, result.full_duration
    )?;
    writeln!(out, "</section>")?;
    Ok(())
}

fn stats_table(out: &mut String, scenario: &ScenarioReport) -> anyhow::Result<()> {
    writeln!(
        out,
        "<table><tr><th>Action</th><th>Min (sec)</th><th>Max (sec)</th><th>Avg (sec)</th>\
         <th>90%ile (sec)</th><th>95%ile (sec)</th><th>Success</th><th>Count</th></tr>"
    )?;
    for row in &scenario.stats.rows {
        writeln!(
            out,
            "<tr><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td>\
             <td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td>\
             <td class=\"num\">{}</td><td class=\"num\">{}</td></tr>",
            html_escape(&row.action),
            opt_float3(&row.stats.min),
            opt_float3(&row.stats.max),
            opt_float3(&row.stats.avg),
            opt_float3(&row.stats.p90),
            opt_float3(&row.stats.p95),
            opt_percent(&row.success_rate),
            row.stats.count
        )?;
    }
    writeln!(out, "</table>")?;
    Ok(())
}

fn trend_section(
    out: &mut String,
    idx: usize,
    name: &str,
    labels: &[String],
    values: &[Option<f64>],
    options: &TrendOptions,
) -> anyhow::Result<()> {
    writeln!(out, "<section class=\"scenario\" id=\"trend-{idx}\">")?;
    writeln!(out, "<h2>{}</h2>", html_escape(name))?;
    if options.assets == ChartAssets::Cdn {
        writeln!(
            out,
            "<div class=\"chart\"><canvas id=\"trend-chart-{idx}\"></canvas></div>"
        )?;
    }
    writeln!(
        out,
        "<table><tr><th>Submitted</th><th>{}</th></tr>",
        html_escape(options.statistic.label())
    )?;
    for (label, value) in labels.iter().zip(values) {
        let cell = match options.statistic {
            TrendStatistic::SuccessRate => opt_percent(value),
            _ => opt_float3(value),
        };
        writeln!(
            out,
            "<tr><td>{}</td><td class=\"num\">{cell}</td></tr>",
            html_escape(label)
        )?;
    }
    writeln!(out, "</table>")?;
    writeln!(out, "</section>")?;
    Ok(())
}

fn payload_json(document: &ReportDocument) -> anyhow::Result<String> {
    let scenarios: Vec<serde_json::Value> = document
        .scenarios
        .iter()
        .map(|scenario| {
            let durations: Vec<f64> = scenario
                .result
                .iterations
                .iter()
                .map(|itr| itr.duration)
                .collect();
            let atomic_durations: Vec<Vec<f64>> = scenario
                .result
                .iterations
                .iter()
                .map(|itr| scenario.merged.durations_for(itr))
                .collect();
            let additive: Vec<_> = scenario
                .result
                .iterations
                .iter()
                .map(|itr| &itr.output.additive)
                .collect();
            let complete: Vec<_> = scenario
                .result
                .iterations
                .iter()
                .map(|itr| &itr.output.complete)
                .collect();
            serde_json::json!({
                "name": scenario.result.key.name,
                "pos": scenario.result.key.pos,
                "sla_success": !scenario.result.sla_failed(),
                "durations": durations,
                "atomic_names": scenario.merged.names(),
                "atomic_durations": atomic_durations,
                "stats": scenario.stats,
                "outputs": scenario.outputs,
                "additive": additive,
                "complete": complete,
            })
        })
        .collect();
    let payload = serde_json::to_string(&serde_json::json!({ "scenarios": scenarios }))?;
    Ok(escape_payload(payload))
}

fn page(title: &str, sections: &str, payload: &str, assets: ChartAssets) -> String {
    let scripts = match assets {
        ChartAssets::Cdn => format!(
            "<script src=\"{CHART_SCRIPT_URL}\"></script>\n<script>{GLUE_SCRIPT}</script>\n"
        ),
        ChartAssets::Offline => String::new(),
    };
    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>{title}</title>\n\
         <style>{STYLE}</style>\n\
         </head>\n\
         <body>\n\
         <h1>{title}</h1>\n\
         {sections}\
         <script type=\"application/json\" id=\"report-data\">{payload}</script>\n\
         {scripts}\
         </body>\n\
         </html>\n"
    )
}

pub(crate) fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Keep the embedded JSON from terminating its own script element
///
/// `<\/` is the same JSON string as `</`, but the HTML parser no longer sees a closing
/// tag in it.
fn escape_payload(payload: String) -> String {
    payload.replace("</", "<\\/")
}
