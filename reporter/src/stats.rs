//! Descriptive statistics over scenario measurements.
//!
//! Everything here works in full precision; rounding for display is the renderer's job.

use crate::merge::{action_durations, MergedAtomics};
use gust_task_model::Iteration;
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;

/// Row name of the whole-iteration summary in a [StatsTable]
pub const TOTAL_ROW: &str = "total";
/// Row name used when a scenario recorded no iterations at all
pub const NO_DATA_ROW: &str = "no data";

/// Linear-interpolation percentile of an unsorted series
///
/// `fraction` is in `0.0..=1.0`. The rank `(len - 1) * fraction` is interpolated
/// between its floor and ceiling neighbours. Returns None for an empty series.
pub fn percentile(values: &[f64], fraction: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let rank = (sorted.len() - 1) as f64 * fraction;
    let low = rank.floor() as usize;
    let high = rank.ceil() as usize;
    if low == high {
        return Some(sorted[low]);
    }
    Some(sorted[low] * (high as f64 - rank) + sorted[high] * (rank - low as f64))
}

/// Descriptive statistics of one series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesStats {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
    pub p90: Option<f64>,
    pub p95: Option<f64>,
    pub count: usize,
}

impl SeriesStats {
    pub fn from_values(values: &[f64]) -> Self {
        let count = values.len();
        if count == 0 {
            return Self {
                min: None,
                max: None,
                avg: None,
                p90: None,
                p95: None,
                count,
            };
        }
        Self {
            min: Some(values.iter().copied().fold(f64::INFINITY, f64::min)),
            max: Some(values.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
            avg: Some(values.iter().sum::<f64>() / count as f64),
            p90: percentile(values, 0.90),
            p95: percentile(values, 0.95),
            count,
        }
    }
}

/// One row of a [StatsTable]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsRow {
    /// Canonical action display path, or [TOTAL_ROW], or [NO_DATA_ROW]
    pub action: String,
    pub stats: SeriesStats,
    /// Successful iterations over all iterations of the scenario
    ///
    /// A property of the scenario, not of the row, so every row carries the same value.
    pub success_rate: Option<f64>,
}

/// The response-times table of one scenario
///
/// One row per canonical atomic action followed by a [TOTAL_ROW] over the iteration
/// durations. Durations of failed iterations are included in every statistic: the
/// timing is a fact regardless of the logical outcome, and only the success-rate
/// column reflects failures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsTable {
    pub rows: Vec<StatsRow>,
}

impl StatsTable {
    /// Build the table for one scenario's iterations
    ///
    /// Each action row summarizes the iterations that recorded the action, so its count
    /// column says how many did. A scenario with no iterations at all produces a single
    /// [NO_DATA_ROW] placeholder instead of failing.
    pub fn build(iterations: &[Iteration], merged: &MergedAtomics) -> Self {
        if iterations.is_empty() {
            return Self {
                rows: vec![StatsRow {
                    action: NO_DATA_ROW.to_string(),
                    stats: SeriesStats::from_values(&[]),
                    success_rate: None,
                }],
            };
        }

        let successful = iterations.iter().filter(|itr| !itr.failed()).count();
        let success_rate = Some(successful as f64 / iterations.len() as f64);

        let mut series: HashMap<String, Vec<f64>> = HashMap::new();
        for iteration in iterations {
            for (path, duration) in action_durations(iteration) {
                series.entry(path).or_default().push(duration);
            }
        }

        let mut rows: Vec<StatsRow> = merged
            .names()
            .iter()
            .map(|name| StatsRow {
                action: name.clone(),
                stats: SeriesStats::from_values(
                    series.get(name).map(Vec::as_slice).unwrap_or_default(),
                ),
                success_rate,
            })
            .collect();

        let durations: Vec<f64> = iterations.iter().map(|itr| itr.duration).collect();
        rows.push(StatsRow {
            action: TOTAL_ROW.to_string(),
            stats: SeriesStats::from_values(&durations),
            success_rate,
        });

        Self { rows }
    }

    /// Whether the table holds only the no-data placeholder
    pub fn is_placeholder(&self) -> bool {
        self.rows.len() == 1 && self.rows[0].action == NO_DATA_ROW
    }
}

/// Aggregated view of one additive output series across iterations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputStatsTable {
    pub title: String,
    pub description: String,
    pub chart_plugin: String,
    pub rows: Vec<OutputStatsRow>,
}

/// One named value series of an additive output chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputStatsRow {
    pub name: String,
    pub stats: SeriesStats,
}

/// Aggregate the additive output series of a scenario, grouped by chart title
///
/// Tables appear in the order their titles were first seen; rows keep the order the
/// series names were first seen. Items that are not a `[name, value]` pair are skipped.
pub fn output_stats(iterations: &[Iteration]) -> Vec<OutputStatsTable> {
    struct Accumulator {
        title: String,
        description: String,
        chart_plugin: String,
        names: Vec<String>,
        series: HashMap<String, Vec<f64>>,
    }

    let mut tables: Vec<Accumulator> = Vec::new();
    let mut table_index: HashMap<String, usize> = HashMap::new();

    for iteration in iterations {
        for chart in &iteration.output.additive {
            let idx = match table_index.get(&chart.title) {
                Some(&idx) => idx,
                None => {
                    table_index.insert(chart.title.clone(), tables.len());
                    tables.push(Accumulator {
                        title: chart.title.clone(),
                        description: chart.description.clone(),
                        chart_plugin: chart.chart_plugin.clone(),
                        names: Vec::new(),
                        series: HashMap::new(),
                    });
                    tables.len() - 1
                }
            };
            let table = &mut tables[idx];
            let Some(items) = chart.data.as_array() else {
                log::debug!("Skipping additive output {:?}: data is not an array", chart.title);
                continue;
            };
            for item in items {
                let pair = item.as_array().and_then(|pair| {
                    Some((pair.first()?.as_str()?, pair.get(1)?.as_f64()?))
                });
                let Some((name, value)) = pair else {
                    log::debug!(
                        "Skipping malformed item in additive output {:?}",
                        chart.title
                    );
                    continue;
                };
                if !table.series.contains_key(name) {
                    table.names.push(name.to_string());
                }
                table.series.entry(name.to_string()).or_default().push(value);
            }
        }
    }

    tables
        .into_iter()
        .map(|table| OutputStatsTable {
            title: table.title,
            description: table.description,
            chart_plugin: table.chart_plugin,
            rows: table
                .names
                .iter()
                .map(|name| OutputStatsRow {
                    name: name.clone(),
                    stats: SeriesStats::from_values(
                        table.series.get(name).map(Vec::as_slice).unwrap_or_default(),
                    ),
                })
                .collect(),
        })
        .collect()
}

/// Statistic plotted by the trend report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrendStatistic {
    Min,
    Max,
    #[default]
    Avg,
    P90,
    P95,
    SuccessRate,
}

/// Raised when a tag does not name a [TrendStatistic]
#[derive(Debug, thiserror::Error)]
#[error("unknown trend statistic {0:?}, expected one of min, max, avg, p90, p95, success_rate")]
pub struct UnknownStatisticError(pub String);

impl TrendStatistic {
    pub fn label(self) -> &'static str {
        match self {
            TrendStatistic::Min => "min",
            TrendStatistic::Max => "max",
            TrendStatistic::Avg => "avg",
            TrendStatistic::P90 => "90%ile",
            TrendStatistic::P95 => "95%ile",
            TrendStatistic::SuccessRate => "success rate",
        }
    }

    /// Pull this statistic out of a summarized series
    pub fn pick(self, stats: &SeriesStats, success_rate: Option<f64>) -> Option<f64> {
        match self {
            TrendStatistic::Min => stats.min,
            TrendStatistic::Max => stats.max,
            TrendStatistic::Avg => stats.avg,
            TrendStatistic::P90 => stats.p90,
            TrendStatistic::P95 => stats.p95,
            TrendStatistic::SuccessRate => success_rate,
        }
    }
}

impl FromStr for TrendStatistic {
    type Err = UnknownStatisticError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "min" => Ok(TrendStatistic::Min),
            "max" => Ok(TrendStatistic::Max),
            "avg" => Ok(TrendStatistic::Avg),
            "p90" => Ok(TrendStatistic::P90),
            "p95" => Ok(TrendStatistic::P95),
            "success_rate" => Ok(TrendStatistic::SuccessRate),
            _ => Err(UnknownStatisticError(tag.to_string())),
        }
    }
}
