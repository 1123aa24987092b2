use anyhow::{Context, anyhow};
use gust_reporter::{ChartAssets, RenderOptions, ReportFormat, TrendOptions, TrendStatistic};
use gust_task_model::load_task_results_file;
use log::debug;
use std::path::PathBuf;

/// Environment variable naming the task result files to report on, `:`-separated
const TASK_RESULTS_PATH_ENV: &str = "TASK_RESULTS_PATH";
/// Default path for the task results file
const DEFAULT_TASK_RESULTS_PATH: &str = "task_results.json";
/// Environment variable selecting the report format
const REPORT_FORMAT_ENV: &str = "REPORT_FORMAT";
/// Default report format
const DEFAULT_REPORT_FORMAT: &str = "table";
/// Environment variable naming the file to write to, stdout when unset
const REPORT_OUT_ENV: &str = "REPORT_OUT";

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let ignore_errors = std::env::var("REPORT_IGNORE_ERRORS").is_ok();

    // Reject a bad format or statistic before doing any loading work
    let format = std::env::var(REPORT_FORMAT_ENV)
        .unwrap_or_else(|_| DEFAULT_REPORT_FORMAT.to_string())
        .parse::<ReportFormat>()?;
    let statistic = match std::env::var("REPORT_TREND_STAT") {
        Ok(tag) => tag.parse::<TrendStatistic>()?,
        Err(_) => TrendStatistic::default(),
    };

    let options = RenderOptions {
        iterations_data: std::env::var("REPORT_ITERATIONS_DATA").is_ok(),
        verbose: std::env::var("REPORT_VERBOSE").is_ok(),
    };

    let paths = std::env::var(TASK_RESULTS_PATH_ENV)
        .unwrap_or_else(|_| DEFAULT_TASK_RESULTS_PATH.to_string())
        .split(':')
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .collect::<Vec<_>>();

    let total_files = paths.len();
    let mut errors = vec![];
    let mut results = vec![];

    for path in paths {
        debug!("Loading task results from {}", path.display());
        match load_task_results_file(path) {
            Ok(loaded) => results.extend(loaded),
            Err(e) => errors.push(e),
        }
    }

    // If any of the files failed to load and errors should not explicitly be ignored,
    // return an error
    if !errors.is_empty() {
        let error_message = format!(
            "{} out of {} result files failed to load:\n{:#?}",
            errors.len(),
            total_files,
            errors
        );

        if ignore_errors {
            log::warn!("{}", error_message);
        } else {
            return Err(anyhow!(error_message));
        }
    }

    let mut failed_criteria = 0;
    let artifact = if std::env::var("REPORT_RAW").is_ok() {
        gust_reporter::export_results_json(&results)?
    } else if std::env::var("REPORT_SLA_CHECK").is_ok() {
        let check = gust_reporter::sla_check(&results);
        failed_criteria = check.failed;
        check.to_table()
    } else if std::env::var("REPORT_TREND").is_ok() {
        let assets = if format == ReportFormat::HtmlStatic {
            ChartAssets::Offline
        } else {
            ChartAssets::Cdn
        };
        gust_reporter::trends(&results, &TrendOptions { statistic, assets })?
    } else {
        gust_reporter::render_report(results, format, &options)?
    };

    match std::env::var(REPORT_OUT_ENV) {
        Ok(path) => {
            let path = PathBuf::from(path);
            std::fs::write(&path, &artifact)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            log::info!("Wrote report to {}", path.display());
        }
        Err(_) => println!("{}", artifact.trim_end()),
    }

    // The SLA table is still written above; the failure only shows in the exit code
    if failed_criteria > 0 {
        return Err(anyhow!("{failed_criteria} SLA criteria failed"));
    }

    Ok(())
}
