use anyhow::Context;
use gust_reporter::{sla_check, RenderOptions, ReportFormat, TrendOptions};
use gust_task_model::{
    load_task_results_file, load_task_results_str, ScenarioResult, TaskResult, TaskStatus,
};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const ALL_FORMATS: [ReportFormat; 4] = [
    ReportFormat::Table,
    ReportFormat::Html,
    ReportFormat::HtmlStatic,
    ReportFormat::Junit,
];

#[test]
fn every_fixture_renders_in_every_format() -> anyhow::Result<()> {
    env_logger::try_init().ok();

    let mut rendered = 0;
    for entry in WalkDir::new(fixtures_dir()) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let results = load_fixture(&name)?;
        for format in ALL_FORMATS {
            let report =
                gust_reporter::render_report(results.clone(), format, &RenderOptions::default())
                    .with_context(|| format!("Failed to render {name} as {format}"))?;
            assert!(!report.is_empty(), "empty {format} report for {name}");
        }
        rendered += 1;
    }
    assert!(rendered > 0, "no fixtures found");
    Ok(())
}

#[test]
fn rendering_twice_is_byte_identical() -> anyhow::Result<()> {
    let results = load_fixture("boot_and_attach.json")?;

    for format in ALL_FORMATS {
        let first =
            gust_reporter::render_report(results.clone(), format, &RenderOptions::default())?;
        let second =
            gust_reporter::render_report(results.clone(), format, &RenderOptions::default())?;
        pretty_assertions::assert_eq!(first, second, "{format} rendering is not deterministic");
    }
    Ok(())
}

#[test]
fn response_time_statistics_match_hand_computed_values() -> anyhow::Result<()> {
    let results = load_fixture("boot_and_attach.json")?;
    let text =
        gust_reporter::render_report(results, ReportFormat::Table, &RenderOptions::default())?;

    // boot ran for 1.25 and 2.0 seconds across the two iterations
    assert!(text.contains("1.625"), "got: {text}");
    assert!(text.contains("boot > wait_for_ssh"), "got: {text}");
    // the total row covers the iteration durations 1.5 and 2.5
    assert!(text.contains("2.000"), "got: {text}");
    // one of the two iterations failed
    assert!(text.contains("50.0%"), "got: {text}");
    assert!(text.contains("SshTimeout: no route to host"), "got: {text}");
    assert!(text.contains("Request counters:"), "got: {text}");
    Ok(())
}

#[test]
fn iteration_rows_follow_input_order() -> anyhow::Result<()> {
    let results = load_fixture("boot_and_attach.json")?;
    let text = gust_reporter::render_report(
        results,
        ReportFormat::Table,
        &RenderOptions {
            iterations_data: true,
            ..RenderOptions::default()
        },
    )?;

    let start = text
        .find("Atomics per iteration:")
        .context("breakdown table missing")?;
    let breakdown = &text[start..];
    // boot took 1.25 in the first iteration and 2.0 in the second; the rows
    // must come out in exactly that order
    let first = breakdown.find("1.250").context("first iteration row missing")?;
    let second = breakdown.find("2.000").context("second iteration row missing")?;
    assert!(first < second, "got: {breakdown}");
    Ok(())
}

#[test]
fn colliding_entries_get_distinct_positions() -> anyhow::Result<()> {
    let results = load_fixture("duplicate_names.json")?;

    let text = gust_reporter::render_report(
        results.clone(),
        ReportFormat::Table,
        &RenderOptions::default(),
    )?;
    assert!(text.contains("Scenario concurrent_read (pos 0)"), "got: {text}");
    assert!(text.contains("Scenario concurrent_read (pos 1)"), "got: {text}");
    assert!(text.contains("Scenario concurrent_read (pos 2)"), "got: {text}");

    let xml =
        gust_reporter::render_report(results, ReportFormat::Junit, &RenderOptions::default())?;
    assert!(xml.contains("name=\"concurrent_read\""), "got: {xml}");
    assert!(xml.contains("name=\"concurrent_read[1]\""), "got: {xml}");
    assert!(xml.contains("name=\"concurrent_read[2]\""), "got: {xml}");
    Ok(())
}

#[test]
fn junit_maps_sla_failures_to_failure_elements() -> anyhow::Result<()> {
    let results = load_fixture("failed_sla.json")?;
    let xml =
        gust_reporter::render_report(results, ReportFormat::Junit, &RenderOptions::default())?;

    assert!(
        xml.contains("tests=\"2\" failures=\"1\" errors=\"0\" time=\"7.500\""),
        "got: {xml}"
    );
    // both failing details, comma joined, in recorded order
    assert!(
        xml.contains("<failure message=\"avg 3.25 &gt; 2.0, 50.0% &gt; 0.0%\" />"),
        "got: {xml}"
    );
    // the passing entry stays a self-closing case
    assert!(
        xml.contains("<testcase classname=\"\" name=\"fast_reads\" time=\"0.500\" />"),
        "got: {xml}"
    );
    Ok(())
}

#[test]
fn sla_check_sorts_criteria_and_counts_failures() -> anyhow::Result<()> {
    let results = load_fixture("failed_sla.json")?;
    let check = sla_check(&results);

    assert_eq!(2, check.failed);
    let table = check.to_table();
    assert!(table.contains("PASS"), "got: {table}");
    assert!(table.contains("FAIL"), "got: {table}");
    // criteria are sorted by name within the scenario
    let failure_rate = table.find("failure_rate_max").context("row missing")?;
    let max_avg = table.find("max_avg_duration").context("row missing")?;
    let outliers = table.find("outliers_max").context("row missing")?;
    assert!(failure_rate < max_avg, "got: {table}");
    assert!(max_avg < outliers, "got: {table}");
    Ok(())
}

#[test]
fn unknown_format_is_rejected() {
    let err = "svg".parse::<ReportFormat>().unwrap_err();
    assert_eq!(
        "unknown report format \"svg\", expected one of table, html, html_static, junit",
        err.to_string()
    );
}

#[test]
fn trend_page_orders_runs_by_submission_time() -> anyhow::Result<()> {
    let results = load_fixture("trend_runs.json")?;
    let page = gust_reporter::trends(&results, &TrendOptions::default())?;

    // the fixture lists the runs out of order; the page sorts them by created_at
    assert!(page.contains("\"values\":[2.0,3.0,4.0]"), "got: {page}");
    let first = page.find("2026-08-10 08:00:00").context("label missing")?;
    let second = page.find("2026-08-11 08:00:00").context("label missing")?;
    let third = page.find("2026-08-12 08:00:00").context("label missing")?;
    assert!(first < second, "got: {page}");
    assert!(second < third, "got: {page}");
    Ok(())
}

#[test]
fn legacy_records_flow_through_every_renderer() -> anyhow::Result<()> {
    let results = load_fixture("legacy_shapes.json")?;

    let text = gust_reporter::render_report(
        results.clone(),
        ReportFormat::Table,
        &RenderOptions::default(),
    )?;
    assert!(text.contains("connect"), "got: {text}");
    assert!(text.contains("Scenario output:"), "got: {text}");
    assert!(text.contains("bytes_sent"), "got: {text}");
    assert!(text.contains("ConnectionReset: peer dropped the link"), "got: {text}");

    let html = gust_reporter::render_report(
        results.clone(),
        ReportFormat::HtmlStatic,
        &RenderOptions::default(),
    )?;
    assert!(html.contains("bytes_received"), "got: {html}");

    let xml =
        gust_reporter::render_report(results, ReportFormat::Junit, &RenderOptions::default())?;
    assert!(
        xml.contains("<failure message=\"50.0% &gt; 25.0%\" />"),
        "got: {xml}"
    );
    Ok(())
}

#[test]
fn raw_export_is_normalized_and_reloads_identically() -> anyhow::Result<()> {
    let results = load_fixture("legacy_shapes.json")?;
    let json = gust_reporter::export_results_json(&results)?;

    // the export uses the current record shapes, not the legacy ones it was loaded from
    assert!(json.contains("\"children\""), "got: {json}");
    assert!(!json.contains("scenario_output"), "got: {json}");

    let reloaded = load_task_results_str(&json, "re-export")?;
    pretty_assertions::assert_eq!(results, reloaded);
    Ok(())
}

#[test]
fn crashed_task_report_shows_the_verification_log() -> anyhow::Result<()> {
    let task = TaskResult {
        status: TaskStatus::Crashed,
        results: Vec::new(),
        verification_log: Some(
            r#"{"etype": "HostUnreachable", "msg": "controller down", "trace": "stack frames"}"#
                .to_string(),
        ),
    };

    let plain = gust_reporter::task_report(&task, &RenderOptions::default())?;
    assert!(plain.contains("Task status: crashed"), "got: {plain}");
    assert!(plain.contains("HostUnreachable: controller down"), "got: {plain}");
    assert!(!plain.contains("stack frames"), "got: {plain}");

    let verbose = gust_reporter::task_report(
        &task,
        &RenderOptions {
            verbose: true,
            ..RenderOptions::default()
        },
    )?;
    assert!(verbose.contains("stack frames"), "got: {verbose}");
    Ok(())
}

#[test]
fn static_report_is_fully_inline() -> anyhow::Result<()> {
    let results = load_fixture("boot_and_attach.json")?;
    let html = gust_reporter::render_report(
        results,
        ReportFormat::HtmlStatic,
        &RenderOptions::default(),
    )?;

    assert!(!html.contains("<script src"), "got: {html}");
    assert!(!html.contains("http"), "got: {html}");
    assert!(html.contains("report-data"), "got: {html}");
    assert!(html.contains("boot &gt; wait_for_ssh"), "got: {html}");
    assert!(html.contains("Volume profile"), "got: {html}");
    Ok(())
}

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn load_fixture(name: &str) -> anyhow::Result<Vec<ScenarioResult>> {
    load_task_results_file(fixtures_dir().join(name))
        .with_context(|| format!("Failed to load fixture {name}"))
}
