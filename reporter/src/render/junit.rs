//! JUnit-style XML rendering.
//!
//! One test case per scenario entry, so CI systems can track benchmark runs like a test
//! suite. A case fails when any recorded SLA verdict failed; iteration errors alone do
//! not fail a case, they are already reflected in the SLA verdicts that watch them.

use crate::assemble::ReportDocument;
use itertools::Itertools;
use std::fmt::Write as _;

/// Render the document as a JUnit-style XML suite
pub fn report(document: &ReportDocument) -> anyhow::Result<String> {
    let mut cases = String::new();
    let mut failures = 0usize;
    let mut total_time = 0.0f64;

    for scenario in &document.scenarios {
        let result = &scenario.result;
        total_time += result.full_duration;

        let name = if result.key.pos > 0 {
            format!("{}[{}]", result.key.name, result.key.pos)
        } else {
            result.key.name.clone()
        };
        let failed: Vec<&str> = result
            .sla
            .iter()
            .filter(|sla| !sla.success)
            .map(|sla| sla.detail.as_str())
            .collect();

        if failed.is_empty() {
            writeln!(
                cases,
                "  <testcase classname=\"\" name=\"{}\" time=\"{:.3}\" />",
                xml_escape(&name),
                result.full_duration
            )?;
        } else {
            failures += 1;
            writeln!(
                cases,
                "  <testcase classname=\"\" name=\"{}\" time=\"{:.3}\">",
                xml_escape(&name),
                result.full_duration
            )?;
            writeln!(
                cases,
                "    <failure message=\"{}\" />",
                xml_escape(&failed.iter().join(", "))
            )?;
            writeln!(cases, "  </testcase>")?;
        }
    }

    let mut out = String::new();
    writeln!(out, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
    writeln!(
        out,
        "<testsuite name=\"gust\" tests=\"{}\" failures=\"{failures}\" errors=\"0\" time=\"{total_time:.3}\">",
        document.scenarios.len()
    )?;
    out.push_str(&cases);
    writeln!(out, "</testsuite>")?;
    Ok(out)
}

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
