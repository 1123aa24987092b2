//! Report rendering.
//!
//! [ReportFormat] is a closed set on purpose: an unknown format tag fails at the
//! boundary, before any assembly or rendering work starts.

pub mod html;
pub mod junit;
pub mod text;

use crate::assemble::ReportDocument;
use std::str::FromStr;

/// The output formats a report can be rendered in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Plain-text tables for terminals and log files
    Table,
    /// Self-contained HTML document, charts drawn by an external script
    Html,
    /// HTML document with no external references at all
    HtmlStatic,
    /// JUnit-style XML for CI consumption
    Junit,
}

/// Raised when a tag does not name a [ReportFormat]
#[derive(Debug, thiserror::Error)]
#[error("unknown report format {tag:?}, expected one of table, html, html_static, junit")]
pub struct UnknownFormatError {
    pub tag: String,
}

impl FromStr for ReportFormat {
    type Err = UnknownFormatError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "table" => Ok(ReportFormat::Table),
            "html" => Ok(ReportFormat::Html),
            "html_static" => Ok(ReportFormat::HtmlStatic),
            "junit" => Ok(ReportFormat::Junit),
            _ => Err(UnknownFormatError {
                tag: tag.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            ReportFormat::Table => "table",
            ReportFormat::Html => "html",
            ReportFormat::HtmlStatic => "html_static",
            ReportFormat::Junit => "junit",
        };
        f.write_str(tag)
    }
}

/// Options honoured by the renderers
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Show the per-iteration atomic action breakdown
    pub iterations_data: bool,
    /// Include tracebacks in error and verification blocks
    pub verbose: bool,
}

/// Render an assembled document in the requested format
pub fn render(
    document: &ReportDocument,
    format: ReportFormat,
    options: &RenderOptions,
) -> anyhow::Result<String> {
    log::info!(
        "Rendering {} scenario entries as {format}",
        document.scenarios.len()
    );
    match format {
        ReportFormat::Table => text::report(document, options),
        ReportFormat::Html => html::report(document, html::ChartAssets::Cdn),
        ReportFormat::HtmlStatic => html::report(document, html::ChartAssets::Offline),
        ReportFormat::Junit => junit::report(document),
    }
}

/// Three-decimal cell, `n/a` when absent
///
/// Statistics are kept in full precision; this is the one place report values get
/// rounded for display.
pub(crate) fn opt_float3(value: &Option<f64>) -> String {
    match value {
        Some(value) => format!("{value:.3}"),
        None => "n/a".to_string(),
    }
}

/// Percentage cell, `n/a` when absent
pub(crate) fn opt_percent(value: &Option<f64>) -> String {
    match value {
        Some(value) => format!("{:.1}%", value * 100.0),
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn known_format_tags_parse() {
        assert_eq!(ReportFormat::Table, "table".parse::<ReportFormat>().unwrap());
        assert_eq!(ReportFormat::Html, "html".parse::<ReportFormat>().unwrap());
        assert_eq!(
            ReportFormat::HtmlStatic,
            "html_static".parse::<ReportFormat>().unwrap()
        );
        assert_eq!(ReportFormat::Junit, "junit".parse::<ReportFormat>().unwrap());
    }

    #[test]
    fn unknown_format_tag_is_rejected_up_front() {
        let err = "pdf".parse::<ReportFormat>().unwrap_err();
        assert!(err.to_string().contains("\"pdf\""), "got: {err}");
    }

    #[test]
    fn format_tags_round_trip_through_display() {
        for format in [
            ReportFormat::Table,
            ReportFormat::Html,
            ReportFormat::HtmlStatic,
            ReportFormat::Junit,
        ] {
            assert_eq!(format, format.to_string().parse::<ReportFormat>().unwrap());
        }
    }

    #[test]
    fn cells_round_to_three_decimals() {
        assert_eq!("1.235", opt_float3(&Some(1.23456)));
        assert_eq!("n/a", opt_float3(&None));
        assert_eq!("66.7%", opt_percent(&Some(2.0 / 3.0)));
        assert_eq!("n/a", opt_percent(&None));
    }
}
