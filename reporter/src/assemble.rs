//! Assembly of loaded results into a report document.

use crate::merge::MergedAtomics;
use crate::stats::{output_stats, OutputStatsTable, StatsTable};
use gust_task_model::ScenarioResult;
use std::collections::HashMap;

/// One scenario entry of a [ReportDocument]
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioReport {
    /// The scenario result, with `key.pos` rewritten where names collided
    pub result: ScenarioResult,
    /// Canonical atomic action names across this entry's iterations
    pub merged: MergedAtomics,
    /// Response-times statistics
    pub stats: StatsTable,
    /// Aggregated additive output series
    pub outputs: Vec<OutputStatsTable>,
}

/// A fully assembled report, ready to hand to any renderer
///
/// The document owns all of its data outright. Rendering never mutates it, so rendering
/// the same document twice in the same format produces byte-identical output.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub scenarios: Vec<ScenarioReport>,
}

/// Merge scenario results, possibly from several tasks, into one report document
///
/// Entries keep their relative order. When several entries share a scenario name, the
/// first keeps its own positional index and every later one is renumbered 1, 2, 3, … in
/// merge order, so repeated runs stay distinguishable in every output format.
pub fn assemble(results: impl IntoIterator<Item = ScenarioResult>) -> ReportDocument {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut scenarios = Vec::new();
    for mut result in results {
        match seen.get_mut(&result.key.name) {
            Some(count) => {
                *count += 1;
                result.key.pos = *count;
            }
            None => {
                seen.insert(result.key.name.clone(), 0);
            }
        }
        let merged = MergedAtomics::from_iterations(&result.iterations);
        let stats = StatsTable::build(&result.iterations, &merged);
        let outputs = output_stats(&result.iterations);
        scenarios.push(ScenarioReport {
            result,
            merged,
            stats,
            outputs,
        });
    }
    log::debug!("Assembled {} scenario entries into a report", scenarios.len());
    ReportDocument { scenarios }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gust_task_model::{load_task_results_str, ScenarioKey};
    use pretty_assertions::assert_eq;

    fn result(name: &str, pos: usize) -> ScenarioResult {
        ScenarioResult {
            key: ScenarioKey {
                name: name.to_string(),
                pos,
                kw: serde_json::Value::Null,
            },
            iterations: Vec::new(),
            sla: Vec::new(),
            hooks: Vec::new(),
            load_duration: 0.0,
            full_duration: 0.0,
            created_at: None,
        }
    }

    #[test]
    fn colliding_names_are_renumbered() {
        let document = assemble(vec![
            result("boot_server", 0),
            result("attach_volume", 0),
            result("boot_server", 0),
            result("boot_server", 0),
        ]);

        let keys: Vec<(String, usize)> = document
            .scenarios
            .iter()
            .map(|s| (s.result.key.name.clone(), s.result.key.pos))
            .collect();
        assert_eq!(
            vec![
                ("boot_server".to_string(), 0),
                ("attach_volume".to_string(), 0),
                ("boot_server".to_string(), 1),
                ("boot_server".to_string(), 2),
            ],
            keys
        );
    }

    #[test]
    fn first_occurrence_keeps_its_own_pos() {
        let document = assemble(vec![result("solo", 4), result("solo", 0)]);

        assert_eq!(4, document.scenarios[0].result.key.pos);
        assert_eq!(1, document.scenarios[1].result.key.pos);
    }

    #[test]
    fn entries_keep_input_order() {
        let document = assemble(vec![result("c", 0), result("a", 0), result("b", 0)]);

        let names: Vec<&str> = document
            .scenarios
            .iter()
            .map(|s| s.result.key.name.as_str())
            .collect();
        assert_eq!(vec!["c", "a", "b"], names);
    }

    #[test]
    fn entries_carry_merged_names_and_stats() -> anyhow::Result<()> {
        let results = load_task_results_str(
            r#"[
              {
                "key": {"name": "timed", "pos": 0, "kw": {}},
                "result": [
                  {"duration": 1.0, "atomic_actions": [{"name": "work", "duration": 0.8, "started_at": 0.0, "children": []}]},
                  {"duration": 2.0, "atomic_actions": []}
                ],
                "sla": [],
                "load_duration": 3.0,
                "full_duration": 3.2
              }
            ]"#,
            "test input",
        )?;

        let document = assemble(results);

        let entry = &document.scenarios[0];
        assert_eq!(vec!["work"], entry.merged.names());
        // One action row plus the total row
        assert_eq!(2, entry.stats.rows.len());
        assert_eq!(2, entry.stats.rows[1].stats.count);
        assert!(entry.outputs.is_empty());
        Ok(())
    }
}
