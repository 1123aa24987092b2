//! Merging of atomic action names across iterations.
//!
//! Different iterations of one scenario may record different action sets: optional
//! steps, retries and mid-run failures all leave gaps. The canonical name list built
//! here is what lets every renderer show a stable set of columns, with a zero wherever
//! an iteration did not record an action.

use gust_task_model::{AtomicAction, Iteration};
use std::collections::HashMap;

/// Separator joining nested action names into a display path
const PATH_SEPARATOR: &str = " > ";

/// The canonical atomic action names of one scenario
///
/// Built by walking every iteration's action tree in document order. Names are display
/// paths (`parent > child`), so an action name reused at another depth stays a distinct
/// entry. Each path appears exactly once, in the order it was first seen across all
/// iterations. The list is never sorted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MergedAtomics {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl MergedAtomics {
    /// Merge the action names of every iteration, in first-seen order
    pub fn from_iterations(iterations: &[Iteration]) -> Self {
        let mut merged = Self::default();
        for iteration in iterations {
            for (path, _) in flatten_actions(&iteration.atomic_actions) {
                merged.insert(path);
            }
        }
        merged
    }

    fn insert(&mut self, path: String) {
        if !self.index.contains_key(&path) {
            self.index.insert(path.clone(), self.names.len());
            self.names.push(path);
        }
    }

    /// The canonical display paths, in first-seen order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Project one iteration onto the canonical names
    ///
    /// Returns one duration per canonical name, in canonical order. Actions the
    /// iteration did not record come back as exactly 0.0, so the projection never
    /// fails, whatever iteration it is handed.
    pub fn durations_for(&self, iteration: &Iteration) -> Vec<f64> {
        let mut durations = vec![0.0; self.names.len()];
        for (path, duration) in flatten_actions(&iteration.atomic_actions) {
            if let Some(&idx) = self.index.get(&path) {
                durations[idx] += duration;
            }
        }
        durations
    }
}

/// Walk an action tree in document order, parents before children
///
/// Yields one `(display path, duration)` pair per tree node. Repeated paths are kept
/// as-is here; callers that need one value per path sum them.
pub fn flatten_actions(actions: &[AtomicAction]) -> Vec<(String, f64)> {
    fn walk(actions: &[AtomicAction], prefix: Option<&str>, out: &mut Vec<(String, f64)>) {
        for action in actions {
            let path = match prefix {
                Some(prefix) => format!("{prefix}{PATH_SEPARATOR}{}", action.name),
                None => action.name.clone(),
            };
            out.push((path.clone(), action.duration));
            walk(&action.children, Some(&path), out);
        }
    }
    let mut out = Vec::new();
    walk(actions, None, &mut out);
    out
}

/// Sum one iteration's action durations by display path
///
/// Paths keep the position they were first seen at; durations recorded twice under the
/// same path are summed into that one entry.
pub fn action_durations(iteration: &Iteration) -> Vec<(String, f64)> {
    let mut ordered: Vec<(String, f64)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for (path, duration) in flatten_actions(&iteration.atomic_actions) {
        match index.get(&path) {
            Some(&idx) => ordered[idx].1 += duration,
            None => {
                index.insert(path.clone(), ordered.len());
                ordered.push((path, duration));
            }
        }
    }
    ordered
}
