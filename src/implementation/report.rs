// Copyright 2020 Xavier Gillard
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! The reporter: one explicit record gathering every figure of a run. The
//! stages write into it as they go and the CLI serialises the final state
//! (snake_case keys) into the metrics file, keyed by input path.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;

use crate::{Error, Instance, SolveOutcome};

/// Every figure a run reports. The numeric fields serialise under the very
/// key names shown here.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub execution_time_seconds: f64,
    pub memory_usage_mb: f64,
    pub num_users: usize,
    pub num_items: usize,
    pub num_cycles_found: usize,
    pub num_cycles_selected: usize,
    pub num_exchanges: usize,
    pub solver_time_seconds: f64,
    pub ilp_num_variables: usize,
    pub ilp_num_constraints: usize,
    pub num_warnings: usize,
    pub participation_percent: f64,
    pub overall_effectiveness_percent: f64,
    /// How many participants took part in exactly n exchanges (gives and
    /// receives counted separately), keyed by n
    pub participation_distribution: BTreeMap<usize, usize>,
    /// The id of the most wanted item of the want-graph, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_wanted_item: Option<String>,
}

impl Report {
    /// Counts a batch of diagnostics into the warning tally.
    pub fn count_warnings(&mut self, how_many: usize) {
        self.num_warnings += how_many;
    }

    /// Folds the outcome of a solve into this report: instance sizes,
    /// solver accounting, participation and effectiveness figures.
    pub fn tally(&mut self, instance: &Instance, outcome: &SolveOutcome) {
        self.num_users = instance.nb_participants();
        self.num_items = instance.nb_items();
        self.num_cycles_found = outcome.completion.stats.cycles_found;
        self.num_cycles_selected = outcome.completion.selection.nb_selected();
        self.num_exchanges = outcome.exchanges.len();
        self.solver_time_seconds = outcome.completion.stats.solver_time_seconds;
        self.ilp_num_variables = outcome.completion.stats.ilp_num_variables.unwrap_or(0);
        self.ilp_num_constraints = outcome.completion.stats.ilp_num_constraints.unwrap_or(0);
        self.count_warnings(outcome.completion.stats.diagnostics.len());
        self.count_warnings(outcome.diagnostics.len());
        self.most_wanted_item = outcome
            .most_wanted
            .map(|item| instance.item(item).id.clone());

        let participating = outcome
            .summaries
            .iter()
            .filter(|s| s.participates())
            .count();
        let total_users = outcome.summaries.len();
        self.participation_percent = if total_users > 0 {
            participating as f64 / total_users as f64 * 100.0
        } else {
            0.0
        };

        let total_offered: usize = outcome.summaries.iter().map(|s| s.items_offered).sum();
        let total_given: usize = outcome.summaries.iter().map(|s| s.items_given.len()).sum();
        self.overall_effectiveness_percent = if total_offered > 0 {
            total_given as f64 / total_offered as f64 * 100.0
        } else {
            0.0
        };

        self.participation_distribution.clear();
        for summary in &outcome.summaries {
            let count = summary.items_given.len() + summary.items_received.len();
            *self.participation_distribution.entry(count).or_insert(0) += 1;
        }
    }
}

/// Best effort probe of the peak resident set size, in megabytes. Memory
/// accounting is a platform concern: on linux the kernel keeps the figure in
/// `/proc/self/status`, elsewhere the probe simply reports zero.
pub fn peak_memory_mb() -> f64 {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            for line in status.lines() {
                if let Some(rest) = line.strip_prefix("VmHWM:") {
                    let kb: f64 = rest
                        .trim()
                        .trim_end_matches("kB")
                        .trim()
                        .parse()
                        .unwrap_or(0.0);
                    return kb / 1024.0;
                }
            }
        }
        0.0
    }
    #[cfg(not(target_os = "linux"))]
    {
        0.0
    }
}

/// Writes the path-keyed metrics map to a json file.
pub fn save_metrics<P: AsRef<Path>>(
    path: P,
    metrics: &BTreeMap<String, Report>,
) -> Result<(), Error> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    Ok(serde_json::to_writer_pretty(writer, metrics)?)
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_report {
    use super::*;

    #[test]
    fn serialises_with_snake_case_keys() {
        let report = Report::default();
        let json = serde_json::to_value(&report).unwrap();
        for key in [
            "execution_time_seconds",
            "memory_usage_mb",
            "num_users",
            "num_items",
            "num_cycles_found",
            "num_cycles_selected",
            "num_exchanges",
            "solver_time_seconds",
            "ilp_num_variables",
            "ilp_num_constraints",
            "num_warnings",
            "participation_percent",
            "overall_effectiveness_percent",
        ] {
            assert!(json.get(key).is_some(), "missing key {}", key);
        }
        // absent most-wanted item stays out of the output
        assert!(json.get("most_wanted_item").is_none());
    }

    #[test]
    fn warning_counts_accumulate() {
        let mut report = Report::default();
        report.count_warnings(2);
        report.count_warnings(3);
        assert_eq!(5, report.num_warnings);
    }
}
