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

//! The greedy back-end: longest-cycle-first packing with no backtracking.
//! Fast, deterministic, and often surprisingly decent -- but it comes with
//! no guarantee whatsoever; the ILP back-ends dominate it on every instance.

use std::time::Instant;

use fxhash::FxHashSet;

use crate::{
    Completion, CycleEnumerator, Diagnostic, Error, Selection, SolveContext, SolveStatus, Solver,
    SolverStats,
};

pub struct GreedySolver;

impl Solver for GreedySolver {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn solve(&mut self, ctx: &SolveContext) -> Result<Completion, Error> {
        let start = Instant::now();
        let mut diagnostics = Vec::new();

        let pool = CycleEnumerator::new(
            ctx.graph,
            ctx.instance,
            ctx.config.max_cycle_length,
            ctx.cutoff,
        )
        .materialise(None)?;
        let mut cycles = pool.cycles;
        let cycles_found = cycles.len();

        // longest first; the sort is stable so equal lengths keep their
        // enumeration order
        cycles.sort_by(|a, b| b.len().cmp(&a.len()));

        let mut cancelled = pool.cancelled;
        let mut committed = FxHashSet::default();
        let mut picked = Vec::new();
        for cycle in cycles {
            if ctx.cutoff.must_stop() {
                cancelled = true;
                break;
            }
            if cycle.conflicts_with(&committed) {
                continue;
            }
            // a cycle stepping between two items of one owner cannot be
            // honoured (the graph builder refuses such edges already)
            if cycle
                .steps()
                .any(|(a, b)| ctx.instance.owner_of(a) == ctx.instance.owner_of(b))
            {
                Diagnostic::emit(
                    &mut diagnostics,
                    format!(
                        "skipping a cycle with a same-owner step: {:?}",
                        cycle
                            .items()
                            .iter()
                            .map(|it| ctx.instance.item(*it).id.as_str())
                            .collect::<Vec<_>>()
                    ),
                );
                continue;
            }
            cycle.commit_into(&mut committed);
            picked.push(cycle);
        }

        let status = if cancelled {
            SolveStatus::Cancelled
        } else {
            SolveStatus::Feasible
        };
        Ok(Completion {
            status,
            selection: Selection::Cycles(picked),
            stats: SolverStats {
                cycles_found,
                solver_time_seconds: start.elapsed().as_secs_f64(),
                ilp_num_variables: None,
                ilp_num_constraints: None,
                diagnostics,
            },
        })
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_greedy {
    use super::*;
    use crate::{normalise, NoCutoff, RawInstance, RawItem, RawUser, SolveConfig, WantGraph};

    fn instance(wants: &[(&str, &[&str])]) -> crate::Instance {
        let mut raw = RawInstance::default();
        for (i, (item, list)) in wants.iter().enumerate() {
            let owner = format!("user{}", i);
            raw.items.insert(
                item.to_string(),
                RawItem {
                    owner: owner.clone(),
                    name: item.to_string(),
                },
            );
            let mut user = RawUser::default();
            user.offers.insert(
                item.to_string(),
                list.iter().map(|w| w.to_string()).collect(),
            );
            raw.users.insert(owner, user);
        }
        normalise(&raw).0
    }

    #[test]
    fn picks_the_longest_cycle_first() {
        // the 3-cycle a-b-c conflicts with the 2-cycle a-b on items a and b
        let instance = instance(&[("a", &["b"]), ("b", &["c", "a"]), ("c", &["a"])]);
        let graph = WantGraph::build(&instance);
        let config = SolveConfig::default();
        let ctx = SolveContext {
            instance: &instance,
            graph: &graph,
            config: &config,
            cutoff: &NoCutoff,
        };
        let completion = GreedySolver.solve(&ctx).unwrap();
        match completion.selection {
            Selection::Cycles(cycles) => {
                assert_eq!(1, cycles.len());
                assert_eq!(3, cycles[0].len());
            }
            _ => panic!("greedy produces cycles"),
        }
        assert_eq!(2, completion.stats.cycles_found);
        assert_eq!(SolveStatus::Feasible, completion.status);
    }

    #[test]
    fn packs_disjoint_cycles() {
        let instance = instance(&[("a", &["b"]), ("b", &["a"]), ("c", &["d"]), ("d", &["c"])]);
        let graph = WantGraph::build(&instance);
        let config = SolveConfig::default();
        let ctx = SolveContext {
            instance: &instance,
            graph: &graph,
            config: &config,
            cutoff: &NoCutoff,
        };
        let completion = GreedySolver.solve(&ctx).unwrap();
        match completion.selection {
            Selection::Cycles(cycles) => assert_eq!(2, cycles.len()),
            _ => panic!("greedy produces cycles"),
        }
    }
}
