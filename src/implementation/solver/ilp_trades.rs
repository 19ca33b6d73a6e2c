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

//! The trade-maximizing ILP back-end: one binary variable per enumerated
//! cycle, an at-most-once constraint per item, and an objective summing the
//! lengths of the chosen cycles. The backing solver is exact, so a
//! successful solve is a certificate of optimality for the given pool.

use std::collections::BTreeMap;
use std::time::Instant;

use good_lp::{constraint, microlp, variable, variables, Expression, Solution, SolverModel};

use crate::{
    Completion, Cycle, CycleEnumerator, Diagnostic, Error, ItemIdx, Selection, SolveContext,
    SolveStatus, Solver, SolverStats,
};

pub struct MaxTradesIlp;

impl Solver for MaxTradesIlp {
    fn name(&self) -> &'static str {
        "ilp-trades"
    }

    fn solve(&mut self, ctx: &SolveContext) -> Result<Completion, Error> {
        let pool = CycleEnumerator::new(
            ctx.graph,
            ctx.instance,
            ctx.config.max_cycle_length,
            ctx.cutoff,
        )
        .materialise(Some(ctx.config.max_cycles))?;

        if pool.cancelled {
            return Ok(Completion {
                status: SolveStatus::Cancelled,
                selection: Selection::empty(),
                stats: SolverStats {
                    cycles_found: pool.cycles.len(),
                    ..SolverStats::default()
                },
            });
        }
        let cycles = pool.cycles;
        if cycles.is_empty() {
            return Ok(Completion {
                status: SolveStatus::Optimal,
                selection: Selection::empty(),
                stats: SolverStats::default(),
            });
        }

        let mut diagnostics = Vec::new();
        let mut vars = variables!();
        let xs: Vec<_> = cycles.iter().map(|_| vars.add(variable().binary())).collect();

        let objective: Expression = xs
            .iter()
            .zip(cycles.iter())
            .map(|(x, cycle)| cycle.len() as f64 * *x)
            .sum();
        let mut model = vars.maximise(objective).using(microlp);

        // at most one chosen cycle per item
        let clashes = item_clashes(&cycles);
        let nb_constraints = clashes.len();
        for (_, members) in clashes {
            let usage: Expression = members.iter().map(|c| Expression::from(xs[*c])).sum();
            model = model.with(constraint!(usage <= 1));
        }

        let solve_start = Instant::now();
        let solved = model.solve();
        let solver_time_seconds = solve_start.elapsed().as_secs_f64();

        let mut stats = SolverStats {
            cycles_found: cycles.len(),
            solver_time_seconds,
            ilp_num_variables: Some(xs.len()),
            ilp_num_constraints: Some(nb_constraints),
            diagnostics: Vec::new(),
        };

        match solved {
            Ok(solution) => {
                let picked: Vec<Cycle> = cycles
                    .into_iter()
                    .zip(xs.iter())
                    .filter(|(_, x)| solution.value(**x) > 0.5)
                    .map(|(cycle, _)| cycle)
                    .collect();
                stats.diagnostics = diagnostics;
                Ok(Completion {
                    status: SolveStatus::Optimal,
                    selection: Selection::Cycles(picked),
                    stats,
                })
            }
            Err(err) => {
                Diagnostic::emit(
                    &mut diagnostics,
                    format!("no optimal solution was found: {}", err),
                );
                stats.diagnostics = diagnostics;
                Ok(Completion {
                    status: SolveStatus::Failed,
                    selection: Selection::empty(),
                    stats,
                })
            }
        }
    }
}

/// Groups the cycles by the items they use: the disjointness constraints of
/// both ILP formulations stem from this map. A `BTreeMap` keeps the model
/// rows in a reproducible order.
pub(crate) fn item_clashes(cycles: &[Cycle]) -> BTreeMap<ItemIdx, Vec<usize>> {
    let mut clashes: BTreeMap<ItemIdx, Vec<usize>> = BTreeMap::new();
    for (c, cycle) in cycles.iter().enumerate() {
        for item in cycle.items() {
            clashes.entry(*item).or_default().push(c);
        }
    }
    clashes
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_ilp_trades {
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

    fn solve(instance: &crate::Instance, config: &SolveConfig) -> Completion {
        let graph = WantGraph::build(instance);
        let ctx = SolveContext {
            instance,
            graph: &graph,
            config,
            cutoff: &NoCutoff,
        };
        MaxTradesIlp.solve(&ctx).unwrap()
    }

    #[test]
    fn selects_every_disjoint_cycle() {
        let instance = instance(&[("a", &["b"]), ("b", &["a"]), ("c", &["d"]), ("d", &["c"])]);
        let completion = solve(&instance, &SolveConfig::default());
        assert_eq!(SolveStatus::Optimal, completion.status);
        match completion.selection {
            Selection::Cycles(cycles) => {
                assert_eq!(2, cycles.len());
                assert_eq!(4, cycles.iter().map(Cycle::len).sum::<usize>());
            }
            _ => panic!("ilp produces cycles"),
        }
    }

    #[test]
    fn prefers_more_trades_over_fewer() {
        // the 3-cycle beats the nested 2-cycle on trade count
        let instance = instance(&[("a", &["b"]), ("b", &["c", "a"]), ("c", &["a"])]);
        let completion = solve(&instance, &SolveConfig::default());
        match completion.selection {
            Selection::Cycles(cycles) => {
                assert_eq!(1, cycles.len());
                assert_eq!(3, cycles[0].len());
            }
            _ => panic!("ilp produces cycles"),
        }
        assert_eq!(Some(2), completion.stats.ilp_num_variables);
    }

    #[test]
    fn an_empty_pool_is_trivially_optimal() {
        let instance = instance(&[("a", &[] as &[&str])]);
        let completion = solve(&instance, &SolveConfig::default());
        assert_eq!(SolveStatus::Optimal, completion.status);
        assert_eq!(0, completion.selection.nb_selected());
    }

    #[test]
    fn the_pool_cap_is_a_fatal_error() {
        let instance = instance(&[("a", &["b"]), ("b", &["a"]), ("c", &["d"]), ("d", &["c"])]);
        let graph = WantGraph::build(&instance);
        let mut config = SolveConfig::default();
        config.max_cycles = 1;
        let ctx = SolveContext {
            instance: &instance,
            graph: &graph,
            config: &config,
            cutoff: &NoCutoff,
        };
        assert!(matches!(
            MaxTradesIlp.solve(&ctx),
            Err(Error::CyclePoolExceeded(1))
        ));
    }
}
