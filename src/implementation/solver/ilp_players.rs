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

//! The participant-maximizing ILP back-end. Same cycle pool and
//! disjointness constraints as the trade-maximizing formulation, plus one
//! binary variable per participant telling whether they trade at all; the
//! objective counts those. Linking constraints tie the participant
//! variables to the cycles they appear in, and a per-participant balance
//! constraint equates what they give with what they receive (automatic for
//! plain cycles, but stated so a richer cycle semantics would stay sound).

use std::collections::BTreeMap;
use std::time::Instant;

use good_lp::{constraint, microlp, variable, variables, Expression, Solution, SolverModel};

use super::ilp_trades::item_clashes;
use crate::{
    Completion, Cycle, CycleEnumerator, Diagnostic, Error, Selection, SolveContext, SolveStatus,
    Solver, SolverStats, UserIdx,
};

pub struct MaxPlayersIlp;

impl Solver for MaxPlayersIlp {
    fn name(&self) -> &'static str {
        "ilp-players"
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

        // who gives and receives how many times in each cycle
        let mut touches: BTreeMap<UserIdx, Vec<usize>> = BTreeMap::new();
        let mut gives: BTreeMap<UserIdx, BTreeMap<usize, (usize, usize)>> = BTreeMap::new();
        for (c, cycle) in cycles.iter().enumerate() {
            for user in cycle.owners(ctx.instance) {
                touches.entry(user).or_default().push(c);
            }
            for (given, received) in cycle.steps() {
                let giver = ctx.instance.owner_of(given);
                let receiver = ctx.instance.owner_of(received);
                gives.entry(giver).or_default().entry(c).or_insert((0, 0)).0 += 1;
                gives
                    .entry(receiver)
                    .or_default()
                    .entry(c)
                    .or_insert((0, 0))
                    .1 += 1;
            }
        }

        let mut vars = variables!();
        let xs: Vec<_> = cycles.iter().map(|_| vars.add(variable().binary())).collect();
        let ys: BTreeMap<UserIdx, _> = touches
            .keys()
            .map(|user| (*user, vars.add(variable().binary())))
            .collect();

        let objective: Expression = ys.values().map(|y| Expression::from(*y)).sum();
        let mut model = vars.maximise(objective).using(microlp);
        let mut nb_constraints = 0;

        // item disjointness
        for (_, members) in item_clashes(&cycles) {
            let usage: Expression = members.iter().map(|c| Expression::from(xs[*c])).sum();
            model = model.with(constraint!(usage <= 1));
            nb_constraints += 1;
        }
        // a participant only counts when one of their cycles is chosen ..
        for (user, members) in &touches {
            let chosen: Expression = members.iter().map(|c| Expression::from(xs[*c])).sum();
            model = model.with(constraint!(ys[user] <= chosen));
            nb_constraints += 1;
        }
        // .. and must count as soon as any of them is
        for (user, members) in &touches {
            for c in members {
                model = model.with(constraint!(ys[user] >= xs[*c]));
                nb_constraints += 1;
            }
        }
        // give/receive balance per participant; a plain cycle hands every
        // involved owner exactly as many items as it takes from them, so the
        // row only materialises when the two sides actually differ
        for per_cycle in gives.values() {
            if per_cycle.values().all(|(g, r)| g == r) {
                continue;
            }
            let given: Expression = per_cycle
                .iter()
                .map(|(c, (g, _))| *g as f64 * xs[*c])
                .sum();
            let received: Expression = per_cycle
                .iter()
                .map(|(c, (_, r))| *r as f64 * xs[*c])
                .sum();
            model = model.with(constraint!(given == received));
            nb_constraints += 1;
        }

        let nb_variables = xs.len() + ys.len();
        let solve_start = Instant::now();
        let solved = model.solve();
        let solver_time_seconds = solve_start.elapsed().as_secs_f64();

        let mut stats = SolverStats {
            cycles_found: cycles.len(),
            solver_time_seconds,
            ilp_num_variables: Some(nb_variables),
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
                Ok(Completion {
                    status: SolveStatus::Optimal,
                    selection: Selection::Cycles(picked),
                    stats,
                })
            }
            Err(err) => {
                Diagnostic::emit(
                    &mut stats.diagnostics,
                    format!("no optimal solution was found: {}", err),
                );
                Ok(Completion {
                    status: SolveStatus::Failed,
                    selection: Selection::empty(),
                    stats,
                })
            }
        }
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################
