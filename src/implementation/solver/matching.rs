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

//! The matching back-end: reduces the trade selection to a minimum-cost
//! perfect matching on the bipartite receiver/sender graph. Every receiver
//! vertex has at least its heavy self-edge, so a full matching always
//! exists; the self-edge weight makes the matcher prefer real exchanges
//! whenever they are feasible. The assignment itself is solved exactly by
//! the Hungarian algorithm on the dense cost matrix.

use std::time::Instant;

use crate::graph::KEEP_WEIGHT;
use crate::{
    Completion, Diagnostic, Error, ItemIdx, RsGraph, Selection, SolveContext, SolveStatus, Solver,
    SolverStats, TradePair,
};

pub struct MatchingSolver;

impl Solver for MatchingSolver {
    fn name(&self) -> &'static str {
        "matching"
    }

    fn uses_cycles(&self) -> bool {
        false
    }

    fn solve(&mut self, ctx: &SolveContext) -> Result<Completion, Error> {
        let start = Instant::now();
        let mut diagnostics = Vec::new();

        if ctx.cutoff.must_stop() {
            return Ok(Completion::empty(SolveStatus::Cancelled));
        }

        let rs = RsGraph::build(ctx.instance, ctx.graph);
        if !rs.is_bipartite() {
            Diagnostic::emit(
                &mut diagnostics,
                "the receiver/sender graph is not bipartite; returning an empty matching",
            );
            return Ok(Completion {
                status: SolveStatus::Failed,
                selection: Selection::empty(),
                stats: SolverStats {
                    diagnostics,
                    ..SolverStats::default()
                },
            });
        }

        let n = rs.nb_items();
        // a pairing that is no edge of the graph must cost more than a full
        // round of self-edges, so the optimum never resorts to one
        let forbidden = KEEP_WEIGHT * (n as i64 + 1);
        let cost = rs.cost_matrix(forbidden);
        let assignment = hungarian(&cost);

        let pairs = assignment
            .iter()
            .enumerate()
            .filter(|(i, j)| i != *j)
            .map(|(i, j)| TradePair {
                item: ItemIdx(i),
                receives: ItemIdx(*j),
            })
            .collect::<Vec<_>>();

        Ok(Completion {
            status: SolveStatus::Optimal,
            selection: Selection::Matching(pairs),
            stats: SolverStats {
                cycles_found: 0,
                solver_time_seconds: start.elapsed().as_secs_f64(),
                ilp_num_variables: None,
                ilp_num_constraints: None,
                diagnostics,
            },
        })
    }
}

/// Solves the square assignment problem exactly: returns, for each row, the
/// column it is matched to in a minimum-total-cost perfect matching. This is
/// the classical O(n^3) Hungarian algorithm over row/column potentials;
/// ties resolve deterministically by scanning order.
fn hungarian(cost: &[Vec<i64>]) -> Vec<usize> {
    let n = cost.len();
    // all arrays are 1-based, index 0 is the virtual root of the
    // augmenting-path search
    let mut u = vec![0i64; n + 1];
    let mut v = vec![0i64; n + 1];
    let mut matched_row = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];

    for i in 1..=n {
        matched_row[0] = i;
        let mut j0 = 0usize;
        let mut minv = vec![i64::MAX; n + 1];
        let mut used = vec![false; n + 1];
        loop {
            used[j0] = true;
            let i0 = matched_row[j0];
            let mut delta = i64::MAX;
            let mut j1 = 0usize;
            for j in 1..=n {
                if used[j] {
                    continue;
                }
                let reduced = cost[i0 - 1][j - 1] - u[i0] - v[j];
                if reduced < minv[j] {
                    minv[j] = reduced;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }
            for j in 0..=n {
                if used[j] {
                    u[matched_row[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }
            j0 = j1;
            if matched_row[j0] == 0 {
                break;
            }
        }
        // unwind the augmenting path
        loop {
            let j1 = way[j0];
            matched_row[j0] = matched_row[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![0usize; n];
    for j in 1..=n {
        assignment[matched_row[j] - 1] = j - 1;
    }
    assignment
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_matching {
    use super::*;
    use crate::{normalise, NoCutoff, RawInstance, RawItem, RawUser, SolveConfig, WantGraph};

    #[test]
    fn hungarian_picks_the_cheapest_assignment() {
        let cost = vec![vec![4, 1, 3], vec![2, 0, 5], vec![3, 2, 2]];
        let assignment = hungarian(&cost);
        let total: i64 = assignment
            .iter()
            .enumerate()
            .map(|(i, j)| cost[i][*j])
            .sum();
        assert_eq!(5, total); // 1 + 2 + 2
        assert_eq!(vec![1, 0, 2], assignment);
    }

    #[test]
    fn hungarian_handles_the_identity_case() {
        let cost = vec![vec![0, 9], vec![9, 0]];
        assert_eq!(vec![0, 1], hungarian(&cost));
    }

    #[test]
    fn hungarian_copes_with_an_empty_matrix() {
        assert!(hungarian(&[]).is_empty());
    }

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
    fn matches_a_two_cycle() {
        let instance = instance(&[("a", &["b"]), ("b", &["a"])]);
        let graph = WantGraph::build(&instance);
        let config = SolveConfig::default();
        let ctx = SolveContext {
            instance: &instance,
            graph: &graph,
            config: &config,
            cutoff: &NoCutoff,
        };
        let completion = MatchingSolver.solve(&ctx).unwrap();
        assert_eq!(SolveStatus::Optimal, completion.status);
        match completion.selection {
            Selection::Matching(pairs) => {
                assert_eq!(2, pairs.len());
                assert!(pairs.iter().all(|p| p.item != p.receives));
            }
            _ => panic!("matching produces pairs"),
        }
    }

    #[test]
    fn leaves_an_unwanted_item_with_its_owner() {
        // c wants a but nobody wants c: c must self-match
        let instance = instance(&[("a", &["b"]), ("b", &["a"]), ("c", &["a"])]);
        let graph = WantGraph::build(&instance);
        let config = SolveConfig::default();
        let ctx = SolveContext {
            instance: &instance,
            graph: &graph,
            config: &config,
            cutoff: &NoCutoff,
        };
        let completion = MatchingSolver.solve(&ctx).unwrap();
        match completion.selection {
            Selection::Matching(pairs) => {
                assert_eq!(2, pairs.len());
                let c = instance.item_idx("c").unwrap();
                assert!(pairs.iter().all(|p| p.item != c && p.receives != c));
            }
            _ => panic!("matching produces pairs"),
        }
    }
}
