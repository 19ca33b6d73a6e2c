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

//! The orchestrator: derives the want-graph from an instance, dispatches the
//! chosen back-end over it and reconstructs the resulting exchanges. This is
//! the one-call entry point the CLI (and most client code) goes through.

use crate::implementation::{reconstruct, solver};
use crate::{
    Completion, Cutoff, Diagnostic, Error, Exchange, Instance, ItemIdx, SolveConfig, SolveContext,
    UserSummary, WantGraph,
};

/// Everything one solve produces: the solver's completion, the flat exchange
/// records, the per-participant summaries and the diagnostics of the
/// derivation stages (the solver's own diagnostics travel in the
/// completion).
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub completion: Completion,
    pub exchanges: Vec<Exchange>,
    pub summaries: Vec<UserSummary>,
    pub diagnostics: Vec<Diagnostic>,
    /// The most wanted item of the (possibly weeded) want-graph
    pub most_wanted: Option<ItemIdx>,
}

/// Runs the full pipeline over a normalised instance with the back-end named
/// by `algo` (one of `matching`, `ilp-trades`, `ilp-players`, `genetic`,
/// `greedy`). An unknown name, or a cycle pool outgrowing its cap, is a
/// fatal error; everything else lands in the outcome.
pub fn solve(
    instance: &Instance,
    algo: &str,
    config: &SolveConfig,
    cutoff: &dyn Cutoff,
) -> Result<SolveOutcome, Error> {
    let mut solver = solver::by_name(algo)?;
    let mut diagnostics = Vec::new();

    let mut graph = WantGraph::build(instance);
    log::info!(
        "want-graph: {} vertices, {} edges",
        graph.nb_nodes(),
        graph.nb_edges()
    );
    if solver.uses_cycles() && config.weed_out {
        let removed = graph.weed_out(instance, &mut diagnostics);
        if removed > 0 {
            log::info!(
                "weed-out removed {} vertices, {} remain",
                removed,
                graph.nb_nodes()
            );
        }
    }
    let most_wanted = graph.most_wanted();

    let ctx = SolveContext {
        instance,
        graph: &graph,
        config,
        cutoff,
    };
    let completion = solver.solve(&ctx)?;
    log::info!(
        "solver '{}' done: {:?}, {} cycles selected",
        solver.name(),
        completion.status,
        completion.selection.nb_selected()
    );

    let exchanges = reconstruct::exchanges(instance, &completion.selection, &mut diagnostics);
    let summaries = reconstruct::summarise(instance, &exchanges);

    Ok(SolveOutcome {
        completion,
        exchanges,
        summaries,
        diagnostics,
        most_wanted,
    })
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_pipeline {
    use super::*;
    use crate::{normalise, NoCutoff, RawInstance, RawItem, RawUser};

    fn two_cycle() -> Instance {
        let mut raw = RawInstance::default();
        for (id, owner) in [("item1", "Alice"), ("item2", "Bob")] {
            raw.items.insert(
                id.to_string(),
                RawItem {
                    owner: owner.to_string(),
                    name: id.to_string(),
                },
            );
        }
        for (user, item, wish) in [("Alice", "item1", "item2"), ("Bob", "item2", "item1")] {
            let mut u = RawUser::default();
            u.offers.insert(item.to_string(), vec![wish.to_string()]);
            raw.users.insert(user.to_string(), u);
        }
        normalise(&raw).0
    }

    #[test]
    fn every_backend_solves_the_two_cycle() {
        let instance = two_cycle();
        let config = SolveConfig::default();
        for algo in ["matching", "ilp-trades", "ilp-players", "genetic", "greedy"] {
            let outcome = solve(&instance, algo, &config, &NoCutoff).unwrap();
            assert_eq!(2, outcome.exchanges.len(), "algo {}", algo);
        }
    }

    #[test]
    fn an_unknown_backend_is_fatal() {
        let instance = two_cycle();
        let config = SolveConfig::default();
        assert!(matches!(
            solve(&instance, "oracle", &config, &NoCutoff),
            Err(Error::UnknownSolver(_))
        ));
    }
}
