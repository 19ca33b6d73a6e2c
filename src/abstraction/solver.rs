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

//! This module defines the `Solver` trait.

use crate::implementation::graph::WantGraph;
use crate::{Completion, Cutoff, Error, Instance, SolveConfig};

/// Everything a back-end gets to look at during one solve: the (immutable)
/// instance, the want-graph derived from it, the operator configuration and
/// the cancellation hook. The context is shared by all five stock back-ends;
/// this is what makes them interchangeable.
pub struct SolveContext<'a> {
    /// The normalised problem instance
    pub instance: &'a Instance,
    /// The directed want-graph over the instance's items (weeded out or not,
    /// depending on the configuration and the chosen back-end)
    pub graph: &'a WantGraph,
    /// The operator knobs
    pub config: &'a SolveConfig,
    /// The cooperative cancellation hook
    pub cutoff: &'a dyn Cutoff,
}

/// This is the solver abstraction. It is implemented by every selection
/// strategy of this crate: the exact minimum-cost matching, the two
/// cycle-ILP formulations, the genetic search and the greedy packer. All of
/// them consume the same `SolveContext` and produce a `Completion`, which
/// makes them fully interchangeable from the caller's standpoint (the CLI
/// merely dispatches on a name).
///
/// A solve is synchronous: call, get a result. The implementations need not
/// be reentrant; there is never more than one solve per process. Long
/// running back-ends poll `ctx.cutoff` at their natural boundaries and
/// return a `Cancelled` completion when it fired.
///
/// The `Err` side of the result is reserved for genuinely fatal conditions
/// (e.g. the cycle pool outgrowing its cap): ordinary solver mishaps such as
/// a non-optimal ILP status yield an `Ok` completion with an empty selection
/// and a diagnostic.
pub trait Solver {
    /// The name under which the CLI knows this back-end.
    fn name(&self) -> &'static str;
    /// True for the back-ends consuming the enumerated cycle pool. The
    /// pipeline only applies the weed-out pre-pass to those; the matching
    /// back-end needs every item around so each keeps its self-edge.
    fn uses_cycles(&self) -> bool {
        true
    }
    /// Runs the selection strategy over the given context and returns the
    /// outcome of the attempted resolution.
    fn solve(&mut self, ctx: &SolveContext) -> Result<Completion, Error>;
}
