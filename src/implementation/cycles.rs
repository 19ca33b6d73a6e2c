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

//! The cycle enumerator: a lazy iterator producing every simple directed
//! cycle of bounded length in the want-graph, each exactly once. The search
//! is a plain rooted depth-first walk: roots are visited in vertex order and
//! a path rooted at r only ever runs through vertices with an index larger
//! than r, so each cycle is discovered from its smallest vertex only. The
//! output order is thus fully determined by the graph. Worst case cost is
//! exponential in the graph density; the length bound is the operator's knob
//! on it.

use petgraph::graph::NodeIndex;

use crate::{Cutoff, Cycle, Error, Instance, WantGraph};

/// One level of the depth-first walk.
struct Frame {
    node: NodeIndex,
    succ: Vec<NodeIndex>,
    pos: usize,
}

/// The lazy cycle producer. Use it as a plain `Iterator` to stream cycles
/// one at a time (the greedy and genetic back-ends could not care less about
/// having them all in memory at once), or `materialise` the pool with a cap
/// for the back-ends that must see everything (the ILP formulations).
///
/// Cycles running through an item of the sentinel (unknown) owner are never
/// produced. The cancellation hook is polled between enumeration roots; a
/// fired cutoff ends the stream early and is reported by `was_cancelled`.
pub struct CycleEnumerator<'a> {
    graph: &'a WantGraph,
    cutoff: &'a dyn Cutoff,
    max_len: usize,
    /// false for the vertices excluded from the search altogether
    eligible: Vec<bool>,
    next_root: usize,
    stack: Vec<Frame>,
    on_path: Vec<bool>,
    root: NodeIndex,
    cancelled: bool,
}

impl<'a> CycleEnumerator<'a> {
    pub fn new(
        graph: &'a WantGraph,
        instance: &'a Instance,
        max_len: usize,
        cutoff: &'a dyn Cutoff,
    ) -> Self {
        let n = graph.graph().node_count();
        let mut eligible = vec![false; n];
        for node in graph.graph().node_indices() {
            eligible[node.index()] = !instance.has_unknown_owner(graph.item_of(node));
        }
        CycleEnumerator {
            graph,
            cutoff,
            max_len,
            eligible,
            next_root: 0,
            stack: Vec::new(),
            on_path: vec![false; n],
            root: NodeIndex::new(0),
            cancelled: false,
        }
    }

    /// True iff the stream ended because the cutoff fired rather than
    /// because the enumeration was exhausted.
    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Drains the stream into a pool, refusing to grow it past the given
    /// cap. The `cancelled` flag of the pool tells whether the enumeration
    /// ran to completion.
    pub fn materialise(mut self, cap: Option<usize>) -> Result<CyclePool, Error> {
        let mut cycles = Vec::new();
        for cycle in &mut self {
            if let Some(cap) = cap {
                if cycles.len() >= cap {
                    return Err(Error::CyclePoolExceeded(cap));
                }
            }
            cycles.push(cycle);
        }
        Ok(CyclePool {
            cycles,
            cancelled: self.cancelled,
        })
    }

    /// Sorted successor list of a vertex: sorting unties the output order
    /// from petgraph's internal edge ordering.
    fn successors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut succ: Vec<NodeIndex> = self.graph.graph().neighbors(node).collect();
        succ.sort_unstable();
        succ
    }

    fn push_node(&mut self, node: NodeIndex) {
        self.on_path[node.index()] = true;
        self.stack.push(Frame {
            node,
            succ: self.successors(node),
            pos: 0,
        });
    }

    fn pop_node(&mut self) {
        if let Some(frame) = self.stack.pop() {
            self.on_path[frame.node.index()] = false;
        }
    }

    /// Starts the walk rooted at the next eligible vertex; false when every
    /// root has been exhausted.
    fn advance_root(&mut self) -> bool {
        let n = self.graph.graph().node_count();
        while self.next_root < n {
            if self.cutoff.must_stop() {
                self.cancelled = true;
                return false;
            }
            let root = NodeIndex::new(self.next_root);
            self.next_root += 1;
            if self.eligible[root.index()] {
                self.root = root;
                self.push_node(root);
                return true;
            }
        }
        false
    }

    fn current_cycle(&self) -> Cycle {
        Cycle::new(
            self.stack
                .iter()
                .map(|frame| self.graph.item_of(frame.node))
                .collect(),
        )
    }
}

impl Iterator for CycleEnumerator<'_> {
    type Item = Cycle;

    fn next(&mut self) -> Option<Cycle> {
        loop {
            if self.stack.is_empty() && !self.advance_root() {
                return None;
            }
            let depth = self.stack.len();
            let root = self.root;
            let max_len = self.max_len;

            // pick the next candidate of the topmost frame, if any
            let candidate = match self.stack.last_mut() {
                Some(frame) if frame.pos < frame.succ.len() => {
                    let v = frame.succ[frame.pos];
                    frame.pos += 1;
                    Some(v)
                }
                _ => None,
            };

            match candidate {
                None => self.pop_node(),
                Some(v) if v == root => {
                    if depth >= 2 {
                        return Some(self.current_cycle());
                    }
                }
                Some(v) => {
                    if v.index() > root.index()
                        && !self.on_path[v.index()]
                        && depth < max_len
                        && self.eligible[v.index()]
                    {
                        self.push_node(v);
                    }
                }
            }
        }
    }
}

/// A fully materialised cycle pool.
#[derive(Debug, Clone)]
pub struct CyclePool {
    pub cycles: Vec<Cycle>,
    /// true when the enumeration was cut short by the cancellation hook
    pub cancelled: bool,
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################
