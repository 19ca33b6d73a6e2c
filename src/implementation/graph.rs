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

//! The graph builders. Two formulations of the same instance live here: the
//! directed *want-graph* the cycle-based back-ends search, and the bipartite
//! receiver/sender graph the matching back-end pairs up.

use fxhash::FxHashSet;
use petgraph::graph::{DiGraph, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::{Diagnostic, Instance, ItemIdx};

/// The weight of a receiver/sender self-edge: large enough that the matcher
/// only ever leaves an item with its owner when no real exchange is feasible.
pub const KEEP_WEIGHT: i64 = 1_000_000_000;

// ----------------------------------------------------------------------------
// --- WANT-GRAPH -------------------------------------------------------------
// ----------------------------------------------------------------------------
/// The directed want-graph of an instance. There is one vertex per item and
/// one edge (a -> b) whenever the offer of item a lists b in its wishlist;
/// the edge weight is 1/priority, so a more preferred wish weighs more.
/// Edges between two items of the same owner are refused, as are edges
/// touching an item of the sentinel (unknown) owner: neither could ever be
/// part of a legal exchange.
#[derive(Debug, Clone)]
pub struct WantGraph {
    graph: DiGraph<ItemIdx, f64>,
    /// maps every item onto its vertex, if it still has one
    node_of: Vec<Option<NodeIndex>>,
}

impl WantGraph {
    /// Derives the want-graph of the given (normalised) instance.
    pub fn build(instance: &Instance) -> Self {
        let mut graph = DiGraph::new();
        let mut node_of = vec![None; instance.nb_items()];
        for i in 0..instance.nb_items() {
            node_of[i] = Some(graph.add_node(ItemIdx(i)));
        }
        for participant in &instance.participants {
            for offer in &participant.offers {
                let owner = instance.owner_of(offer.item);
                for (position, wish) in offer.wishlist.iter().enumerate() {
                    if instance.owner_of(*wish) == owner {
                        continue;
                    }
                    if instance.has_unknown_owner(*wish) || instance.has_unknown_owner(offer.item)
                    {
                        continue;
                    }
                    if let (Some(from), Some(to)) =
                        (node_of[offer.item.id()], node_of[wish.id()])
                    {
                        let priority = position + 1;
                        graph.add_edge(from, to, 1.0 / priority as f64);
                    }
                }
            }
        }
        WantGraph { graph, node_of }
    }

    /// The weed-out pre-pass: one sweep removing every vertex without any
    /// incoming edge. Nobody wants those items so they cannot sit on any
    /// cycle; dropping them shrinks the enumeration without losing a single
    /// achievable cycle.
    pub fn weed_out(&mut self, instance: &Instance, diags: &mut Vec<Diagnostic>) -> usize {
        let doomed: FxHashSet<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|n| {
                self.graph
                    .neighbors_directed(*n, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .collect();
        if doomed.is_empty() {
            return 0;
        }
        let mut names: Vec<&str> = doomed
            .iter()
            .map(|n| instance.item(self.graph[*n]).id.as_str())
            .collect();
        names.sort_unstable();
        Diagnostic::emit(
            diags,
            format!("weeding out items nobody wants: {:?}", names),
        );

        self.graph.retain_nodes(|_, n| !doomed.contains(&n));
        self.node_of = vec![None; self.node_of.len()];
        for n in self.graph.node_indices() {
            self.node_of[self.graph[n].id()] = Some(n);
        }
        doomed.len()
    }

    /// The underlying petgraph structure.
    pub fn graph(&self) -> &DiGraph<ItemIdx, f64> {
        &self.graph
    }
    /// The item sitting on the given vertex.
    pub fn item_of(&self, node: NodeIndex) -> ItemIdx {
        self.graph[node]
    }
    /// The vertex of the given item, unless it was weeded out.
    pub fn node_of(&self, item: ItemIdx) -> Option<NodeIndex> {
        self.node_of[item.id()]
    }
    pub fn nb_nodes(&self) -> usize {
        self.graph.node_count()
    }
    pub fn nb_edges(&self) -> usize {
        self.graph.edge_count()
    }

    /// The most wanted item of the graph: the one with the largest in-degree
    /// (ties break on the first vertex encountered). This is a reporting
    /// figure, not a solver input.
    pub fn most_wanted(&self) -> Option<ItemIdx> {
        let mut best: Option<(usize, ItemIdx)> = None;
        for n in self.graph.node_indices() {
            let score = self
                .graph
                .neighbors_directed(n, Direction::Incoming)
                .count();
            if best.map(|(s, _)| score > s).unwrap_or(true) {
                best = Some((score, self.graph[n]));
            }
        }
        best.map(|(_, item)| item)
    }
}

// ----------------------------------------------------------------------------
// --- BIPARTITE RECEIVER/SENDER GRAPH ----------------------------------------
// ----------------------------------------------------------------------------
/// Which side of the bipartition a vertex belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The receiver copy of an item (its owner stands to receive something)
    Receiver,
    /// The sender copy of an item (the item stands to be sent to someone)
    Sender,
}

/// One vertex of the receiver/sender graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RsNode {
    pub item: ItemIdx,
    pub side: Side,
}

/// The bipartite formulation the matching back-end works on. Every item
/// contributes a receiver and a sender vertex joined by a heavy self-edge
/// (the "item keeps its owner" option), and every want-graph edge (a -> b)
/// contributes a unit-weight edge between a's receiver and b's sender.
#[derive(Debug, Clone)]
pub struct RsGraph {
    graph: UnGraph<RsNode, i64>,
    receivers: Vec<NodeIndex>,
    senders: Vec<NodeIndex>,
}

impl RsGraph {
    /// Builds the bipartite graph for the given instance and want-graph.
    pub fn build(instance: &Instance, want: &WantGraph) -> Self {
        let n = instance.nb_items();
        let mut graph = UnGraph::default();
        let mut receivers = Vec::with_capacity(n);
        let mut senders = Vec::with_capacity(n);
        for i in 0..n {
            receivers.push(graph.add_node(RsNode {
                item: ItemIdx(i),
                side: Side::Receiver,
            }));
        }
        for i in 0..n {
            senders.push(graph.add_node(RsNode {
                item: ItemIdx(i),
                side: Side::Sender,
            }));
        }
        for i in 0..n {
            graph.add_edge(receivers[i], senders[i], KEEP_WEIGHT);
        }
        for edge in want.graph().edge_references() {
            let from = want.item_of(edge.source());
            let to = want.item_of(edge.target());
            graph.add_edge(receivers[from.id()], senders[to.id()], 1);
        }
        RsGraph {
            graph,
            receivers,
            senders,
        }
    }

    /// Sanity guard: true iff every edge joins a receiver to a sender. By
    /// construction this always holds; a false return means a programmer
    /// error upstream and the matching back-end bails out on it.
    pub fn is_bipartite(&self) -> bool {
        self.graph.edge_references().all(|e| {
            let a = self.graph[e.source()].side;
            let b = self.graph[e.target()].side;
            a != b
        })
    }

    /// The number of items (vertices per side).
    pub fn nb_items(&self) -> usize {
        self.receivers.len()
    }

    /// The dense cost matrix of the assignment problem: entry (i, j) is the
    /// weight for item i's owner to receive item j, `forbidden` when the
    /// pairing is not an edge of the graph.
    pub fn cost_matrix(&self, forbidden: i64) -> Vec<Vec<i64>> {
        let n = self.nb_items();
        let mut cost = vec![vec![forbidden; n]; n];
        for edge in self.graph.edge_references() {
            let a = self.graph[edge.source()];
            let b = self.graph[edge.target()];
            let (recv, send) = match (a.side, b.side) {
                (Side::Receiver, Side::Sender) => (a.item, b.item),
                (Side::Sender, Side::Receiver) => (b.item, a.item),
                _ => continue,
            };
            cost[recv.id()][send.id()] = *edge.weight();
        }
        cost
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################
