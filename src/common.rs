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

//! This module defines the most basic data types that are used throughout all
//! the code of our library (both at the abstraction and implementation levels).
//! These are also the types your client code is likely to work with: the
//! problem instance (participants, items, offers), the trade cycles that the
//! solvers manipulate, and the outcome of an attempted resolution.

use fxhash::{FxHashMap, FxHashSet};

// ----------------------------------------------------------------------------
// --- INDICES ----------------------------------------------------------------
// ----------------------------------------------------------------------------
/// This type identifies one participant of the math trade. Each participant is
/// assumed to be identified with an integer ranging from 0 until
/// `instance.nb_participants()` (the sentinel bucket for unknown owners, when
/// present, sits past that range).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct UserIdx(pub usize);
impl UserIdx {
    #[inline]
    /// This function returns the id (numeric value) of the participant.
    pub fn id(self) -> usize {
        self.0
    }
}

/// This type identifies one tradable item. Each item is assumed to be
/// identified with an integer ranging from 0 until `instance.nb_items()`.
/// The textual identifier that appeared in the input file is kept on the
/// `Item` record itself.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ItemIdx(pub usize);
impl ItemIdx {
    #[inline]
    /// This function returns the id (numeric value) of the item.
    pub fn id(self) -> usize {
        self.0
    }
}

// ----------------------------------------------------------------------------
// --- INSTANCE ---------------------------------------------------------------
// ----------------------------------------------------------------------------
/// An offer is a participant's declaration that one of their items is up for
/// trade against any single entry of its wishlist. The wishlist is kept in
/// priority order: the item at position 0 is the most wanted one and the
/// priority of the entry at position i is `i + 1` (1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offer {
    /// The item which is being offered away
    pub item: ItemIdx,
    /// The ranked list of items its owner would accept in return
    pub wishlist: Vec<ItemIdx>,
}

/// One participant of the trade. The `display` form preserves the casing of
/// the input file while `folded` is the canonical (lowercased) identifier
/// which is used for all ownership comparisons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// The name as it was spelled in the input
    pub display: String,
    /// The case-folded canonical name
    pub folded: String,
    /// All the offers this participant published
    pub offers: Vec<Offer>,
}

/// One tradable item. An item has exactly one owner; ownership never changes
/// over the lifetime of an instance (a solution merely *plans* a rotation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// The globally unique textual identifier of the item
    pub id: String,
    /// The human readable name of the item
    pub name: String,
    /// The participant owning this item
    pub owner: UserIdx,
}

/// This is the canonical, fully normalised form of a math-trade problem: the
/// typed counterpart of the raw `users`/`items` maps found in the instance
/// files. An instance guarantees the following invariants:
///
/// * every item's owner designates an existing participant (possibly the
///   sentinel `unknown` bucket),
/// * every offer's offered item is owned by the publishing participant,
/// * every wishlist entry designates a known item which is *not* owned by the
///   publishing participant.
///
/// Instances are created by the normaliser and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Instance {
    /// All participants, the sentinel bucket (if any) last
    pub participants: Vec<Participant>,
    /// All items of the trade
    pub items: Vec<Item>,
    /// Maps a case-folded participant name onto its index
    user_index: FxHashMap<String, UserIdx>,
    /// Maps a textual item id onto its index
    item_index: FxHashMap<String, ItemIdx>,
    /// The index of the sentinel participant gathering items whose declared
    /// owner is not a known participant
    sentinel: Option<UserIdx>,
}

impl Instance {
    /// Assembles an instance from its parts. This is meant to be called by the
    /// normaliser once every invariant has been enforced.
    pub fn assemble(
        participants: Vec<Participant>,
        items: Vec<Item>,
        sentinel: Option<UserIdx>,
    ) -> Self {
        let user_index = participants
            .iter()
            .enumerate()
            .map(|(i, p)| (p.folded.clone(), UserIdx(i)))
            .collect();
        let item_index = items
            .iter()
            .enumerate()
            .map(|(i, it)| (it.id.clone(), ItemIdx(i)))
            .collect();
        Instance {
            participants,
            items,
            user_index,
            item_index,
            sentinel,
        }
    }

    /// The number of actual participants, sentinel bucket excluded.
    pub fn nb_participants(&self) -> usize {
        match self.sentinel {
            Some(_) => self.participants.len() - 1,
            None => self.participants.len(),
        }
    }
    /// The total number of items in the trade.
    pub fn nb_items(&self) -> usize {
        self.items.len()
    }
    /// Returns the item identified by the given index.
    pub fn item(&self, idx: ItemIdx) -> &Item {
        &self.items[idx.id()]
    }
    /// Returns the participant identified by the given index.
    pub fn participant(&self, idx: UserIdx) -> &Participant {
        &self.participants[idx.id()]
    }
    /// Returns the owner of the given item.
    pub fn owner_of(&self, idx: ItemIdx) -> UserIdx {
        self.items[idx.id()].owner
    }
    /// Resolves a textual item id onto its index.
    pub fn item_idx(&self, id: &str) -> Option<ItemIdx> {
        self.item_index.get(id).copied()
    }
    /// Resolves a case-folded participant name onto its index.
    pub fn user_idx(&self, folded: &str) -> Option<UserIdx> {
        self.user_index.get(folded).copied()
    }
    /// True iff the given participant is the sentinel bucket for unknown
    /// owners. Items attached to it can never take part in any exchange.
    pub fn is_sentinel(&self, user: UserIdx) -> bool {
        self.sentinel == Some(user)
    }
    /// True iff the owner of the given item is the sentinel bucket.
    pub fn has_unknown_owner(&self, item: ItemIdx) -> bool {
        self.is_sentinel(self.owner_of(item))
    }
}

// ----------------------------------------------------------------------------
// --- CYCLES AND SELECTIONS --------------------------------------------------
// ----------------------------------------------------------------------------
/// A trade cycle: an ordered sequence of distinct items [c0, c1, .., ck-1]
/// such that every consecutive pair (and the wrap-around pair) is an edge of
/// the want-graph. The owner of ci gives ci away and receives c(i+1 mod k) in
/// return. Cycles are always kept in their canonical rotation: the smallest
/// item sits in front.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cycle {
    items: Vec<ItemIdx>,
}

impl Cycle {
    /// Builds a cycle, rotating the given sequence into its canonical form
    /// (smallest item first). Rotation preserves the realised exchanges.
    pub fn new(mut items: Vec<ItemIdx>) -> Self {
        let smallest = items
            .iter()
            .enumerate()
            .min_by_key(|(_, it)| **it)
            .map(|(i, _)| i)
            .unwrap_or(0);
        items.rotate_left(smallest);
        Cycle { items }
    }
    /// The number of items (equivalently, of exchanges) this cycle comprises.
    pub fn len(&self) -> usize {
        self.items.len()
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
    /// The items of the cycle, in rotation order.
    pub fn items(&self) -> &[ItemIdx] {
        &self.items
    }
    /// Iterates over the (given, received) pairs realised by this cycle,
    /// wrap-around step included.
    pub fn steps(&self) -> impl Iterator<Item = (ItemIdx, ItemIdx)> + '_ {
        let n = self.items.len();
        (0..n).map(move |i| (self.items[i], self.items[(i + 1) % n]))
    }
    /// True iff this cycle shares at least one item with the given set.
    pub fn conflicts_with(&self, used: &FxHashSet<ItemIdx>) -> bool {
        self.items.iter().any(|it| used.contains(it))
    }
    /// Adds every item of this cycle to the given set.
    pub fn commit_into(&self, used: &mut FxHashSet<ItemIdx>) {
        used.extend(self.items.iter().copied());
    }
    /// The set of distinct participants owning an item of this cycle.
    pub fn owners(&self, instance: &Instance) -> FxHashSet<UserIdx> {
        self.items.iter().map(|it| instance.owner_of(*it)).collect()
    }
}

/// One receiver-side pair of a full matching: the owner of `item` gives
/// `item` away and receives `receives` in return. Pairs where both ends
/// coincide stand for "the item keeps its owner" and never make it into a
/// selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradePair {
    /// The item whose owner is trading away
    pub item: ItemIdx,
    /// The item flowing back to that owner
    pub receives: ItemIdx,
}

/// The output of a solver: either a set of pairwise item-disjoint cycles, or
/// the non-trivial pairs of a full matching on the bipartite formulation.
/// Both shapes reconstruct into the very same exchange records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// A set of item-disjoint trade cycles
    Cycles(Vec<Cycle>),
    /// The non-self pairs of a minimum-cost full matching
    Matching(Vec<TradePair>),
}

impl Selection {
    /// An empty selection (no item moves at all). This is the degenerate yet
    /// perfectly valid outcome of a solve on an instance without any
    /// compatible wishes.
    pub fn empty() -> Self {
        Selection::Cycles(vec![])
    }
    /// The number of cycles (resp. matched pairs) this selection comprises.
    pub fn nb_selected(&self) -> usize {
        match self {
            Selection::Cycles(cycles) => cycles.len(),
            Selection::Matching(pairs) => pairs.len(),
        }
    }
}

/// One planned exchange, derived from a selection by the reconstructor.
/// The giver parts with `given` (an item they own) and receives `received`,
/// which is owned by `receiver`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exchange {
    pub giver: UserIdx,
    pub receiver: UserIdx,
    pub given: ItemIdx,
    pub received: ItemIdx,
}

// ----------------------------------------------------------------------------
// --- RESULTS ----------------------------------------------------------------
// ----------------------------------------------------------------------------
/// Tells how an attempted resolution ended.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SolveStatus {
    /// The solver proved its selection optimal for its objective
    Optimal,
    /// The solver produced a feasible selection without optimality proof
    /// (heuristic back-ends always land here)
    Feasible,
    /// The cutoff fired: the selection is the best known partial result
    Cancelled,
    /// The back-end reported a failure condition; the selection is empty and
    /// a diagnostic explains what went wrong
    Failed,
}

/// A few figures every solver reports about its own run.
#[derive(Debug, Clone, Default)]
pub struct SolverStats {
    /// How many cycles were enumerated for this solve (0 for the matching
    /// back-end which does not enumerate cycles)
    pub cycles_found: usize,
    /// The wall time spent inside the back-end proper
    pub solver_time_seconds: f64,
    /// Number of variables of the ILP model, when one was built
    pub ilp_num_variables: Option<usize>,
    /// Number of constraints of the ILP model, when one was built
    pub ilp_num_constraints: Option<usize>,
    /// The non-fatal conditions the solver ran into
    pub diagnostics: Vec<Diagnostic>,
}

/// The outcome of a solve: a status, the selection itself and the solver's
/// own accounting.
#[derive(Debug, Clone)]
pub struct Completion {
    pub status: SolveStatus,
    pub selection: Selection,
    pub stats: SolverStats,
}

impl Completion {
    /// A completion carrying an empty selection with the given status.
    pub fn empty(status: SolveStatus) -> Self {
        Completion {
            status,
            selection: Selection::empty(),
            stats: SolverStats::default(),
        }
    }
}

// ----------------------------------------------------------------------------
// --- DIAGNOSTICS AND ERRORS -------------------------------------------------
// ----------------------------------------------------------------------------
/// A non-fatal condition observed while processing the input or solving.
/// Diagnostics accumulate alongside results instead of aborting a stage;
/// their count always makes it into the final report even when the messages
/// themselves are filtered out of the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
        }
    }
    /// Records a warning: logs it and pushes it onto the running list.
    pub fn emit(diags: &mut Vec<Diagnostic>, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}", message);
        diags.push(Diagnostic { message });
    }
}

/// The fatal error conditions of this crate. Anything else is reported as a
/// `Diagnostic` and processing carries on.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// There was an io related error (file missing, unreadable, ..)
    #[error("io error {0}")]
    Io(#[from] std::io::Error),
    /// The instance or metrics json could not be (de)serialised
    #[error("malformed json {0}")]
    Json(#[from] serde_json::Error),
    /// The requested solver name matches no known back-end
    #[error("unknown solver '{0}'")]
    UnknownSolver(String),
    /// The enumerated cycle pool outgrew the configured cap
    #[error("cycle pool exceeds the configured cap of {0} cycles")]
    CyclePoolExceeded(usize),
}

// ----------------------------------------------------------------------------
// --- CONFIGURATION ----------------------------------------------------------
// ----------------------------------------------------------------------------
/// The parameter block of the genetic solver. All defaults follow the stock
/// tuning; they can be overridden one by one through the generated builder
/// (`GeneticParamsBuilder`).
#[derive(Debug, Clone, derive_builder::Builder)]
pub struct GeneticParams {
    /// Number of chromosomes kept alive at any generation
    #[builder(default = "100")]
    pub population_size: usize,
    /// Number of generations to breed before giving the answer
    #[builder(default = "200")]
    pub generations: usize,
    /// Fraction of the population selected for breeding
    #[builder(default = "0.8")]
    pub crossover_rate: f64,
    /// Probability for a freshly bred chromosome to undergo a mutation
    #[builder(default = "0.1")]
    pub mutation_rate: f64,
    /// Number of fittest chromosomes copied verbatim into the next generation
    #[builder(default = "2")]
    pub elite_size: usize,
    /// Number of stagnant generations after which the mutation rate escalates
    #[builder(default = "10")]
    pub stagnation_window: usize,
    /// Population diversity (distinct/total) below which fresh blood is
    /// injected
    #[builder(default = "0.1")]
    pub diversity_floor: f64,
    /// Fraction of the population replaced by fresh chromosomes upon a
    /// diversity injection
    #[builder(default = "0.2")]
    pub injection_fraction: f64,
    /// Hard cap on the escalated mutation rate
    #[builder(default = "0.5")]
    pub mutation_ceiling: f64,
}

impl Default for GeneticParams {
    fn default() -> Self {
        GeneticParams {
            population_size: 100,
            generations: 200,
            crossover_rate: 0.8,
            mutation_rate: 0.1,
            elite_size: 2,
            stagnation_window: 10,
            diversity_floor: 0.1,
            injection_fraction: 0.2,
            mutation_ceiling: 0.5,
        }
    }
}

/// The knobs an operator can turn on a solve, regardless of the chosen
/// back-end. A builder (`SolveConfigBuilder`) is generated for piecemeal
/// construction.
#[derive(Debug, Clone, derive_builder::Builder)]
pub struct SolveConfig {
    /// Longest cycle the enumerator will produce. This is the operator's main
    /// lever on the (worst case exponential) enumeration cost.
    #[builder(default = "8")]
    pub max_cycle_length: usize,
    /// Hard cap on the materialised cycle pool: the ILP back-ends refuse to
    /// build a model past this many cycles.
    #[builder(default = "1_000_000")]
    pub max_cycles: usize,
    /// Seed of the genetic solver's random source. Two solves with the same
    /// instance and seed produce the same answer.
    #[builder(default = "0")]
    pub seed: u64,
    /// Whether the want-graph gets its weed-out pre-pass (dropping items
    /// nobody wants) before cycle enumeration.
    #[builder(default = "true")]
    pub weed_out: bool,
    /// The genetic solver parameter block
    #[builder(default)]
    pub genetic: GeneticParams,
}

impl Default for SolveConfig {
    fn default() -> Self {
        SolveConfig {
            max_cycle_length: 8,
            max_cycles: 1_000_000,
            seed: 0,
            weed_out: true,
            genetic: GeneticParams::default(),
        }
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_cycle {
    use super::*;

    #[test]
    fn steps_wrap_around() {
        let cycle = Cycle::new(vec![ItemIdx(0), ItemIdx(1), ItemIdx(2)]);
        let steps = cycle.steps().collect::<Vec<_>>();
        assert_eq!(
            steps,
            vec![
                (ItemIdx(0), ItemIdx(1)),
                (ItemIdx(1), ItemIdx(2)),
                (ItemIdx(2), ItemIdx(0)),
            ]
        );
    }

    #[test]
    fn conflict_detection() {
        let cycle = Cycle::new(vec![ItemIdx(3), ItemIdx(5)]);
        let mut used = FxHashSet::default();
        assert!(!cycle.conflicts_with(&used));
        used.insert(ItemIdx(5));
        assert!(cycle.conflicts_with(&used));
    }
}

#[cfg(test)]
mod test_config {
    use super::*;

    #[test]
    fn builder_applies_defaults() {
        let config = SolveConfigBuilder::default().build().unwrap();
        assert_eq!(config.max_cycle_length, 8);
        assert_eq!(config.seed, 0);
        assert!(config.weed_out);
        assert_eq!(config.genetic.population_size, 100);
    }

    #[test]
    fn builder_overrides_single_knob() {
        let config = SolveConfigBuilder::default()
            .max_cycle_length(4)
            .build()
            .unwrap();
        assert_eq!(config.max_cycle_length, 4);
        assert_eq!(config.max_cycles, 1_000_000);
    }
}
