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

//! # TRADELOOP
//! Tradeloop is a solver for the *math trade* problem: a set of participants
//! each put items on the table along with a ranked wishlist of other
//! participants' items they would accept in return, and the system computes a
//! set of item-for-item exchanges optimizing a stated objective -- under the
//! rule that whoever gives an item away receives exactly one item back.
//!
//! The engine is organised as a small pipeline: a wants-file parser produces
//! a raw instance, the normaliser turns it into the canonical typed
//! `Instance`, a directed *want-graph* is derived from the wishlists, trade
//! cycles are enumerated in that graph and one of five interchangeable
//! back-ends selects a conflict-free subset of them:
//!
//! * `matching`    -- exact minimum-cost full matching on the bipartite
//!   receiver/sender formulation,
//! * `ilp-trades`  -- exact cycle selection maximizing the number of traded
//!   items,
//! * `ilp-players` -- exact cycle selection maximizing the number of
//!   participants who trade at least once,
//! * `genetic`     -- a seeded genetic search targeting the participant-count
//!   objective,
//! * `greedy`      -- longest-cycle-first packing, no backtracking.
//!
//! ## Quick Example
//! The following runs the full pipeline over a two participant instance in
//! which each of them wants the other's item. Every back-end agrees on the
//! outcome here: both items move.
//! ```
//! use tradeloop::*;
//!
//! let json = r#"{
//!     "users": {
//!         "Alice": { "offers": { "item1": ["item2"] } },
//!         "Bob":   { "offers": { "item2": ["item1"] } }
//!     },
//!     "items": {
//!         "item1": { "owner": "Alice", "name": "Chess Set" },
//!         "item2": { "owner": "Bob",   "name": "Monopoly"  }
//!     }
//! }"#;
//!
//! let raw: RawInstance = serde_json::from_str(json).unwrap();
//! let (instance, diags) = normalise(&raw);
//! assert!(diags.is_empty());
//!
//! let config  = SolveConfig::default();
//! let outcome = solve(&instance, "greedy", &config, &NoCutoff).unwrap();
//! assert_eq!(2, outcome.exchanges.len());
//! ```
//!
//! ## Going further
//! For finer control, the stages compose by hand: `parse_wants` for the text
//! format, `normalise`, `WantGraph::build`, `CycleEnumerator` for lazy cycle
//! production, and the `Solver` implementations themselves. The `Cutoff`
//! trait (with the stock `NoCutoff` and `TimeBudget`) provides cooperative
//! cancellation of the expensive stages.

mod abstraction;
mod common;
mod implementation;

pub use abstraction::*;
pub use common::*;
pub use implementation::*;
