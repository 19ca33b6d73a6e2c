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

//! The five stock solver back-ends. They all implement the `Solver` trait
//! over the same context, which makes them interchangeable: the CLI (or any
//! other caller) merely picks one by name.

mod genetic;
mod greedy;
mod ilp_players;
mod ilp_trades;
mod matching;

pub use genetic::*;
pub use greedy::*;
pub use ilp_players::*;
pub use ilp_trades::*;
pub use matching::*;

use crate::{Error, Solver};

/// Resolves a back-end from its command-line name. An unrecognised name is a
/// fatal input error.
pub fn by_name(name: &str) -> Result<Box<dyn Solver>, Error> {
    match name {
        "matching" => Ok(Box::new(MatchingSolver)),
        "ilp-trades" => Ok(Box::new(MaxTradesIlp)),
        "ilp-players" => Ok(Box::new(MaxPlayersIlp)),
        "genetic" => Ok(Box::new(GeneticSolver)),
        "greedy" => Ok(Box::new(GreedySolver)),
        other => Err(Error::UnknownSolver(other.to_string())),
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_by_name {
    use super::*;

    #[test]
    fn resolves_every_stock_backend() {
        for name in ["matching", "ilp-trades", "ilp-players", "genetic", "greedy"] {
            assert_eq!(name, by_name(name).unwrap().name());
        }
    }

    #[test]
    fn rejects_unknown_names() {
        assert!(matches!(
            by_name("simulated-annealing"),
            Err(Error::UnknownSolver(_))
        ));
    }
}
