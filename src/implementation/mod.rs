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

//! This module (and its submodules) provide the concrete implementation of
//! every stage of the math-trade pipeline: the wants-file parser, the
//! normaliser, the graph builders, the cycle enumerator, the five solver
//! back-ends, the exchange reconstructor, the reporter and the visualisation
//! emitter -- plus the `solve` entry point tying them all together.

mod cutoff;
mod cycles;
pub mod graph;
mod instance;
mod normalise;
mod pipeline;
mod reconstruct;
mod report;
pub mod solver;
mod viz;
mod wants;

pub use cutoff::*;
pub use cycles::*;
pub use graph::*;
pub use instance::*;
pub use normalise::*;
pub use pipeline::*;
pub use reconstruct::*;
pub use report::*;
pub use solver::*;
pub use viz::*;
pub use wants::*;
