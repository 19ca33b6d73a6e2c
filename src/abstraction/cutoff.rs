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

//! This module defines the `Cutoff` trait: the cooperative cancellation hook
//! of the solver layer.

/// This trait encapsulates a criterion deciding when a long operation should
/// give up and return what it has. The expensive stages of a solve (cycle
/// enumeration, ILP solving, the generations of the genetic search) poll it
/// at their natural boundaries: between enumeration roots, between
/// generations, around a model solve. When the cutoff fires, the stage
/// returns its best known partial (possibly empty) result and the completion
/// is flagged `Cancelled`.
///
/// Timeouts are one such criterion (see `TimeBudget`); a front-end's cancel
/// button wired to an atomic flag is another.
pub trait Cutoff {
    /// Returns true when the ongoing operation must stop.
    fn must_stop(&self) -> bool;
}
