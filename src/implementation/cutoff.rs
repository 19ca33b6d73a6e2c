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

//! This module provides the implementation of the various cutoff criteria
//! that can be used to bound the runtime of a solve.

use std::{
    sync::{atomic::AtomicBool, Arc},
    time::Duration,
};

use crate::Cutoff;

/// _This is the default cutoff._ It never fires: the solve runs to its
/// natural completion.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoCutoff;
impl Cutoff for NoCutoff {
    fn must_stop(&self) -> bool {
        false
    }
}

/// This cutoff allows one to specify a maximum time budget for a solve.
/// Once the budget is elapsed, the expensive stages stop at their next
/// boundary and the best solution found so far is returned, flagged as
/// cancelled.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use tradeloop::{Cutoff, TimeBudget};
///
/// let cutoff = TimeBudget::new(Duration::from_secs(10));
/// assert!(!cutoff.must_stop()); // fires ten seconds from now
/// ```
#[derive(Debug, Clone)]
pub struct TimeBudget {
    stop: Arc<AtomicBool>,
}
impl TimeBudget {
    pub fn new(budget: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let t_flag = Arc::clone(&stop);

        // timer
        std::thread::spawn(move || {
            std::thread::sleep(budget);
            t_flag.store(true, std::sync::atomic::Ordering::Relaxed);
        });

        TimeBudget { stop }
    }
}
impl Cutoff for TimeBudget {
    fn must_stop(&self) -> bool {
        self.stop.load(std::sync::atomic::Ordering::Relaxed)
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_cutoff {
    use super::*;

    #[test]
    fn no_cutoff_never_fires() {
        assert!(!NoCutoff.must_stop());
    }

    #[test]
    fn time_budget_fires_once_elapsed() {
        let cutoff = TimeBudget::new(Duration::from_millis(10));
        assert!(!cutoff.must_stop());
        std::thread::sleep(Duration::from_millis(50));
        assert!(cutoff.must_stop());
    }
}
