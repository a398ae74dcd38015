//! Probe Cycle
//!
//! The failover sequence of one health check as a small state machine:
//!
//! ```text
//! Probing(start) --online--> Succeeded(i)
//! Probing(i)     --failed--> Probing(i + 1 mod n)
//! Probing(i)     --failed--> Exhausted          (when i + 1 mod n == start)
//! ```
//!
//! Transitions are pure; the prober drives the registry cursor alongside.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    /// Probing the candidate at this index
    Probing(usize),
    /// The candidate at this index answered online
    Succeeded(usize),
    /// Every candidate failed once
    Exhausted,
}

/// One pass over the registry, starting at the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeCycle {
    start: usize,
    state: CycleState,
    visited: Vec<usize>,
    advances: usize,
}

impl ProbeCycle {
    pub fn begin(start: usize) -> Self {
        Self {
            start,
            state: CycleState::Probing(start),
            visited: vec![start],
            advances: 0,
        }
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    /// Candidate indexes probed so far, in order.
    pub fn visited(&self) -> &[usize] {
        &self.visited
    }

    /// Number of times the cursor moved during this cycle.
    pub fn advances(&self) -> usize {
        self.advances
    }

    pub fn is_finished(&self) -> bool {
        !matches!(self.state, CycleState::Probing(_))
    }

    /// The current candidate answered online.
    pub fn on_success(mut self) -> Self {
        if let CycleState::Probing(index) = self.state {
            self.state = CycleState::Succeeded(index);
        }
        self
    }

    /// The current candidate failed; move on or give up.
    pub fn on_failure(mut self, candidate_count: usize) -> Self {
        if let CycleState::Probing(index) = self.state {
            let next = (index + 1) % candidate_count.max(1);
            self.advances += 1;
            if next == self.start {
                self.state = CycleState::Exhausted;
            } else {
                self.state = CycleState::Probing(next);
                self.visited.push(next);
            }
        }
        self
    }
}
