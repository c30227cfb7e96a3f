//! Receive liveness watch
//!
//! An asynchronous link has no master to say "done", so completion has to be
//! inferred: if the cursor stopped moving and the FIFO is empty at the
//! expected count, the packet is in; if data arrived and then stalled, or the
//! count is wrong with nothing more coming, the packet is bad; if nothing
//! happens for the whole tick budget, the peer never spoke.
//!
//! The watch is pure bookkeeping - the caller feeds it observations from a
//! periodic status poll and an independent timer tick. For the stall
//! detection to be meaningful, the poll interval must exceed the time one
//! whole packet needs on the wire (see `UartConfig::packet_duration_micros`
//! in `porthmos-hal`).

/// Verdict of one liveness check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Liveness {
    /// No verdict yet; keep polling.
    Waiting,
    /// The packet arrived completely and nothing is left in the FIFO.
    Complete,
    /// Data arrived but the packet is wrong: too short, too long, or stuck
    /// below the interrupt threshold with no further progress.
    Stalled,
    /// The tick budget ran out before the packet completed.
    Expired,
}

/// Progress observer for one receive session
///
/// Re-armed at every session start. Compares the cursor and FIFO fill level
/// against the previous check to tell "still arriving" from "arrived and
/// stopped".
#[derive(Debug, Clone)]
pub struct ProgressWatch {
    prev_cursor: usize,
    prev_fifo_level: usize,
    /// Remaining ticks, `None` when no timeout is armed.
    budget: Option<u32>,
}

impl ProgressWatch {
    /// Arm a watch with an optional tick budget.
    pub const fn new(budget: Option<u32>) -> Self {
        Self {
            prev_cursor: 0,
            prev_fifo_level: 0,
            budget,
        }
    }

    /// Remaining tick budget, if a timeout is armed.
    pub fn budget(&self) -> Option<u32> {
        self.budget
    }

    /// Burn one tick of the timeout budget.
    ///
    /// Driven by an external periodic timer, independent of the status poll.
    pub fn tick(&mut self) {
        if let Some(remaining) = self.budget {
            self.budget = Some(remaining.saturating_sub(1));
        }
    }

    /// Evaluate one observation of the session.
    ///
    /// `cursor` is the bytes copied into the software buffer so far,
    /// `requested` the expected packet length, `fifo_level` the current
    /// hardware FIFO fill. The expired verdict is delivered at most once;
    /// completion disarms the budget.
    pub fn check(&mut self, cursor: usize, requested: usize, fifo_level: usize) -> Liveness {
        let verdict = if cursor != self.prev_cursor {
            // New data reached the software buffer since the last check.
            self.prev_cursor = cursor;
            Liveness::Waiting
        } else if fifo_level == 0 && cursor == requested {
            self.budget = None;
            Liveness::Complete
        } else if (cursor > 0 && fifo_level == 0)
            || (fifo_level > 0 && fifo_level == self.prev_fifo_level)
        {
            // Short packet with the line quiet, or bytes wedged in the FIFO
            // (excess beyond the expected count, or a stall below the
            // interrupt threshold).
            Liveness::Stalled
        } else {
            // Either nothing has arrived at all, or sub-threshold bytes are
            // still trickling in; the budget decides how long to keep waiting.
            Liveness::Waiting
        };
        self.prev_fifo_level = fifo_level;

        if verdict == Liveness::Waiting && self.budget == Some(0) {
            self.budget = None;
            return Liveness::Expired;
        }
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_needs_quiet_cursor() {
        let mut watch = ProgressWatch::new(None);
        // First check sees the cursor move: no verdict yet.
        assert_eq!(watch.check(8, 8, 0), Liveness::Waiting);
        // Second check with the cursor unchanged and the FIFO empty: done.
        assert_eq!(watch.check(8, 8, 0), Liveness::Complete);
    }

    #[test]
    fn test_nothing_arrived_keeps_waiting() {
        let mut watch = ProgressWatch::new(None);
        for _ in 0..10 {
            assert_eq!(watch.check(0, 8, 0), Liveness::Waiting);
        }
    }

    #[test]
    fn test_short_packet_stalls() {
        let mut watch = ProgressWatch::new(None);
        assert_eq!(watch.check(5, 8, 0), Liveness::Waiting);
        // Cursor stuck short of the expected count, FIFO empty: bad packet.
        assert_eq!(watch.check(5, 8, 0), Liveness::Stalled);
    }

    #[test]
    fn test_excess_bytes_stall() {
        let mut watch = ProgressWatch::new(None);
        // Full packet copied, but two extra bytes sit in the FIFO.
        assert_eq!(watch.check(8, 8, 2), Liveness::Waiting);
        assert_eq!(watch.check(8, 8, 2), Liveness::Stalled);
    }

    #[test]
    fn test_sub_threshold_stall() {
        let mut watch = ProgressWatch::new(None);
        // Three bytes arrived (below the interrupt threshold, cursor still 0)
        // and then the line went dead.
        assert_eq!(watch.check(0, 8, 3), Liveness::Waiting);
        assert_eq!(watch.check(0, 8, 3), Liveness::Stalled);
    }

    #[test]
    fn test_trickling_data_keeps_waiting() {
        let mut watch = ProgressWatch::new(None);
        // FIFO level grows between checks: data is still arriving.
        assert_eq!(watch.check(0, 8, 2), Liveness::Waiting);
        assert_eq!(watch.check(0, 8, 4), Liveness::Waiting);
        assert_eq!(watch.check(0, 8, 6), Liveness::Waiting);
    }

    #[test]
    fn test_expiry_after_exact_budget() {
        let mut watch = ProgressWatch::new(Some(5));
        for _ in 0..4 {
            watch.tick();
            assert_eq!(watch.check(0, 8, 0), Liveness::Waiting);
        }
        watch.tick();
        assert_eq!(watch.check(0, 8, 0), Liveness::Expired);
    }

    #[test]
    fn test_expiry_delivered_once() {
        let mut watch = ProgressWatch::new(Some(1));
        watch.tick();
        assert_eq!(watch.check(0, 8, 0), Liveness::Expired);
        // Budget disarmed on delivery.
        assert_eq!(watch.check(0, 8, 0), Liveness::Waiting);
        assert_eq!(watch.budget(), None);
    }

    #[test]
    fn test_completion_disarms_budget() {
        let mut watch = ProgressWatch::new(Some(5));
        watch.tick();
        assert_eq!(watch.check(8, 8, 0), Liveness::Waiting);
        assert_eq!(watch.check(8, 8, 0), Liveness::Complete);
        assert_eq!(watch.budget(), None);
    }

    #[test]
    fn test_expiry_beats_late_completion() {
        // The budget is absolute for the whole packet: data landing on the
        // same poll that burns the last tick is still a timeout.
        let mut watch = ProgressWatch::new(Some(1));
        watch.tick();
        assert_eq!(watch.check(8, 8, 0), Liveness::Expired);
    }

    #[test]
    fn test_no_budget_never_expires() {
        let mut watch = ProgressWatch::new(None);
        for _ in 0..100 {
            watch.tick();
        }
        assert_eq!(watch.check(0, 8, 0), Liveness::Waiting);
    }

    #[test]
    fn test_progress_resets_comparison() {
        let mut watch = ProgressWatch::new(None);
        assert_eq!(watch.check(4, 8, 0), Liveness::Waiting);
        // More data lands between checks: cursor moved again.
        assert_eq!(watch.check(8, 8, 0), Liveness::Waiting);
        assert_eq!(watch.check(8, 8, 0), Liveness::Complete);
    }
}
