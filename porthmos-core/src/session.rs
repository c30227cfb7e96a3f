//! Transfer session state machine
//!
//! One session tracks one start-to-finish transfer request: how many bytes
//! were asked for, how many have been moved through the hardware FIFO, and
//! where the transfer stands. Sessions never reset themselves - a terminal
//! result stays visible until foreground code acknowledges it, so a finished
//! transfer cannot be silently overwritten unread.

/// Transfer status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Status {
    /// No transfer active; buffers belong to foreground code.
    Idle,
    /// A transfer has been started and the interrupt handler owns progress.
    InProgress,
    /// All requested bytes were moved. For transmit this means handed to
    /// hardware; use the engine's flushed predicate for line-quiet timing.
    Finished,
    /// The receive timeout budget ran out before the packet completed.
    TimedOut,
    /// The link misbehaved: short packet, excess bytes, or data that arrived
    /// and then stalled. Recovery is the same as for a timeout - acknowledge
    /// and restart - but the cause is distinguishable for callers that want
    /// to re-synchronize instead of merely retry.
    FramingError,
}

impl Status {
    /// Whether this is a terminal state requiring acknowledgement.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Finished | Status::TimedOut | Status::FramingError)
    }
}

/// Why a start request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StartError {
    /// A session is in progress or an earlier result is unacknowledged.
    Busy,
    /// Zero-length transfers are meaningless.
    EmptyTransfer,
    /// The request exceeds the software buffer capacity.
    Oversize,
}

/// State of one logical transfer
///
/// Constructed once per channel/direction at initialization; only its
/// contents churn per transfer.
#[derive(Debug, Clone)]
pub struct TransferSession {
    status: Status,
    requested: usize,
    cursor: usize,
}

impl Default for TransferSession {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferSession {
    /// Create an idle session.
    pub const fn new() -> Self {
        Self {
            status: Status::Idle,
            requested: 0,
            cursor: 0,
        }
    }

    /// Current status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Whether the interrupt handler currently owns this session.
    pub fn is_in_progress(&self) -> bool {
        self.status == Status::InProgress
    }

    /// Total bytes requested for the active or last session.
    pub fn requested(&self) -> usize {
        self.requested
    }

    /// Bytes moved through the hardware FIFO so far.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Bytes still outstanding.
    pub fn remaining(&self) -> usize {
        self.requested - self.cursor
    }

    /// Whether every requested byte has been moved.
    pub fn is_complete(&self) -> bool {
        self.cursor == self.requested
    }

    /// Begin a transfer of `len` bytes against a buffer of `capacity`.
    ///
    /// Rejection leaves the session untouched: a refused start mutates
    /// nothing, so callers can retry later without cleanup.
    pub fn begin(&mut self, len: usize, capacity: usize) -> Result<(), StartError> {
        if self.status != Status::Idle {
            return Err(StartError::Busy);
        }
        if len == 0 {
            return Err(StartError::EmptyTransfer);
        }
        if len > capacity {
            return Err(StartError::Oversize);
        }
        self.status = Status::InProgress;
        self.requested = len;
        self.cursor = 0;
        Ok(())
    }

    /// Record `n` more bytes moved through the FIFO.
    ///
    /// The pump bounds `n` by the remaining count, keeping the cursor
    /// monotonic and never past `requested`.
    pub fn advance(&mut self, n: usize) {
        debug_assert!(self.cursor + n <= self.requested);
        self.cursor += n;
    }

    /// Mark the session finished.
    pub fn finish(&mut self) {
        debug_assert!(self.is_complete());
        self.status = Status::Finished;
    }

    /// Abort an in-progress session to a failure terminal state.
    pub fn abort(&mut self, cause: Status) {
        debug_assert!(cause.is_terminal());
        self.status = cause;
    }

    /// Acknowledge a terminal result, returning the session to idle.
    ///
    /// Returns `true` exactly once per terminal session; `false` while a
    /// transfer is still in progress or the session is already idle.
    pub fn acknowledge(&mut self) -> bool {
        if self.status.is_terminal() {
            self.status = Status::Idle;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_from_idle() {
        let mut session = TransferSession::new();
        assert_eq!(session.begin(10, 50), Ok(()));
        assert_eq!(session.status(), Status::InProgress);
        assert_eq!(session.requested(), 10);
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn test_begin_rejects_zero_length() {
        let mut session = TransferSession::new();
        assert_eq!(session.begin(0, 50), Err(StartError::EmptyTransfer));
        assert_eq!(session.status(), Status::Idle);
    }

    #[test]
    fn test_begin_rejects_oversize() {
        let mut session = TransferSession::new();
        assert_eq!(session.begin(51, 50), Err(StartError::Oversize));
        assert_eq!(session.status(), Status::Idle);
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn test_begin_rejects_busy() {
        let mut session = TransferSession::new();
        session.begin(10, 50).unwrap();
        session.advance(4);
        assert_eq!(session.begin(5, 50), Err(StartError::Busy));
        // The in-flight session is unaffected
        assert_eq!(session.requested(), 10);
        assert_eq!(session.cursor(), 4);
    }

    #[test]
    fn test_begin_rejects_unacknowledged_result() {
        let mut session = TransferSession::new();
        session.begin(2, 50).unwrap();
        session.advance(2);
        session.finish();
        assert_eq!(session.begin(5, 50), Err(StartError::Busy));
        assert_eq!(session.status(), Status::Finished);
    }

    #[test]
    fn test_completion() {
        let mut session = TransferSession::new();
        session.begin(3, 50).unwrap();
        session.advance(2);
        assert!(!session.is_complete());
        assert_eq!(session.remaining(), 1);
        session.advance(1);
        assert!(session.is_complete());
        session.finish();
        assert_eq!(session.status(), Status::Finished);
    }

    #[test]
    fn test_acknowledge_is_idempotent() {
        let mut session = TransferSession::new();
        session.begin(1, 50).unwrap();
        session.advance(1);
        session.finish();
        assert!(session.acknowledge());
        assert_eq!(session.status(), Status::Idle);
        assert!(!session.acknowledge());
        assert_eq!(session.status(), Status::Idle);
    }

    #[test]
    fn test_acknowledge_refused_in_progress() {
        let mut session = TransferSession::new();
        session.begin(5, 50).unwrap();
        assert!(!session.acknowledge());
        assert_eq!(session.status(), Status::InProgress);
    }

    #[test]
    fn test_acknowledge_after_abort() {
        let mut session = TransferSession::new();
        session.begin(5, 50).unwrap();
        session.abort(Status::TimedOut);
        assert_eq!(session.status(), Status::TimedOut);
        assert!(session.acknowledge());
        assert_eq!(session.status(), Status::Idle);
    }

    #[test]
    fn test_terminal_states() {
        assert!(Status::Finished.is_terminal());
        assert!(Status::TimedOut.is_terminal());
        assert!(Status::FramingError.is_terminal());
        assert!(!Status::Idle.is_terminal());
        assert!(!Status::InProgress.is_terminal());
    }
}

#[cfg(test)]
mod prop_tests {
    extern crate std;

    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn oversize_never_mutates(len in 51usize..10_000) {
            let mut session = TransferSession::new();
            prop_assert_eq!(session.begin(len, 50), Err(StartError::Oversize));
            prop_assert_eq!(session.status(), Status::Idle);
            prop_assert_eq!(session.cursor(), 0);
        }

        #[test]
        fn cursor_is_monotonic_and_bounded(len in 1usize..=50, step in 1usize..=16) {
            let mut session = TransferSession::new();
            session.begin(len, 50).unwrap();
            let mut last = 0;
            while !session.is_complete() {
                let n = step.min(session.remaining());
                session.advance(n);
                prop_assert!(session.cursor() >= last);
                prop_assert!(session.cursor() <= session.requested());
                last = session.cursor();
            }
            session.finish();
            prop_assert_eq!(session.status(), Status::Finished);
            prop_assert_eq!(session.cursor(), len);
        }
    }
}
