//! UART transfer engines
//!
//! The two directions are independent engines with independent sessions and
//! buffer sizes. Transmit is fully driven: the engine knows when the last
//! byte was handed over. Receive on an asynchronous link is not - nobody
//! clocks the peer - so completion is inferred by the liveness watch from
//! `porthmos-core`, fed by a periodic status poll and a timer tick.
//!
//! The poll interval contract: calls to [`UartReceiver::poll_status`] must be
//! spaced further apart than one whole packet takes on the wire
//! (`UartConfig::packet_duration_micros`), or an in-flight packet is
//! indistinguishable from a stalled one. The engine documents this; it cannot
//! enforce it.

use porthmos_core::{pump, Liveness, ProgressWatch, StartError, Status, TransferSession};
use porthmos_hal::{UartRxPort, UartTxPort};

/// Default transmit software buffer capacity, in bytes.
pub const UART_TX_BUFFER_CAPACITY: usize = 64;

/// Default receive software buffer capacity, in bytes.
pub const UART_RX_BUFFER_CAPACITY: usize = 64;

/// Interrupt-driven UART transmitter
///
/// `Finished` means every byte has been handed to the hardware; the last one
/// may still be shifting onto the line. Callers that need line-accurate
/// timing wait on [`is_flushed`](Self::is_flushed).
pub struct UartTransmitter<P: UartTxPort, const N: usize = UART_TX_BUFFER_CAPACITY> {
    port: P,
    buffer: [u8; N],
    session: TransferSession,
}

impl<P: UartTxPort, const N: usize> UartTransmitter<P, N> {
    /// Create an idle engine over an initialized port.
    pub fn new(port: P) -> Self {
        Self {
            port,
            buffer: [0; N],
            session: TransferSession::new(),
        }
    }

    /// Start transmitting `len` bytes from the software buffer.
    ///
    /// The transmitter is enabled before the first FIFO write, then the
    /// first chunk is primed and the drained-FIFO interrupt armed. Rejected
    /// requests change nothing.
    pub fn start_transmit(&mut self, len: usize) -> Result<(), StartError> {
        self.session.begin(len, N)?;
        self.port.set_transmitter_enabled(true);
        let queued = pump::fill(&mut self.port, &self.buffer[..len]);
        self.session.advance(queued);
        self.port.clear_tx_interrupt();
        self.port.set_tx_interrupt_enabled(true);
        Ok(())
    }

    /// Drained-FIFO interrupt handler body.
    ///
    /// Refills the FIFO with the next chunk; once every byte has been handed
    /// over, disables the interrupt and the transmitter (queued data still
    /// drains) and finishes the session.
    pub fn on_interrupt(&mut self) {
        if !self.session.is_in_progress() {
            self.port.clear_tx_interrupt();
            return;
        }

        if self.session.is_complete() {
            self.port.set_tx_interrupt_enabled(false);
            self.port.set_transmitter_enabled(false);
            self.session.finish();
        } else {
            let cursor = self.session.cursor();
            let requested = self.session.requested();
            let queued = pump::fill(&mut self.port, &self.buffer[cursor..requested]);
            self.session.advance(queued);
        }

        self.port.clear_tx_interrupt();
    }

    /// Current transfer status.
    pub fn status(&self) -> Status {
        self.session.status()
    }

    /// Whether the line has gone quiet: no session in progress and both the
    /// FIFO and the output shift register are empty.
    pub fn is_flushed(&self) -> bool {
        !self.session.is_in_progress() && self.port.shift_register_empty()
    }

    /// Acknowledge a terminal result, returning the session to idle.
    pub fn acknowledge_idle(&mut self) -> bool {
        self.session.acknowledge()
    }

    /// Transmit buffer, written by foreground code before a transfer.
    ///
    /// Byte 0 is the first byte on the wire. Must not be touched while a
    /// transfer is in progress.
    pub fn buffer_mut(&mut self) -> &mut [u8; N] {
        &mut self.buffer
    }

    /// Access to the underlying port.
    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }
}

/// Interrupt-driven UART receiver with inferred completion
///
/// Started with an expected packet length and an optional timeout budget in
/// ticks. The interrupt handler copies arriving chunks; the status poll
/// decides between "complete", "still arriving", "malformed" and "timed
/// out". After the expected count has arrived the receiver stays enabled so
/// excess bytes remain detectable until the poll delivers its verdict.
pub struct UartReceiver<P: UartRxPort, const N: usize = UART_RX_BUFFER_CAPACITY> {
    port: P,
    buffer: [u8; N],
    session: TransferSession,
    watch: ProgressWatch,
}

impl<P: UartRxPort, const N: usize> UartReceiver<P, N> {
    /// Create an idle engine over an initialized port.
    pub fn new(port: P) -> Self {
        Self {
            port,
            buffer: [0; N],
            session: TransferSession::new(),
            watch: ProgressWatch::new(None),
        }
    }

    /// Arm reception of a `len`-byte packet.
    ///
    /// UART has no master: this cannot force the peer to send, it only
    /// prepares the engine to accept. Stale FIFO content is discarded and
    /// the overflow flag cleared before the interrupt is armed, so leftovers
    /// from a previous packet can neither corrupt this one nor suppress its
    /// interrupts. `timeout_ticks` bounds the whole packet in units of the
    /// external tick; `None` waits forever.
    pub fn start_receive(&mut self, len: usize, timeout_ticks: Option<u32>) -> Result<(), StartError> {
        self.session.begin(len, N)?;
        self.watch = ProgressWatch::new(timeout_ticks);
        while self.port.rx_level() > 0 {
            let _ = self.port.pop();
        }
        self.port
            .set_rx_watermark(pump::watermark(len, self.port.rx_capacity()));
        self.port.clear_overflow();
        self.port.clear_rx_interrupt();
        self.port.set_rx_interrupt_enabled(true);
        self.port.set_receiver_enabled(true);
        Ok(())
    }

    /// Receive-threshold interrupt handler body.
    ///
    /// Drains the FIFO into the buffer and re-arms the threshold for the
    /// remainder. Once the expected count has arrived the interrupt is
    /// disabled but the receiver stays on, so an over-long packet leaves
    /// evidence in the FIFO for the status poll.
    pub fn on_interrupt(&mut self) {
        if !self.session.is_in_progress() {
            self.port.clear_rx_interrupt();
            return;
        }

        let cursor = self.session.cursor();
        let requested = self.session.requested();
        let received = pump::drain(&mut self.port, &mut self.buffer[cursor..requested]);
        self.session.advance(received);

        if self.session.is_complete() {
            self.port.set_rx_interrupt_enabled(false);
        } else {
            self.port.set_rx_watermark(pump::watermark(
                self.session.remaining(),
                self.port.rx_capacity(),
            ));
        }

        self.port.clear_rx_interrupt();
    }

    /// Burn one tick of the timeout budget.
    ///
    /// Called from an external periodic timer, independent of the poll.
    pub fn tick(&mut self) {
        if self.session.is_in_progress() {
            self.watch.tick();
        }
    }

    /// Poll the transfer status, driving completion and failure detection.
    ///
    /// This is deliberately not a pure read: each call feeds the liveness
    /// watch one observation, and a terminal verdict disables the receiver
    /// and its interrupt. Poll at an interval longer than one packet time on
    /// the wire. [`status`](Self::status) reads without side effects.
    pub fn poll_status(&mut self) -> Status {
        if self.session.is_in_progress() {
            let verdict = self.watch.check(
                self.session.cursor(),
                self.session.requested(),
                self.port.rx_level(),
            );
            match verdict {
                Liveness::Waiting => {}
                Liveness::Complete => {
                    self.quiesce();
                    self.session.finish();
                }
                Liveness::Stalled => {
                    self.quiesce();
                    self.session.abort(Status::FramingError);
                }
                Liveness::Expired => {
                    self.quiesce();
                    self.session.abort(Status::TimedOut);
                }
            }
        }
        self.session.status()
    }

    fn quiesce(&mut self) {
        self.port.set_receiver_enabled(false);
        self.port.set_rx_interrupt_enabled(false);
    }

    /// Current transfer status, without driving the liveness check.
    pub fn status(&self) -> Status {
        self.session.status()
    }

    /// Acknowledge a terminal result, returning the session to idle.
    pub fn acknowledge_idle(&mut self) -> bool {
        self.session.acknowledge()
    }

    /// Receive buffer; valid up to the requested length once finished.
    pub fn buffer(&self) -> &[u8; N] {
        &self.buffer
    }

    /// Access to the underlying port.
    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }
}
