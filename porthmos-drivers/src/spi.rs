//! SPI master transfer engine
//!
//! Full-duplex master transport: every transmitted byte clocks exactly one
//! byte back in, so transmit and receive pump in lock-step off the single
//! receive-threshold interrupt. Receive progress is the session cursor and
//! the completion authority; the transmit side merely keeps the FIFO primed,
//! running ahead of receive by at most one FIFO depth.
//!
//! A transfer holds its chip-select line asserted across all chunks. The
//! line is released by foreground code, explicitly and separately from
//! acknowledging the session - some peripherals want the select held low
//! across several back-to-back transfers.

use porthmos_core::{pump, StartError, Status, TransferSession};
use porthmos_hal::{ChipSelect, Endpoint, OutputPin, SpiPort};

/// Default software buffer capacity per direction, in bytes.
pub const SPI_BUFFER_CAPACITY: usize = 50;

/// Interrupt-driven SPI master engine
///
/// Foreground code writes the transmit buffer, starts a transfer and polls
/// the status; the interrupt handler calls [`on_interrupt`](Self::on_interrupt).
/// Once the status is terminal, the receive buffer holds the clocked-in
/// bytes until the session is acknowledged back to idle.
pub struct SpiMaster<P: SpiPort, S: ChipSelect, const N: usize = SPI_BUFFER_CAPACITY> {
    port: P,
    select: S,
    tx_buffer: [u8; N],
    rx_buffer: [u8; N],
    session: TransferSession,
    /// Bytes handed to the transmit FIFO; leads the session cursor.
    tx_cursor: usize,
}

impl<P: SpiPort, S: ChipSelect, const N: usize> SpiMaster<P, S, N> {
    /// Create an idle engine over an initialized port and select bank.
    pub fn new(port: P, select: S) -> Self {
        Self {
            port,
            select,
            tx_buffer: [0; N],
            rx_buffer: [0; N],
            session: TransferSession::new(),
            tx_cursor: 0,
        }
    }

    /// Start a transfer of `len` bytes to/from `endpoint`.
    ///
    /// Asserts the endpoint's select line, primes the first chunk into the
    /// transmit FIFO and arms the receive interrupt. Rejected requests (busy,
    /// zero length, oversize) change nothing, select lines included.
    ///
    /// The session status is written before the interrupt source is armed;
    /// combined with every terminal path disabling that source first, the
    /// check-then-set below never races the handler.
    pub fn start_transfer(&mut self, endpoint: Endpoint, len: usize) -> Result<(), StartError> {
        self.session.begin(len, N)?;
        self.select.assert(endpoint);
        self.tx_cursor = pump::fill(&mut self.port, &self.tx_buffer[..len]);
        self.port
            .set_rx_watermark(pump::watermark(len, self.port.rx_capacity()));
        self.port.set_rx_interrupt_enabled(true);
        Ok(())
    }

    /// Receive-threshold interrupt handler body.
    ///
    /// Drains the receive FIFO into the buffer; on completion disables the
    /// interrupt and finishes the session, otherwise refills the transmit
    /// FIFO with the next chunk and re-arms the threshold for the remainder.
    pub fn on_interrupt(&mut self) {
        if !self.session.is_in_progress() {
            self.port.clear_rx_interrupt();
            return;
        }

        let cursor = self.session.cursor();
        let requested = self.session.requested();
        let received = pump::drain(&mut self.port, &mut self.rx_buffer[cursor..requested]);
        self.session.advance(received);

        if self.session.is_complete() {
            self.port.set_rx_interrupt_enabled(false);
            self.session.finish();
        } else {
            let refilled = pump::fill(
                &mut self.port,
                &self.tx_buffer[self.tx_cursor..requested],
            );
            self.tx_cursor += refilled;
            self.port.set_rx_watermark(pump::watermark(
                self.session.remaining(),
                self.port.rx_capacity(),
            ));
        }

        self.port.clear_rx_interrupt();
    }

    /// Current transfer status.
    pub fn status(&self) -> Status {
        self.session.status()
    }

    /// Acknowledge a terminal result, returning the session to idle.
    ///
    /// Returns `false` while a transfer is in progress or the session is
    /// already idle. Does not touch the select lines.
    pub fn acknowledge_idle(&mut self) -> bool {
        self.session.acknowledge()
    }

    /// Release every chip-select line.
    ///
    /// Refused (returns `false`) while a transfer is in progress - dropping
    /// the select mid-transfer would corrupt the exchange.
    pub fn release_endpoint(&mut self) -> bool {
        if self.session.is_in_progress() {
            return false;
        }
        self.select.release();
        true
    }

    /// Whether `endpoint`'s select line is currently asserted.
    pub fn is_endpoint_asserted(&self, endpoint: Endpoint) -> bool {
        self.select.is_asserted(endpoint)
    }

    /// Transmit buffer, written by foreground code before a transfer.
    ///
    /// Byte 0 is the first byte on the wire. Must not be touched while a
    /// transfer is in progress.
    pub fn tx_buffer_mut(&mut self) -> &mut [u8; N] {
        &mut self.tx_buffer
    }

    /// Receive buffer; valid up to the requested length once finished.
    pub fn rx_buffer(&self) -> &[u8; N] {
        &self.rx_buffer
    }

    /// Access to the underlying port.
    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }
}

/// Active-low chip-select bank over plain output pins
///
/// [`Endpoint`] indexes into the pin array. Asserting releases every other
/// line first, so two slaves are never addressed at once; an out-of-range
/// endpoint just releases the bank.
pub struct PinSelector<P: OutputPin, const K: usize> {
    pins: [P; K],
}

impl<P: OutputPin, const K: usize> PinSelector<P, K> {
    /// Take ownership of the select pins, releasing all of them.
    pub fn new(mut pins: [P; K]) -> Self {
        for pin in &mut pins {
            pin.set_high();
        }
        Self { pins }
    }

    /// Access to one select pin.
    pub fn pin(&self, index: usize) -> Option<&P> {
        self.pins.get(index)
    }
}

impl<P: OutputPin, const K: usize> ChipSelect for PinSelector<P, K> {
    fn assert(&mut self, endpoint: Endpoint) {
        for pin in &mut self.pins {
            pin.set_high();
        }
        if let Some(pin) = self.pins.get_mut(endpoint.0 as usize) {
            pin.set_low();
        }
    }

    fn release(&mut self) {
        for pin in &mut self.pins {
            pin.set_high();
        }
    }

    fn is_asserted(&self, endpoint: Endpoint) -> bool {
        self.pins
            .get(endpoint.0 as usize)
            .map(|pin| pin.is_set_low())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockPin, MockSpiPort};

    fn engine() -> SpiMaster<MockSpiPort, PinSelector<MockPin, 2>, 50> {
        SpiMaster::new(
            MockSpiPort::new(),
            PinSelector::new([MockPin::new(), MockPin::new()]),
        )
    }

    /// Run the hardware and the interrupt handler until the session leaves
    /// `InProgress`, returning the number of interrupts taken.
    fn run_to_completion<const N: usize>(
        spi: &mut SpiMaster<MockSpiPort, PinSelector<MockPin, 2>, N>,
    ) -> usize {
        let mut interrupts = 0;
        while spi.status() == Status::InProgress {
            spi.port_mut().shift();
            spi.on_interrupt();
            interrupts += 1;
            assert!(interrupts <= 16, "transfer does not converge");
        }
        interrupts
    }

    #[test]
    fn test_loopback_round_trip() {
        let mut spi = engine();
        spi.tx_buffer_mut()[..3].copy_from_slice(&[1, 2, 3]);
        spi.start_transfer(Endpoint(0), 3).unwrap();

        let interrupts = run_to_completion(&mut spi);
        assert_eq!(interrupts, 1);
        assert_eq!(spi.status(), Status::Finished);
        assert_eq!(&spi.rx_buffer()[..3], &[1, 2, 3]);
        assert_eq!(spi.port_mut().wire(), &[1, 2, 3]);
    }

    #[test]
    fn test_chunked_transfer_40_bytes() {
        let mut spi = engine();
        for (i, byte) in spi.tx_buffer_mut()[..40].iter_mut().enumerate() {
            *byte = i as u8;
        }
        spi.start_transfer(Endpoint(0), 40).unwrap();

        let interrupts = run_to_completion(&mut spi);
        assert_eq!(interrupts, 3);
        assert_eq!(spi.status(), Status::Finished);
        // min(remaining, fifo) after each fill: 40 -> 16, 24 -> 16, 8 -> 8
        assert_eq!(spi.port_mut().watermark_history(), &[16, 16, 8]);
        let expected: [u8; 40] = core::array::from_fn(|i| i as u8);
        assert_eq!(&spi.rx_buffer()[..40], &expected);
        assert_eq!(spi.port_mut().wire(), &expected);
        assert!(!spi.port_mut().overflowed());
    }

    #[test]
    fn test_full_buffer_transfer() {
        let mut spi = engine();
        spi.start_transfer(Endpoint(0), 50).unwrap();
        let interrupts = run_to_completion(&mut spi);
        // 16 + 16 + 16 + 2
        assert_eq!(interrupts, 4);
        assert_eq!(spi.status(), Status::Finished);
    }

    #[test]
    fn test_rejects_oversize() {
        let mut spi = engine();
        assert_eq!(
            spi.start_transfer(Endpoint(0), 51),
            Err(StartError::Oversize)
        );
        assert_eq!(spi.status(), Status::Idle);
        assert!(!spi.is_endpoint_asserted(Endpoint(0)));
        assert!(!spi.port_mut().rx_interrupt_enabled());
    }

    #[test]
    fn test_rejects_zero_length() {
        let mut spi = engine();
        assert_eq!(
            spi.start_transfer(Endpoint(0), 0),
            Err(StartError::EmptyTransfer)
        );
        assert_eq!(spi.status(), Status::Idle);
    }

    #[test]
    fn test_rejects_while_busy() {
        let mut spi = engine();
        spi.start_transfer(Endpoint(0), 40).unwrap();
        assert_eq!(
            spi.start_transfer(Endpoint(1), 5),
            Err(StartError::Busy)
        );
        // The in-flight session is unaffected, including its endpoint
        assert!(spi.is_endpoint_asserted(Endpoint(0)));
        assert!(!spi.is_endpoint_asserted(Endpoint(1)));
        assert_eq!(spi.status(), Status::InProgress);
    }

    #[test]
    fn test_rejects_unacknowledged_result() {
        let mut spi = engine();
        spi.start_transfer(Endpoint(0), 2).unwrap();
        run_to_completion(&mut spi);
        assert_eq!(
            spi.start_transfer(Endpoint(0), 2),
            Err(StartError::Busy)
        );
        assert!(spi.acknowledge_idle());
        assert_eq!(spi.start_transfer(Endpoint(0), 2), Ok(()));
    }

    #[test]
    fn test_endpoint_held_until_released() {
        let mut spi = engine();
        spi.start_transfer(Endpoint(1), 4).unwrap();
        assert!(spi.is_endpoint_asserted(Endpoint(1)));

        // Release refused mid-transfer
        assert!(!spi.release_endpoint());
        assert!(spi.is_endpoint_asserted(Endpoint(1)));

        run_to_completion(&mut spi);
        // Completion does not release the line; foreground does
        assert!(spi.is_endpoint_asserted(Endpoint(1)));
        assert!(spi.release_endpoint());
        assert!(!spi.is_endpoint_asserted(Endpoint(1)));
    }

    #[test]
    fn test_assert_releases_other_lines() {
        let mut selector = PinSelector::new([MockPin::new(), MockPin::new()]);
        selector.assert(Endpoint(0));
        assert!(selector.is_asserted(Endpoint(0)));
        selector.assert(Endpoint(1));
        assert!(!selector.is_asserted(Endpoint(0)));
        assert!(selector.is_asserted(Endpoint(1)));
        selector.release();
        assert!(!selector.is_asserted(Endpoint(1)));
    }

    #[test]
    fn test_acknowledge_idempotent() {
        let mut spi = engine();
        spi.start_transfer(Endpoint(0), 1).unwrap();
        run_to_completion(&mut spi);
        assert!(spi.acknowledge_idle());
        assert!(!spi.acknowledge_idle());
        assert_eq!(spi.status(), Status::Idle);
    }

    #[test]
    fn test_interrupt_disabled_at_completion() {
        let mut spi = engine();
        spi.start_transfer(Endpoint(0), 3).unwrap();
        assert!(spi.port_mut().rx_interrupt_enabled());
        run_to_completion(&mut spi);
        assert!(!spi.port_mut().rx_interrupt_enabled());
    }

    #[test]
    fn test_stray_interrupt_is_ignored() {
        let mut spi = engine();
        spi.on_interrupt();
        assert_eq!(spi.status(), Status::Idle);
        assert_eq!(spi.port_mut().interrupt_clears(), 1);
    }
}
