//! Mock ports for host-side testing
//!
//! In-memory implementations of the `porthmos-hal` port traits. The hardware
//! side of each FIFO is driven explicitly by the test (`shift`, `shift_out`,
//! `receive`), so a test interleaves engine calls and "hardware" activity in
//! any order it wants and then inspects the wire log, watermark history and
//! control-line state.

use heapless::{Deque, Vec};
use porthmos_hal::i2c::StopMode;
use porthmos_hal::{I2cPort, OutputPin, RxFifo, SpiPort, TxFifo, UartRxPort, UartTxPort};

/// Hardware FIFO depth used by all mock ports.
pub const MOCK_FIFO_CAPACITY: usize = 16;

/// Digital output double with readable state.
#[derive(Debug)]
pub struct MockPin {
    high: bool,
}

impl Default for MockPin {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPin {
    /// A pin idling high (released chip-select line).
    pub fn new() -> Self {
        Self { high: true }
    }
}

impl OutputPin for MockPin {
    fn set_high(&mut self) {
        self.high = true;
    }

    fn set_low(&mut self) {
        self.high = false;
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}

/// Loopback SPI port
///
/// [`shift`](MockSpiPort::shift) clocks every queued transmit byte onto the
/// wire log and echoes it into the receive FIFO, which is what a looped-back
/// MOSI/MISO pair does on real hardware.
#[derive(Debug, Default)]
pub struct MockSpiPort {
    tx: Deque<u8, MOCK_FIFO_CAPACITY>,
    rx: Deque<u8, MOCK_FIFO_CAPACITY>,
    wire: Vec<u8, 64>,
    watermark_history: Vec<usize, 8>,
    rx_interrupt_enabled: bool,
    interrupt_clears: usize,
    overflowed: bool,
}

impl MockSpiPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock out everything queued for transmit, echoing it back as receive
    /// data.
    pub fn shift(&mut self) {
        while let Some(byte) = self.tx.pop_front() {
            let _ = self.wire.push(byte);
            if self.rx.push_back(byte).is_err() {
                self.overflowed = true;
            }
        }
    }

    /// Every byte that has crossed the wire so far.
    pub fn wire(&self) -> &[u8] {
        &self.wire
    }

    /// Watermark values in the order they were programmed.
    pub fn watermark_history(&self) -> &[usize] {
        &self.watermark_history
    }

    pub fn rx_interrupt_enabled(&self) -> bool {
        self.rx_interrupt_enabled
    }

    pub fn interrupt_clears(&self) -> usize {
        self.interrupt_clears
    }

    pub fn overflowed(&self) -> bool {
        self.overflowed
    }
}

impl TxFifo for MockSpiPort {
    fn tx_capacity(&self) -> usize {
        MOCK_FIFO_CAPACITY
    }

    fn tx_level(&self) -> usize {
        self.tx.len()
    }

    fn push(&mut self, byte: u8) {
        if self.tx.push_back(byte).is_err() {
            self.overflowed = true;
        }
    }
}

impl RxFifo for MockSpiPort {
    fn rx_capacity(&self) -> usize {
        MOCK_FIFO_CAPACITY
    }

    fn rx_level(&self) -> usize {
        self.rx.len()
    }

    fn pop(&mut self) -> u8 {
        self.rx.pop_front().unwrap_or(0)
    }
}

impl SpiPort for MockSpiPort {
    fn set_rx_watermark(&mut self, entries: usize) {
        let _ = self.watermark_history.push(entries);
    }

    fn set_rx_interrupt_enabled(&mut self, enabled: bool) {
        self.rx_interrupt_enabled = enabled;
    }

    fn clear_rx_interrupt(&mut self) {
        self.interrupt_clears += 1;
    }
}

/// UART transmit port double
///
/// [`shift_out`](MockUartTxPort::shift_out) moves bytes from the FIFO onto
/// the wire log and marks the shift register busy; the last byte finishes
/// only on [`complete_shift`](MockUartTxPort::complete_shift), so tests can
/// observe the gap between "handed to hardware" and "line quiet".
#[derive(Debug, Default)]
pub struct MockUartTxPort {
    fifo: Deque<u8, MOCK_FIFO_CAPACITY>,
    wire: Vec<u8, 128>,
    transmitter_enabled: bool,
    tx_interrupt_enabled: bool,
    interrupt_clears: usize,
    in_flight: bool,
}

impl MockUartTxPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shift up to `n` bytes out of the FIFO onto the wire.
    pub fn shift_out(&mut self, n: usize) {
        for _ in 0..n {
            match self.fifo.pop_front() {
                Some(byte) => {
                    let _ = self.wire.push(byte);
                    self.in_flight = true;
                }
                None => break,
            }
        }
    }

    /// Let the byte in the shift register finish on the line.
    pub fn complete_shift(&mut self) {
        self.in_flight = false;
    }

    pub fn wire(&self) -> &[u8] {
        &self.wire
    }

    pub fn transmitter_enabled(&self) -> bool {
        self.transmitter_enabled
    }

    pub fn tx_interrupt_enabled(&self) -> bool {
        self.tx_interrupt_enabled
    }

    pub fn interrupt_clears(&self) -> usize {
        self.interrupt_clears
    }
}

impl TxFifo for MockUartTxPort {
    fn tx_capacity(&self) -> usize {
        MOCK_FIFO_CAPACITY
    }

    fn tx_level(&self) -> usize {
        self.fifo.len()
    }

    fn push(&mut self, byte: u8) {
        let _ = self.fifo.push_back(byte);
    }
}

impl UartTxPort for MockUartTxPort {
    fn set_transmitter_enabled(&mut self, enabled: bool) {
        self.transmitter_enabled = enabled;
    }

    fn set_tx_interrupt_enabled(&mut self, enabled: bool) {
        self.tx_interrupt_enabled = enabled;
    }

    fn clear_tx_interrupt(&mut self) {
        self.interrupt_clears += 1;
    }

    fn shift_register_empty(&self) -> bool {
        self.fifo.is_empty() && !self.in_flight
    }
}

/// UART receive port double
///
/// [`receive`](MockUartRxPort::receive) models bytes arriving on the line:
/// they land in the FIFO only while the receiver is enabled, and a full FIFO
/// latches the overflow flag and drops the rest.
#[derive(Debug, Default)]
pub struct MockUartRxPort {
    fifo: Deque<u8, MOCK_FIFO_CAPACITY>,
    receiver_enabled: bool,
    watermark_history: Vec<usize, 8>,
    rx_interrupt_enabled: bool,
    interrupt_clears: usize,
    overflow: bool,
    overflow_clears: usize,
}

impl MockUartRxPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes arriving on the line.
    pub fn receive(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            if !self.receiver_enabled {
                continue;
            }
            if self.fifo.push_back(byte).is_err() {
                self.overflow = true;
            }
        }
    }

    pub fn receiver_enabled(&self) -> bool {
        self.receiver_enabled
    }

    pub fn watermark_history(&self) -> &[usize] {
        &self.watermark_history
    }

    pub fn rx_interrupt_enabled(&self) -> bool {
        self.rx_interrupt_enabled
    }

    pub fn interrupt_clears(&self) -> usize {
        self.interrupt_clears
    }

    pub fn overflowed(&self) -> bool {
        self.overflow
    }

    pub fn overflow_clears(&self) -> usize {
        self.overflow_clears
    }
}

impl RxFifo for MockUartRxPort {
    fn rx_capacity(&self) -> usize {
        MOCK_FIFO_CAPACITY
    }

    fn rx_level(&self) -> usize {
        self.fifo.len()
    }

    fn pop(&mut self) -> u8 {
        self.fifo.pop_front().unwrap_or(0)
    }
}

impl UartRxPort for MockUartRxPort {
    fn set_receiver_enabled(&mut self, enabled: bool) {
        self.receiver_enabled = enabled;
    }

    fn set_rx_watermark(&mut self, entries: usize) {
        let _ = self.watermark_history.push(entries);
    }

    fn set_rx_interrupt_enabled(&mut self, enabled: bool) {
        self.rx_interrupt_enabled = enabled;
    }

    fn clear_rx_interrupt(&mut self) {
        self.interrupt_clears += 1;
    }

    fn clear_overflow(&mut self) {
        self.overflow = false;
        self.overflow_clears += 1;
    }
}

/// One bus transaction phase observed by [`MockI2cPort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum I2cTransaction {
    Write {
        address: u8,
        count: usize,
        stop: StopMode,
    },
    Read {
        address: u8,
        count: usize,
    },
}

/// I2C port double with a scripted slave
///
/// A write phase consumes the transmit FIFO into `written`; a read phase
/// serves bytes from the scripted `respond_with` data. An armed NACK makes
/// the next phase fail without moving data.
#[derive(Debug, Default)]
pub struct MockI2cPort {
    tx: Deque<u8, MOCK_FIFO_CAPACITY>,
    rx: Deque<u8, MOCK_FIFO_CAPACITY>,
    written: Vec<u8, 32>,
    response: Vec<u8, 32>,
    transactions: Vec<I2cTransaction, 8>,
    nack: bool,
    nack_armed: bool,
    interrupt_enabled: bool,
}

impl MockI2cPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the data the slave returns on the next read phase.
    pub fn respond_with(&mut self, bytes: &[u8]) {
        self.response.clear();
        let _ = self.response.extend_from_slice(bytes);
    }

    /// Make the slave NACK the next phase.
    pub fn arm_nack(&mut self) {
        self.nack_armed = true;
    }

    /// Bytes the slave has received across all write phases.
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Bus phases in the order they were issued.
    pub fn transactions(&self) -> &[I2cTransaction] {
        &self.transactions
    }

    pub fn interrupt_enabled(&self) -> bool {
        self.interrupt_enabled
    }
}

impl TxFifo for MockI2cPort {
    fn tx_capacity(&self) -> usize {
        MOCK_FIFO_CAPACITY
    }

    fn tx_level(&self) -> usize {
        self.tx.len()
    }

    fn push(&mut self, byte: u8) {
        let _ = self.tx.push_back(byte);
    }
}

impl RxFifo for MockI2cPort {
    fn rx_capacity(&self) -> usize {
        MOCK_FIFO_CAPACITY
    }

    fn rx_level(&self) -> usize {
        self.rx.len()
    }

    fn pop(&mut self) -> u8 {
        self.rx.pop_front().unwrap_or(0)
    }
}

impl I2cPort for MockI2cPort {
    fn start_write(&mut self, address: u8, count: usize, stop: StopMode) {
        let _ = self.transactions.push(I2cTransaction::Write {
            address,
            count,
            stop,
        });
        if self.nack_armed {
            self.nack_armed = false;
            self.nack = true;
            return;
        }
        for _ in 0..count {
            match self.tx.pop_front() {
                Some(byte) => {
                    let _ = self.written.push(byte);
                }
                None => break,
            }
        }
    }

    fn start_read(&mut self, address: u8, count: usize) {
        let _ = self
            .transactions
            .push(I2cTransaction::Read { address, count });
        if self.nack_armed {
            self.nack_armed = false;
            self.nack = true;
            return;
        }
        for i in 0..count.min(self.response.len()) {
            let _ = self.rx.push_back(self.response[i]);
        }
    }

    fn nack_detected(&self) -> bool {
        self.nack
    }

    fn clear_nack(&mut self) {
        self.nack = false;
    }

    fn reset_fifos(&mut self) {
        self.tx.clear();
        self.rx.clear();
    }

    fn set_interrupt_enabled(&mut self, enabled: bool) {
        self.interrupt_enabled = enabled;
    }
}
