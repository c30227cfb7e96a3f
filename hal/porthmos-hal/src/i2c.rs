//! I2C master peripheral abstractions
//!
//! The I2C port is addressed rather than selected: each transaction phase is
//! opened by a START (or repeated START) carrying the slave address and
//! direction. The FIFO pair is the same shape as the other peripherals, but
//! the hardware FIFO bounds the whole transfer - I2C transactions here are
//! single-chunk.

use crate::fifo::{RxFifo, TxFifo};

/// What happens on the bus after the current phase completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopMode {
    /// Issue a STOP condition, releasing the bus.
    Stop,
    /// Hold the bus for a repeated START (write-then-read transactions).
    Restart,
}

/// I2C master port
///
/// The port's interrupt fires when the current phase completes: the write
/// FIFO has drained, the expected read count has arrived, or the slave
/// failed to acknowledge.
pub trait I2cPort: TxFifo + RxFifo {
    /// Issue START + `address` in write direction for `count` data bytes.
    ///
    /// Data must already be queued in the transmit FIFO.
    fn start_write(&mut self, address: u8, count: usize, stop: StopMode);

    /// Issue START (or repeated START) + `address` in read direction for
    /// `count` data bytes, ending with a STOP.
    fn start_read(&mut self, address: u8, count: usize);

    /// Whether the slave failed to acknowledge the address or a data byte.
    fn nack_detected(&self) -> bool;

    /// Clear a latched NACK condition.
    fn clear_nack(&mut self);

    /// Return both FIFOs to empty.
    ///
    /// Used after an aborted transaction so leftover bytes cannot leak into
    /// the next one.
    fn reset_fifos(&mut self);

    /// Enable or disable the phase-complete interrupt.
    fn set_interrupt_enabled(&mut self, enabled: bool);
}

/// I2C configuration
#[derive(Debug, Clone, Copy)]
pub struct I2cConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self {
            frequency: 100_000, // 100kHz standard mode
        }
    }
}

impl I2cConfig {
    /// Standard mode (100 kHz)
    pub const STANDARD: Self = Self { frequency: 100_000 };

    /// Fast mode (400 kHz)
    pub const FAST: Self = Self { frequency: 400_000 };
}
