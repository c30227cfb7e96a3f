//! SPI master peripheral abstractions
//!
//! An SPI master port is a full-duplex FIFO pair plus control over the
//! receive-threshold interrupt. The engine drives the whole transfer off the
//! receive interrupt: every transmitted byte clocks one byte back in, so the
//! receive fill level is the single source of truth for progress.

use crate::fifo::{RxFifo, TxFifo};

/// SPI master port
///
/// Combines both FIFO directions with receive-interrupt control. The
/// transmit-side interrupt is deliberately absent: it would fire while the
/// last byte is still in the output shift register, too early to be useful.
pub trait SpiPort: TxFifo + RxFifo {
    /// Raise the receive interrupt once at least `entries` bytes are waiting.
    ///
    /// Callers keep this within `1..=rx_capacity()`.
    fn set_rx_watermark(&mut self, entries: usize);

    /// Enable or disable the receive-threshold interrupt.
    fn set_rx_interrupt_enabled(&mut self, enabled: bool);

    /// Clear a pending receive-threshold interrupt flag.
    fn clear_rx_interrupt(&mut self);
}

/// One chip-select output, identified by its index in the select bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Endpoint(pub u8);

/// Bank of chip-select lines
///
/// At most one line is asserted at a time; asserting an endpoint releases
/// whatever was asserted before. Release is always explicit - completing a
/// transfer does not touch the lines.
pub trait ChipSelect {
    /// Assert the select line for `endpoint`, releasing any other line first.
    fn assert(&mut self, endpoint: Endpoint);

    /// Release every select line.
    fn release(&mut self);

    /// Whether `endpoint`'s line is currently asserted.
    fn is_asserted(&self, endpoint: Endpoint) -> bool;
}

/// SPI configuration
///
/// Describes the externally-performed peripheral setup (spec'd clock rate and
/// mode); the engine itself never programs these.
#[derive(Debug, Clone, Copy)]
pub struct SpiConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
    /// Clock polarity
    pub polarity: Polarity,
    /// Clock phase
    pub phase: Phase,
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self {
            frequency: 1_000_000, // 1 MHz
            polarity: Polarity::IdleLow,
            phase: Phase::CaptureOnFirstTransition,
        }
    }
}

/// SPI clock polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// Clock idles low (CPOL=0)
    IdleLow,
    /// Clock idles high (CPOL=1)
    IdleHigh,
}

/// SPI clock phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Data captured on first clock transition (CPHA=0)
    CaptureOnFirstTransition,
    /// Data captured on second clock transition (CPHA=1)
    CaptureOnSecondTransition,
}
