//! UART peripheral abstractions
//!
//! UART is asynchronous: the two directions are independent machines with
//! independent enables and interrupts, so the port surface is split the same
//! way. The receive side has no master to signal completion - the engine
//! infers it by polling, which is why the receive port exposes the overflow
//! flag and the transmit port exposes the shift-register-empty predicate.

use crate::fifo::{RxFifo, TxFifo};

/// UART transmit port
///
/// The transmit interrupt fires once the FIFO has fully drained (threshold
/// zero). Note that a drained FIFO does not mean a quiet line: the last byte
/// is still in the output shift register at that point.
pub trait UartTxPort: TxFifo {
    /// Enable or disable the transmitter.
    ///
    /// Disabling does not cut off data already queued; the peripheral still
    /// drains the FIFO and shift register.
    fn set_transmitter_enabled(&mut self, enabled: bool);

    /// Enable or disable the FIFO-drained interrupt.
    fn set_tx_interrupt_enabled(&mut self, enabled: bool);

    /// Clear a pending FIFO-drained interrupt flag.
    fn clear_tx_interrupt(&mut self);

    /// Whether both the FIFO and the output shift register are empty,
    /// i.e. the line has gone quiet.
    fn shift_register_empty(&self) -> bool;
}

/// UART receive port
pub trait UartRxPort: RxFifo {
    /// Enable or disable the receiver.
    fn set_receiver_enabled(&mut self, enabled: bool);

    /// Raise the receive interrupt once at least `entries` bytes are waiting.
    ///
    /// Callers keep this within `1..=rx_capacity()`.
    fn set_rx_watermark(&mut self, entries: usize);

    /// Enable or disable the receive-threshold interrupt.
    fn set_rx_interrupt_enabled(&mut self, enabled: bool);

    /// Clear a pending receive-threshold interrupt flag.
    fn clear_rx_interrupt(&mut self);

    /// Clear the receive-FIFO overflow flag.
    ///
    /// A set overflow flag suppresses further receive interrupts on some
    /// parts, so the engine clears it before arming a new session.
    fn clear_overflow(&mut self);
}

/// UART configuration
///
/// Describes the externally-performed peripheral setup and carries the
/// timing arithmetic the receive-poll contract depends on.
#[derive(Debug, Clone, Copy)]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baudrate: 115_200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

impl UartConfig {
    /// Bits on the wire per frame: start bit + data + parity + stop bits.
    pub fn frame_bits(&self) -> u32 {
        let data = match self.data_bits {
            DataBits::Seven => 7,
            DataBits::Eight => 8,
            DataBits::Nine => 9,
        };
        let parity = match self.parity {
            Parity::None => 0,
            Parity::Even | Parity::Odd => 1,
        };
        let stop = match self.stop_bits {
            StopBits::One => 1,
            StopBits::Two => 2,
        };
        1 + data + parity + stop
    }

    /// Time to receive `len` bytes at the configured baud rate, in
    /// microseconds, rounded up.
    ///
    /// The liveness check on a receive session must be polled at an interval
    /// *longer* than this for the configured packet length, or an in-flight
    /// packet can be mistaken for a stalled one.
    pub fn packet_duration_micros(&self, len: usize) -> u64 {
        let bits = u64::from(self.frame_bits()) * len as u64 * 1_000_000;
        bits.div_ceil(u64::from(self.baudrate))
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
    Nine,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_bits_default() {
        // 1 start + 8 data + 1 stop
        assert_eq!(UartConfig::default().frame_bits(), 10);
    }

    #[test]
    fn test_frame_bits_with_parity() {
        let config = UartConfig {
            parity: Parity::Even,
            stop_bits: StopBits::Two,
            ..UartConfig::default()
        };
        assert_eq!(config.frame_bits(), 12);
    }

    #[test]
    fn test_packet_duration() {
        // 10 bits per frame at 115200 baud: one byte is ~86.8 us
        let config = UartConfig::default();
        assert_eq!(config.packet_duration_micros(1), 87);
        // 8 bytes: 80 bits -> ~694.5 us
        assert_eq!(config.packet_duration_micros(8), 695);
    }
}
