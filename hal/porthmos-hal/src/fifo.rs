//! Hardware FIFO access
//!
//! A serial peripheral's FIFO is a small fixed-capacity shift buffer that the
//! hardware drains (transmit) or fills (receive) on its own. The engine only
//! ever observes the fill level and moves single bytes; everything else -
//! shifting, framing, clocking - is the peripheral's business.
//!
//! Method names carry the direction so a full-duplex port can implement both
//! traits on one type without collisions.

/// Transmit side of a hardware FIFO.
pub trait TxFifo {
    /// Number of entries the transmit FIFO can hold.
    fn tx_capacity(&self) -> usize;

    /// Entries currently queued for transmission.
    ///
    /// Decreases on its own as the peripheral shifts bytes out.
    fn tx_level(&self) -> usize;

    /// Queue one byte for transmission.
    ///
    /// Callers must ensure `tx_level() < tx_capacity()` first; the pump loops
    /// in `porthmos-core` always do.
    fn push(&mut self, byte: u8);
}

/// Receive side of a hardware FIFO.
pub trait RxFifo {
    /// Number of entries the receive FIFO can hold.
    fn rx_capacity(&self) -> usize;

    /// Entries currently waiting to be read.
    ///
    /// Increases on its own as the peripheral shifts bytes in.
    fn rx_level(&self) -> usize;

    /// Take the oldest received byte out of the FIFO.
    ///
    /// Callers must ensure `rx_level() > 0` first; the pump loops in
    /// `porthmos-core` always do.
    fn pop(&mut self) -> u8;
}
