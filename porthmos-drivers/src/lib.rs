//! Peripheral transfer engines
//!
//! This crate wires the engine logic from `porthmos-core` to concrete
//! peripheral port traits:
//!
//! - [`spi::SpiMaster`] - half-duplex-in-lock-step SPI master with a
//!   chip-select bank
//! - [`uart::UartTransmitter`], [`uart::UartReceiver`] - independent UART
//!   directions, with inferred completion and timeout on receive
//! - [`i2c::I2cMaster`] - addressed single-chunk transactions
//!   (write / read / write-then-read)
//! - [`mock`] - in-memory ports for host-side testing
//!
//! Every engine follows the same discipline: foreground code fills the
//! software buffer and starts a session, the interrupt handler pumps chunks
//! until a terminal state, foreground code polls the status and acknowledges
//! the result back to idle.

#![no_std]
#![deny(unsafe_code)]

pub mod i2c;
pub mod mock;
pub mod spi;
pub mod uart;

pub use i2c::I2cMaster;
pub use spi::{PinSelector, SpiMaster};
pub use uart::{UartReceiver, UartTransmitter};
