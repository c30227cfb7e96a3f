//! Porthmos hardware capability traits
//!
//! This crate defines the narrow hardware surface the transport engine needs
//! from a serial peripheral: FIFO access, interrupt thresholds and the
//! per-peripheral control lines. Chip-specific code implements these traits
//! over its register blocks; the engine crates never touch a register
//! directly.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │  Peripheral engines (porthmos-drivers)   │
//! └──────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌──────────────────────────────────────────┐
//! │  porthmos-core (session, pump, watch)    │
//! └──────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌──────────────────────────────────────────┐
//! │  porthmos-hal (this crate - traits)      │
//! └──────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ chip register │       │  mock ports   │
//! │    ports      │       │ (host tests)  │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`fifo::TxFifo`], [`fifo::RxFifo`] - hardware FIFO access
//! - [`gpio::OutputPin`] - digital output (chip-select lines)
//! - [`spi::SpiPort`], [`spi::ChipSelect`] - SPI master peripheral
//! - [`uart::UartTxPort`], [`uart::UartRxPort`] - UART peripheral, per direction
//! - [`i2c::I2cPort`] - I2C master peripheral

#![no_std]
#![deny(unsafe_code)]

pub mod fifo;
pub mod gpio;
pub mod i2c;
pub mod spi;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use fifo::{RxFifo, TxFifo};
pub use gpio::OutputPin;
pub use i2c::I2cPort;
pub use spi::{ChipSelect, Endpoint, SpiPort};
pub use uart::{UartRxPort, UartTxPort};
