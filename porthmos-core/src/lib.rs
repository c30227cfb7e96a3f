//! Transfer engine logic for the Porthmos transport
//!
//! This crate contains the peripheral-independent half of the engine:
//!
//! - Transfer session state machine (status, cursor, acknowledgement)
//! - Chunked pump between software buffer and hardware FIFO
//! - Receive liveness watch (completion inference and timeout on
//!   asynchronous links)
//!
//! Everything here is pure logic over the `porthmos-hal` capability traits;
//! the peripheral engines in `porthmos-drivers` wire it to concrete ports.
//!
//! # Concurrency model
//!
//! One logical core with interrupt preemption, no locks. Foreground code may
//! touch a session's buffers and call start operations only while the status
//! is not [`session::Status::InProgress`]; once in progress, only the
//! interrupt handler advances the cursor and status. The handshake is safe
//! because a session only leaves `InProgress` on paths that first disable the
//! engine's own interrupt source, and start operations re-arm that source
//! only after every session field has been written.

#![no_std]
#![deny(unsafe_code)]

pub mod pump;
pub mod session;
pub mod watch;

pub use pump::{drain, fill, watermark};
pub use session::{StartError, Status, TransferSession};
pub use watch::{Liveness, ProgressWatch};
