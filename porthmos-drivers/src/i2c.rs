//! I2C master transfer engine
//!
//! Same session discipline as the other peripherals, addressed instead of
//! selected, and single-chunk by construction: the software buffers are no
//! larger than the hardware FIFO, so every phase fits in one fill or drain.
//! A write-then-read transaction holds the bus with a repeated START between
//! the phases; one session (and one status) covers both.
//!
//! A slave that fails to acknowledge lands the session in
//! [`Status::FramingError`] - protocol-level failure, same remediation as a
//! bad packet: acknowledge and reissue.

use porthmos_core::{pump, StartError, Status, TransferSession};
use porthmos_hal::i2c::StopMode;
use porthmos_hal::I2cPort;

/// Software buffer capacity per direction; matches the hardware FIFO, so
/// transactions never need more than one chunk.
pub const I2C_BUFFER_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy)]
enum Phase {
    Idle,
    /// Write FIFO draining to the slave; `read_len > 0` means a repeated
    /// START and a read phase follow.
    Write {
        address: u8,
        write_len: usize,
        read_len: usize,
    },
    /// Expected bytes arriving from the slave.
    Read { write_len: usize, read_len: usize },
}

/// Interrupt-driven I2C master engine
///
/// Foreground code fills the write buffer, issues one of the three
/// operations and polls the status; the interrupt handler advances the
/// phases. The session cursor counts write bytes handed to the FIFO plus
/// read bytes copied out, so `Finished` means the whole transaction closed.
pub struct I2cMaster<P: I2cPort> {
    port: P,
    write_buffer: [u8; I2C_BUFFER_CAPACITY],
    read_buffer: [u8; I2C_BUFFER_CAPACITY],
    session: TransferSession,
    phase: Phase,
}

impl<P: I2cPort> I2cMaster<P> {
    /// Create an idle engine over an initialized port.
    pub fn new(port: P) -> Self {
        Self {
            port,
            write_buffer: [0; I2C_BUFFER_CAPACITY],
            read_buffer: [0; I2C_BUFFER_CAPACITY],
            session: TransferSession::new(),
            phase: Phase::Idle,
        }
    }

    fn write_capacity(&self) -> usize {
        I2C_BUFFER_CAPACITY.min(self.port.tx_capacity())
    }

    fn read_capacity(&self) -> usize {
        I2C_BUFFER_CAPACITY.min(self.port.rx_capacity())
    }

    /// Write `len` bytes from the write buffer to the slave at `address`.
    pub fn write(&mut self, address: u8, len: usize) -> Result<(), StartError> {
        let capacity = self.write_capacity();
        self.session.begin(len, capacity)?;
        self.phase = Phase::Write {
            address,
            write_len: len,
            read_len: 0,
        };
        let queued = pump::fill(&mut self.port, &self.write_buffer[..len]);
        self.session.advance(queued);
        self.port.clear_nack();
        self.port.set_interrupt_enabled(true);
        self.port.start_write(address, len, StopMode::Stop);
        Ok(())
    }

    /// Read `len` bytes from the slave at `address` into the read buffer.
    pub fn read(&mut self, address: u8, len: usize) -> Result<(), StartError> {
        let capacity = self.read_capacity();
        self.session.begin(len, capacity)?;
        self.phase = Phase::Read {
            write_len: 0,
            read_len: len,
        };
        self.port.clear_nack();
        self.port.set_interrupt_enabled(true);
        self.port.start_read(address, len);
        Ok(())
    }

    /// Write `write_len` bytes, then read `read_len` bytes from the same
    /// slave under a repeated START (register-pointer-then-data access).
    pub fn write_read(
        &mut self,
        address: u8,
        write_len: usize,
        read_len: usize,
    ) -> Result<(), StartError> {
        if write_len > self.write_capacity() || read_len > self.read_capacity() {
            return Err(StartError::Oversize);
        }
        if write_len == 0 || read_len == 0 {
            return Err(StartError::EmptyTransfer);
        }
        self.session
            .begin(write_len + read_len, write_len + read_len)?;
        self.phase = Phase::Write {
            address,
            write_len,
            read_len,
        };
        let queued = pump::fill(&mut self.port, &self.write_buffer[..write_len]);
        self.session.advance(queued);
        self.port.clear_nack();
        self.port.set_interrupt_enabled(true);
        self.port.start_write(address, write_len, StopMode::Restart);
        Ok(())
    }

    /// Phase-complete interrupt handler body.
    ///
    /// A latched NACK aborts the transaction. Otherwise a finished write
    /// phase either closes the session or opens the read phase under a
    /// repeated START; a read phase drains the FIFO and closes once the
    /// expected count is in.
    pub fn on_interrupt(&mut self) {
        if !self.session.is_in_progress() {
            return;
        }

        if self.port.nack_detected() {
            self.port.clear_nack();
            self.port.reset_fifos();
            self.port.set_interrupt_enabled(false);
            self.phase = Phase::Idle;
            self.session.abort(Status::FramingError);
            return;
        }

        match self.phase {
            Phase::Idle => {}
            Phase::Write {
                address,
                write_len,
                read_len,
            } => {
                if read_len > 0 {
                    self.phase = Phase::Read {
                        write_len,
                        read_len,
                    };
                    self.port.start_read(address, read_len);
                } else {
                    self.port.set_interrupt_enabled(false);
                    self.phase = Phase::Idle;
                    self.session.finish();
                }
            }
            Phase::Read {
                write_len,
                read_len,
            } => {
                let offset = self.session.cursor() - write_len;
                let received =
                    pump::drain(&mut self.port, &mut self.read_buffer[offset..read_len]);
                self.session.advance(received);
                if self.session.is_complete() {
                    self.port.set_interrupt_enabled(false);
                    self.phase = Phase::Idle;
                    self.session.finish();
                }
            }
        }
    }

    /// Current transaction status.
    pub fn status(&self) -> Status {
        self.session.status()
    }

    /// Acknowledge a terminal result, returning the session to idle.
    pub fn acknowledge_idle(&mut self) -> bool {
        self.session.acknowledge()
    }

    /// Write buffer, filled by foreground code before a transaction.
    ///
    /// Must not be touched while a transaction is in progress.
    pub fn write_buffer_mut(&mut self) -> &mut [u8; I2C_BUFFER_CAPACITY] {
        &mut self.write_buffer
    }

    /// Read buffer; valid up to the read length once finished.
    pub fn read_buffer(&self) -> &[u8; I2C_BUFFER_CAPACITY] {
        &self.read_buffer
    }

    /// Access to the underlying port.
    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }
}
