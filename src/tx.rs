//! Transmit state machine.
//!
//! [`TransmitContext`] walks one frame out onto the data line, one bit per
//! call to [`on_tick`](TransmitContext::on_tick). The first tick after arming
//! computes the CRC instead of emitting a bit; the CRC over at most 40 message
//! bits is a fixed, bounded amount of work.
//!
//! ```text
//! GeneratingCrc -> SendingPreamble -> SendingCrc -> SendingDlc -> SendingPayload -> Terminal
//! ```

use crate::bits::{clear, read_bit};
use crate::consts::{
    CRC_BITS, CRC_BYTES, DLC_BITS, MAX_PAYLOAD_BITS, MAX_PAYLOAD_BYTES, PREAMBLE, PREAMBLE_BITS,
};
use crate::crc::{Polynomial, generate};
use crate::error::LinkError;
use crate::frame::{Dlc, Frame};

/// Phase of the transmit state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum TxState {
    /// Armed; the next tick computes the CRC.
    GeneratingCrc,
    /// Emitting the 8 preamble bits.
    SendingPreamble,
    /// Emitting the 32 CRC bits.
    SendingCrc,
    /// Emitting the 8 length-field bits.
    SendingDlc,
    /// Emitting the declared number of payload bits.
    SendingPayload,
    /// Nothing to send until re-armed.
    #[default]
    Terminal,
}

/// Outcome of a single transmit tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum TxTick {
    /// The machine is terminal; the line is left alone.
    Idle,
    /// The CRC was computed; no bit this tick.
    CrcGenerated,
    /// Put this bit on the line.
    Bit(bool),
    /// Put this bit on the line; it completes the frame.
    LastBit(bool),
}

/// The single in-flight outgoing frame and its bit cursor.
#[derive(Debug)]
pub struct TransmitContext {
    state: TxState,
    cursor: usize,
    frame: Frame,
    crc: [u8; CRC_BYTES],
    poly: Polynomial,
}

impl TransmitContext {
    /// Creates an idle context.
    pub const fn new(poly: Polynomial) -> Self {
        Self {
            state: TxState::Terminal,
            cursor: 0,
            frame: Frame::from_raw(Dlc::new(0), [0; MAX_PAYLOAD_BYTES]),
            crc: [0; CRC_BYTES],
            poly,
        }
    }

    /// Creates a context already armed with `frame`.
    pub fn with_frame(frame: Frame, poly: Polynomial) -> Self {
        Self {
            state: TxState::GeneratingCrc,
            cursor: 0,
            frame,
            crc: [0; CRC_BYTES],
            poly,
        }
    }

    /// Loads `frame` and starts a new transmit cycle.
    ///
    /// Callers sharing this context with an interrupt must hold a critical
    /// section across this call.
    ///
    /// # Errors
    /// - [`LinkError::Busy`] while a previous frame is still going out
    /// - [`LinkError::PayloadTooLong`] if the frame's DLC overflows the buffer
    pub fn arm(&mut self, frame: Frame) -> Result<(), LinkError> {
        if self.is_active() {
            return Err(LinkError::Busy);
        }
        if !frame.dlc().fits() {
            return Err(LinkError::PayloadTooLong {
                bits: frame.payload_bits(),
                max: MAX_PAYLOAD_BITS,
            });
        }
        self.frame = frame;
        self.cursor = 0;
        self.state = TxState::GeneratingCrc;
        Ok(())
    }

    /// Whether a frame is armed or going out.
    pub fn is_active(&self) -> bool {
        self.state != TxState::Terminal
    }

    /// Current phase.
    pub const fn state(&self) -> TxState {
        self.state
    }

    /// Index of the next bit within the current phase.
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// The frame being (or last) sent.
    pub const fn frame(&self) -> &Frame {
        &self.frame
    }

    /// The CRC computed for the current frame.
    pub const fn crc(&self) -> &[u8; CRC_BYTES] {
        &self.crc
    }

    /// Advances the machine by one tick.
    pub fn on_tick(&mut self) -> TxTick {
        match self.state {
            TxState::Terminal => TxTick::Idle,
            TxState::GeneratingCrc => {
                clear(&mut self.crc);
                generate(
                    &mut self.crc,
                    &self.frame.crc_message(),
                    self.frame.crc_message_bits(),
                    self.poly,
                );
                debug!("tx: crc generated {:?}", self.crc);
                self.cursor = 0;
                self.state = TxState::SendingPreamble;
                TxTick::CrcGenerated
            }
            TxState::SendingPreamble => {
                let bit = read_bit(&[PREAMBLE], self.cursor);
                self.step(bit, PREAMBLE_BITS, TxState::SendingCrc)
            }
            TxState::SendingCrc => {
                let bit = read_bit(&self.crc, self.cursor);
                self.step(bit, CRC_BITS, TxState::SendingDlc)
            }
            TxState::SendingDlc => {
                let bit = read_bit(&[self.frame.dlc().raw()], self.cursor);
                let next = if self.frame.payload_bits() == 0 {
                    TxState::Terminal
                } else {
                    TxState::SendingPayload
                };
                self.step(bit, DLC_BITS, next)
            }
            TxState::SendingPayload => {
                let bit = read_bit(self.frame.payload(), self.cursor);
                self.step(bit, self.frame.payload_bits(), TxState::Terminal)
            }
        }
    }

    fn step(&mut self, bit: bool, width: usize, next: TxState) -> TxTick {
        self.cursor += 1;
        if self.cursor < width {
            return TxTick::Bit(bit);
        }
        self.cursor = 0;
        self.state = next;
        if next == TxState::Terminal {
            trace!("tx: frame complete");
            TxTick::LastBit(bit)
        } else {
            TxTick::Bit(bit)
        }
    }
}
