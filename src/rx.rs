//! Receive state machine.
//!
//! [`ReceiveContext`] rebuilds a frame from the data line, one bit per clock
//! edge. It is purely reactive: nothing happens between edges and there is no
//! timeout, so a peer that stops mid-frame leaves the machine waiting in its
//! current phase until [`reset`](ReceiveContext::reset) is called.
//!
//! ```text
//! DetectingPreamble -> ReceivingCrc -> ReceivingDlc -> ReceivingPayload
//!        ^                                                    |
//!        +------- ProcessingData <------- CheckingCrc <-------+
//! ```
//!
//! `CheckingCrc` and `ProcessingData` run inside the edge that delivers the
//! last payload bit, so they never consume a data bit of their own and are
//! never left in [`ReceiveContext::state`]. Their outcome is the returned
//! [`RxEvent`]. Every completed cycle (valid, CRC failure, oversized length,
//! or truncated address header) clears all buffers and returns to
//! `DetectingPreamble`.

use crate::bits::{clear, matches_preamble, shift_in, update_bit};
use crate::consts::{CRC_BITS, CRC_BYTES, DLC_BITS, MAX_PAYLOAD_BYTES};
use crate::crc::Polynomial;
use crate::frame::{Dlc, Frame};
use crate::routing::{Route, classify};

/// Phase of the receive state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum RxState {
    /// Shifting bits through the rolling window, looking for the preamble.
    #[default]
    DetectingPreamble,
    /// Collecting the 32 CRC bits.
    ReceivingCrc,
    /// Collecting the 8 length-field bits.
    ReceivingDlc,
    /// Collecting the number of payload bits the DLC declared.
    ReceivingPayload,
    /// Validating the CRC. Transient, never stored.
    CheckingCrc,
    /// Classifying and handing off a valid frame. Transient, never stored.
    ProcessingData,
}

/// A validated frame as handed to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct ReceivedFrame {
    /// Length field and payload.
    pub frame: Frame,
    /// The CRC that came with it.
    pub crc: [u8; CRC_BYTES],
    /// Classification for addressed frames, `None` for plain ones.
    pub route: Option<Route>,
}

/// Outcome of a single receive edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum RxEvent {
    /// The bit was absorbed; nothing completed.
    Pending,
    /// The preamble was recognised.
    PreambleDetected,
    /// All CRC bits are in.
    CrcReceived,
    /// The length field is in and announces a payload.
    DlcReceived,
    /// The length field declared more bits than the payload buffer holds.
    /// The frame was dropped.
    LengthOverflow {
        /// Declared payload length in bits.
        bits: usize,
    },
    /// The frame failed its CRC and was dropped.
    CrcMismatch,
    /// The DLC set the addressed flag but declared too few bits for the
    /// destination and source ids. The frame was dropped.
    MissingHeader {
        /// Declared payload length in bits.
        bits: usize,
    },
    /// A frame passed its CRC.
    Received(ReceivedFrame),
}

/// The single in-flight incoming frame and its bit cursor.
#[derive(Debug)]
pub struct ReceiveContext {
    state: RxState,
    cursor: usize,
    window: u8,
    crc: [u8; CRC_BYTES],
    dlc: [u8; 1],
    payload: [u8; MAX_PAYLOAD_BYTES],
    poly: Polynomial,
    node_id: u8,
}

impl ReceiveContext {
    /// Creates a context hunting for a preamble, classifying frames for `node_id`.
    pub const fn new(poly: Polynomial, node_id: u8) -> Self {
        Self {
            state: RxState::DetectingPreamble,
            cursor: 0,
            window: 0,
            crc: [0; CRC_BYTES],
            dlc: [0; 1],
            payload: [0; MAX_PAYLOAD_BYTES],
            poly,
            node_id,
        }
    }

    /// Current phase.
    pub const fn state(&self) -> RxState {
        self.state
    }

    /// Index of the next bit within the current phase.
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// The rolling preamble window.
    pub const fn window(&self) -> u8 {
        self.window
    }

    /// Drops any partial frame and goes back to preamble detection.
    pub fn reset(&mut self) {
        self.window = 0;
        clear(&mut self.crc);
        clear(&mut self.dlc);
        clear(&mut self.payload);
        self.cursor = 0;
        self.state = RxState::DetectingPreamble;
    }

    /// Feeds one bit sampled on a clock edge.
    pub fn on_bit(&mut self, bit: bool) -> RxEvent {
        match self.state {
            RxState::DetectingPreamble => {
                self.window = shift_in(self.window, bit);
                if !matches_preamble(self.window) {
                    return RxEvent::Pending;
                }
                info!("rx: preamble detected");
                self.window = 0;
                self.cursor = 0;
                self.state = RxState::ReceivingCrc;
                RxEvent::PreambleDetected
            }
            RxState::ReceivingCrc => {
                update_bit(&mut self.crc, self.cursor, bit);
                self.cursor += 1;
                if self.cursor < CRC_BITS {
                    return RxEvent::Pending;
                }
                debug!("rx: crc received {:?}", self.crc);
                self.cursor = 0;
                self.state = RxState::ReceivingDlc;
                RxEvent::CrcReceived
            }
            RxState::ReceivingDlc => {
                update_bit(&mut self.dlc, self.cursor, bit);
                self.cursor += 1;
                if self.cursor < DLC_BITS {
                    return RxEvent::Pending;
                }
                self.cursor = 0;
                let dlc = Dlc::new(self.dlc[0]);
                debug!("rx: dlc received {}", dlc.raw());
                if !dlc.fits() {
                    let bits = dlc.payload_bits();
                    warn!("rx: dlc declares {} payload bits, dropping frame", bits);
                    self.reset();
                    return RxEvent::LengthOverflow { bits };
                }
                if dlc.payload_bits() == 0 {
                    return self.complete();
                }
                self.state = RxState::ReceivingPayload;
                RxEvent::DlcReceived
            }
            RxState::ReceivingPayload => {
                update_bit(&mut self.payload, self.cursor, bit);
                self.cursor += 1;
                if self.cursor < Dlc::new(self.dlc[0]).payload_bits() {
                    return RxEvent::Pending;
                }
                debug!("rx: payload received {:?}", self.payload);
                self.cursor = 0;
                self.complete()
            }
            // Never stored; complete() runs both within one edge
            RxState::CheckingCrc | RxState::ProcessingData => {
                self.reset();
                self.on_bit(bit)
            }
        }
    }

    fn complete(&mut self) -> RxEvent {
        let frame = Frame::from_raw(Dlc::new(self.dlc[0]), self.payload);
        let event = if !frame.verify(&self.crc, self.poly) {
            warn!("rx: crc invalid");
            RxEvent::CrcMismatch
        } else if frame.header_truncated() {
            let bits = frame.payload_bits();
            warn!("rx: addressed frame of {} bits has no header, dropping", bits);
            RxEvent::MissingHeader { bits }
        } else {
            info!("rx: crc valid");
            let route = if frame.dlc().is_addressed() {
                let route = classify(&frame, self.node_id);
                debug!("rx: route {:?}", route);
                Some(route)
            } else {
                None
            };
            RxEvent::Received(ReceivedFrame {
                frame,
                crc: self.crc,
                route,
            })
        };
        self.reset();
        event
    }
}
