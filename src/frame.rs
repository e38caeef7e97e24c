//! Frame model: the length field and the payload it describes.
//!
//! A frame on the wire is `preamble ‖ crc ‖ dlc ‖ payload`. The preamble is a
//! constant and the CRC is derived, so a [`Frame`] only stores the DLC and the
//! payload bytes. Payload bits past the declared length are always zero, which
//! keeps a transmitted frame and its received copy bit-identical.

use crate::bits::write_bit;
use crate::consts::{
    ADDRESS_HEADER_LEN, CRC_BYTES, CRC_MESSAGE_BYTES, DLC_BITS, DLC_FLAG_ADDRESSED,
    DLC_LENGTH_MASK, MAX_ADDRESSED_DATA_BITS, MAX_PAYLOAD_BITS, MAX_PAYLOAD_BYTES,
};
use crate::crc::{Polynomial, check, generate};
use crate::error::LinkError;

/// The length field (DLC).
///
/// Bits 0..=5 hold the payload length in bits. Bit 6 marks an addressed frame;
/// bit 7 is reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Dlc(u8);

impl Dlc {
    /// Wraps a raw length-field byte as received from the wire.
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    /// Builds a DLC from a payload length and the addressed flag.
    ///
    /// Only the low six bits of `payload_bits` are kept.
    pub const fn from_parts(payload_bits: u8, addressed: bool) -> Self {
        let flags = if addressed { DLC_FLAG_ADDRESSED } else { 0 };
        Self((payload_bits & DLC_LENGTH_MASK) | flags)
    }

    /// The raw byte as sent on the wire.
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Declared payload length in bits.
    ///
    /// This may exceed [`MAX_PAYLOAD_BITS`] for a corrupted or hostile DLC;
    /// see [`Dlc::fits`].
    pub const fn payload_bits(self) -> usize {
        (self.0 & DLC_LENGTH_MASK) as usize
    }

    /// Whether the payload opens with destination and source ids.
    pub const fn is_addressed(self) -> bool {
        self.0 & DLC_FLAG_ADDRESSED != 0
    }

    /// Whether the declared length fits the payload buffer.
    pub const fn fits(self) -> bool {
        self.payload_bits() <= MAX_PAYLOAD_BITS
    }
}

/// A frame as carried between the transmit and receive machines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Frame {
    dlc: Dlc,
    payload: [u8; MAX_PAYLOAD_BYTES],
}

impl Frame {
    /// Builds an unaddressed frame carrying the first `bits` bits of `data`.
    ///
    /// # Errors
    /// - [`LinkError::PayloadTooLong`] if `bits` exceeds the payload buffer
    /// - [`LinkError::ShortPayload`] if `data` holds fewer than `bits` bits
    pub fn new(data: &[u8], bits: usize) -> Result<Self, LinkError> {
        if bits > MAX_PAYLOAD_BITS {
            return Err(LinkError::PayloadTooLong {
                bits,
                max: MAX_PAYLOAD_BITS,
            });
        }
        let mut frame = Self {
            dlc: Dlc::from_parts(bits as u8, false),
            payload: [0; MAX_PAYLOAD_BYTES],
        };
        frame.fill(0, data, bits)?;
        Ok(frame)
    }

    /// Builds an addressed frame: `[dst, src, data...]`.
    ///
    /// `bits` counts the application data only; the two address bytes are
    /// added to the declared length.
    ///
    /// # Errors
    /// - [`LinkError::PayloadTooLong`] if `bits` exceeds the room left after
    ///   the address header
    /// - [`LinkError::ShortPayload`] if `data` holds fewer than `bits` bits
    pub fn addressed(dst: u8, src: u8, data: &[u8], bits: usize) -> Result<Self, LinkError> {
        if bits > MAX_ADDRESSED_DATA_BITS {
            return Err(LinkError::PayloadTooLong {
                bits,
                max: MAX_ADDRESSED_DATA_BITS,
            });
        }
        let total = bits + ADDRESS_HEADER_LEN * 8;
        let mut frame = Self {
            dlc: Dlc::from_parts(total as u8, true),
            payload: [0; MAX_PAYLOAD_BYTES],
        };
        frame.payload[0] = dst;
        frame.payload[1] = src;
        frame.fill(ADDRESS_HEADER_LEN, data, bits)?;
        Ok(frame)
    }

    /// Reassembles a frame from raw wire fields without validation.
    ///
    /// Payload bits past the declared length are cleared.
    pub const fn from_raw(dlc: Dlc, mut payload: [u8; MAX_PAYLOAD_BYTES]) -> Self {
        let bits = dlc.payload_bits();
        let mut i = 0;
        while i < MAX_PAYLOAD_BYTES {
            let start = i * 8;
            if bits <= start {
                payload[i] = 0;
            } else if bits < start + 8 {
                payload[i] &= !(0xff >> (bits - start));
            }
            i += 1;
        }
        Self { dlc, payload }
    }

    fn fill(&mut self, offset: usize, data: &[u8], bits: usize) -> Result<(), LinkError> {
        let available = data.len() * 8;
        if available < bits {
            return Err(LinkError::ShortPayload { bits, available });
        }
        let bytes = bits.div_ceil(8);
        self.payload[offset..offset + bytes].copy_from_slice(&data[..bytes]);
        // Zero the tail of a partial last byte
        for pos in bits..bytes * 8 {
            write_bit(&mut self.payload[offset..], pos, false);
        }
        Ok(())
    }

    /// The length field.
    pub const fn dlc(&self) -> Dlc {
        self.dlc
    }

    /// The whole payload buffer, header bytes included for addressed frames.
    pub const fn payload(&self) -> &[u8; MAX_PAYLOAD_BYTES] {
        &self.payload
    }

    /// Declared payload length in bits.
    pub const fn payload_bits(&self) -> usize {
        self.dlc.payload_bits()
    }

    /// Whether the DLC sets the addressed flag but declares fewer bits than
    /// the destination and source ids need.
    pub const fn header_truncated(&self) -> bool {
        self.dlc.is_addressed() && self.payload_bits() < ADDRESS_HEADER_LEN * 8
    }

    const fn has_header(&self) -> bool {
        self.dlc.is_addressed() && !self.header_truncated()
    }

    /// Destination id of an addressed frame.
    pub const fn destination(&self) -> Option<u8> {
        if self.has_header() {
            Some(self.payload[0])
        } else {
            None
        }
    }

    /// Source id of an addressed frame.
    pub const fn source(&self) -> Option<u8> {
        if self.has_header() {
            Some(self.payload[1])
        } else {
            None
        }
    }

    /// The application bytes: the payload minus any address header, trimmed
    /// to the declared length rounded up to whole bytes.
    pub fn data(&self) -> &[u8] {
        let end = self.payload_bits().div_ceil(8).min(MAX_PAYLOAD_BYTES);
        let start = if self.dlc.is_addressed() {
            ADDRESS_HEADER_LEN.min(end)
        } else {
            0
        };
        &self.payload[start..end]
    }

    /// The bytes covered by the CRC: `dlc ‖ payload`.
    pub fn crc_message(&self) -> [u8; CRC_MESSAGE_BYTES] {
        let mut msg = [0u8; CRC_MESSAGE_BYTES];
        msg[0] = self.dlc.raw();
        msg[1..].copy_from_slice(&self.payload);
        msg
    }

    /// Number of leading bits of [`Frame::crc_message`] covered by the CRC.
    ///
    /// Clamped to the buffer so an oversized DLC cannot index past it.
    pub fn crc_message_bits(&self) -> usize {
        DLC_BITS + self.payload_bits().min(MAX_PAYLOAD_BITS)
    }

    /// Computes the CRC of this frame.
    pub fn compute_crc(&self, poly: Polynomial) -> [u8; CRC_BYTES] {
        let mut crc = [0u8; CRC_BYTES];
        generate(&mut crc, &self.crc_message(), self.crc_message_bits(), poly);
        crc
    }

    /// Checks a received CRC against this frame.
    pub fn verify(&self, crc: &[u8; CRC_BYTES], poly: Polynomial) -> bool {
        check(crc, &self.crc_message(), self.crc_message_bits(), poly)
    }
}
