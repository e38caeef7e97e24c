//! Constants used across the link protocol implementation.
//!
//! This module defines the fixed field widths of a frame, the preamble pattern,
//! the length-field layout, and the node identity defaults.
//!
//! ## Frame Layout
//!
//! Every frame goes out most-significant-bit first, byte 0 first:
//!
//! | Field    | Width (bits)               |
//! |----------|----------------------------|
//! | Preamble | [`PREAMBLE_BITS`]          |
//! | CRC      | [`CRC_BITS`]               |
//! | DLC      | [`DLC_BITS`]               |
//! | Payload  | `0..=`[`MAX_PAYLOAD_BITS`] |
//!
//! These values are shared by every node on a link. Two peers built with
//! different values will never agree on a frame.

/// The fixed sentinel byte that opens every frame (`0111 1110`).
pub const PREAMBLE: u8 = 0b0111_1110;

/// Width of the preamble in bits.
pub const PREAMBLE_BITS: usize = 8;

/// Width of the CRC field in bits.
pub const CRC_BITS: usize = 32;

/// Width of the CRC field in bytes.
pub const CRC_BYTES: usize = CRC_BITS / 8;

/// Width of the length field (DLC) in bits.
pub const DLC_BITS: usize = 8;

/// Capacity of the payload buffer in bytes.
pub const MAX_PAYLOAD_BYTES: usize = 4;

/// Capacity of the payload buffer in bits.
pub const MAX_PAYLOAD_BITS: usize = MAX_PAYLOAD_BYTES * 8;

/// Bytes covered by the CRC: the length field followed by the payload.
pub const CRC_MESSAGE_BYTES: usize = 1 + MAX_PAYLOAD_BYTES;

/// Low bits of the DLC that carry the payload length in bits.
pub const DLC_LENGTH_MASK: u8 = 0x3f;

/// DLC flag marking a frame whose payload opens with destination and source ids.
pub const DLC_FLAG_ADDRESSED: u8 = 0x40;

/// DLC bit reserved for future frame types. Always sent as zero.
pub const DLC_FLAG_RESERVED: u8 = 0x80;

/// Bytes at the head of an addressed payload: destination, then source.
pub const ADDRESS_HEADER_LEN: usize = 2;

/// Largest application data section of an addressed frame, in bits.
pub const MAX_ADDRESSED_DATA_BITS: usize = MAX_PAYLOAD_BITS - ADDRESS_HEADER_LEN * 8;

/// The default identity of this node.
pub const MY_ID: u8 = 0x10;

/// The reserved destination every node accepts.
pub const BROADCAST_ID: u8 = u8::MAX;

/// Number of validated frames the driver keeps for the main thread.
pub const INBOX_LEN: usize = 4;
