//! Bit-granular access to fixed-size byte buffers.
//!
//! A buffer is treated as one flat bit sequence: byte 0 first, and within each
//! byte the most significant bit first. Bit `0` is therefore `buf[0] & 0x80`
//! and bit `9` is `buf[1] & 0x40`.
//!
//! None of these functions bounds-check against a logical frame length. The
//! caller guarantees `pos < buf.len() * 8`; slice indexing panics otherwise.

use crate::consts::PREAMBLE;

#[inline]
fn mask(pos: usize) -> u8 {
    0x80 >> (pos % 8)
}

/// Reads the bit at `pos`.
///
/// # Panics
/// If `pos / 8` is out of range for `buf`.
#[inline]
pub fn read_bit(buf: &[u8], pos: usize) -> bool {
    buf[pos / 8] & mask(pos) != 0
}

/// Sets the bit at `pos` to `bit`, leaving every other bit untouched.
///
/// # Panics
/// If `pos / 8` is out of range for `buf`.
#[inline]
pub fn write_bit(buf: &mut [u8], pos: usize, bit: bool) {
    if bit {
        buf[pos / 8] |= mask(pos);
    } else {
        buf[pos / 8] &= !mask(pos);
    }
}

/// Stores a freshly received bit at `pos`.
///
/// Same contract as [`write_bit`]; the receive path uses this name while it
/// assembles an incoming field.
#[inline]
pub fn update_bit(buf: &mut [u8], pos: usize, bit: bool) {
    write_bit(buf, pos, bit)
}

/// Zeroes the whole buffer.
#[inline]
pub fn clear(buf: &mut [u8]) {
    buf.fill(0);
}

/// Returns `true` only for the exact preamble byte.
#[inline]
pub const fn matches_preamble(byte: u8) -> bool {
    byte == PREAMBLE
}

/// Shifts `bit` into a rolling one-byte window and returns the new window.
///
/// The oldest bit falls off the top; the newest bit lands in the least
/// significant position, so after eight bits the window reads in arrival order.
#[inline]
pub const fn shift_in(window: u8, bit: bool) -> u8 {
    (window << 1) | bit as u8
}

/// Iterates over the first `count` bits of `buf` in wire order.
///
/// # Panics
/// While iterating, if `count` exceeds `buf.len() * 8`.
pub fn iter_bits(buf: &[u8], count: usize) -> impl Iterator<Item = bool> + '_ {
    (0..count).map(move |pos| read_bit(buf, pos))
}
