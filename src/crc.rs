//! Bit-serial CRC-32 engine.
//!
//! The CRC is the remainder of binary (GF(2)) polynomial long division, carried
//! out one message bit at a time. There is no lookup table, no initial value,
//! no bit reflection, and no final XOR: a message with all-zero bits has an
//! all-zero CRC.
//!
//! A receiver validates a frame by dividing the message followed by its CRC and
//! requiring a zero remainder. Both peers must share the same [`Polynomial`]; a
//! mismatch shows up only as every frame failing [`check`].

use crate::bits::{iter_bits, write_bit};
use crate::consts::CRC_BITS;

/// A 33-bit generator polynomial, stored with its `x^32` term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Polynomial(u64);

impl Polynomial {
    /// The IEEE 802.3 generator, `x^32 + x^26 + x^23 + ... + x + 1`.
    pub const CRC32: Polynomial = Polynomial(0x1_04c1_1db7);

    /// Builds a polynomial from its coefficients, `x^32` term included.
    ///
    /// Returns `None` unless bit 32 is set and nothing above it is.
    pub const fn new(coefficients: u64) -> Option<Self> {
        if coefficients >> CRC_BITS == 1 {
            Some(Self(coefficients))
        } else {
            None
        }
    }

    /// Decodes the 33-bit generator from its MSB-first bit-string form.
    ///
    /// The first 33 bits of `bytes` are the coefficients from `x^32` down to
    /// `x^0`; the trailing 7 bits are ignored.
    pub const fn from_bit_string(bytes: [u8; 5]) -> Option<Self> {
        let raw = ((bytes[0] as u64) << 32)
            | ((bytes[1] as u64) << 24)
            | ((bytes[2] as u64) << 16)
            | ((bytes[3] as u64) << 8)
            | bytes[4] as u64;
        Self::new(raw >> 7)
    }

    /// The coefficients, `x^32` term included.
    pub const fn coefficients(&self) -> u64 {
        self.0
    }
}

impl Default for Polynomial {
    fn default() -> Self {
        Self::CRC32
    }
}

/// Runs the long division over `bits` and returns the 32-bit remainder.
///
/// Each step shifts the next bit into the register; when a one reaches the
/// `x^32` position the generator is subtracted (XORed) out.
fn divide(bits: impl Iterator<Item = bool>, poly: Polynomial) -> u32 {
    let top = 1u64 << CRC_BITS;
    let mut reg: u64 = 0;
    for bit in bits {
        reg = (reg << 1) | bit as u64;
        if reg & top != 0 {
            reg ^= poly.0;
        }
    }
    reg as u32
}

/// Computes the CRC of the first `src_bits` bits of `src` into `dest`.
///
/// The message is conceptually extended with 32 zero bits before division.
/// `dest` is cleared first and receives the remainder MSB-first.
///
/// # Panics
/// If `dest` is shorter than 4 bytes or `src` holds fewer than `src_bits` bits.
pub fn generate(dest: &mut [u8], src: &[u8], src_bits: usize, poly: Polynomial) {
    let augmented = iter_bits(src, src_bits).chain(core::iter::repeat_n(false, CRC_BITS));
    let remainder = divide(augmented, poly);
    dest.fill(0);
    for pos in 0..CRC_BITS {
        write_bit(dest, pos, remainder & (1 << (CRC_BITS - 1 - pos)) != 0);
    }
}

/// Validates `crc` against the first `src_bits` bits of `src`.
///
/// Divides the message followed by the received CRC and reports `true` for a
/// zero remainder.
pub fn check(crc: &[u8], src: &[u8], src_bits: usize, poly: Polynomial) -> bool {
    let framed = iter_bits(src, src_bits).chain(iter_bits(crc, CRC_BITS));
    divide(framed, poly) == 0
}
