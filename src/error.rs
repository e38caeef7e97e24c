//! Errors returned when arming a transmission.
//!
//! Nothing on the interrupt side returns an error. Receive-side failures (bad
//! CRC, oversized length field) are logged, counted, and the receiver resets.

use thiserror::Error;

/// Reasons a frame could not be built or queued for transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum LinkError {
    /// The global link driver has not been set up yet.
    #[error("link driver not initialized")]
    NotReady,
    /// A transmit cycle is still in progress.
    #[error("transmitter busy")]
    Busy,
    /// The requested payload length does not fit in a frame.
    #[error("payload of {bits} bits exceeds the {max} bit limit")]
    PayloadTooLong {
        /// Requested length in bits.
        bits: usize,
        /// Largest length the frame can carry.
        max: usize,
    },
    /// The supplied bytes hold fewer bits than the requested length.
    #[error("{bits} bits requested but only {available} supplied")]
    ShortPayload {
        /// Requested length in bits.
        bits: usize,
        /// Bits available in the supplied slice.
        available: usize,
    },
}
