//! Link configuration.
//!
//! A [`LinkConfig`] is fixed when the [`LinkDriver`](crate::driver::LinkDriver)
//! is built. Every field can be set in a `const` context so firmware can keep
//! its configuration in a `static`:
//!
//! ```rust
//! use bitlink::config::LinkConfig;
//!
//! const CONFIG: LinkConfig = LinkConfig::new().with_node_id(0x22).with_ticks_per_bit(4);
//! assert_eq!(CONFIG.node_id, 0x22);
//! assert_eq!(CONFIG.tx_phase, 2);
//! ```

use crate::consts::MY_ID;
use crate::crc::Polynomial;

/// Timing, identity, and CRC parameters for one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct LinkConfig {
    /// This node's address. Defaults to [`MY_ID`].
    pub node_id: u8,
    /// Timer ticks per bit period, for both the transmitter and the clock line.
    pub ticks_per_bit: u8,
    /// Starting value of the transmit tick counter.
    ///
    /// Offsetting the transmitter from the clock generator keeps data changes
    /// away from clock edges; half a bit period puts each edge mid-bit.
    pub tx_phase: u8,
    /// Generator polynomial shared by both peers.
    pub polynomial: Polynomial,
}

impl LinkConfig {
    /// Node [`MY_ID`], 8 ticks per bit, transmit phase of half a bit, CRC-32.
    pub const fn new() -> Self {
        Self {
            node_id: MY_ID,
            ticks_per_bit: 8,
            tx_phase: 4,
            polynomial: Polynomial::CRC32,
        }
    }

    /// Sets the node address.
    pub const fn with_node_id(mut self, node_id: u8) -> Self {
        self.node_id = node_id;
        self
    }

    /// Sets the bit period and resets the transmit phase to half of it.
    ///
    /// A value of zero is treated as one.
    pub const fn with_ticks_per_bit(mut self, ticks_per_bit: u8) -> Self {
        self.ticks_per_bit = if ticks_per_bit == 0 { 1 } else { ticks_per_bit };
        self.tx_phase = self.ticks_per_bit / 2;
        self
    }

    /// Sets the transmit phase offset explicitly.
    pub const fn with_tx_phase(mut self, tx_phase: u8) -> Self {
        self.tx_phase = tx_phase;
        self
    }

    /// Sets the generator polynomial.
    pub const fn with_polynomial(mut self, polynomial: Polynomial) -> Self {
        self.polynomial = polynomial;
        self
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self::new()
    }
}
