//! # bitlink
//!
//! A portable, no_std Rust driver for a bit-banged synchronous serial link between
//! two microcontrollers: one data line and one clock line in each direction.
//!
//! The link is built from:
//! - `embedded-hal` traits for the data and clock pins
//! - a tick-driven transmit state machine and an edge-driven receive state machine
//! - a bit-serial CRC-32 over the length field and payload
//! - one-byte node addressing with a reserved broadcast id
//! - interrupt-safe driver access with `critical-section`
//!
//! ## Crate features
//! | Feature               | Description |
//! |-----------------------|-------------|
//! | `std`                 | Disables `#![no_std]` |
//! | `delay-loop`          | Blocking tick loop over `embedded_hal::delay::DelayNs` |
//! | `timer-isr` (default) | Global driver and ISR helpers behind `critical_section::with` |
//! | `defmt-0-3`           | Uses `defmt` logging |
//! | `log`                 | Uses `log` logging |
//!
//! ## Frame layout
//!
//! ```text
//! | preamble 0x7E | CRC (32 bits) | DLC (8 bits) | payload (0..=32 bits) |
//! ```
//!
//! Bits go out most significant first within each byte. The DLC carries the
//! payload length in bits in its low six bits and an *addressed* flag; addressed
//! payloads start with the destination and source ids.
//!
//! ## Usage
//!
//! ```rust
//! # use embedded_hal_mock::eh1::digital::{Mock as Pin, State as PinState, Transaction as PinTransaction};
//! use bitlink::config::LinkConfig;
//! use bitlink::driver::LinkDriver;
//!
//! # let tx_pin = Pin::new(&[PinTransaction::set(PinState::Low)]);
//! # let rx_pin = Pin::new(&[]);
//! # let clk_pin = Pin::new(&[PinTransaction::set(PinState::Low)]);
//! let mut driver = LinkDriver::new(tx_pin, rx_pin, clk_pin, LinkConfig::new());
//! driver.send(b"test", 32).unwrap();
//! assert!(driver.is_transmitting());
//! # driver.tx.done();
//! # driver.rx.done();
//! # driver.clk.done();
//! ```
//!
//! Call [`tick()`](driver::LinkDriver::tick) and
//! [`clock_tick()`](driver::LinkDriver::clock_tick) from a periodic timer and
//! [`on_edge()`](driver::LinkDriver::on_edge) from the pin-change interrupt of
//! the incoming clock line.
//!
//! ## Integration Notes
//!
//! - The clock line toggles once per bit; the receiver samples on both edges
//! - Only one driver instance should be active at a time in interrupt-driven mode
//! - Both peers must agree on the CRC polynomial

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "timer-isr")]
pub use critical_section;

pub use heapless;

#[macro_use]
mod fmt;

pub mod bits;
pub mod clock;
pub mod config;
pub mod consts;
pub mod crc;
pub mod driver;
pub mod error;
pub mod frame;
pub mod routing;
pub mod rx;
pub mod timer;
pub mod tx;
