//! Timer and tick-loop utilities for the link driver.
//!
//! Two ways of driving a [`LinkDriver`](crate::driver::LinkDriver): interrupt
//! handlers sharing a global driver through `critical_section::with`
//! (`timer-isr` feature), or a busy loop around a delay provider (`delay-loop`
//! feature).
//!
//! Contains:
//! - `compute_ocr_value` / `const_ocr_value`: timer compare value for a tick period
//! - `ticks_per_bit` / `const_ticks_per_bit`: divider for a target bit rate
//! - `run_link_tick_loop`: blocking driver loop for `DelayNs` (feature `delay-loop`)
//! - `global_link_*` functions and `tick_link_timer!()`, `tick_link_clock!()`,
//!   `link_bit_edge!()`: interrupt wrappers (feature `timer-isr`)
//!
//! Common AVR prescalers at 16 MHz (for `compute_ocr_value` and `const_ocr_value`):
//!
//! | PRESCALER | TIMER_COUNTS | Tick Interval |
//! |-----------|--------------|---------------|
//! |         8 |          125 |       62.5 µs |
//! |        64 |          250 |        1 ms   |
//! |       256 |          125 |        2 ms   |
//! |      1024 |          250 |       16 ms   |

use libm::round;

#[cfg(feature = "delay-loop")]
mod delay;
#[cfg(feature = "delay-loop")]
pub use delay::*;

#[cfg(feature = "timer-isr")]
mod isr;
#[cfg(feature = "timer-isr")]
pub use isr::*;

#[cfg(feature = "timer-isr")]
mod macros;

/// Nanoseconds in one microsecond
pub const NANOSECONDS_PER_MICROSECOND: u32 = 1_000;
/// Nanoseconds in one second
pub const NANOSECONDS_PER_SECOND: u64 = 1_000_000_000;

/// Computes the compare-match count for a timer tick.
///
/// # Arguments
/// - `f_cpu`: CPU frequency in Hz
/// - `prescaler`: timer prescaler (e.g., 8, 64, 256)
/// - `tick_us`: desired tick interval in microseconds (e.g., 62.5)
///
/// # Returns
/// Timer counts per tick, rounded to the nearest integer. Registers that count
/// from zero (AVR CTC `OCRnA`) take this value minus one.
pub fn compute_ocr_value(f_cpu: u32, prescaler: u32, tick_us: f32) -> u16 {
    let counts_per_second = f_cpu as f64 / prescaler as f64;
    round(counts_per_second * tick_us as f64 / 1_000_000.0) as u16
}

/// Compile-time [`compute_ocr_value`], with the tick given in nanoseconds.
pub const fn const_ocr_value(f_cpu: u32, prescaler: u32, tick_ns: u32) -> u16 {
    let counts = (f_cpu / prescaler) as u64 * tick_ns as u64;
    ((counts + NANOSECONDS_PER_SECOND / 2) / NANOSECONDS_PER_SECOND) as u16
}

/// Computes how many ticks make up one bit period.
///
/// # Arguments
/// - `tick_us`: tick interval in microseconds (e.g., 62.5)
/// - `bits_per_second`: target bit rate (e.g., 2000)
///
/// # Returns
/// The divider for [`LinkConfig::with_ticks_per_bit`](crate::config::LinkConfig::with_ticks_per_bit),
/// at least 1.
pub fn ticks_per_bit(tick_us: f32, bits_per_second: u32) -> u8 {
    let ticks = round(1_000_000.0 / (tick_us as f64 * bits_per_second as f64));
    if ticks < 1.0 { 1 } else { ticks as u8 }
}

/// Compile-time [`ticks_per_bit`], with the tick given in nanoseconds.
pub const fn const_ticks_per_bit(tick_ns: u32, bits_per_second: u32) -> u8 {
    let ticks = NANOSECONDS_PER_SECOND / (tick_ns as u64 * bits_per_second as u64);
    if ticks == 0 { 1 } else { ticks as u8 }
}
