//! Clock line generator.
//!
//! Toggles the clock output once per bit period. The peer samples its data
//! input on every clock change, rising and falling alike, so one toggle
//! carries one bit.

use embedded_hal::digital::OutputPin;

/// Divides the timer tick down to one clock toggle per bit period.
#[derive(Debug)]
pub struct ClockGenerator {
    ticks_per_toggle: u8,
    counter: u8,
    level: bool,
}

impl ClockGenerator {
    /// Creates a generator that toggles every `ticks_per_toggle` ticks.
    /// The line starts low.
    pub const fn new(ticks_per_toggle: u8) -> Self {
        Self {
            ticks_per_toggle: if ticks_per_toggle == 0 {
                1
            } else {
                ticks_per_toggle
            },
            counter: 0,
            level: false,
        }
    }

    /// Current level of the clock line.
    pub const fn level(&self) -> bool {
        self.level
    }

    /// Drives the line to its current level, e.g. after construction.
    pub fn drive<CLK: OutputPin>(&self, clk: &mut CLK) {
        if self.level {
            let _ = clk.set_high();
        } else {
            let _ = clk.set_low();
        }
    }

    /// Advances by one timer tick. Returns `true` when the line was toggled.
    pub fn tick<CLK: OutputPin>(&mut self, clk: &mut CLK) -> bool {
        self.counter += 1;
        if self.counter < self.ticks_per_toggle {
            return false;
        }
        self.counter = 0;
        self.level = !self.level;
        self.drive(clk);
        true
    }
}
