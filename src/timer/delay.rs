use crate::driver::LinkDriver;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

/// Runs a blocking loop that drives the transmitter and the clock line.
///
/// For boards that loop the clock output back to their own sampling side, or
/// for polling firmware without interrupts. Each pass calls
/// [`LinkDriver::tick`] and [`LinkDriver::clock_tick`], then waits `tick_us`.
///
/// # Example
/// ```rust,ignore
/// use bitlink::timer::run_link_tick_loop;
/// let mut driver = LinkDriver::new(tx, rx, clk, LinkConfig::new());
/// run_link_tick_loop(&mut driver, &mut delay, 63);
/// ```
///
/// This loop never returns.
pub fn run_link_tick_loop<D: DelayNs, TX, RX, CLK>(
    driver: &mut LinkDriver<TX, RX, CLK>,
    delay: &mut D,
    tick_us: u32,
) -> !
where
    TX: OutputPin,
    RX: InputPin,
    CLK: OutputPin,
{
    loop {
        driver.tick();
        let _ = driver.clock_tick();
        delay.delay_us(tick_us);
    }
}

/// Like [`run_link_tick_loop`] but stops after `count` ticks.
///
/// Returns the number of clock toggles emitted.
pub fn run_link_ticks<D: DelayNs, TX, RX, CLK>(
    driver: &mut LinkDriver<TX, RX, CLK>,
    delay: &mut D,
    tick_us: u32,
    count: usize,
) -> usize
where
    TX: OutputPin,
    RX: InputPin,
    CLK: OutputPin,
{
    let mut toggles = 0;
    for _ in 0..count {
        driver.tick();
        if driver.clock_tick() {
            toggles += 1;
        }
        delay.delay_us(tick_us);
    }
    toggles
}
