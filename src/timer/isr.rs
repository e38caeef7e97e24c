use crate::config::LinkConfig;
use crate::driver::LinkDriver;
use crate::error::LinkError;
use crate::frame::Frame;
use crate::rx::ReceivedFrame;
use core::cell::RefCell;
use critical_section::Mutex;
use embedded_hal::digital::{InputPin, OutputPin};

/// A link driver shared between the main thread and interrupt handlers.
pub type GlobalLinkDriver<TX, RX, CLK> = Mutex<RefCell<Option<LinkDriver<TX, RX, CLK>>>>;

/// Used to initialize the global static `LinkDriver` for use with
/// `critical_section`.
///
/// # Example
/// ```rust,ignore
/// use bitlink::timer::{GlobalLinkDriver, global_link_driver_init};
/// use some_hal::{PD2, PD3, PD4};
///
/// static LINK: GlobalLinkDriver<PD2, PD3, PD4> = global_link_driver_init();
/// ```
pub const fn global_link_driver_init<TX: OutputPin, RX: InputPin, CLK: OutputPin>()
-> GlobalLinkDriver<TX, RX, CLK> {
    Mutex::new(RefCell::new(None))
}

/// Builds the driver and stores it in the global slot.
///
/// Call once from `main()` before enabling the timer and pin-change interrupts.
pub fn global_link_driver_setup<TX: OutputPin, RX: InputPin, CLK: OutputPin>(
    global_driver: &'static GlobalLinkDriver<TX, RX, CLK>,
    tx: TX,
    rx: RX,
    clk: CLK,
    config: LinkConfig,
) {
    critical_section::with(|cs| {
        let _ = global_driver
            .borrow(cs)
            .replace(Some(LinkDriver::new(tx, rx, clk, config)));
    });
}

/// Transmit timer interrupt body.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn TIMER0_COMPA() {
///     global_link_timer_tick(&LINK);
/// }
/// ```
pub fn global_link_timer_tick<TX: OutputPin, RX: InputPin, CLK: OutputPin>(
    global_driver: &'static GlobalLinkDriver<TX, RX, CLK>,
) {
    critical_section::with(|cs| {
        if let Some(driver) = global_driver.borrow(cs).borrow_mut().as_mut() {
            driver.tick();
        }
    });
}

/// Clock timer interrupt body. Returns `true` when the clock line toggled.
pub fn global_link_clock_tick<TX: OutputPin, RX: InputPin, CLK: OutputPin>(
    global_driver: &'static GlobalLinkDriver<TX, RX, CLK>,
) -> bool {
    critical_section::with(|cs| {
        global_driver
            .borrow(cs)
            .borrow_mut()
            .as_mut()
            .is_some_and(|driver| driver.clock_tick())
    })
}

/// Pin-change interrupt body for the peer's clock line.
pub fn global_link_bit_edge<TX: OutputPin, RX: InputPin, CLK: OutputPin>(
    global_driver: &'static GlobalLinkDriver<TX, RX, CLK>,
) -> Option<ReceivedFrame> {
    critical_section::with(|cs| {
        global_driver
            .borrow(cs)
            .borrow_mut()
            .as_mut()
            .and_then(|driver| driver.on_edge())
    })
}

fn with_driver<TX: OutputPin, RX: InputPin, CLK: OutputPin, T>(
    global_driver: &'static GlobalLinkDriver<TX, RX, CLK>,
    f: impl FnOnce(&mut LinkDriver<TX, RX, CLK>) -> Result<T, LinkError>,
) -> Result<T, LinkError> {
    critical_section::with(|cs| match global_driver.borrow(cs).borrow_mut().as_mut() {
        Some(driver) => f(driver),
        None => Err(LinkError::NotReady),
    })
}

/// Arms a plain frame with interrupts held off, so the transmit interrupt
/// never sees a partly written frame.
///
/// # Errors
/// [`LinkError::NotReady`] before setup, otherwise as [`LinkDriver::send`].
pub fn global_link_send<TX: OutputPin, RX: InputPin, CLK: OutputPin>(
    global_driver: &'static GlobalLinkDriver<TX, RX, CLK>,
    data: &[u8],
    bits: usize,
) -> Result<(), LinkError> {
    with_driver(global_driver, |driver| driver.send(data, bits))
}

/// Arms an addressed frame inside a critical section.
///
/// # Errors
/// [`LinkError::NotReady`] before setup, otherwise as [`LinkDriver::send_to`].
pub fn global_link_send_to<TX: OutputPin, RX: InputPin, CLK: OutputPin>(
    global_driver: &'static GlobalLinkDriver<TX, RX, CLK>,
    dst: u8,
    data: &[u8],
    bits: usize,
) -> Result<(), LinkError> {
    with_driver(global_driver, |driver| driver.send_to(dst, data, bits))
}

/// Re-arms a received frame inside a critical section.
///
/// # Errors
/// [`LinkError::NotReady`] before setup, otherwise as [`LinkDriver::relay`].
pub fn global_link_relay<TX: OutputPin, RX: InputPin, CLK: OutputPin>(
    global_driver: &'static GlobalLinkDriver<TX, RX, CLK>,
    frame: &Frame,
) -> Result<(), LinkError> {
    with_driver(global_driver, |driver| driver.relay(frame))
}

/// Pops the oldest validated frame inside a critical section.
pub fn global_link_receive<TX: OutputPin, RX: InputPin, CLK: OutputPin>(
    global_driver: &'static GlobalLinkDriver<TX, RX, CLK>,
) -> Option<ReceivedFrame> {
    critical_section::with(|cs| {
        global_driver
            .borrow(cs)
            .borrow_mut()
            .as_mut()
            .and_then(|driver| driver.receive())
    })
}

/// Whether the global driver is mid-transmission. `false` before setup.
pub fn global_link_is_transmitting<TX: OutputPin, RX: InputPin, CLK: OutputPin>(
    global_driver: &'static GlobalLinkDriver<TX, RX, CLK>,
) -> bool {
    critical_section::with(|cs| {
        global_driver
            .borrow(cs)
            .borrow()
            .as_ref()
            .is_some_and(|driver| driver.is_transmitting())
    })
}
