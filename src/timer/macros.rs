/// Declares a static global `LINK_DRIVER` instance protected by a `critical_section` mutex.
///
/// Both the main thread and the timer and pin-change interrupts reach the
/// shared driver through this static.
///
/// # Arguments
/// - `$tx`: The concrete type of the data output pin (must implement `OutputPin`)
/// - `$rx`: The concrete type of the data input pin (must implement `InputPin`)
/// - `$clk`: The concrete type of the clock output pin (must implement `OutputPin`)
///
/// # Example
/// ```rust,ignore
/// init_link_driver!(MyTxPin, MyRxPin, MyClkPin);
/// ```
#[macro_export]
macro_rules! init_link_driver {
    ( $tx:ty, $rx:ty, $clk:ty ) => {
        pub static LINK_DRIVER: $crate::timer::GlobalLinkDriver<$tx, $rx, $clk> =
            $crate::critical_section::Mutex::new(::core::cell::RefCell::new(None));
    };
}

/// Stores a new driver in the `LINK_DRIVER` declared by `init_link_driver!`.
///
/// # Arguments
/// - `$tx`, `$rx`, `$clk`: the pins, in the order `LinkDriver::new` takes them
/// - `$config`: a [`LinkConfig`](crate::config::LinkConfig)
///
/// # Example
/// ```rust,ignore
/// fn main() {
///     setup_link_driver!(tx, rx, clk, LinkConfig::new().with_node_id(0x22));
/// }
/// ```
#[macro_export]
macro_rules! setup_link_driver {
    ( $tx:expr, $rx:expr, $clk:expr, $config:expr ) => {
        $crate::critical_section::with(|cs| {
            let _ = LINK_DRIVER
                .borrow(cs)
                .replace(Some($crate::driver::LinkDriver::new(
                    $tx, $rx, $clk, $config,
                )));
        });
    };
}

/// Calls `tick()` on the global `LINK_DRIVER` if it has been initialized.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn TIMER0_COMPA() {
///     tick_link_timer!();
/// }
/// ```
///
/// Does nothing before `setup_link_driver!` has run.
#[macro_export]
macro_rules! tick_link_timer {
    () => {
        $crate::critical_section::with(|cs| {
            if let Some(driver) = LINK_DRIVER.borrow(cs).borrow_mut().as_mut() {
                driver.tick();
            }
        });
    };
}

/// Calls `clock_tick()` on the global `LINK_DRIVER`. Evaluates to `true`
/// when the clock line toggled.
#[macro_export]
macro_rules! tick_link_clock {
    () => {
        $crate::critical_section::with(|cs| {
            LINK_DRIVER
                .borrow(cs)
                .borrow_mut()
                .as_mut()
                .is_some_and(|driver| driver.clock_tick())
        })
    };
}

/// Samples one bit on the global `LINK_DRIVER`. Call from the pin-change
/// interrupt of the incoming clock line.
///
/// Evaluates to the `Option<ReceivedFrame>` completed by this edge.
#[macro_export]
macro_rules! link_bit_edge {
    () => {
        $crate::critical_section::with(|cs| {
            LINK_DRIVER
                .borrow(cs)
                .borrow_mut()
                .as_mut()
                .and_then(|driver| driver.on_edge())
        })
    };
}
