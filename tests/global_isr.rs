//! Interrupt glue over `critical_section`, using the std implementation.

use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};

use bitlink::config::LinkConfig;
use bitlink::error::LinkError;
use bitlink::frame::Frame;
use bitlink::routing::Route;
use bitlink::timer::{
    GlobalLinkDriver, global_link_bit_edge, global_link_clock_tick, global_link_driver_init,
    global_link_driver_setup, global_link_is_transmitting, global_link_receive, global_link_relay,
    global_link_send, global_link_send_to, global_link_timer_tick,
};
use bitlink::{init_link_driver, link_bit_edge, setup_link_driver, tick_link_clock, tick_link_timer};
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

/// A pin backed by a static line, so drivers can live in statics.
#[derive(Debug, Clone, Copy)]
struct LinePin(&'static AtomicBool);

impl ErrorType for LinePin {
    type Error = Infallible;
}

impl OutputPin for LinePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl InputPin for LinePin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.load(Ordering::SeqCst))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.0.load(Ordering::SeqCst))
    }
}

const FRAME_TICKS: usize = 100 * 8;

static UNSET: GlobalLinkDriver<LinePin, LinePin, LinePin> = global_link_driver_init();

#[test]
fn test_calls_before_setup_are_harmless() {
    global_link_timer_tick(&UNSET);
    assert!(!global_link_clock_tick(&UNSET));
    assert_eq!(global_link_bit_edge(&UNSET), None);
    assert_eq!(global_link_receive(&UNSET), None);
    assert!(!global_link_is_transmitting(&UNSET));
    assert_eq!(global_link_send(&UNSET, b"x", 8), Err(LinkError::NotReady));
    assert_eq!(
        global_link_send_to(&UNSET, 0x20, b"x", 8),
        Err(LinkError::NotReady)
    );
    assert_eq!(
        global_link_relay(&UNSET, &Frame::default()),
        Err(LinkError::NotReady)
    );
}

static SENDER: GlobalLinkDriver<LinePin, LinePin, LinePin> = global_link_driver_init();
static RECEIVER: GlobalLinkDriver<LinePin, LinePin, LinePin> = global_link_driver_init();
static FN_IDLE: AtomicBool = AtomicBool::new(false);
static FN_DATA: AtomicBool = AtomicBool::new(false);
static FN_CLK_A: AtomicBool = AtomicBool::new(false);
static FN_OUT_B: AtomicBool = AtomicBool::new(false);
static FN_CLK_B: AtomicBool = AtomicBool::new(false);

#[test]
fn test_global_functions_carry_a_frame() {
    global_link_driver_setup(
        &SENDER,
        LinePin(&FN_DATA),
        LinePin(&FN_IDLE),
        LinePin(&FN_CLK_A),
        LinkConfig::new().with_node_id(0x30),
    );
    global_link_driver_setup(
        &RECEIVER,
        LinePin(&FN_OUT_B),
        LinePin(&FN_DATA),
        LinePin(&FN_CLK_B),
        LinkConfig::new(),
    );

    global_link_send_to(&SENDER, 0x10, b"hi", 16).unwrap();
    assert!(global_link_is_transmitting(&SENDER));
    assert_eq!(global_link_send(&SENDER, b"no", 16), Err(LinkError::Busy));

    let mut delivered = None;
    for _ in 0..FRAME_TICKS {
        global_link_timer_tick(&SENDER);
        if global_link_clock_tick(&SENDER) {
            if let Some(received) = global_link_bit_edge(&RECEIVER) {
                delivered = Some(received);
                break;
            }
        }
    }

    let delivered = delivered.expect("frame not received");
    assert_eq!(delivered.route, Some(Route::Mine));
    assert_eq!(delivered.frame.data(), b"hi");
    assert!(!global_link_is_transmitting(&SENDER));
    assert_eq!(global_link_receive(&RECEIVER), Some(delivered));
    assert_eq!(global_link_receive(&RECEIVER), None);
}

mod macro_driven {
    use super::*;

    init_link_driver!(LinePin, LinePin, LinePin);

    static DATA: AtomicBool = AtomicBool::new(false);
    static CLK: AtomicBool = AtomicBool::new(false);

    #[test]
    fn test_macros_loop_back_own_clock() {
        // The node listens to its own data line on its own clock edges
        let tx = LinePin(&DATA);
        let rx = LinePin(&DATA);
        let clk = LinePin(&CLK);
        setup_link_driver!(tx, rx, clk, LinkConfig::new());

        global_link_send(&LINK_DRIVER, b"loop", 32).unwrap();

        let mut delivered = None;
        for _ in 0..FRAME_TICKS {
            tick_link_timer!();
            if tick_link_clock!() {
                if let Some(received) = link_bit_edge!() {
                    delivered = Some(received);
                    break;
                }
            }
        }

        let delivered = delivered.expect("frame not received");
        assert_eq!(delivered.frame.data(), b"loop");
        assert_eq!(delivered.route, None);
    }
}
