//! Bit-banged link driver.
//!
//! This module provides the [`LinkDriver`] struct, which owns the data and clock
//! pins together with the transmit and receive state machines of one node.
//! The driver has three interrupt-facing entry points:
//!
//! - [`tick()`](LinkDriver::tick): transmit timer, advances the outgoing frame
//! - [`clock_tick()`](LinkDriver::clock_tick): clock timer, toggles the clock line
//! - [`on_edge()`](LinkDriver::on_edge): pin-change on the peer's clock line,
//!   samples the data input
//!
//! Each call does a bounded amount of work and never blocks.
//!
//! ## Example
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
//!
//! loop {
//!     driver.tick(); // Called from the transmit timer interrupt
//!     # break;
//! }
//! # driver.tx.done();
//! # driver.rx.done();
//! # driver.clk.done();
//! ```
//!
//! ## Sharing with interrupts
//!
//! When the driver is touched by both the main thread and interrupt handlers,
//! keep it in a `critical_section::Mutex` and arm transmissions through
//! [`crate::timer`] so an interrupt never observes a half-written frame.

use core::convert::Infallible;

use embedded_hal::digital::{InputPin, OutputPin};
use heapless::Deque;

use crate::clock::ClockGenerator;
use crate::config::LinkConfig;
use crate::consts::INBOX_LEN;
use crate::error::LinkError;
use crate::frame::Frame;
use crate::rx::{ReceiveContext, ReceivedFrame, RxEvent};
use crate::tx::{TransmitContext, TxTick};

/// One node of a synchronous bit-banged link.
///
/// ## Type Parameters
///
/// - `TX`: data output, implementing [`embedded_hal::digital::OutputPin`]
/// - `RX`: data input, implementing [`embedded_hal::digital::InputPin`]
/// - `CLK`: clock output, implementing [`embedded_hal::digital::OutputPin`]
///
/// ## Notes
///
/// - Only one transmit cycle can be in flight; `send` while busy fails with
///   [`LinkError::Busy`].
/// - Validated frames wait in a small inbox until [`receive()`](LinkDriver::receive)
///   pops them. When it is full, new frames are dropped and counted.
#[derive(Debug)]
pub struct LinkDriver<TX, RX, CLK>
where
    TX: OutputPin,
    RX: InputPin,
    CLK: OutputPin,
{
    /// Data output pin
    pub tx: TX,
    /// Data input pin
    pub rx: RX,
    /// Clock output pin
    pub clk: CLK,
    config: LinkConfig,
    transmitter: TransmitContext,
    receiver: ReceiveContext,
    clock: ClockGenerator,
    tick_counter: u8,
    inbox: Deque<ReceivedFrame, INBOX_LEN>,

    /// Frames sent in full.
    pub tx_good: u16,

    /// Frames received with a valid CRC.
    pub rx_good: u16,

    /// Frames dropped for a bad CRC, an oversized length field, or a missing
    /// address header.
    pub rx_bad: u16,

    /// Valid frames dropped because the inbox was full.
    pub rx_dropped: u16,
}

impl<TX, RX, CLK> LinkDriver<TX, RX, CLK>
where
    TX: OutputPin,
    RX: InputPin,
    CLK: OutputPin,
{
    /// Creates a driver with both output lines driven low.
    ///
    /// A transmit phase of a bit period or more wraps around the period.
    pub fn new(tx: TX, rx: RX, clk: CLK, config: LinkConfig) -> Self {
        let ticks_per_bit = config.ticks_per_bit.max(1);
        let mut driver = Self {
            tx,
            rx,
            clk,
            transmitter: TransmitContext::new(config.polynomial),
            receiver: ReceiveContext::new(config.polynomial, config.node_id),
            clock: ClockGenerator::new(config.ticks_per_bit),
            tick_counter: config.tx_phase % ticks_per_bit,
            inbox: Deque::new(),
            config: LinkConfig {
                ticks_per_bit,
                ..config
            },
            tx_good: 0,
            rx_good: 0,
            rx_bad: 0,
            rx_dropped: 0,
        };
        driver.write_tx(false);
        driver.clock.drive(&mut driver.clk);
        driver
    }

    /// The configuration this driver was built with.
    pub const fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// This node's address.
    pub const fn node_id(&self) -> u8 {
        self.config.node_id
    }

    /// The transmit state machine.
    pub const fn transmitter(&self) -> &TransmitContext {
        &self.transmitter
    }

    /// The receive state machine.
    pub const fn receiver(&self) -> &ReceiveContext {
        &self.receiver
    }

    fn write_tx(&mut self, bit: bool) {
        if bit {
            let _ = self.tx.set_high();
        } else {
            let _ = self.tx.set_low();
        }
    }

    /// Transmit timer entry point.
    ///
    /// The transmit machine advances once every `ticks_per_bit` calls.
    pub fn tick(&mut self) {
        self.tick_counter += 1;
        if self.tick_counter >= self.config.ticks_per_bit {
            self.tick_counter = 0;
            self.transmit_bit();
        }
    }

    fn transmit_bit(&mut self) {
        match self.transmitter.on_tick() {
            TxTick::Idle | TxTick::CrcGenerated => {}
            TxTick::Bit(bit) => self.write_tx(bit),
            TxTick::LastBit(bit) => {
                self.write_tx(bit);
                self.tx_good = self.tx_good.wrapping_add(1);
                info!("tx: frame sent");
            }
        }
    }

    /// Clock timer entry point. Returns `true` when the clock line toggled.
    pub fn clock_tick(&mut self) -> bool {
        self.clock.tick(&mut self.clk)
    }

    /// Clock-edge entry point: samples the data input and advances the
    /// receive machine.
    ///
    /// Returns the frame when this edge completed a valid one. The frame is
    /// also queued for [`receive()`](LinkDriver::receive).
    pub fn on_edge(&mut self) -> Option<ReceivedFrame> {
        let bit = self.rx.is_high().unwrap_or(false);
        match self.receiver.on_bit(bit) {
            RxEvent::Received(received) => {
                self.rx_good = self.rx_good.wrapping_add(1);
                if self.inbox.push_back(received).is_err() {
                    warn!("rx: inbox full, frame dropped");
                    self.rx_dropped = self.rx_dropped.wrapping_add(1);
                }
                Some(received)
            }
            RxEvent::CrcMismatch
            | RxEvent::LengthOverflow { .. }
            | RxEvent::MissingHeader { .. } => {
                self.rx_bad = self.rx_bad.wrapping_add(1);
                None
            }
            RxEvent::Pending
            | RxEvent::PreambleDetected
            | RxEvent::CrcReceived
            | RxEvent::DlcReceived => None,
        }
    }

    /// Arms a plain frame carrying the first `bits` bits of `data`.
    ///
    /// # Errors
    /// [`LinkError::Busy`], [`LinkError::PayloadTooLong`], or
    /// [`LinkError::ShortPayload`].
    pub fn send(&mut self, data: &[u8], bits: usize) -> Result<(), LinkError> {
        if self.is_transmitting() {
            return Err(LinkError::Busy);
        }
        let frame = Frame::new(data, bits)?;
        self.transmitter.arm(frame)
    }

    /// Arms an addressed frame from this node to `dst`.
    ///
    /// `bits` counts application data only.
    ///
    /// # Errors
    /// [`LinkError::Busy`], [`LinkError::PayloadTooLong`], or
    /// [`LinkError::ShortPayload`].
    pub fn send_to(&mut self, dst: u8, data: &[u8], bits: usize) -> Result<(), LinkError> {
        if self.is_transmitting() {
            return Err(LinkError::Busy);
        }
        let frame = Frame::addressed(dst, self.config.node_id, data, bits)?;
        self.transmitter.arm(frame)
    }

    /// Re-arms a received frame unchanged, addresses included.
    ///
    /// # Errors
    /// [`LinkError::Busy`] or [`LinkError::PayloadTooLong`].
    pub fn relay(&mut self, frame: &Frame) -> Result<(), LinkError> {
        debug!("tx: relaying frame from {:?}", frame.source());
        self.transmitter.arm(*frame)
    }

    /// Whether a transmit cycle is armed or in progress.
    pub fn is_transmitting(&self) -> bool {
        self.transmitter.is_active()
    }

    /// Returns `WouldBlock` until the current frame has gone out.
    ///
    /// Useful with `nb::block!` when interrupts drive [`tick()`](LinkDriver::tick).
    pub fn flush(&self) -> nb::Result<(), Infallible> {
        if self.is_transmitting() {
            Err(nb::Error::WouldBlock)
        } else {
            Ok(())
        }
    }

    /// Whether a validated frame is waiting.
    pub fn available(&self) -> bool {
        !self.inbox.is_empty()
    }

    /// Pops the oldest validated frame.
    pub fn receive(&mut self) -> Option<ReceivedFrame> {
        self.inbox.pop_front()
    }

    /// Abandons any partially received frame.
    pub fn reset_receiver(&mut self) {
        self.receiver.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::iter_bits;
    use crate::consts::MY_ID;
    use crate::crc::Polynomial;
    use crate::routing::Route;
    use crate::rx::RxState;
    use crate::tx::TxState;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };

    fn state(bit: bool) -> PinState {
        if bit { PinState::High } else { PinState::Low }
    }

    fn wire_bits(frame: &Frame) -> Vec<bool> {
        let crc = frame.compute_crc(Polynomial::CRC32);
        iter_bits(&[0x7e], 8)
            .chain(iter_bits(&crc, 32))
            .chain(iter_bits(&[frame.dlc().raw()], 8))
            .chain(iter_bits(frame.payload(), frame.payload_bits()))
            .collect()
    }

    fn rx_pin(bits: &[bool]) -> PinMock {
        let expectations: Vec<PinTransaction> =
            bits.iter().map(|&b| PinTransaction::get(state(b))).collect();
        PinMock::new(&expectations)
    }

    fn idle_pins() -> (PinMock, PinMock) {
        (
            PinMock::new(&[PinTransaction::set(PinState::Low)]),
            PinMock::new(&[PinTransaction::set(PinState::Low)]),
        )
    }

    #[test]
    fn test_driver_initialization() {
        let (tx, clk) = idle_pins();
        let rx = PinMock::new(&[]);
        let mut driver = LinkDriver::new(tx, rx, clk, LinkConfig::new());

        assert_eq!(driver.node_id(), MY_ID);
        assert!(!driver.is_transmitting());
        assert!(!driver.available());
        assert_eq!(driver.flush(), Ok(()));
        driver.tx.done();
        driver.rx.done();
        driver.clk.done();
    }

    #[test]
    fn test_send_arms_transmitter() {
        let (tx, clk) = idle_pins();
        let rx = PinMock::new(&[]);
        let mut driver = LinkDriver::new(tx, rx, clk, LinkConfig::new());

        assert_eq!(driver.send(b"test", 32), Ok(()));
        assert!(driver.is_transmitting());
        assert_eq!(driver.transmitter().state(), TxState::GeneratingCrc);
        assert_eq!(driver.flush(), Err(nb::Error::WouldBlock));
        assert_eq!(driver.send(b"test", 32), Err(LinkError::Busy));
        assert_eq!(driver.send_to(0x20, b"hi", 16), Err(LinkError::Busy));
        driver.tx.done();
        driver.rx.done();
        driver.clk.done();
    }

    #[test]
    fn test_send_rejects_oversized_payload() {
        let (tx, clk) = idle_pins();
        let rx = PinMock::new(&[]);
        let mut driver = LinkDriver::new(tx, rx, clk, LinkConfig::new());

        assert_eq!(
            driver.send(&[0; 5], 40),
            Err(LinkError::PayloadTooLong { bits: 40, max: 32 })
        );
        assert_eq!(
            driver.send_to(0x20, &[0; 3], 24),
            Err(LinkError::PayloadTooLong { bits: 24, max: 16 })
        );
        assert!(!driver.is_transmitting());
        driver.tx.done();
        driver.rx.done();
        driver.clk.done();
    }

    #[test]
    fn test_tick_emits_empty_frame() {
        // Preamble, then a zero CRC and a zero DLC
        let mut expected = vec![PinTransaction::set(PinState::Low)];
        expected.extend(iter_bits(&[0x7e], 8).map(|b| PinTransaction::set(state(b))));
        expected.extend((0..40).map(|_| PinTransaction::set(PinState::Low)));
        let tx = PinMock::new(&expected);
        let clk = PinMock::new(&[PinTransaction::set(PinState::Low)]);
        let rx = PinMock::new(&[]);

        let config = LinkConfig::new().with_ticks_per_bit(1);
        let mut driver = LinkDriver::new(tx, rx, clk, config);
        assert_eq!(driver.send(&[], 0), Ok(()));

        // One CRC tick, 48 bit ticks, then idle ticks that touch nothing
        for _ in 0..(1 + 48 + 5) {
            driver.tick();
        }

        assert_eq!(driver.tx_good, 1);
        assert!(!driver.is_transmitting());
        assert_eq!(driver.flush(), Ok(()));
        driver.tx.done();
        driver.rx.done();
        driver.clk.done();
    }

    #[test]
    fn test_tick_respects_bit_period_and_phase() {
        let tx = PinMock::new(&[
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);
        let clk = PinMock::new(&[PinTransaction::set(PinState::Low)]);
        let rx = PinMock::new(&[]);

        // Phase 2 of 4: the first step lands on the second tick
        let config = LinkConfig::new().with_ticks_per_bit(4);
        let mut driver = LinkDriver::new(tx, rx, clk, config);
        driver.send(&[0xff], 8).unwrap();

        driver.tick();
        assert_eq!(driver.transmitter().state(), TxState::GeneratingCrc);
        driver.tick();
        assert_eq!(driver.transmitter().state(), TxState::SendingPreamble);
        // Two more bit periods: preamble bits 0 and 1
        for _ in 0..8 {
            driver.tick();
        }
        assert_eq!(driver.transmitter().cursor(), 2);
        driver.tx.done();
        driver.rx.done();
        driver.clk.done();
    }

    #[test]
    fn test_clock_tick_toggles_line() {
        let tx = PinMock::new(&[PinTransaction::set(PinState::Low)]);
        let clk = PinMock::new(&[
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
        ]);
        let rx = PinMock::new(&[]);

        let config = LinkConfig::new().with_ticks_per_bit(2);
        let mut driver = LinkDriver::new(tx, rx, clk, config);
        let toggles: Vec<bool> = (0..4).map(|_| driver.clock_tick()).collect();
        assert_eq!(toggles, vec![false, true, false, true]);
        driver.tx.done();
        driver.rx.done();
        driver.clk.done();
    }

    #[test]
    fn test_phase_past_bit_period_wraps() {
        let tx = PinMock::new(&[
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::Low),
        ]);
        let clk = PinMock::new(&[PinTransaction::set(PinState::Low)]);
        let rx = PinMock::new(&[]);

        // 255 % 4 == 3: the first step lands on the first tick
        let config = LinkConfig::new().with_ticks_per_bit(4).with_tx_phase(255);
        let mut driver = LinkDriver::new(tx, rx, clk, config);
        driver.send(&[0x00], 8).unwrap();

        driver.tick();
        assert_eq!(driver.transmitter().state(), TxState::SendingPreamble);
        for _ in 0..4 {
            driver.tick();
        }
        assert_eq!(driver.transmitter().cursor(), 1);
        driver.tx.done();
        driver.rx.done();
        driver.clk.done();
    }

    #[test]
    fn test_zero_bit_period_does_not_panic() {
        let (tx, clk) = idle_pins();
        let rx = PinMock::new(&[]);
        let config = LinkConfig {
            ticks_per_bit: 0,
            tx_phase: 255,
            ..LinkConfig::new()
        };
        let mut driver = LinkDriver::new(tx, rx, clk, config);
        assert_eq!(driver.config().ticks_per_bit, 1);
        for _ in 0..300 {
            driver.tick();
        }
        assert!(!driver.is_transmitting());
        driver.tx.done();
        driver.rx.done();
        driver.clk.done();
    }

    #[test]
    fn test_on_edge_counts_missing_header() {
        let frame = Frame::from_raw(crate::frame::Dlc::new(0x48), [0x20, 0, 0, 0]);
        let bits = wire_bits(&frame);
        let (tx, clk) = idle_pins();
        let rx = rx_pin(&bits);

        let mut driver = LinkDriver::new(tx, rx, clk, LinkConfig::new());
        for _ in 0..bits.len() {
            assert_eq!(driver.on_edge(), None);
        }
        assert_eq!(driver.rx_bad, 1);
        assert!(!driver.available());
        driver.tx.done();
        driver.rx.done();
        driver.clk.done();
    }

    #[test]
    fn test_on_edge_receives_frame() {
        let frame = Frame::new(b"hi", 16).unwrap();
        let bits = wire_bits(&frame);
        let (tx, clk) = idle_pins();
        let rx = rx_pin(&bits);

        let mut driver = LinkDriver::new(tx, rx, clk, LinkConfig::new());
        let mut delivered = None;
        for _ in 0..bits.len() {
            if let Some(received) = driver.on_edge() {
                delivered = Some(received);
            }
        }

        let delivered = delivered.expect("frame not delivered");
        assert_eq!(delivered.frame, frame);
        assert_eq!(driver.rx_good, 1);
        assert!(driver.available());
        assert_eq!(driver.receive(), Some(delivered));
        assert_eq!(driver.receive(), None);
        driver.tx.done();
        driver.rx.done();
        driver.clk.done();
    }

    #[test]
    fn test_on_edge_counts_crc_failure() {
        let frame = Frame::new(b"hi", 16).unwrap();
        let mut bits = wire_bits(&frame);
        // Flip a CRC bit
        bits[12] = !bits[12];
        let (tx, clk) = idle_pins();
        let rx = rx_pin(&bits);

        let mut driver = LinkDriver::new(tx, rx, clk, LinkConfig::new());
        for _ in 0..bits.len() {
            assert_eq!(driver.on_edge(), None);
        }
        assert_eq!(driver.rx_bad, 1);
        assert_eq!(driver.rx_good, 0);
        assert!(!driver.available());
        assert_eq!(driver.receiver().state(), RxState::DetectingPreamble);
        driver.tx.done();
        driver.rx.done();
        driver.clk.done();
    }

    #[test]
    fn test_inbox_overflow_drops_newest() {
        let frame = Frame::addressed(MY_ID, 0x30, b"x", 8).unwrap();
        let one = wire_bits(&frame);
        let count = INBOX_LEN + 1;
        let bits: Vec<bool> = one.iter().copied().cycle().take(one.len() * count).collect();
        let (tx, clk) = idle_pins();
        let rx = rx_pin(&bits);

        let mut driver = LinkDriver::new(tx, rx, clk, LinkConfig::new());
        for _ in 0..bits.len() {
            let _ = driver.on_edge();
        }
        assert_eq!(driver.rx_good, count as u16);
        assert_eq!(driver.rx_dropped, 1);
        let first = driver.receive().unwrap();
        assert_eq!(first.route, Some(Route::Mine));
        driver.tx.done();
        driver.rx.done();
        driver.clk.done();
    }

    #[test]
    fn test_reset_receiver_abandons_frame() {
        let bits: Vec<bool> = iter_bits(&[0x7e, 0x00], 10).collect();
        let (tx, clk) = idle_pins();
        let rx = rx_pin(&bits);

        let mut driver = LinkDriver::new(tx, rx, clk, LinkConfig::new());
        for _ in 0..bits.len() {
            let _ = driver.on_edge();
        }
        assert_eq!(driver.receiver().state(), RxState::ReceivingCrc);
        driver.reset_receiver();
        assert_eq!(driver.receiver().state(), RxState::DetectingPreamble);
        driver.tx.done();
        driver.rx.done();
        driver.clk.done();
    }

    #[test]
    fn test_relay_rearms_frame_unchanged() {
        let (tx, clk) = idle_pins();
        let rx = PinMock::new(&[]);
        let mut driver = LinkDriver::new(tx, rx, clk, LinkConfig::new());

        let frame = Frame::addressed(0x20, 0x30, b"go", 16).unwrap();
        assert_eq!(driver.relay(&frame), Ok(()));
        assert_eq!(driver.transmitter().frame(), &frame);
        assert_eq!(driver.relay(&frame), Err(LinkError::Busy));
        driver.tx.done();
        driver.rx.done();
        driver.clk.done();
    }
}
