// Host-side doubles for the hardware traits. Every double records into a shared EventLog so tests
// can assert on the interleaving of pin, bus, delay and timer activity.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::blocking::spi;
use embedded_hal::digital::v2::OutputPin;
use embedded_hal::serial;

use crate::spi::{DacSpi, IdleLow, SampleFirstEdge};
use crate::timer::{TimerInterrupt, TimerReload};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Low(&'static str),
    High(&'static str),
    Bytes(Vec<u8>),
    DelayUs(u8),
    Reload(u32),
    InterruptCleared,
}

#[derive(Clone, Default)]
pub struct EventLog(Rc<RefCell<Vec<Event>>>);
impl EventLog {
    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }
    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }
    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

pub struct MockPin {
    name: &'static str,
    log: EventLog,
}
impl MockPin {
    pub fn new(name: &'static str, log: &EventLog) -> Self {
        MockPin { name, log: log.clone() }
    }
}
impl OutputPin for MockPin {
    type Error = Infallible;
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.log.push(Event::Low(self.name));
        Ok(())
    }
    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.log.push(Event::High(self.name));
        Ok(())
    }
}

/// Stands in for a configured DAC bus: frames each send with the chip select like the real one.
pub struct MockSpi {
    log: EventLog,
}
impl MockSpi {
    pub fn new(log: &EventLog) -> Self {
        MockSpi { log: log.clone() }
    }
}
impl DacSpi<IdleLow, SampleFirstEdge> for MockSpi {
    fn send(&mut self, data: &[u8], cs_pin: &mut impl OutputPin) {
        cs_pin.set_low().ok();
        self.log.push(Event::Bytes(data.to_vec()));
        cs_pin.set_high().ok();
    }
}

/// A bare blocking SPI peripheral, for exercising `DacSpiBus`.
pub struct RawSpi {
    log: EventLog,
}
impl RawSpi {
    pub fn new(log: &EventLog) -> Self {
        RawSpi { log: log.clone() }
    }
}
impl spi::Write<u8> for RawSpi {
    type Error = Infallible;
    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        self.log.push(Event::Bytes(words.to_vec()));
        Ok(())
    }
}

pub struct MockDelay {
    log: EventLog,
}
impl MockDelay {
    pub fn new(log: &EventLog) -> Self {
        MockDelay { log: log.clone() }
    }
}
impl DelayUs<u8> for MockDelay {
    fn delay_us(&mut self, us: u8) {
        self.log.push(Event::DelayUs(us));
    }
}

/// 16-bit symbol timer.
pub struct MockTimer {
    log: EventLog,
}
impl MockTimer {
    pub fn new(log: &EventLog) -> Self {
        MockTimer { log: log.clone() }
    }
}
impl TimerReload for MockTimer {
    const MAX_RELOAD: u32 = 0xFFFF;
    fn set_reload(&mut self, count: u32) {
        self.log.push(Event::Reload(count));
    }
}
impl TimerInterrupt for MockTimer {
    fn clear_interrupt(&mut self) {
        self.log.push(Event::InterruptCleared);
    }
}

/// Loopback-free UART: bytes written are kept, bytes queued are handed to `read`.
#[derive(Default)]
pub struct MockSerial {
    sent: Vec<u8>,
    incoming: VecDeque<u8>,
    busy: usize,
}
impl MockSerial {
    pub fn sent(&self) -> Vec<u8> {
        self.sent.clone()
    }
    pub fn queue(&mut self, bytes: &[u8]) {
        self.incoming.extend(bytes.iter().copied());
    }
    /// The next `polls` writes report `WouldBlock`.
    pub fn busy_for(&mut self, polls: usize) {
        self.busy = polls;
    }
}
impl serial::Write<u8> for MockSerial {
    type Error = Infallible;
    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        if self.busy > 0 {
            self.busy -= 1;
            return Err(nb::Error::WouldBlock);
        }
        self.sent.push(word);
        Ok(())
    }
    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        Ok(())
    }
}
impl serial::Read<u8> for MockSerial {
    type Error = Infallible;
    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        self.incoming.pop_front().ok_or(nb::Error::WouldBlock)
    }
}
