use core::marker::PhantomData;

// An abstraction layer (adds typestating) built on top of an embedded-hal implementation.
use embedded_hal::blocking::spi::Write;
use embedded_hal::digital::v2::OutputPin;

// Trait because the bus may be a peripheral or a test double.
pub trait DacSpi<Polarity: SckPolarity, Phase: SckPhase> {
    /// Send a series of packets, framed by the chip select.
    fn send(&mut self, data: &[u8], cs_pin: &mut impl OutputPin);
}

// Some peripherals expect the bus left high or low when idle, and some read rising edges while others read falling edges.
// Encode this in types so peripherals can enforce a correct configuration
pub trait SckPolarity {}
pub struct IdleHigh; impl SckPolarity for IdleHigh {}
pub struct IdleLow; impl SckPolarity for IdleLow {}

pub trait SckPhase {}
pub struct SampleFirstEdge; impl SckPhase for SampleFirstEdge {}
pub struct SampleSecondEdge; impl SckPhase for SampleSecondEdge {}

/// Wraps a configured blocking SPI bus. The type parameters record how the bus was configured,
/// which the caller vouches for when calling `new`.
pub struct DacSpiBus<SPI, Polarity: SckPolarity, Phase: SckPhase> {
    bus: SPI,
    _polarity: PhantomData<Polarity>,
    _phase: PhantomData<Phase>,
}
impl<SPI: Write<u8>, Polarity: SckPolarity, Phase: SckPhase> DacSpiBus<SPI, Polarity, Phase> {
    pub fn new(bus: SPI) -> Self {
        DacSpiBus { bus, _polarity: PhantomData, _phase: PhantomData }
    }
}
impl<SPI: Write<u8>, Polarity: SckPolarity, Phase: SckPhase> DacSpi<Polarity, Phase> for DacSpiBus<SPI, Polarity, Phase> {
    fn send(&mut self, data: &[u8], cs_pin: &mut impl OutputPin) {
        cs_pin.set_low().ok();
        self.bus.write(data).ok(); // the DAC can't NAK, nothing useful to do with an error here
        cs_pin.set_high().ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Event, EventLog, MockPin, RawSpi};

    #[test]
    fn bus_frames_each_send_with_chip_select() {
        let log = EventLog::default();
        let mut cs = MockPin::new("cs", &log);
        let mut bus: DacSpiBus<_, IdleLow, SampleFirstEdge> = DacSpiBus::new(RawSpi::new(&log));

        bus.send(&[0x30, 0x00], &mut cs);
        bus.send(&[0xBF, 0xFF], &mut cs);

        assert_eq!(log.events(), vec![
            Event::Low("cs"), Event::Bytes(vec![0x30, 0x00]), Event::High("cs"),
            Event::Low("cs"), Event::Bytes(vec![0xBF, 0xFF]), Event::High("cs"),
        ]);
    }
}
