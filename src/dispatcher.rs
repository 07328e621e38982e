// Runs once per symbol timer period, from interrupt context.

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::digital::v2::OutputPin;

use crate::dac::DAC;
use crate::modulation::SharedSignal;
use crate::spi::{DacSpi, IdleLow, SampleFirstEdge};
use crate::timer::TimerInterrupt;

/// Owns everything the tick touches, so the interrupt only needs one lock to get at it.
pub struct SymbolDispatcher<CsPin, LdacPin, SPI, DELAY, TIMER>
where CsPin: OutputPin, LdacPin: OutputPin, SPI: DacSpi<IdleLow, SampleFirstEdge>, DELAY: DelayUs<u8>, TIMER: TimerInterrupt {
    dac: DAC<CsPin, LdacPin>,
    spi_bus: SPI,
    delay: DELAY,
    timer: TIMER,
}
impl<CsPin, LdacPin, SPI, DELAY, TIMER> SymbolDispatcher<CsPin, LdacPin, SPI, DELAY, TIMER>
where CsPin: OutputPin, LdacPin: OutputPin, SPI: DacSpi<IdleLow, SampleFirstEdge>, DELAY: DelayUs<u8>, TIMER: TimerInterrupt {
    pub fn new(dac: DAC<CsPin, LdacPin>, spi_bus: SPI, delay: DELAY, timer: TIMER) -> Self {
        SymbolDispatcher { dac, spi_bus, delay, timer }
    }
    /// Latch what was loaded last tick, then load the next pair.
    ///
    /// Output is delayed by one tick: the samples sent here only reach the pins on the next strobe.
    /// That keeps the latch instant at a fixed offset from the timer edge regardless of how long the
    /// SPI transfer takes.
    pub fn on_tick(&mut self, signal: &SharedSignal) {
        self.dac.strobe_latch(&mut self.delay);
        let samples = signal.next_samples();
        self.dac.send_pair(samples, &mut self.spi_bus);
        self.timer.clear_interrupt();
    }
    pub fn release(self) -> (DAC<CsPin, LdacPin>, SPI, DELAY, TIMER) {
        (self.dac, self.spi_bus, self.delay, self.timer)
    }
}
