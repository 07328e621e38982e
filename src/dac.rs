// This file interacts with a dual 12-bit SPI DAC (MCP4922 command format) carrying the I and Q outputs.
// Board-specific values (pins, clocks) can be found in the board file.

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::digital::v2::OutputPin;

use crate::spi::{DacSpi, IdleLow, SampleFirstEdge};

pub const DAC_RESOLUTION: u16 = 4095;
/// How long LDAC is held low to transfer the input registers to the outputs.
pub const LATCH_HOLD_US: u8 = 1;

// Upper nibble of each command word: [A/B, BUF, GA, SHDN].
// GA=1 selects 1x gain, SHDN=1 keeps the output powered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DacChannel {
    I = 0x3000, // 0b0011 << 12, channel A
    Q = 0xB000, // 0b1011 << 12, channel B
}
impl DacChannel {
    pub const fn header(self) -> u16 {
        self as u16
    }
}

/// A value the converter can represent. Only constructible in range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct DacSample(u16);
impl DacSample {
    pub const ZERO: DacSample = DacSample(0);
    pub const MAX: DacSample = DacSample(DAC_RESOLUTION);

    pub const fn new(value: u16) -> Option<DacSample> {
        if value <= DAC_RESOLUTION { Some(DacSample(value)) } else { None }
    }
    /// Pins out-of-range values to the nearest end of the scale.
    pub const fn saturating(value: i32) -> DacSample {
        if value < 0 {
            DacSample(0)
        } else if value > DAC_RESOLUTION as i32 {
            DacSample(DAC_RESOLUTION)
        } else {
            DacSample(value as u16)
        }
    }
    pub const fn value(self) -> u16 {
        self.0
    }
}

/// One value per DAC output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChannelPair<T> {
    pub i: T,
    pub q: T,
}
impl<T> ChannelPair<T> {
    pub const fn new(i: T, q: T) -> Self {
        ChannelPair { i, q }
    }
    pub fn get(&self, channel: DacChannel) -> &T {
        match channel {
            DacChannel::I => &self.i,
            DacChannel::Q => &self.q,
        }
    }
    pub fn get_mut(&mut self, channel: DacChannel) -> &mut T {
        match channel {
            DacChannel::I => &mut self.i,
            DacChannel::Q => &mut self.q,
        }
    }
    pub fn map<U>(self, mut f: impl FnMut(DacChannel, T) -> U) -> ChannelPair<U> {
        ChannelPair { i: f(DacChannel::I, self.i), q: f(DacChannel::Q, self.q) }
    }
}

/// Builds the 16-bit transport word for one channel.
pub const fn encode_word(channel: DacChannel, sample: DacSample) -> u16 {
    channel.header() | sample.value()
}

pub struct DAC<CsPin: OutputPin, LdacPin: OutputPin> {
    pub cs_pin: CsPin,
    ldac_pin: LdacPin,
}
impl<CsPin: OutputPin, LdacPin: OutputPin> DAC<CsPin, LdacPin> {
    // in lieu of stateful output pins, constructor sets both (active low) pins high
    pub fn new(mut cs_pin: CsPin, mut ldac_pin: LdacPin) -> DAC<CsPin, LdacPin> {
        cs_pin.set_high().ok();
        ldac_pin.set_high().ok();
        DAC { cs_pin, ldac_pin }
    }
    /// Pulse LDAC so the words shifted in last tick appear on both outputs at once.
    pub fn strobe_latch(&mut self, delay: &mut impl DelayUs<u8>) {
        self.ldac_pin.set_low().ok();
        delay.delay_us(LATCH_HOLD_US);
        self.ldac_pin.set_high().ok();
    }
    pub fn send_sample(&mut self, channel: DacChannel, sample: DacSample,
                       spi_bus: &mut impl DacSpi<IdleLow, SampleFirstEdge>) {
        let word = encode_word(channel, sample);
        spi_bus.send(&word.to_be_bytes(), &mut self.cs_pin);
    }
    /// Q goes first; the converter expects channel B before channel A in each burst.
    pub fn send_pair(&mut self, samples: ChannelPair<DacSample>,
                     spi_bus: &mut impl DacSpi<IdleLow, SampleFirstEdge>) {
        self.send_sample(DacChannel::Q, samples.q, spi_bus);
        self.send_sample(DacChannel::I, samples.i, spi_bus);
    }
    pub fn return_pins(self) -> (CsPin, LdacPin) {
        (self.cs_pin, self.ldac_pin)
    }
}
