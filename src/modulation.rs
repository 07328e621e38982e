//! Modulation state machine and the state shared with the symbol timer interrupt.
//!
//! The command loop never edits the live state field by field. It builds a whole new
//! [`SignalState`] and hands it over with [`SharedSignal::publish`]; the tick handler samples and
//! advances the indices in [`SharedSignal::next_samples`]. Both happen inside a critical section,
//! so a tick sees either the old configuration or the new one, never a mix.

use core::cell::Cell;

use critical_section::Mutex;

use crate::dac::{ChannelPair, DacChannel, DacSample};
use crate::tables::{Constellation, ToneTable, TONE_TABLE_LEN};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModulationMode {
    Raw,
    Dc,
    Sine,
    Bpsk,
    Qpsk,
    Psk8,
    Qam16,
}
impl ModulationMode {
    pub const fn name(self) -> &'static str {
        match self {
            ModulationMode::Raw => "raw",
            ModulationMode::Dc => "dc",
            ModulationMode::Sine => "sine",
            ModulationMode::Bpsk => "bpsk",
            ModulationMode::Qpsk => "qpsk",
            ModulationMode::Psk8 => "8psk",
            ModulationMode::Qam16 => "16qam",
        }
    }
}
impl ufmt::uDisplay for ModulationMode {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where W: ufmt::uWrite + ?Sized {
        f.write_str(self.name())
    }
}

/// What the converter is fed. Each variant carries everything needed to produce a sample,
/// including the table length the indices wrap at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Modulation {
    /// Fixed counts written with `raw`.
    Raw(ChannelPair<DacSample>),
    /// Fixed counts derived from `dc` voltages.
    Dc(ChannelPair<DacSample>),
    Sine(ChannelPair<ToneTable>),
    Keyed(&'static Constellation),
}
impl Modulation {
    pub fn mode(&self) -> ModulationMode {
        match self {
            Modulation::Raw(_) => ModulationMode::Raw,
            Modulation::Dc(_) => ModulationMode::Dc,
            Modulation::Sine(_) => ModulationMode::Sine,
            Modulation::Keyed(constellation) => constellation.mode(),
        }
    }
    pub fn table_len(&self) -> u16 {
        match self {
            Modulation::Raw(_) | Modulation::Dc(_) => 1,
            Modulation::Sine(_) => TONE_TABLE_LEN as u16,
            Modulation::Keyed(constellation) => constellation.symbols(),
        }
    }
    pub fn sample(&self, channel: DacChannel, index: u16) -> DacSample {
        match self {
            Modulation::Raw(levels) | Modulation::Dc(levels) => *levels.get(channel),
            Modulation::Sine(tables) => tables.get(channel).sample(index),
            Modulation::Keyed(constellation) => constellation.sample(channel, index),
        }
    }
}

/// Where one channel is in its table and how far it moves per tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelState {
    index: u16,
    increment: u16,
}
impl ChannelState {
    pub const fn new(increment: u16) -> Self {
        ChannelState { index: 0, increment }
    }
    pub const fn index(&self) -> u16 {
        self.index
    }
    pub const fn increment(&self) -> u16 {
        self.increment
    }
    /// `index = (index + increment) mod table_len`. Every table length is a power of two, so
    /// this is a mask and not a division.
    pub fn advance(&mut self, table_len: u16) {
        debug_assert!(table_len.is_power_of_two());
        self.index = self.index.wrapping_add(self.increment) & (table_len - 1);
    }
}

/// Everything the tick handler needs. Small and `Copy` so it can be swapped in one go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignalState {
    modulation: Modulation,
    channels: ChannelPair<ChannelState>,
}
impl SignalState {
    /// Power-on state: header-only words, zero magnitude on both channels.
    pub const fn idle() -> Self {
        SignalState::new(Modulation::Raw(ChannelPair::new(DacSample::ZERO, DacSample::ZERO)), ChannelPair::new(1, 1))
    }
    /// Both indices start at zero.
    pub const fn new(modulation: Modulation, increments: ChannelPair<u16>) -> Self {
        SignalState {
            modulation,
            channels: ChannelPair::new(ChannelState::new(increments.i), ChannelState::new(increments.q)),
        }
    }
    /// Keyed modes move one symbol per tick.
    pub const fn keyed(constellation: &'static Constellation) -> Self {
        SignalState::new(Modulation::Keyed(constellation), ChannelPair::new(1, 1))
    }
    pub fn mode(&self) -> ModulationMode {
        self.modulation.mode()
    }
    pub fn modulation(&self) -> &Modulation {
        &self.modulation
    }
    pub fn channels(&self) -> ChannelPair<ChannelState> {
        self.channels
    }
    /// Sample at the current indices without moving.
    pub fn current_samples(&self) -> ChannelPair<DacSample> {
        ChannelPair::new(
            self.modulation.sample(DacChannel::I, self.channels.i.index),
            self.modulation.sample(DacChannel::Q, self.channels.q.index),
        )
    }
    /// Sample, then step both channels.
    pub fn take_samples(&mut self) -> ChannelPair<DacSample> {
        let samples = self.current_samples();
        let table_len = self.modulation.table_len();
        self.channels.i.advance(table_len);
        self.channels.q.advance(table_len);
        samples
    }
}

/// The single point of contact between the command loop and the tick interrupt.
pub struct SharedSignal {
    state: Mutex<Cell<SignalState>>,
}
impl SharedSignal {
    pub const fn new(initial: SignalState) -> Self {
        SharedSignal { state: Mutex::new(Cell::new(initial)) }
    }
    /// Replace the live configuration. The new state must be fully built before this is called.
    pub fn publish(&self, state: SignalState) {
        critical_section::with(|cs| self.state.borrow(cs).set(state));
    }
    /// Called once per tick. Sampling and stepping happen under the same lock.
    pub fn next_samples(&self) -> ChannelPair<DacSample> {
        critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let mut state = cell.get();
            let samples = state.take_samples();
            cell.set(state);
            samples
        })
    }
    pub fn snapshot(&self) -> SignalState {
        critical_section::with(|cs| self.state.borrow(cs).get())
    }
}
