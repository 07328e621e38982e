// Turns parsed commands into new signal states and publishes them.
// Out-of-range arguments are clamped with a warning, never rejected.

use core::num::NonZeroU32;

use ufmt::{uWrite, uwriteln};

use crate::command::{parse, Command, CommandError, FilterSetting, Fxd};
use crate::dac::{ChannelPair, DacChannel, DacSample, DAC_RESOLUTION};
use crate::dds;
use crate::modulation::{Modulation, ModulationMode, SharedSignal, SignalState};
use crate::serial::dbg_uwriteln;
use crate::tables::{full_scale_gain, ToneTable};
use crate::timer::{achieved_rate_hz, reload_for, TimerReload};

pub const DEFAULT_TONE_HZ: i32 = 10_000;
const HALF_VOLT: Fxd = Fxd::from_bits(1 << 31);

pub fn enforce_bounds<T: PartialOrd>(lower_bound: T, mut num: T, upper_bound: T) -> T {
    if num > upper_bound {
        num = upper_bound;
    } else if num < lower_bound {
        num = lower_bound;
    }
    num
}

/// DC volts to counts: `round((0.5 - V) * 4095)`. The output stage inverts, so +0.5 V is count 0.
pub fn dc_level(volts: Fxd) -> DacSample {
    let volts = enforce_bounds(-HALF_VOLT, volts, HALF_VOLT);
    let counts = ((HALF_VOLT - volts) * DAC_RESOLUTION as i64).round().to_num::<i32>();
    DacSample::saturating(counts)
}

/// Gain for a requested amplitude, where 0.5 V is the channel's full gain.
pub fn amplitude_gain(channel: DacChannel, amplitude: Fxd) -> u16 {
    let amplitude = enforce_bounds(Fxd::ZERO, amplitude, HALF_VOLT);
    (amplitude * (2 * full_scale_gain(channel) as i64)).round().to_num::<u16>()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToneSetting {
    pub frequency_hz: i32,
    pub gain: u16,
}

/// Runtime configuration. Kept across mode changes, so `sine q ...` after `sine i ...` keeps the
/// I tone, and `dc i ...` after `raw q ...` keeps the Q level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settings {
    pub cycle_clock_hz: u32,
    pub sample_rate_hz: NonZeroU32,
    pub levels: ChannelPair<DacSample>,
    pub tones: ChannelPair<ToneSetting>,
    pub filter: FilterSetting,
}
impl Settings {
    pub fn new(cycle_clock_hz: u32, sample_rate_hz: NonZeroU32) -> Self {
        Settings {
            cycle_clock_hz,
            sample_rate_hz,
            levels: ChannelPair::new(DacSample::ZERO, DacSample::ZERO),
            tones: ChannelPair::new(DacChannel::I, DacChannel::Q)
                .map(|_, channel| ToneSetting { frequency_hz: DEFAULT_TONE_HZ, gain: full_scale_gain(channel) }),
            filter: FilterSetting::Off,
        }
    }
    fn nyquist_hz(&self) -> i32 {
        (self.sample_rate_hz.get() / 2) as i32
    }
    /// Tone tables and DDS steps for the current tones at the current sample rate.
    pub fn tone_state(&self) -> SignalState {
        let tables = self.tones.map(|channel, tone| ToneTable::build(channel, tone.gain));
        let increments = self.tones.map(|_, tone| dds::index_increment(tone.frequency_hz, self.sample_rate_hz));
        SignalState::new(Modulation::Sine(tables), increments)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Rejected(CommandError),
    /// Blank line.
    Ignored,
    /// Caller should reset the system.
    Reboot,
}

pub const HELP_TEXT: &str = "\
Commands:
  dc       i|q DC
  sine     i|q FREQ [AMPL]
  tone     FREQ [AMPL]
  mod      bpsk|qpsk|8psk|16qam
  filter   rrc|off
  raw      i|q RAW
  sr       SAMPLERATE
  reboot
  help

  where FREQ = [-Fs/2, Fs/2] Hz
        AMPL = [0, 0.5] V
        DC   = [-0.5, 0.5] V
        RAW  = [0, 4095] LSb";

pub struct Controller<'a, T: TimerReload> {
    signal: &'a SharedSignal,
    timer: T,
    settings: Settings,
    startup_rate_clamped: bool,
}
impl<'a, T: TimerReload> Controller<'a, T> {
    /// Programs the symbol period and publishes the idle state. A rate the timer can't reach is
    /// replaced by the one it achieves, see `startup_rate_clamped`.
    pub fn new(signal: &'a SharedSignal, mut timer: T, cycle_clock_hz: u32, sample_rate_hz: NonZeroU32) -> Self {
        let reload = reload_for(cycle_clock_hz, sample_rate_hz, T::MAX_RELOAD);
        timer.set_reload(reload.count);
        let mut settings = Settings::new(cycle_clock_hz, sample_rate_hz);
        if reload.clamped {
            settings.sample_rate_hz = achieved_sample_rate(cycle_clock_hz, reload.count, sample_rate_hz);
        }
        signal.publish(SignalState::idle());
        Controller { signal, timer, settings, startup_rate_clamped: reload.clamped }
    }
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
    pub fn startup_rate_clamped(&self) -> bool {
        self.startup_rate_clamped
    }
    pub fn return_timer(self) -> T {
        self.timer
    }

    pub fn handle_line<W: uWrite + ?Sized>(&mut self, line: &str, out: &mut W) -> Outcome {
        match parse(line) {
            Ok(command) => self.execute(command, out),
            Err(CommandError::Empty) => Outcome::Ignored,
            Err(err) => {
                uwriteln!(out, "[!] {}. Try help.", err).ok();
                Outcome::Rejected(err)
            }
        }
    }

    pub fn execute<W: uWrite + ?Sized>(&mut self, command: Command, out: &mut W) -> Outcome {
        match command {
            Command::Raw { channel, value } => {
                let level = enforce_bounds(0, value, DAC_RESOLUTION as i32);
                if level != value {
                    uwriteln!(out, "[!] Raw value clamped to {}", level).ok();
                }
                *self.settings.levels.get_mut(channel) = DacSample::saturating(level);
                self.publish(SignalState::new(Modulation::Raw(self.settings.levels), ChannelPair::new(1, 1)), out);
            }
            Command::Dc { channel, volts } => {
                if volts < -HALF_VOLT || volts > HALF_VOLT {
                    uwriteln!(out, "[!] DC level clamped to [-0.5, 0.5] V").ok();
                }
                *self.settings.levels.get_mut(channel) = dc_level(volts);
                self.publish(SignalState::new(Modulation::Dc(self.settings.levels), ChannelPair::new(1, 1)), out);
            }
            Command::Sine { channel, frequency_hz, amplitude } => {
                self.set_tone(channel, frequency_hz, amplitude, out);
                self.publish(self.settings.tone_state(), out);
            }
            Command::Tone { frequency_hz, amplitude } => {
                self.set_tone(DacChannel::I, frequency_hz, amplitude, out);
                self.set_tone(DacChannel::Q, frequency_hz, amplitude, out);
                self.publish(self.settings.tone_state(), out);
            }
            Command::Modulate(scheme) => {
                self.publish(SignalState::keyed(scheme.constellation()), out);
            }
            Command::SampleRate(rate) => self.set_sample_rate(rate, out),
            Command::Filter(filter) => {
                self.settings.filter = filter;
                dbg_uwriteln!(out, "filter {} (not applied)", filter);
            }
            Command::Reboot => return Outcome::Reboot,
            Command::Help => {
                uwriteln!(out, "{}", HELP_TEXT).ok();
            }
        }
        Outcome::Applied
    }

    fn set_tone<W: uWrite + ?Sized>(&mut self, channel: DacChannel, frequency_hz: i32, amplitude: Option<Fxd>, out: &mut W) {
        let nyquist = self.settings.nyquist_hz();
        let frequency = enforce_bounds(-nyquist, frequency_hz, nyquist);
        if frequency != frequency_hz {
            uwriteln!(out, "[!] Frequency clamped to {}Hz", frequency).ok();
        }
        let gain = match amplitude {
            Some(amplitude) => {
                if amplitude < Fxd::ZERO || amplitude > HALF_VOLT {
                    uwriteln!(out, "[!] Amplitude clamped to [0, 0.5] V").ok();
                }
                amplitude_gain(channel, amplitude)
            }
            None => full_scale_gain(channel),
        };
        *self.settings.tones.get_mut(channel) = ToneSetting { frequency_hz: frequency, gain };
    }

    fn set_sample_rate<W: uWrite + ?Sized>(&mut self, rate: NonZeroU32, out: &mut W) {
        let reload = reload_for(self.settings.cycle_clock_hz, rate, T::MAX_RELOAD);
        self.settings.sample_rate_hz = if reload.clamped {
            let achieved = achieved_sample_rate(self.settings.cycle_clock_hz, reload.count, rate);
            uwriteln!(out, "[!] Sample rate clamped to {}Hz", achieved.get()).ok();
            achieved
        } else {
            rate
        };
        self.timer.set_reload(reload.count);
        dbg_uwriteln!(out, "reload {} fs {}Hz", reload.count, self.settings.sample_rate_hz.get());
        // Tone steps depend on Fs. Other modes don't, and keep their phase.
        if self.signal.snapshot().mode() == ModulationMode::Sine {
            self.publish(self.settings.tone_state(), out);
        }
    }

    fn publish<W: uWrite + ?Sized>(&self, state: SignalState, out: &mut W) {
        self.signal.publish(state);
        dbg_uwriteln!(out, "mode {} fs {}Hz filter {}", state.mode(), self.settings.sample_rate_hz.get(), self.settings.filter);
    }
}

fn achieved_sample_rate(cycle_clock_hz: u32, reload: u32, fallback: NonZeroU32) -> NonZeroU32 {
    NonZeroU32::new(achieved_rate_hz(cycle_clock_hz, reload)).unwrap_or(fallback)
}
