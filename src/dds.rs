//! Direct digital synthesis frequency engine.
//!
//! A 32-bit phase step is computed for the requested tone, then only its top
//! `TABLE_BITS` bits are kept as the per-tick step through the tone table. The
//! discarded low bits put a floor on frequency resolution of `Fs / 4096`; this
//! truncation is part of the design and must be kept.

use core::num::NonZeroU32;

use crate::tables::TONE_TABLE_LEN;

/// log2 of the tone table length.
pub const TABLE_BITS: u32 = 12;
/// Shift that turns a 32-bit phase word into a table step.
pub const PHASE_SHIFT: u32 = 32 - TABLE_BITS;

const _: () = assert!(1 << TABLE_BITS == TONE_TABLE_LEN as u32);

/// `floor(f * 2^32 / Fs)` wrapped into 32 bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrequencyTuningWord(u32);

impl FrequencyTuningWord {
    /// Negative frequencies wrap through two's complement, so `-Fs/2` and `+Fs/2` land on the same word.
    pub fn new(frequency_hz: i32, sample_rate_hz: NonZeroU32) -> Self {
        let scaled = (frequency_hz as i64) << 32;
        let phase = scaled.div_euclid(sample_rate_hz.get() as i64);
        FrequencyTuningWord(phase as u32)
    }
    pub const fn phase(self) -> u32 {
        self.0
    }
    /// Table steps per tick, in `0..TONE_TABLE_LEN`. Zero gives a stationary output.
    pub const fn index_increment(self) -> u16 {
        (self.0 >> PHASE_SHIFT) as u16
    }
}

/// Shortcut for the step the tone tables use.
pub fn index_increment(frequency_hz: i32, sample_rate_hz: NonZeroU32) -> u16 {
    FrequencyTuningWord::new(frequency_hz, sample_rate_hz).index_increment()
}
