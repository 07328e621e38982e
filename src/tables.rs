// Waveform and constellation lookup tables.
//
// Tone tables are not stored per channel: with 4k of SRAM there is no room for two 4096-entry
// buffers, so each channel keeps a small ToneTable (gain, offset, quadrature) that reads the
// unit sine table generated into FRAM by build.rs.

use crate::dac::{DacChannel, DacSample};
use crate::modulation::ModulationMode;

include!(concat!(env!("OUT_DIR"), "/sine_table.rs")); // Imports SINE_TABLE

pub const TONE_TABLE_LEN: usize = 4096;
/// SINE_TABLE holds sin() scaled by 1 << UNIT_AMPLITUDE_BITS.
pub const UNIT_AMPLITUDE_BITS: u32 = 30;
const QUARTER_PERIOD: u16 = (TONE_TABLE_LEN / 4) as u16;
const INDEX_MASK: u16 = (TONE_TABLE_LEN - 1) as u16;

/// Output stage calibration, in DAC counts.
pub mod output_stage {
    pub const MIDSCALE: u16 = 2135;
    pub const I_GAIN: u16 = (4095 - 190) / 2;
    pub const Q_GAIN: u16 = (4095 - 175) / 2;
}
use output_stage::*;

pub const fn full_scale_gain(channel: DacChannel) -> u16 {
    match channel {
        DacChannel::I => I_GAIN,
        DacChannel::Q => Q_GAIN,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quadrature {
    Sine,
    Cosine,
}

/// One channel's tone: `round(gain * sin_or_cos(2*pi*i/4096) + offset)` for each index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToneTable {
    gain: u16,
    offset: u16,
    quadrature: Quadrature,
}
impl ToneTable {
    /// I is the sine half of the quadrature pair, Q the cosine half.
    pub const fn build(channel: DacChannel, gain: u16) -> ToneTable {
        let quadrature = match channel {
            DacChannel::I => Quadrature::Sine,
            DacChannel::Q => Quadrature::Cosine,
        };
        ToneTable { gain, offset: MIDSCALE, quadrature }
    }
    pub const fn full_scale(channel: DacChannel) -> ToneTable {
        ToneTable::build(channel, full_scale_gain(channel))
    }
    pub fn sample(&self, index: u16) -> DacSample {
        let index = match self.quadrature {
            Quadrature::Sine => index,
            Quadrature::Cosine => index.wrapping_add(QUARTER_PERIOD),
        } & INDEX_MASK;
        let unit = SINE_TABLE[index as usize] as i64;
        let rounding = 1 << (UNIT_AMPLITUDE_BITS - 1);
        let scaled = (self.gain as i64 * unit + rounding) >> UNIT_AMPLITUDE_BITS;
        DacSample::saturating(self.offset as i32 + scaled as i32)
    }
    /// Every sample of the table, in index order.
    pub fn samples(&self) -> impl Iterator<Item = DacSample> + '_ {
        (0..TONE_TABLE_LEN as u16).map(move |i| self.sample(i))
    }
}

/// Picks a constellation entry out of part of the shared symbol index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitSlice {
    pub mask: u16,
    pub shift: u8,
}
impl BitSlice {
    pub const fn select(&self, index: u16) -> usize {
        ((index & self.mask) >> self.shift) as usize
    }
}

/// A keyed modulation: how many symbols the counter cycles through, which bits of the counter
/// choose I and Q, and the points those bits select.
///
/// I and Q are slices of the same counter, not independent bit streams. For QPSK that means the
/// I bit toggles every symbol while the Q bit toggles every other symbol.
#[derive(Debug, PartialEq, Eq)]
pub struct Constellation {
    mode: ModulationMode,
    symbols: u16,
    i_slice: BitSlice,
    q_slice: BitSlice,
    i_points: &'static [i16],
    q_points: &'static [i16],
}
impl Constellation {
    /// `symbols` must be a power of two, the tick handler wraps the counter with a mask.
    /// Checked at compile time for the tables below.
    pub const fn new(
        mode: ModulationMode,
        symbols: u16,
        i_slice: BitSlice,
        q_slice: BitSlice,
        i_points: &'static [i16],
        q_points: &'static [i16],
    ) -> Self {
        assert!(symbols.is_power_of_two(), "symbol count must be a power of two");
        Constellation { mode, symbols, i_slice, q_slice, i_points, q_points }
    }
    pub const fn mode(&self) -> ModulationMode {
        self.mode
    }
    pub const fn symbols(&self) -> u16 {
        self.symbols
    }
    /// Points are relative to midscale and the output stage inverts, hence `MIDSCALE - point`.
    pub fn sample(&self, channel: DacChannel, index: u16) -> DacSample {
        let point = match channel {
            DacChannel::I => self.i_points[self.i_slice.select(index)],
            DacChannel::Q => self.q_points[self.q_slice.select(index)],
        };
        DacSample::saturating(MIDSCALE as i32 - point as i32)
    }
}

const IG: i16 = I_GAIN as i16;
const QG: i16 = Q_GAIN as i16;
// Scaled coefficients, truncated toward zero.
const I_071: i16 = ((I_GAIN as u32 * 71) / 100) as i16;
const Q_071: i16 = ((Q_GAIN as u32 * 71) / 100) as i16;
const I_033: i16 = ((I_GAIN as u32 * 33) / 100) as i16;
const Q_033: i16 = ((Q_GAIN as u32 * 33) / 100) as i16;

pub static BPSK: Constellation = Constellation::new(
    ModulationMode::Bpsk,
    2,
    BitSlice { mask: 0b1, shift: 0 },
    BitSlice { mask: 0b1, shift: 0 },
    &[IG, -IG],
    &[0, 0],
);

pub static QPSK: Constellation = Constellation::new(
    ModulationMode::Qpsk,
    4,
    BitSlice { mask: 0b01, shift: 0 },
    BitSlice { mask: 0b10, shift: 1 },
    &[IG, -IG],
    &[QG, -QG],
);

// Gray ordered: 0, 45, 135, 90, 315, 270, 180, 225 degrees
pub static PSK8: Constellation = Constellation::new(
    ModulationMode::Psk8,
    8,
    BitSlice { mask: 0b111, shift: 0 },
    BitSlice { mask: 0b111, shift: 0 },
    &[IG, I_071, -I_071, 0, I_071, 0, -IG, -I_071],
    &[0, Q_071, Q_071, QG, -Q_071, -QG, 0, -Q_071],
);

pub static QAM16: Constellation = Constellation::new(
    ModulationMode::Qam16,
    16,
    BitSlice { mask: 0b0011, shift: 0 },
    BitSlice { mask: 0b1100, shift: 2 },
    &[-IG, -I_033, IG, I_033],
    &[-QG, -Q_033, QG, Q_033],
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn reference(gain: u16, angle: f64) -> i32 {
        (gain as f64 * angle + MIDSCALE as f64).round() as i32
    }

    #[test]
    fn output_stage_constants() {
        assert_eq!(I_GAIN, 1952);
        assert_eq!(Q_GAIN, 1960);
        assert_eq!((I_071, Q_071, I_033, Q_033), (1385, 1391, 644, 646));
    }

    #[test]
    fn tone_tables_track_exact_sine_and_cosine() {
        for (i_gain, q_gain) in [(I_GAIN, Q_GAIN), (976, 980), (1000, 1), (1951, 1959)] {
            let i_table = ToneTable::build(DacChannel::I, i_gain);
            let q_table = ToneTable::build(DacChannel::Q, q_gain);
            for (n, (i, q)) in i_table.samples().zip(q_table.samples()).enumerate() {
                let theta = 2.0 * PI * n as f64 / TONE_TABLE_LEN as f64;
                let want_i = reference(i_gain, theta.sin());
                let want_q = reference(q_gain, theta.cos());
                assert_eq!(i.value() as i32, want_i, "I[{}] gain {}", n, i_gain);
                assert_eq!(q.value() as i32, want_q, "Q[{}] gain {}", n, q_gain);
            }
        }
    }

    #[test]
    fn tone_samples_near_half_counts_round_once() {
        let i_table = ToneTable::full_scale(DacChannel::I);
        assert_eq!(i_table.sample(55).value(), 2299);
        assert_eq!(i_table.sample(93).value(), 2413);
    }

    #[test]
    fn tone_table_landmarks() {
        let i_table = ToneTable::full_scale(DacChannel::I);
        let q_table = ToneTable::full_scale(DacChannel::Q);
        assert_eq!(i_table.sample(0).value(), 2135);
        assert_eq!(i_table.sample(1024).value(), 2135 + 1952);
        assert_eq!(i_table.sample(3072).value(), 2135 - 1952);
        assert_eq!(q_table.sample(0).value(), 4095);
        assert_eq!(q_table.sample(2048).value(), 2135 - 1960);
    }

    #[test]
    fn tone_table_stays_in_range_and_scales_with_gain() {
        let half = ToneTable::build(DacChannel::I, I_GAIN / 2);
        assert_eq!(half.sample(1024).value(), 2135 + 976);
        assert!(ToneTable::full_scale(DacChannel::Q).samples().all(|s| s.value() <= 4095));
        let silent = ToneTable::build(DacChannel::Q, 0);
        assert!(silent.samples().all(|s| s.value() == MIDSCALE));
    }

    #[test]
    fn qpsk_index_three_selects_second_entries() {
        assert_eq!(QPSK.i_slice.select(3), 1);
        assert_eq!(QPSK.q_slice.select(3), 1);
        assert_eq!(QPSK.sample(DacChannel::I, 3).value(), 2135 + 1952);
        assert_eq!(QPSK.sample(DacChannel::Q, 3).value(), 2135 + 1960);
        assert_eq!(QPSK.sample(DacChannel::I, 2).value(), 2135 - 1952);
        assert_eq!(QPSK.sample(DacChannel::Q, 1).value(), 2135 - 1960);
    }

    #[test]
    fn qam16_slices_low_and_high_bit_pairs() {
        // index 0b0111: I bits 0b11 -> +0.33, Q bits 0b01 -> -0.33
        assert_eq!(QAM16.sample(DacChannel::I, 0b0111).value(), 2135 - 644);
        assert_eq!(QAM16.sample(DacChannel::Q, 0b0111).value(), 2135 + 646);
        assert_eq!(QAM16.sample(DacChannel::I, 0b1000).value(), 2135 + 1952);
        assert_eq!(QAM16.sample(DacChannel::Q, 0b1000).value(), 2135 - 1960);
    }

    #[test]
    fn bpsk_keeps_q_at_midscale() {
        assert_eq!(BPSK.sample(DacChannel::I, 0).value(), 2135 - 1952);
        assert_eq!(BPSK.sample(DacChannel::I, 1).value(), 2135 + 1952);
        assert_eq!(BPSK.sample(DacChannel::Q, 0).value(), 2135);
        assert_eq!(BPSK.sample(DacChannel::Q, 1).value(), 2135);
    }

    #[test]
    fn psk8_points_sit_near_the_unit_circle() {
        for index in 0..PSK8.symbols {
            let i = PSK8.i_points[PSK8.i_slice.select(index)] as f64 / I_GAIN as f64;
            let q = PSK8.q_points[PSK8.q_slice.select(index)] as f64 / Q_GAIN as f64;
            let radius = (i * i + q * q).sqrt();
            assert!((radius - 1.0).abs() < 0.01, "symbol {} radius {}", index, radius);
        }
    }

    #[test]
    fn symbol_counts_wrap_with_a_mask() {
        for c in [&BPSK, &QPSK, &PSK8, &QAM16] {
            assert!(c.symbols().is_power_of_two(), "{}", c.mode().name());
        }
    }

    #[test]
    #[should_panic(expected = "power of two")]
    fn non_power_of_two_symbol_count_is_refused() {
        Constellation::new(ModulationMode::Bpsk, 3, BPSK.i_slice, BPSK.q_slice, &[0, 0, 0], &[0, 0, 0]);
    }

    #[test]
    fn every_constellation_covers_its_counter() {
        for c in [&BPSK, &QPSK, &PSK8, &QAM16] {
            for index in 0..c.symbols {
                assert!(c.i_slice.select(index) < c.i_points.len());
                assert!(c.q_slice.select(index) < c.q_points.len());
            }
        }
    }
}
