//! Symbol timer seam. The board implements these against its timer peripheral; tests use a mock.

use core::num::NonZeroU32;

/// A periodic timer whose period is set in input clock cycles.
pub trait TimerReload {
    /// Largest reload count the counter can hold.
    const MAX_RELOAD: u32;
    fn set_reload(&mut self, count: u32);
}

/// The tick handler acknowledges each period it services.
pub trait TimerInterrupt {
    fn clear_interrupt(&mut self);
}

/// Reload counts that `reload_for` can't honour exactly are pinned to the timer's range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reload {
    pub count: u32,
    pub clamped: bool,
}

/// `floor(cycle_clock / sample_rate)` limited to `1..=max_reload`.
pub fn reload_for(cycle_clock_hz: u32, sample_rate_hz: NonZeroU32, max_reload: u32) -> Reload {
    let ideal = cycle_clock_hz / sample_rate_hz.get();
    let count = ideal.clamp(1, max_reload.max(1));
    Reload { count, clamped: count != ideal }
}

/// Tick rate produced by a given reload count.
pub fn achieved_rate_hz(cycle_clock_hz: u32, reload: u32) -> u32 {
    cycle_clock_hz / reload.max(1)
}

/// Passes of a nop busy-wait loop, at about 128/6 cycles a pass, that cover at least `cycles`.
/// Rounds up, so any nonzero wait gets at least one pass.
pub const fn delay_loop_passes(cycles: u32) -> u32 {
    (6 * cycles).div_ceil(128)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate(hz: u32) -> NonZeroU32 {
        NonZeroU32::new(hz).unwrap()
    }

    #[test]
    fn reload_is_floor_of_cycles_per_sample() {
        assert_eq!(reload_for(16_000_000, rate(20_000), 0xFFFF), Reload { count: 800, clamped: false });
        assert_eq!(reload_for(16_000_000, rate(30_000), 0xFFFF), Reload { count: 533, clamped: false });
    }

    #[test]
    fn slow_rates_clamp_to_the_counter_width() {
        let reload = reload_for(16_000_000, rate(100), 0xFFFF);
        assert_eq!(reload, Reload { count: 0xFFFF, clamped: true });
        assert_eq!(achieved_rate_hz(16_000_000, reload.count), 244);
    }

    #[test]
    fn fast_rates_clamp_to_one_cycle() {
        assert_eq!(reload_for(16_000_000, rate(32_000_000), 0xFFFF), Reload { count: 1, clamped: true });
        assert_eq!(achieved_rate_hz(16_000_000, 1), 16_000_000);
    }

    #[test]
    fn short_waits_still_spin() {
        // 1us latch hold at 16MHz
        assert_eq!(delay_loop_passes(16), 1);
        assert_eq!(delay_loop_passes(0), 0);
        for cycles in 1..5_000 {
            let passes = delay_loop_passes(cycles);
            assert!(passes * 128 >= 6 * cycles, "{} cycles", cycles);
            assert!((passes - 1) * 128 < 6 * cycles, "{} cycles", cycles);
        }
    }
}
