// This file acts as an abstraction layer for board-specific values that may change between revisions.

use embedded_hal::blocking::delay::DelayUs;
use msp430fr2355 as pac;
use msp430fr2355::{P4, P6, PMM};
use msp430fr2x5x_hal::{gpio::Batch, pmm::Pmm};

use msp430_iq_signal_generator::timer::{delay_loop_passes, TimerInterrupt, TimerReload};

pub mod pin_name_types {
    use msp430fr2x5x_hal::gpio::*;

    pub type DacCsPin = Pin<P6, Pin3, Output>;
    pub type DacLdacPin = Pin<P6, Pin2, Output>;

    pub type DacSCKPin = Pin<P4, Pin5, Alternate1<Output>>;
    pub type DacMOSIPin = Pin<P4, Pin6, Alternate1<Output>>;
    pub type DacMISOPin = Pin<P4, Pin7, Alternate1<Output>>; // unused, the DAC has no data out

    pub type DebugSerialRx = Pin<P4, Pin2, Alternate1<Output>>;
    pub type DebugSerialTx = Pin<P4, Pin3, Alternate1<Output>>;
}
use pin_name_types::*;

pub mod clocks {
    use core::num::NonZeroU32;

    /// SMCLK, which also clocks the symbol timer.
    pub const CYCLE_CLOCK_HZ: u32 = 16_000_000;
    pub const CYCLES_PER_MICROSECOND: u32 = CYCLE_CLOCK_HZ / 1_000_000;
    pub const DAC_SPI_BAUD_HZ: u32 = 8_000_000;
    pub const DEBUG_SERIAL_BAUD: u32 = 115_200;
    pub const DEFAULT_SAMPLE_RATE_HZ: NonZeroU32 = match NonZeroU32::new(20_000) {
        Some(rate) => rate,
        None => panic!(),
    };
}

pub struct DacPins {
    pub cs: DacCsPin,
    pub ldac: DacLdacPin,
    pub sck: DacSCKPin,
    pub mosi: DacMOSIPin,
    pub miso: DacMISOPin,
}

pub struct DebugSerialPins {
    pub rx: DebugSerialRx,
    pub tx: DebugSerialTx,
}

// Takes raw port peripherals and returns actually useful pin collections
pub fn collect_pins(pmm: PMM, p4: P4, p6: P6) -> (DacPins, DebugSerialPins) {
    let pmm = Pmm::new(pmm);
    let port4 = Batch::new(p4).split(&pmm);
    let port6 = Batch::new(p6).split(&pmm);

    let dac_pins = DacPins {
        cs:   port6.pin3.to_output(),
        ldac: port6.pin2.to_output(),
        sck:  port4.pin5.to_output().to_alternate1(),
        mosi: port4.pin6.to_output().to_alternate1(),
        miso: port4.pin7.to_output().to_alternate1(),
    };

    let debug_serial_pins = DebugSerialPins {
        rx: port4.pin2.to_output().to_alternate1(),
        tx: port4.pin3.to_output().to_alternate1(),
    };

    (dac_pins, debug_serial_pins)
}

pub fn delay_cycles(num_cycles: u32) { //approximate delay fn, never shorter than asked
    for _ in 0..delay_loop_passes(num_cycles) {
        msp430::asm::nop()
    }
}

/// Busy-wait delay for the LDAC hold time. Rounds up to whole loop passes.
pub struct CycleDelay;
impl DelayUs<u8> for CycleDelay {
    fn delay_us(&mut self, us: u8) {
        delay_cycles(us as u32 * clocks::CYCLES_PER_MICROSECOND);
    }
}

// Timer_B0 register bits
const TBSSEL_SMCLK: u16 = 0b10 << 8;
const MC_UP: u16 = 0b01 << 4;
const TBCLR: u16 = 1 << 2;
const CCIE: u16 = 1 << 4;
const CCIFG: u16 = 1 << 0;

/// Timer_B0 in up mode from SMCLK, interrupting on CCR0.
///
/// Split into two handles: the command loop owns the period, the tick interrupt owns the flag.
pub struct SymbolTimer;
impl SymbolTimer {
    pub fn new(tb0: pac::TB0) -> (TimerPeriod, TimerAck) {
        tb0.tb0ctl().write(|w| unsafe { w.bits(TBSSEL_SMCLK | TBCLR) });
        tb0.tb0cctl0().write(|w| unsafe { w.bits(CCIE) });
        tb0.tb0ctl().write(|w| unsafe { w.bits(TBSSEL_SMCLK | MC_UP) });
        (TimerPeriod { _tb0: tb0 }, TimerAck)
    }
}

fn tb0() -> &'static pac::tb0::RegisterBlock {
    unsafe { &*pac::TB0::ptr() }
}

pub struct TimerPeriod {
    _tb0: pac::TB0,
}
impl TimerReload for TimerPeriod {
    // CCR0 holds count - 1
    const MAX_RELOAD: u32 = 0x1_0000;
    fn set_reload(&mut self, count: u32) {
        let ccr0 = (count.max(1) - 1) as u16;
        tb0().tb0ccr0().write(|w| unsafe { w.bits(ccr0) });
    }
}

pub struct TimerAck;
impl TimerInterrupt for TimerAck {
    fn clear_interrupt(&mut self) {
        tb0().tb0cctl0().modify(|r, w| unsafe { w.bits(r.bits() & !CCIFG) });
    }
}

const PMMPW: u16 = 0xA5 << 8;
const PMMSWBOR: u16 = 1 << 2;

/// Software brownout reset. Does not return.
pub fn system_reset() -> ! {
    let pmm = unsafe { &*pac::PMM::ptr() };
    pmm.pmmctl0().write(|w| unsafe { w.bits(PMMPW | PMMSWBOR) });
    #[allow(clippy::empty_loop)]
    loop {}
}
