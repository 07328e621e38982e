#![no_main]
#![no_std]
#![feature(abi_msp430_interrupt)]

#![allow(clippy::upper_case_acronyms)]

use core::cell::RefCell;

use critical_section::Mutex;
use msp430_rt::entry;
use msp430fr2355::{interrupt, E_USCI_B1};
use msp430fr2x5x_hal::{
    clock::{ClockConfig, DcoclkFreqSel, MclkDiv, SmclkDiv},
    fram::Fram,
    serial::{BitCount, BitOrder, Loopback, Parity, SerialConfig, StopBits},
    spi::{Phase, Polarity, SpiBus, SpiConfig},
    watchdog::Wdt,
};

#[cfg(debug_assertions)]
use panic_msp430 as _;

#[cfg(not(debug_assertions))]
use panic_never as _;

use msp430_iq_signal_generator::{
    dac::DAC,
    serial::{poll_byte, SerialWriter},
    spi::{DacSpiBus, IdleLow, SampleFirstEdge},
    Console, Controller, Outcome, SharedSignal, SignalState, SymbolDispatcher,
};

mod board;
use board::{clocks::*, collect_pins, pin_name_types::*, CycleDelay, SymbolTimer, TimerAck};

type DacBus = DacSpiBus<SpiBus<E_USCI_B1>, IdleLow, SampleFirstEdge>;
type Dispatcher = SymbolDispatcher<DacCsPin, DacLdacPin, DacBus, CycleDelay, TimerAck>;

static SIGNAL: SharedSignal = SharedSignal::new(SignalState::idle());
static DISPATCHER: Mutex<RefCell<Option<Dispatcher>>> = Mutex::new(RefCell::new(None));

#[entry]
fn main() -> ! {
    if let Some(periph) = msp430fr2355::Peripherals::take() {
        let _wdt = Wdt::constrain(periph.WDT_A);

        let (dac_pins, debug_serial_pins) = collect_pins(periph.PMM, periph.P4, periph.P6);

        let mut fram = Fram::new(periph.FRCTL);
        let (smclk, _aclk) = ClockConfig::new(periph.CS)
            .mclk_dcoclk(DcoclkFreqSel::_16MHz, MclkDiv::_1)
            .smclk_on(SmclkDiv::_1)
            .freeze(&mut fram);
        for _ in 0..2 {msp430::asm::nop();} // MSP hangs in release mode without a short pause after clock selection.

        // SCK idles low, data captured on the first (rising) edge, MSB first
        let spi_bus = SpiConfig::new(
            periph.E_USCI_B1,
            Polarity::IdleLow,
            Phase::CaptureOnFirstEdge,
            BitOrder::MsbFirst,
            BitCount::EightBits,
            Loopback::NoLoop,
            DAC_SPI_BAUD_HZ)
            .use_smclk(&smclk)
            .apply_config(dac_pins.sck, dac_pins.mosi, dac_pins.miso);
        let dac_spi: DacBus = DacSpiBus::new(spi_bus);

        let (serial_tx_pin, mut serial_rx_pin) = SerialConfig::new(
            periph.E_USCI_A1,
            BitOrder::LsbFirst,
            BitCount::EightBits,
            StopBits::OneStopBit,
            Parity::NoParity,
            Loopback::NoLoop,
            DEBUG_SERIAL_BAUD)
            .use_smclk(&smclk)
            .split(debug_serial_pins.tx, debug_serial_pins.rx);
        // Wrapper struct so we can use ufmt traits like uwrite! and uwriteln!
        let mut serial_writer = SerialWriter::new(serial_tx_pin);

        let (timer_period, timer_ack) = SymbolTimer::new(periph.TB0);
        let dac = DAC::new(dac_pins.cs, dac_pins.ldac);
        critical_section::with(|cs| {
            DISPATCHER.borrow_ref_mut(cs).replace(SymbolDispatcher::new(dac, dac_spi, CycleDelay, timer_ack));
        });

        let controller = Controller::new(&SIGNAL, timer_period, CYCLE_CLOCK_HZ, DEFAULT_SAMPLE_RATE_HZ);
        let mut console = Console::new(controller);
        console.banner(&mut serial_writer);

        unsafe { msp430::interrupt::enable() };

        loop {
            if let Some(byte) = poll_byte(&mut serial_rx_pin) {
                if let Some(Outcome::Reboot) = console.feed(byte, &mut serial_writer) {
                    board::system_reset();
                }
            }
        }
    }
    else {#[allow(clippy::empty_loop)] loop{}}
}

#[interrupt]
fn TIMER0_B0() {
    critical_section::with(|cs| {
        if let Some(dispatcher) = DISPATCHER.borrow_ref_mut(cs).as_mut() {
            dispatcher.on_tick(&SIGNAL);
        }
    });
}

// The compiler will emit calls to the abort() compiler intrinsic if debug assertions are
// enabled (default for dev profile). MSP430 does not actually have meaningful abort() support
// so for now, we create our own in each application where debug assertions are present.
#[no_mangle]
extern "C" fn abort() -> ! {
    panic!();
}
