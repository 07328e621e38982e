#![cfg_attr(not(test), no_std)]
#![allow(clippy::upper_case_acronyms)]

//! Baseband I/Q signal generator core.
//!
//! Everything here is written against `embedded-hal` traits and the two timer traits in
//! [`timer`], so it runs unchanged on the MSP430 firmware and on a host test harness.

pub mod dac;
pub mod spi;
pub mod tables;
pub mod dds;
pub mod modulation;
pub mod timer;
pub mod dispatcher;
pub mod serial;
pub mod command;
pub mod controller;
pub mod console;

#[cfg(test)]
mod testing;

pub use console::Console;
pub use controller::{Controller, Outcome};
pub use dispatcher::SymbolDispatcher;
pub use modulation::{SharedSignal, SignalState};
