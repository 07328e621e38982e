//! Byte-at-a-time operator console.
//!
//! `LineBuffer` only assembles lines; `Console` hands finished lines to the `Controller`. Neither
//! touches the DAC, so a slow or half-typed command can never stall the symbol tick.

use heapless::Vec;
use ufmt::{uWrite, uwriteln};

use crate::controller::{Controller, Outcome};
use crate::timer::TimerReload;

pub const MAX_CHARS: usize = 80;
const CARRIAGE_RETURN: u8 = b'\r';
const BACKSPACE: u8 = 0x08;
const DELETE: u8 = 0x7F;

/// Accumulates printable bytes, folded to lowercase.
///
/// A line ends on carriage return, or when a byte arrives while the buffer is already full. The
/// terminating byte is not stored in either case.
#[derive(Default)]
pub struct LineBuffer {
    chars: Vec<u8, MAX_CHARS>,
}
impl LineBuffer {
    pub fn new() -> Self {
        LineBuffer { chars: Vec::new() }
    }
    /// Returns true once a complete line is waiting in `line()`.
    pub fn push(&mut self, byte: u8) -> bool {
        if byte == CARRIAGE_RETURN || self.chars.is_full() {
            return true;
        }
        match byte.to_ascii_lowercase() {
            BACKSPACE | DELETE => {
                self.chars.pop();
            }
            c @ b' '..=b'~' => {
                self.chars.push(c).ok();
            }
            _ => (),
        }
        false
    }
    pub fn line(&self) -> &str {
        core::str::from_utf8(&self.chars).unwrap_or("")
    }
    pub fn clear(&mut self) {
        self.chars.clear();
    }
}

pub struct Console<'a, T: TimerReload> {
    input: LineBuffer,
    controller: Controller<'a, T>,
}
impl<'a, T: TimerReload> Console<'a, T> {
    pub fn new(controller: Controller<'a, T>) -> Self {
        Console { input: LineBuffer::new(), controller }
    }
    pub fn banner<W: uWrite + ?Sized>(&self, out: &mut W) {
        let sample_rate_hz = self.controller.settings().sample_rate_hz.get();
        uwriteln!(out, "I/Q signal generator").ok();
        if self.controller.startup_rate_clamped() {
            uwriteln!(out, "[!] Sample rate clamped to {}Hz", sample_rate_hz).ok();
        }
        uwriteln!(out, "Fs = {}Hz, type 'help' for commands", sample_rate_hz).ok();
    }
    /// Feed one received byte. Returns the outcome when the byte completed a line.
    pub fn feed<W: uWrite + ?Sized>(&mut self, byte: u8, out: &mut W) -> Option<Outcome> {
        if !self.input.push(byte) {
            return None;
        }
        let outcome = self.controller.handle_line(self.input.line(), out);
        self.input.clear();
        uwriteln!(out, "").ok();
        Some(outcome)
    }
    pub fn controller(&self) -> &Controller<'a, T> {
        &self.controller
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_all(buffer: &mut LineBuffer, bytes: &[u8]) -> bool {
        bytes.iter().fold(false, |_, b| buffer.push(*b))
    }

    #[test]
    fn lines_end_on_carriage_return() {
        let mut buffer = LineBuffer::new();
        assert!(!push_all(&mut buffer, b"MOD QPSK"));
        assert!(buffer.push(b'\r'));
        assert_eq!(buffer.line(), "mod qpsk");
    }

    #[test]
    fn backspace_and_delete_erase() {
        let mut buffer = LineBuffer::new();
        push_all(&mut buffer, b"sinx\x08e q\x7F\x7F i");
        assert_eq!(buffer.line(), "sine i");
        buffer.clear();
        buffer.push(BACKSPACE);
        assert_eq!(buffer.line(), "");
    }

    #[test]
    fn control_bytes_are_dropped() {
        let mut buffer = LineBuffer::new();
        push_all(&mut buffer, b"\x1b[Ahelp\n\t");
        assert_eq!(buffer.line(), "[ahelp");
    }

    #[test]
    fn full_buffer_ends_the_line() {
        let mut buffer = LineBuffer::new();
        for _ in 0..MAX_CHARS {
            assert!(!buffer.push(b'a'));
        }
        assert!(buffer.push(b'b'));
        assert_eq!(buffer.line().len(), MAX_CHARS);
        assert!(!buffer.line().contains('b'));
    }
}
