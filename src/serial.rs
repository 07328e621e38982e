use embedded_hal::serial::{Read, Write};
use ufmt::uWrite;

/// Lets the ufmt macros print to any blocking-capable serial transmitter.
pub struct SerialWriter<TX: Write<u8>> {
    serial: TX,
}
impl<TX: Write<u8>> SerialWriter<TX> {
    pub fn new(serial: TX) -> SerialWriter<TX> {
        SerialWriter { serial }
    }
    pub fn return_pin(self) -> TX {
        self.serial
    }
}
impl<TX: Write<u8>> uWrite for SerialWriter<TX> {
    type Error = TX::Error;
    fn write_char(&mut self, c: char) -> Result<(), Self::Error> {
        let mut buf = [0u8; 4];
        for byte in c.encode_utf8(&mut buf).bytes() {
            nb::block!(self.serial.write(byte))?;
        }
        Ok(())
    }

    fn write_str(&mut self, string: &str) -> Result<(), Self::Error> {
        for byte in string.bytes() {
            nb::block!(self.serial.write(byte))?;
        }
        Ok(())
    }
}

/// Take a byte if one has arrived. Receive errors (overrun, framing) drop the byte.
pub fn poll_byte<RX: Read<u8>>(serial_reader: &mut RX) -> Option<u8> {
    serial_reader.read().ok()
}

/// `uwriteln!` that only exists in `debug_print` builds. Write errors are ignored.
macro_rules! dbg_uwriteln {
    ($writer:expr, $($arg:tt)*) => {
        #[cfg(feature = "debug_print")]
        ufmt::uwriteln!($writer, $($arg)*).ok();
        #[cfg(not(feature = "debug_print"))]
        let _ = &$writer;
    };
}
pub(crate) use dbg_uwriteln;
