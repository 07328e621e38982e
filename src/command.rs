//! Console command grammar.
//!
//! Lines are space delimited and case-insensitive. Arguments past the ones a command uses are
//! ignored, so the longer forms listed in the help text (`sine i 1000 0.5 ...`) still parse.

use core::num::NonZeroU32;
use core::str::{FromStr, SplitAsciiWhitespace};

use ufmt::uDisplay;

use crate::dac::DacChannel;
use crate::tables::{Constellation, BPSK, PSK8, QAM16, QPSK};

/// Fixed-point type used for volt and amplitude arguments.
pub type Fxd = fixed::types::I32F32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scheme {
    Bpsk,
    Qpsk,
    Psk8,
    Qam16,
}
impl Scheme {
    pub fn constellation(self) -> &'static Constellation {
        match self {
            Scheme::Bpsk => &BPSK,
            Scheme::Qpsk => &QPSK,
            Scheme::Psk8 => &PSK8,
            Scheme::Qam16 => &QAM16,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FilterSetting {
    Rrc,
    #[default]
    Off,
}
impl uDisplay for FilterSetting {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where W: ufmt::uWrite + ?Sized {
        match self {
            FilterSetting::Rrc => f.write_str("rrc"),
            FilterSetting::Off => f.write_str("off"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Raw { channel: DacChannel, value: i32 },
    Dc { channel: DacChannel, volts: Fxd },
    Sine { channel: DacChannel, frequency_hz: i32, amplitude: Option<Fxd> },
    Tone { frequency_hz: i32, amplitude: Option<Fxd> },
    Modulate(Scheme),
    SampleRate(NonZeroU32),
    Filter(FilterSetting),
    Reboot,
    Help,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandError {
    /// Nothing but whitespace on the line.
    Empty,
    UnknownCommand,
    MissingArgument,
    BadChannel,
    BadNumber,
    BadScheme,
    BadFilter,
    /// Recognised but not implemented (`ook`, `64qam`).
    UnsupportedScheme,
}
impl uDisplay for CommandError {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where W: ufmt::uWrite + ?Sized {
        let msg = match self {
            CommandError::Empty => "Empty command",
            CommandError::UnknownCommand => "Invalid command",
            CommandError::MissingArgument => "Missing argument",
            CommandError::BadChannel => "Invalid channel, expected i or q",
            CommandError::BadNumber => "Invalid number",
            CommandError::BadScheme => "Invalid modulation scheme",
            CommandError::BadFilter => "Invalid filter setting",
            CommandError::UnsupportedScheme => "Modulation scheme not supported",
        };
        f.write_str(msg)
    }
}

fn is(token: &str, word: &str) -> bool {
    token.eq_ignore_ascii_case(word)
}

struct Args<'a>(SplitAsciiWhitespace<'a>);
impl<'a> Args<'a> {
    fn next(&mut self) -> Result<&'a str, CommandError> {
        self.0.next().ok_or(CommandError::MissingArgument)
    }
    fn optional(&mut self) -> Option<&'a str> {
        self.0.next()
    }
    fn channel(&mut self) -> Result<DacChannel, CommandError> {
        let token = self.next()?;
        if is(token, "i") {
            Ok(DacChannel::I)
        } else if is(token, "q") {
            Ok(DacChannel::Q)
        } else {
            Err(CommandError::BadChannel)
        }
    }
    fn number<N: FromStr>(&mut self) -> Result<N, CommandError> {
        parse_number(self.next()?)
    }
    fn optional_number<N: FromStr>(&mut self) -> Result<Option<N>, CommandError> {
        self.optional().map(parse_number::<N>).transpose()
    }
}

fn parse_number<N: FromStr>(token: &str) -> Result<N, CommandError> {
    token.parse().map_err(|_| CommandError::BadNumber)
}

fn parse_scheme(token: &str) -> Result<Scheme, CommandError> {
    match token {
        t if is(t, "bpsk") => Ok(Scheme::Bpsk),
        t if is(t, "qpsk") => Ok(Scheme::Qpsk),
        t if is(t, "8psk") => Ok(Scheme::Psk8),
        t if is(t, "16qam") => Ok(Scheme::Qam16),
        t if is(t, "ook") || is(t, "64qam") => Err(CommandError::UnsupportedScheme),
        _ => Err(CommandError::BadScheme),
    }
}

fn parse_filter(token: &str) -> Result<FilterSetting, CommandError> {
    if is(token, "rrc") {
        Ok(FilterSetting::Rrc)
    } else if is(token, "off") {
        Ok(FilterSetting::Off)
    } else {
        Err(CommandError::BadFilter)
    }
}

pub fn parse(line: &str) -> Result<Command, CommandError> {
    let mut args = Args(line.split_ascii_whitespace());
    let name = args.optional().ok_or(CommandError::Empty)?;

    let command = match name {
        n if is(n, "raw") => Command::Raw { channel: args.channel()?, value: args.number()? },
        n if is(n, "dc") => Command::Dc { channel: args.channel()?, volts: args.number()? },
        n if is(n, "sine") => Command::Sine {
            channel: args.channel()?,
            frequency_hz: args.number()?,
            amplitude: args.optional_number()?,
        },
        n if is(n, "tone") => Command::Tone { frequency_hz: args.number()?, amplitude: args.optional_number()? },
        n if is(n, "mod") => Command::Modulate(parse_scheme(args.next()?)?),
        n if is(n, "sr") => {
            let rate: u32 = args.number()?;
            Command::SampleRate(NonZeroU32::new(rate).ok_or(CommandError::BadNumber)?)
        }
        n if is(n, "filter") => Command::Filter(parse_filter(args.next()?)?),
        n if is(n, "reboot") => Command::Reboot,
        n if is(n, "help") => Command::Help,
        _ => return Err(CommandError::UnknownCommand),
    };
    Ok(command)
}
