//! Low-level decoding primitives shared by all format readers.
//!
//! Binary reads fail with a format error on a short read, since a
//! truncated record means the stream does not match the format being
//! decoded. Number parsing is locale-independent and distinguishes
//! "no digits at all" from numeric overflow.

use std::io::Read;
use std::sync::OnceLock;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use encoding_rs::WINDOWS_1252;
use regex::Regex;

use super::error::{Error, Result};

fn eof_error() -> Error {
    Error::Format("unexpected eof".to_string())
}

fn read_exact(f: &mut dyn Read, buf: &mut [u8]) -> Result<()> {
    f.read_exact(buf).map_err(|_| eof_error())
}

pub fn read_u8(f: &mut dyn Read) -> Result<u8> {
    let mut buf = [0u8; 1];
    read_exact(f, &mut buf)?;
    Ok(buf[0])
}

pub fn read_u16_le(f: &mut dyn Read) -> Result<u16> {
    let mut buf = [0u8; 2];
    read_exact(f, &mut buf)?;
    Ok(LittleEndian::read_u16(&buf))
}

pub fn read_i16_le(f: &mut dyn Read) -> Result<i16> {
    let mut buf = [0u8; 2];
    read_exact(f, &mut buf)?;
    Ok(LittleEndian::read_i16(&buf))
}

pub fn read_u32_le(f: &mut dyn Read) -> Result<u32> {
    let mut buf = [0u8; 4];
    read_exact(f, &mut buf)?;
    Ok(LittleEndian::read_u32(&buf))
}

pub fn read_i32_le(f: &mut dyn Read) -> Result<i32> {
    let mut buf = [0u8; 4];
    read_exact(f, &mut buf)?;
    Ok(LittleEndian::read_i32(&buf))
}

pub fn read_u32_be(f: &mut dyn Read) -> Result<u32> {
    let mut buf = [0u8; 4];
    read_exact(f, &mut buf)?;
    Ok(BigEndian::read_u32(&buf))
}

pub fn read_i32_be(f: &mut dyn Read) -> Result<i32> {
    let mut buf = [0u8; 4];
    read_exact(f, &mut buf)?;
    Ok(BigEndian::read_i32(&buf))
}

pub fn read_f32_le(f: &mut dyn Read) -> Result<f32> {
    let mut buf = [0u8; 4];
    read_exact(f, &mut buf)?;
    Ok(LittleEndian::read_f32(&buf))
}

pub fn read_f64_le(f: &mut dyn Read) -> Result<f64> {
    let mut buf = [0u8; 8];
    read_exact(f, &mut buf)?;
    Ok(LittleEndian::read_f64(&buf))
}

/// Read exactly `len` bytes as a fixed-length padded string.
///
/// Vendor strings are not guaranteed to be UTF-8, so bytes are decoded
/// as WINDOWS-1252, under which every byte maps to a character. Nothing
/// is trimmed; padding is the caller's business.
pub fn read_string(f: &mut dyn Read, len: usize) -> Result<String> {
    let mut buf = vec![0u8; len];
    read_exact(f, &mut buf)?;
    let (text, _, _) = WINDOWS_1252.decode(&buf);
    Ok(text.into_owned())
}

/// Convert a single-precision number in DEC PDP-11 format to `f64`.
///
/// Sign bit, 8-bit biased exponent, 24-bit mantissa with a hidden
/// leading bit. An exponent field of zero is not IEEE-754: it decodes
/// to 0.0, or to NaN when the sign bit is set (DEC calls it Undefined).
pub fn from_pdp11(p: &[u8; 4]) -> f64 {
    let negative = p[1] & 0x80 != 0;
    let exb = (((p[1] & 0x7f) as i32) << 1) + ((p[0] & 0x80) >> 7) as i32;
    if exb == 0 {
        if negative {
            return f64::NAN;
        }
        // either clean-zero or dirty-zero
        return 0.0;
    }
    let h = p[2] as f64 / 256.0 / 256.0 / 256.0
        + p[3] as f64 / 256.0 / 256.0
        + (128 + (p[0] & 0x7f) as i32) as f64 / 256.0;
    let sign = if negative { -1.0 } else { 1.0 };
    sign * h * (2f64).powi(exb - 128)
}

static NUMBER_PATTERN: OnceLock<Regex> = OnceLock::new();

// Longest numeric prefix, strtod-style: optional sign, digits with
// optional fraction, optional exponent; inf/nan literals also count.
fn number_regex() -> &'static Regex {
    NUMBER_PATTERN.get_or_init(|| {
        Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?|^[+-]?(?i:inf(?:inity)?|nan)")
            .expect("invalid number pattern")
    })
}

/// Parse the numeric prefix of `s`.
///
/// Returns the value and the number of bytes consumed, or `None` when
/// `s` does not start with a number. A finite-looking token that parses
/// to infinity is a format error (numeric overflow).
pub(crate) fn number_prefix(s: &str) -> Result<Option<(f64, usize)>> {
    let m = match number_regex().find(s) {
        Some(m) => m,
        None => return Ok(None),
    };
    let token = m.as_str();
    let val: f64 = token
        .parse()
        .map_err(|_| Error::Format(format!("malformed number: {}", token)))?;
    if val.is_infinite() && token.contains(|c: char| c.is_ascii_digit()) {
        return Err(Error::Format("numeric overflow".to_string()));
    }
    Ok(Some((val, m.end())))
}

/// Locale-independent string-to-double with error checking.
///
/// Leading whitespace is skipped and trailing non-numeric text is
/// ignored, like `strtod`.
///
/// # Errors
/// Format error when no digits are found or the value overflows.
pub fn parse_double(s: &str) -> Result<f64> {
    let t = s.trim_start();
    match number_prefix(t) {
        Ok(Some((val, _))) => Ok(val),
        Ok(None) => Err(Error::Format("not a double as expected".to_string())),
        Err(_) => Err(Error::Format("overflow when reading double".to_string())),
    }
}

/// Locale-independent string-to-integer with error checking.
///
/// # Errors
/// Format error when no digits are found or the value overflows.
pub fn parse_long(s: &str) -> Result<i64> {
    let t = s.trim();
    let digits_start = match t.as_bytes().first() {
        Some(b'+') | Some(b'-') => 1,
        _ => 0,
    };
    let digits_end = t[digits_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(t.len(), |i| digits_start + i);
    if digits_end == digits_start {
        return Err(Error::Format("not an integer as expected".to_string()));
    }
    t[..digits_end]
        .parse()
        .map_err(|_| Error::Format("overflow when reading long".to_string()))
}

/// Read all leading numbers from `s` into `row`, consuming any mix of
/// whitespace, `,`, `;` and `:` between them.
///
/// Returns the unconsumed remainder, which callers use to decide
/// whether a line is purely numeric or numeric with a trailing label.
///
/// # Errors
/// Format error on numeric overflow.
pub fn read_numbers<'a>(s: &'a str, row: &mut Vec<f64>) -> Result<&'a str> {
    row.clear();
    let is_sep = |c: char| c.is_whitespace() || c == ',' || c == ';' || c == ':';
    let mut p = s;
    loop {
        let q = p.trim_start();
        match number_prefix(q)
            .map_err(|_| Error::Format(format!("numeric overflow in line:\n{}", s)))?
        {
            Some((val, used)) => {
                row.push(val);
                p = q[used..].trim_start_matches(is_sep);
            }
            None => break,
        }
    }
    Ok(p)
}

/// Count the whitespace-separated numbers at the start of `s`.
pub fn count_numbers(s: &str) -> usize {
    let mut n = 0;
    let mut p = s.trim_start();
    while let Some(m) = number_regex().find(p) {
        n += 1;
        p = p[m.end()..].trim_start();
    }
    n
}
