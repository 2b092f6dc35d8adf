//! String and line-oriented helpers shared by text-based format readers.

use std::io::BufRead;

use encoding_rs::WINDOWS_1252;

use super::decode;
use super::error::{Error, Result};
use super::model::{Block, Column, StepColumn, VecColumn};
use super::Source;

/// True when the space-separated `sentence` contains `word` as a whole
/// word.
pub fn has_word(sentence: &str, word: &str) -> bool {
    debug_assert!(!word.is_empty());
    sentence.split_whitespace().any(|w| w == word)
}

/// Split a `key<sep>value` line; key and value are trimmed. Without the
/// separator the whole line is the key and the value is empty.
pub fn split_key_value(line: &str, sep: char) -> (&str, &str) {
    match line.split_once(sep) {
        Some((key, val)) => (key.trim(), val.trim()),
        None => (line, ""),
    }
}

/// Read the next line with the line ending removed; `None` at end of
/// input. Bytes are decoded as WINDOWS-1252, so vendor files with
/// non-ASCII header text never fail to read.
pub fn next_line(f: &mut dyn Source) -> Result<Option<String>> {
    let mut buf = Vec::new();
    let n = f
        .read_until(b'\n', &mut buf)
        .map_err(|e| Error::Runtime(format!("read error: {}", e)))?;
    if n == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    let (text, _, _) = WINDOWS_1252.decode(&buf);
    Ok(Some(text.into_owned()))
}

/// Read a line, failing with a format error at end of input.
pub fn read_line(f: &mut dyn Source) -> Result<String> {
    next_line(f)?.ok_or_else(|| Error::Format("unexpected end of file".to_string()))
}

/// Get the next line that is not blank and not a comment, with any
/// inline comment stripped and surrounding whitespace trimmed.
pub fn get_valid_line(f: &mut dyn Source, comment_char: char) -> Result<Option<String>> {
    loop {
        let line = match next_line(f)? {
            Some(l) => l,
            None => return Ok(None),
        };
        let t = line.trim_start();
        if t.is_empty() || t.starts_with(comment_char) {
            continue;
        }
        let cut = t.find(comment_char).unwrap_or(t.len());
        return Ok(Some(t[..cut].trim_end().to_string()));
    }
}

/// Read a line in the free format popular in powder-data ascii files:
/// `start step stop`, e.g. `15.000 0.020 110.000`.
///
/// Returns `None` when the line does not hold such a triple: a missing
/// number, a zero step, fewer than 4 resulting points, or a step that
/// does not evenly cover the range.
pub fn read_start_step_end_line(f: &mut dyn Source) -> Result<Option<StepColumn>> {
    let line = match next_line(f)? {
        Some(l) => l,
        None => return Ok(None),
    };
    let mut rest = line.as_str();
    let mut nums = [0.0f64; 3];
    for slot in &mut nums {
        let q = rest.trim_start();
        match decode::number_prefix(q) {
            Ok(Some((val, used))) => {
                *slot = val;
                rest = &q[used..];
            }
            _ => return Ok(None),
        }
    }
    let [start, step, stop] = nums;
    if step == 0.0 {
        return Ok(None);
    }
    let dcount = (stop - start) / step + 1.0;
    let count = (dcount + 0.5).floor();
    if count < 4.0 || (count - dcount).abs() > 1e-2 {
        return Ok(None);
    }
    Ok(Some(StepColumn::new(start, step, Some(count as usize))))
}

/// Read a start-step-end line followed by y data.
///
/// The triple should be in one of the first `max_headers + 1` lines.
/// Only as many data lines as necessary are consumed, since some files
/// have free text after the data. Returns `None` when no triple is
/// found or the y column does not end up with the expected length.
pub fn read_ssel_and_data(f: &mut dyn Source, max_headers: usize) -> Result<Option<Block>> {
    let mut xcol = read_start_step_end_line(f)?;
    for _ in 0..max_headers {
        if xcol.is_some() {
            break;
        }
        xcol = read_start_step_end_line(f)?;
    }
    let xcol = match xcol {
        Some(c) => c,
        None => return Ok(None),
    };
    let target = xcol.count.unwrap_or(0);

    let mut ycol = VecColumn::new();
    while ycol.point_count() < target {
        let line = match next_line(f)? {
            Some(l) => l,
            None => break,
        };
        ycol.push_values_from_str(&line, ' ')?;
    }
    if ycol.point_count() != target {
        return Ok(None);
    }

    let mut blk = Block::new();
    blk.add_column(Column::Stepwise(xcol));
    blk.add_column(Column::Materialized(ycol));
    Ok(Some(blk))
}
