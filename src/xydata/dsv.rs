//! Delimiter-separated values: the separator/decimal-convention
//! detector and the reader built on it.
//!
//! The detector is deliberately approximate. It samples the first four
//! non-blank lines, scores a fixed priority-ordered set of candidate
//! separators against lines 3 and 4, and degrades to "no separator
//! found" on ambiguous or malformed input instead of failing hard.

use log::debug;

use super::error::{Error, Result};
use super::model::{Block, Column, DataSet, VecColumn};
use super::registry::FormatReader;
use super::util::next_line;
use super::Source;

pub(crate) struct DsvFormat;

// If a "line" is longer than this, the input is most likely binary or
// one endless line; either way it is not worth scanning further.
const LINE_LIMIT: usize = 1600;

// Candidate separators in priority order. The trailing (';', true)
// entry probes the popular variant with ',' as the decimal point and
// ';' as the separator, tried even when the decimal-comma option was
// not given.
const SEPARATORS: [(char, bool); 7] = [
    ('\t', false),
    (',', false),
    (';', false),
    ('|', false),
    (':', false),
    (' ', false),
    (';', true),
];

/// Outcome of the four-line sample.
struct Detection {
    sep: char,
    decimal_comma: bool,
    /// Column names from a recognized header line, empty otherwise.
    column_names: Vec<String>,
    /// Numeric rows recovered from the sampled lines.
    rows: Vec<Vec<f64>>,
}

/// Split one line into fields, honoring double quotes and a minimal
/// set of backslash escapes. Text content is of secondary importance
/// here, so no more than that is attempted.
fn split_line(line: &str, sep: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut cur = String::new();
    let mut in_quote = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if c == sep && !in_quote {
            fields.push(std::mem::take(&mut cur));
        } else if c == '"' {
            in_quote = !in_quote;
        } else if c == '\\' {
            match chars.peek() {
                Some(&next) if next == '"' || next == sep || next == '\\' => {
                    chars.next();
                    cur.push(next);
                }
                _ => cur.push(c),
            }
        } else {
            cur.push(c);
        }
    }
    fields.push(cur);
    fields
}

// A field counts as numeric only when it contains nothing but a number
// with optional surrounding whitespace.
fn parse_field(field: &str) -> Option<f64> {
    let t = field.trim();
    if t.is_empty() {
        return None;
    }
    t.parse().ok()
}

/// Append one row to `out`; non-numeric fields become NaN. Returns the
/// count of numeric fields.
fn append_row(line: &str, sep: char, out: &mut Vec<Vec<f64>>) -> usize {
    let fields = split_line(line, sep);
    let mut nums = Vec::with_capacity(fields.len());
    let mut numeric = 0;
    for field in &fields {
        match parse_field(field) {
            Some(v) => {
                numeric += 1;
                nums.push(v);
            }
            None => nums.push(f64::NAN),
        }
    }
    out.push(nums);
    numeric
}

/// (field count, numeric field count) of one line under a candidate
/// separator.
fn count_fields(line: &str, sep: char, decimal_comma: bool) -> (usize, usize) {
    let modified;
    let l: &str = if decimal_comma {
        modified = line.replace(',', ".");
        &modified
    } else {
        line
    };
    let fields = split_line(l, sep);
    let numeric = fields.iter().filter(|f| parse_field(f.as_str()).is_some()).count();
    (fields.len(), numeric)
}

/// Sample the first four non-blank lines and pick the best separator.
///
/// `decimal_comma` is the load option: when set, commas are turned into
/// dots before any scoring. Returns `None` when no candidate separator
/// yields two matching data lines.
///
/// # Errors
/// Format error when the stream holds fewer than four non-blank lines
/// or a line exceeds the scanning limit.
fn read_four_lines(f: &mut dyn Source, decimal_comma: bool) -> Result<Option<Detection>> {
    let mut lines: [String; 4] = Default::default();
    let mut cnt = 0;
    let mut line_no = 0;
    while cnt < 4 {
        line_no += 1;
        let line = next_line(f)?
            .ok_or_else(|| Error::Format(format!("reading line {} failed", line_no)))?;
        if line.len() > LINE_LIMIT {
            return Err(Error::Format(format!("reading line {} failed", line_no)));
        }
        if line.trim().is_empty() {
            continue;
        }
        lines[cnt] = if decimal_comma { line.replace(',', ".") } else { line };
        cnt += 1;
    }

    // Determine the separator. The first line can be a header; the
    // second should not be, but just in case, score lines 3 and 4.
    let mut max_score = 0.0;
    let mut field_count = 0;
    let mut best: Option<(char, bool)> = None;
    for (sep, comma_variant) in SEPARATORS {
        if comma_variant && decimal_comma {
            continue;
        }
        let (fields2, num2) = count_fields(&lines[2], sep, comma_variant);
        if fields2 < 2 {
            continue;
        }
        let (fields3, num3) = count_fields(&lines[3], sep, comma_variant);
        if fields2 != fields3 {
            continue;
        }
        let nan_count = (fields2 - num2) + (fields3 - num3);
        let score = (num2 + num3) as f64 - 1e-3 * nan_count as f64;
        if score > max_score {
            max_score = score;
            field_count = fields2;
            best = Some((sep, comma_variant));
        }
    }
    let (sep, comma_won) = match best {
        Some(b) => b,
        None => return Ok(None),
    };
    let decimal_comma = decimal_comma || comma_won;

    // The first line holds column names iff it splits into as many
    // fields as the data lines, none of them numeric, and it is not a
    // "# "-style comment.
    let (fields0, num0) = count_fields(&lines[0], sep, decimal_comma);
    let has_header = fields0 == field_count && num0 == 0 && !lines[0].starts_with("# ");
    let column_names = if has_header {
        split_line(&lines[0], sep)
    } else {
        Vec::new()
    };

    let mut rows = Vec::new();
    for line in lines.iter().skip(if has_header { 1 } else { 0 }) {
        let modified;
        let l = if decimal_comma {
            modified = line.replace(',', ".");
            &modified
        } else {
            line
        };
        if append_row(l, sep, &mut rows) == 0 {
            rows.pop();
        }
    }

    Ok(Some(Detection { sep, decimal_comma, column_names, rows }))
}

impl FormatReader for DsvFormat {
    fn probe(&self, f: &mut dyn Source) -> Result<bool> {
        match read_four_lines(f, false) {
            Ok(Some(d)) => {
                debug!(
                    "dsv separator: {}{}",
                    if d.sep == '\t' { "TAB".to_string() } else { format!("'{}'", d.sep) },
                    if d.decimal_comma { ", decimal comma" } else { "" }
                );
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(e) if e.is_format_error() => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn load(&self, f: &mut dyn Source, ds: &mut DataSet) -> Result<()> {
        let decimal_comma = ds.has_option("decimal-comma")?;

        let detection = read_four_lines(f, decimal_comma)?
            .ok_or_else(|| Error::Format("no field separator found".to_string()))?;
        let mut data = detection.rows;

        while let Some(line) = next_line(f)? {
            if line.trim().is_empty() {
                continue;
            }
            let modified;
            let l = if detection.decimal_comma {
                modified = line.replace(',', ".");
                &modified
            } else {
                &line
            };
            if append_row(l, detection.sep, &mut data) == 0 {
                data.pop();
            }
        }

        let n_col = data
            .first()
            .map(Vec::len)
            .ok_or_else(|| Error::Format("data not found in file".to_string()))?;

        // Rows can be ragged; short rows are padded with NaN.
        let mut blk = Block::new();
        for i in 0..n_col {
            let mut col = VecColumn::new();
            if let Some(name) = detection.column_names.get(i) {
                col.set_name(name.as_str());
            }
            col.reserve(data.len());
            for row in &data {
                col.push(row.get(i).copied().unwrap_or(f64::NAN));
            }
            blk.add_column(Column::Materialized(col));
        }
        ds.add_block(blk);
        Ok(())
    }
}
