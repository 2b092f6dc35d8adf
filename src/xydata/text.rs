//! The last-resort reader for free-form numeric text.
//!
//! Accepts any extension and its probe accepts any stream, so the
//! registry keeps it at the end of the table. The reader is tolerant by
//! default: label lines are skipped, ragged data shrinks the column
//! set, and a leading count line is dropped in favor of the real data.
//! The `strict` option turns the tolerance off.

use std::io::BufRead;

use log::{debug, warn};

use super::decode::read_numbers;
use super::error::{Error, Result};
use super::model::{Block, Column, DataSet, VecColumn};
use super::registry::FormatReader;
use super::util::{next_line, read_line};
use super::Source;

pub(crate) struct TextFormat;

// The title line is either a block name or column names; assume the
// latter when the word count matches the column count.
fn use_title_line(line: &str, cols: &mut [VecColumn], blk: &mut Block) {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.len() == cols.len() {
        for (col, word) in cols.iter_mut().zip(words) {
            col.set_name(word);
        }
    } else {
        blk.set_name(line);
    }
}

fn at_eof(f: &mut dyn Source) -> Result<bool> {
    let buf = f
        .fill_buf()
        .map_err(|e| Error::Runtime(format!("read error: {}", e)))?;
    Ok(buf.is_empty())
}

impl FormatReader for TextFormat {
    fn probe(&self, _f: &mut dyn Source) -> Result<bool> {
        Ok(true)
    }

    fn load(&self, f: &mut dyn Source, ds: &mut DataSet) -> Result<()> {
        let strict = ds.has_option("strict")?;
        let first_line_header = ds.has_option("first-line-header")?;
        // header in the last comment line, just before the first data line
        let mut last_line_header = ds.has_option("last-line-header")?;
        let decimal_comma = ds.has_option("decimal-comma")?;

        let mut cols: Vec<VecColumn> = Vec::new();
        let mut row: Vec<f64> = Vec::new();
        let mut title_line = String::new();

        if first_line_header {
            title_line = read_line(f)?.trim().to_string();
            if let Some(rest) = title_line.strip_prefix('#') {
                title_line = rest.to_string();
            }
        }

        // Read lines until the first data line is found and the columns
        // can be created.
        let mut last_line = String::new();
        while let Some(mut s) = next_line(f)? {
            // Basic support for LAMMPS log files. Output of the thermo
            // command has a good chance of being read properly, but the
            // log has no well-defined syntax, so nothing is guaranteed.
            if !strict && s.starts_with("LAMMPS (") {
                last_line_header = true;
                continue;
            }
            if decimal_comma {
                s = s.replace(',', ".");
            }
            let rest = read_numbers(&s, &mut row)?;
            // Lines with no data are skipped. A line with a single
            // number followed by text is skipped too: probably a label.
            if row.len() > 1 || (row.len() == 1 && (strict || rest.is_empty() || rest.starts_with('#')))
            {
                cols.reserve(row.len());
                for &val in &row {
                    let mut col = VecColumn::new();
                    col.push(val);
                    cols.push(col);
                }
                break;
            }
            if last_line_header {
                let t = s.trim();
                if !t.is_empty() {
                    last_line = t.strip_prefix('#').unwrap_or(t).to_string();
                }
            }
        }

        // Read the remaining data lines (the first one was read above).
        while let Some(mut s) = next_line(f)? {
            if decimal_comma {
                s = s.replace(',', ".");
            }
            read_numbers(&s, &mut row)?;

            // Lines with no data are silently skipped.
            if row.is_empty() {
                continue;
            }

            if row.len() < cols.len() {
                if !strict {
                    // Some non-data lines start with numbers (LAMMPS
                    // again). The exceptions below allow plotting such
                    // files anyway.

                    // a short final line is ignored
                    if at_eof(f)? {
                        debug!("ignoring short trailing line");
                        break;
                    }

                    // a line with only one number is probably not data
                    if row.len() == 1 {
                        continue;
                    }

                    // look at the next line before deciding
                    let mut row2: Vec<f64> = Vec::new();
                    if let Some(mut s2) = next_line(f)? {
                        if decimal_comma {
                            s2 = s2.replace(',', ".");
                        }
                        read_numbers(&s2, &mut row2)?;
                    }
                    if row2.len() <= 1 {
                        continue;
                    }
                    if row2.len() < cols.len() {
                        // two short rows in a row: keep the first one,
                        // the column set is about to shrink anyway
                        for (col, &val) in cols.iter_mut().zip(&row) {
                            col.push(val);
                        }
                        if row.len() < row2.len() {
                            row2.truncate(row.len());
                        }
                    }
                    row = row2;
                }

                // this check is not redundant, row may have changed
                if row.len() < cols.len() {
                    warn!("short data line, narrowing to {} columns", row.len());
                    cols.truncate(row.len());
                }
            } else if row.len() > cols.len() {
                // Extra columns are ignored, unless the single line
                // read so far was a count line ("number of points" or
                // "number of columns") and the real data starts here.
                if cols.first().map_or(false, |c| c.point_count() == 1) {
                    cols.clear();
                    cols.resize_with(row.len(), VecColumn::new);
                }
            }

            for (col, &val) in cols.iter_mut().zip(&row) {
                col.push(val);
            }
        }

        if cols.first().map_or(true, |c| c.point_count() < 2) {
            return Err(Error::Format("data not found in file".to_string()));
        }

        let mut blk = Block::new();
        if !title_line.is_empty() {
            use_title_line(&title_line, &mut cols, &mut blk);
        }
        if !last_line.is_empty() {
            use_title_line(&last_line, &mut cols, &mut blk);
        }
        for col in cols {
            blk.add_column(Column::Materialized(col));
        }
        ds.add_block(blk);
        Ok(())
    }
}
