//! The canonical in-memory model: datasets, blocks, columns and metadata.
//!
//! A [`DataSet`] corresponds to one file and contains one or more
//! [`Block`]s; a block is a named, row-aligned group of [`Column`]s plus
//! [`MetaData`]. It is analogous to a spreadsheet: one file, a number of
//! sheets, each sheet a list of columns of equal length.
//!
//! Blocks and rows are numbered from 0, columns from 1; pseudo-column 0
//! always yields the row index. All values are stored as `f64`, even when
//! they are integers in the file.

use std::collections::BTreeMap;
use std::sync::{OnceLock, RwLock};

use super::decode;
use super::error::{Error, Result};
use super::registry::FormatDescriptor;
use super::util::has_word;

/// One series of numeric values.
///
/// Either fully materialized ([`VecColumn`]) or generated from an
/// arithmetic rule ([`StepColumn`]). Many binary formats store only
/// `start` and `step` for the x axis, so the generated variant avoids
/// materializing millions of evenly spaced values.
#[derive(Debug)]
pub enum Column {
    Materialized(VecColumn),
    Stepwise(StepColumn),
}

impl Column {
    /// Column name; usually empty.
    pub fn name(&self) -> &str {
        match self {
            Column::Materialized(c) => &c.name,
            Column::Stepwise(c) => &c.name,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        match self {
            Column::Materialized(c) => c.name = name.into(),
            Column::Stepwise(c) => c.name = name.into(),
        }
    }

    /// Number of points, or `None` for an unbounded generated column.
    pub fn point_count(&self) -> Option<usize> {
        match self {
            Column::Materialized(c) => Some(c.point_count()),
            Column::Stepwise(c) => c.count,
        }
    }

    /// Value of the n-th point (counting from 0).
    ///
    /// # Errors
    /// Runtime error if `n` is out of range for a bounded column.
    pub fn value(&self, n: usize) -> Result<f64> {
        match self {
            Column::Materialized(c) => c.value(n),
            Column::Stepwise(c) => c.value(n),
        }
    }

    /// The fixed step between points, 0.0 for materialized columns.
    pub fn step(&self) -> f64 {
        match self {
            Column::Materialized(_) => 0.0,
            Column::Stepwise(c) => c.step,
        }
    }

    /// Minimum value. For a stepwise column this assumes a non-negative
    /// step.
    pub fn min(&self) -> f64 {
        match self {
            Column::Materialized(c) => c.min(),
            Column::Stepwise(c) => c.start,
        }
    }

    /// Maximum value. `point_count` must be given for a column of
    /// unbounded length and is ignored otherwise.
    pub fn max(&self, point_count: Option<usize>) -> Result<f64> {
        match self {
            Column::Materialized(c) => Ok(c.max()),
            Column::Stepwise(c) => c.max(point_count),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct MinMax {
    min: f64,
    max: f64,
    len: usize,
}

/// A column backed by a vector of values.
///
/// Append-only: values already stored are never altered, which lets the
/// min/max scan be cached until the length changes.
#[derive(Debug, Default)]
pub struct VecColumn {
    name: String,
    data: Vec<f64>,
    minmax: RwLock<Option<MinMax>>,
}

impl VecColumn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn point_count(&self) -> usize {
        self.data.len()
    }

    pub fn value(&self, n: usize) -> Result<f64> {
        self.data
            .get(n)
            .copied()
            .ok_or_else(|| Error::Runtime(format!("index out of range: {}", n)))
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn push(&mut self, val: f64) {
        self.data.push(val);
    }

    pub fn reserve(&mut self, n: usize) {
        self.data.reserve(n);
    }

    /// Append all numbers found in `s`, separated by whitespace and the
    /// optional extra separator `sep`.
    ///
    /// # Errors
    /// Format error if a token is not a number or overflows.
    pub fn push_values_from_str(&mut self, s: &str, sep: char) -> Result<()> {
        let is_sep = |c: char| c.is_whitespace() || c == sep;
        let mut p = s.trim_start_matches(is_sep);
        while !p.is_empty() {
            let (val, used) = decode::number_prefix(p)
                .map_err(|_| Error::Format(format!("numeric overflow in line:\n{}", s)))?
                .ok_or_else(|| Error::Format(format!("number not found in line:\n{}", s)))?;
            self.push(val);
            p = p[used..].trim_start_matches(is_sep);
        }
        Ok(())
    }

    pub fn min(&self) -> f64 {
        self.min_max().min
    }

    pub fn max(&self) -> f64 {
        self.min_max().max
    }

    // Values are only ever appended, so the cached scan stays valid as
    // long as the length is unchanged.
    fn min_max(&self) -> MinMax {
        if let Some(c) = *self.minmax.read().unwrap() {
            if c.len == self.data.len() {
                return c;
            }
        }
        let (mut min, mut max) = (0.0, 0.0);
        if let Some((&first, rest)) = self.data.split_first() {
            min = first;
            max = first;
            for &v in rest {
                if v < min {
                    min = v;
                }
                if v > max {
                    max = v;
                }
            }
        }
        let c = MinMax { min, max, len: self.data.len() };
        *self.minmax.write().unwrap() = Some(c);
        c
    }
}

/// A column of evenly spaced values: `start`, `start + step`, ...
///
/// `count` of `None` means unbounded length. `min()`/`max()` work
/// properly only when the step is non-negative.
#[derive(Debug, Clone)]
pub struct StepColumn {
    name: String,
    pub start: f64,
    pub step: f64,
    pub count: Option<usize>,
}

impl StepColumn {
    pub fn new(start: f64, step: f64, count: Option<usize>) -> Self {
        StepColumn { name: String::new(), start, step, count }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn value(&self, n: usize) -> Result<f64> {
        if let Some(count) = self.count {
            if n >= count {
                return Err(Error::Runtime(format!("point index out of range: {}", n)));
            }
        }
        Ok(self.start + self.step * n as f64)
    }

    pub fn max(&self, point_count: Option<usize>) -> Result<f64> {
        let n = self.count.or(point_count).ok_or_else(|| {
            Error::Runtime("point count required for a column of unbounded length".into())
        })?;
        if n == 0 {
            return Err(Error::Runtime("column has no points".into()));
        }
        Ok(self.start + self.step * (n - 1) as f64)
    }
}

// The index pseudo-column is shared by all blocks and owned by none.
static INDEX_COLUMN: OnceLock<Column> = OnceLock::new();

/// A block of data: a named, ordered list of columns plus metadata.
#[derive(Debug, Default)]
pub struct Block {
    /// Meta-data describing the x-y data, e.g. date of the experiment
    /// or wavelength.
    pub meta: MetaData,
    name: String,
    cols: Vec<Column>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    /// The pseudo-column that yields the index of a point as its value.
    pub fn index_column() -> &'static Column {
        INDEX_COLUMN.get_or_init(|| Column::Stepwise(StepColumn::new(0.0, 1.0, None)))
    }

    /// Block name; usually empty.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Number of real columns, not counting the index pseudo-column.
    pub fn column_count(&self) -> usize {
        self.cols.len()
    }

    /// Get a column; column 0 is the index of points, real columns are
    /// numbered from 1.
    pub fn column(&self, n: usize) -> Result<&Column> {
        if n == 0 {
            return Ok(Self::index_column());
        }
        self.cols
            .get(n - 1)
            .ok_or_else(|| Error::Runtime(format!("column index out of range: {}", n)))
    }

    pub fn add_column(&mut self, col: Column) {
        self.cols.push(col);
    }

    /// Insert a column in front of the existing ones (it becomes column 1).
    pub fn prepend_column(&mut self, col: Column) {
        self.cols.insert(0, col);
    }

    /// Number of points, or `None` when every column is an unbounded
    /// generator (or there are no columns at all).
    ///
    /// All columns in a block are conceptually aligned row for row; this
    /// minimum over the finite column lengths is the authoritative row
    /// bound for iteration.
    pub fn point_count(&self) -> Option<usize> {
        self.cols.iter().filter_map(Column::point_count).min()
    }
}

/// Data stored typically in one file: one or more blocks plus metadata.
///
/// A dataset is constructed empty by the resolved format, populated by
/// exactly one decode pass and immutable to callers afterwards, except
/// for [`DataSet::clear`] which exists only for explicit reloading.
#[derive(Debug)]
pub struct DataSet {
    /// Meta-data that applies to the whole file.
    pub meta: MetaData,
    format: &'static FormatDescriptor,
    options: String,
    blocks: Vec<Block>,
}

impl DataSet {
    pub(crate) fn new(format: &'static FormatDescriptor) -> Self {
        DataSet { meta: MetaData::new(), format, options: String::new(), blocks: Vec::new() }
    }

    /// The descriptor of the format this dataset was decoded from.
    pub fn format(&self) -> &'static FormatDescriptor {
        self.format
    }

    /// Number of blocks (usually 1).
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn block(&self, n: usize) -> Result<&Block> {
        self.blocks
            .get(n)
            .ok_or_else(|| Error::Runtime(format!("no block #{} in this file", n)))
    }

    pub fn add_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Delete all data stored in this dataset. Use only to call the
    /// decode routine more than once.
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.meta.clear();
    }

    pub(crate) fn set_options(&mut self, options: &str) {
        self.options = options.to_string();
    }

    /// True when the option keyword was handled at load time.
    ///
    /// # Errors
    /// Runtime error if `word` is not a valid option for this format.
    /// Options are validated lazily, at first query rather than at parse
    /// time.
    pub fn has_option(&self, word: &str) -> Result<bool> {
        if !self.is_valid_option(word) {
            return Err(Error::Runtime(format!(
                "invalid option for format {}: {}",
                self.format.name, word
            )));
        }
        Ok(has_word(&self.options, word))
    }

    /// True if this option keyword is recognized by the format.
    pub fn is_valid_option(&self, word: &str) -> bool {
        has_word(self.format.valid_options, word)
    }
}

/// String-keyed property store for a block or dataset.
///
/// Keys are unique and the last write wins. Enumeration order is stable
/// for a given set of insertions; use [`MetaData::size`] and
/// [`MetaData::key_at`] to iterate without direct map access.
#[derive(Debug, Default, Clone)]
pub struct MetaData {
    map: BTreeMap<String, String>,
}

impl MetaData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// # Errors
    /// Runtime error when the key is absent.
    pub fn get(&self, key: &str) -> Result<&str> {
        self.map
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| Error::Runtime(format!("no such key in meta-info found: {}", key)))
    }

    /// Store a value; returns true when the key was not present before.
    pub fn set(&mut self, key: impl Into<String>, val: impl Into<String>) -> bool {
        self.map.insert(key.into(), val.into()).is_none()
    }

    pub fn size(&self) -> usize {
        self.map.len()
    }

    /// # Errors
    /// Runtime error when the index is out of range.
    pub fn key_at(&self, index: usize) -> Result<&str> {
        self.map
            .keys()
            .nth(index)
            .map(String::as_str)
            .ok_or_else(|| Error::Runtime(format!("meta-info index out of range: {}", index)))
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }
}
