//! # xydata-reader
//!
//! A library for reading files that contain x-y data from powder
//! diffraction, spectroscopy or other experimental methods.
//!
//! Usually [`load_file`] is called first; it reads a whole file into a
//! [`DataSet`]. A dataset contains a list of [`Block`]s, each block a
//! list of [`Column`]s, and each column a list of values. It is
//! analogous to a spreadsheet with a number of sheets, of which usually
//! only one is used. All columns in one block have equal length, and many file
//! types produce exactly one block with two columns. Coordinates of the
//! 15th point are then:
//!
//! ```no_run
//! let ds = xydata_reader::load_file("scan.csv", "", "")?;
//! let block = ds.block(0)?;
//! let x = block.column(1)?.value(14)?;
//! let y = block.column(2)?.value(14)?;
//! # Ok::<(), xydata_reader::Error>(())
//! ```
//!
//! Blocks and points are numbered from 0, but columns from 1, because
//! column 0 returns the index of a point. All values are stored as
//! floating-point numbers, even when the file keeps them as integers.
//! Datasets and blocks also carry [`MetaData`], a string-to-string map.
pub mod xydata;

// Re-export the main types for convenience
pub use xydata::{
    format_at, format_by_name, format_count, load_bytes, load_file, load_stream, version, Block,
    Cache, Column, DataSet, Error, FormatDescriptor, MetaData, Result, Source, StepColumn,
    VecColumn,
};
