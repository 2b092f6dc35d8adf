//! Core module: the data model, format registry and loading entry
//! points.

pub mod cache;
pub mod decode;
pub mod error;
pub mod model;
pub mod registry;
pub mod util;

mod compression;
mod dsv;
mod text;

use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Seek};
use std::path::Path;

use log::info;

pub use cache::Cache;
pub use error::{Error, Result};
pub use model::{Block, Column, DataSet, MetaData, StepColumn, VecColumn};
pub use registry::{
    format_at, format_by_name, format_count, guess_format, possible_formats, FormatDescriptor,
};

/// Any buffered, seekable byte source a format can be decoded from.
/// Probing rewinds the stream between candidates, hence `Seek`.
pub trait Source: BufRead + Seek {}

impl<T: BufRead + Seek> Source for T {}

/// Version of the library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Read a dataset from a file.
///
/// When `format_name` is empty the format is guessed; otherwise it must
/// be the exact name of a supported format. Files with a `.gz` or
/// `.bz2` suffix are transparently decompressed first, and the format
/// is guessed from the path with that suffix stripped.
///
/// `options` is a whitespace-separated list of per-format keywords; an
/// unrecognized keyword is reported when the format first queries it,
/// not here.
pub fn load_file(path: &str, format_name: &str, options: &str) -> Result<DataSet> {
    info!("loading file: {}", path);
    let gzipped = path.ends_with(".gz");
    let bz2ed = path.ends_with(".bz2");
    if (gzipped && path.ends_with(".tar.gz")) || (bz2ed && path.ends_with(".tar.bz2")) {
        return Err(Error::Runtime(format!("refusing to read a tarball: {}", path)));
    }
    if Path::new(path).is_dir() {
        return Err(Error::Runtime(format!("it is a directory, not a file: {}", path)));
    }

    if gzipped {
        let file = File::open(path)
            .map_err(|_| Error::Runtime(format!("can't open .gz input file: {}", path)))?;
        let buf = compression::decompress_gz(file)?;
        let inner_path = path.strip_suffix(".gz").unwrap_or(path);
        guess_and_load(&mut Cursor::new(buf), inner_path, format_name, options)
    } else if bz2ed {
        let file = File::open(path)
            .map_err(|_| Error::Runtime(format!("can't open .bz2 input file: {}", path)))?;
        let buf = compression::decompress_bz2(file)?;
        let inner_path = path.strip_suffix(".bz2").unwrap_or(path);
        guess_and_load(&mut Cursor::new(buf), inner_path, format_name, options)
    } else {
        let file = File::open(path)
            .map_err(|_| Error::Runtime(format!("can't open input file: {}", path)))?;
        guess_and_load(&mut BufReader::new(file), path, format_name, options)
    }
}

/// Read a dataset from a byte buffer; used for embedding.
///
/// Same contract as [`load_file`] without file-system involvement. With
/// an empty `format_name` there is no extension to filter on, so only
/// formats without an extension restriction are probed.
pub fn load_bytes(bytes: &[u8], format_name: &str, options: &str) -> Result<DataSet> {
    guess_and_load(&mut Cursor::new(bytes), "", format_name, options)
}

/// Read a dataset of a named format from a stream.
pub fn load_stream(f: &mut dyn Source, format_name: &str, options: &str) -> Result<DataSet> {
    let fi = format_by_name(format_name).ok_or_else(|| {
        Error::Runtime(format!("unsupported (misspelled?) data format: {}", format_name))
    })?;
    load_stream_of_format(f, fi, options)
}

fn guess_and_load(
    f: &mut dyn Source,
    path: &str,
    format_name: &str,
    options: &str,
) -> Result<DataSet> {
    let fi = if format_name.is_empty() {
        let fi = registry::guess_format(path, f)?;
        info!("guessed format: {}", fi.name);
        f.rewind()
            .map_err(|e| Error::Runtime(format!("cannot rewind stream: {}", e)))?;
        fi
    } else {
        format_by_name(format_name).ok_or_else(|| {
            Error::Runtime(format!("unsupported (misspelled?) data format: {}", format_name))
        })?
    };
    load_stream_of_format(f, fi, options)
}

fn load_stream_of_format(
    f: &mut dyn Source,
    fi: &'static FormatDescriptor,
    options: &str,
) -> Result<DataSet> {
    let at_end = f
        .fill_buf()
        .map_err(|e| Error::Runtime(format!("read error: {}", e)))?
        .is_empty();
    if at_end {
        return Err(Error::Format("the file is empty".to_string()));
    }

    let mut ds = DataSet::new(fi);
    ds.set_options(options);
    match fi.kind.reader().load(f, &mut ds) {
        Ok(()) => Ok(ds),
        // append the format name for diagnostics
        Err(Error::Format(msg)) => {
            Err(Error::Format(format!("{} [filetype: {}]", msg, fi.name)))
        }
        Err(e) => Err(e),
    }
}
