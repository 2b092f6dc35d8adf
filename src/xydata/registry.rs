//! The format registry: descriptor table, extension filtering and
//! file-type guessing.

use std::io::Seek;
use std::path::Path;

use log::debug;

use super::dsv::DsvFormat;
use super::error::{Error, Result};
use super::model::DataSet;
use super::text::TextFormat;
use super::util::has_word;
use super::Source;

/// Static description of one supported file type.
#[derive(Debug)]
pub struct FormatDescriptor {
    /// Short name used to request the format explicitly.
    pub name: &'static str,
    /// Full format name, reasonably short.
    pub description: &'static str,
    /// Possible extensions, separated by spaces; empty means the format
    /// puts no restriction on the extension.
    pub extensions: &'static str,
    /// Binary or text content.
    pub binary: bool,
    /// Whether the file type can hold more than one block.
    pub multiblock: bool,
    /// Option keywords recognized at load time, separated by spaces;
    /// empty means no options are accepted.
    pub valid_options: &'static str,
    pub(crate) kind: FormatKind,
}

/// Closed set of format implementations. Adding a format means adding a
/// variant here and an entry in [`FORMATS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FormatKind {
    Dsv,
    Text,
}

/// The behavior every format implements: a self-check against the
/// stream and the decode routine that fills a dataset.
pub(crate) trait FormatReader {
    /// Answer "does this byte stream look like me?". The probe may
    /// consume the stream and leave it at an arbitrary position; the
    /// caller rewinds between candidates.
    fn probe(&self, f: &mut dyn Source) -> Result<bool>;

    /// Decode the whole stream into `ds`. Called exactly once per
    /// dataset, with the stream at offset 0.
    fn load(&self, f: &mut dyn Source, ds: &mut DataSet) -> Result<()>;
}

impl FormatKind {
    pub(crate) fn reader(self) -> &'static dyn FormatReader {
        match self {
            FormatKind::Dsv => &DsvFormat,
            FormatKind::Text => &TextFormat,
        }
    }
}

// Formats are probed in this order and the first one that matches is
// picked. Formats with more specific extensions and probes come first.
// TEXT must be last because it puts no restriction on the extension and
// its probe accepts anything, so it only wins when nothing else claims
// the file.
static FORMATS: [FormatDescriptor; 2] = [
    FormatDescriptor {
        name: "csv",
        description: "CSV or TSV",
        extensions: "csv tsv tab",
        binary: false,
        multiblock: false,
        valid_options: "decimal-comma",
        kind: FormatKind::Dsv,
    },
    FormatDescriptor {
        name: "text",
        description: "ascii text",
        extensions: "",
        binary: false,
        multiblock: false,
        valid_options: "strict first-line-header last-line-header decimal-comma",
        kind: FormatKind::Text,
    },
];

/// Number of supported formats.
pub fn format_count() -> usize {
    FORMATS.len()
}

/// Descriptor of the n-th supported format, in registry order.
pub fn format_at(n: usize) -> Option<&'static FormatDescriptor> {
    FORMATS.get(n)
}

/// Exact, case-sensitive lookup by format name.
pub fn format_by_name(name: &str) -> Option<&'static FormatDescriptor> {
    FORMATS.iter().find(|fi| fi.name == name)
}

/// Formats that could match the file, judged by extension alone.
///
/// A format is a candidate when its extension list is empty or contains
/// the path's lowercased extension as a whole word. Registry order is
/// preserved.
pub fn possible_formats(path: &str) -> Vec<&'static FormatDescriptor> {
    let ext = Path::new(path)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    FORMATS
        .iter()
        .filter(|fi| fi.extensions.is_empty() || (!ext.is_empty() && has_word(fi.extensions, &ext)))
        .collect()
}

/// Guess the format of the stream.
///
/// Extension-filtered candidates are probed in registry order; after a
/// failed probe the stream is rewound and the next candidate tried. The
/// stream is left wherever the successful probe stopped, so callers
/// rewind before decoding. Guessing is deterministic: the same bytes
/// and the same registry always select the same format.
///
/// # Errors
/// Runtime error when no candidate claims the file.
pub fn guess_format(path: &str, f: &mut dyn Source) -> Result<&'static FormatDescriptor> {
    for fi in possible_formats(path) {
        debug!("probing format: {}", fi.name);
        match fi.kind.reader().probe(f) {
            Ok(true) => return Ok(fi),
            Ok(false) => {}
            Err(e) => debug!("probe of {} failed: {}", fi.name, e),
        }
        f.rewind()
            .map_err(|e| Error::Runtime(format!("cannot rewind stream: {}", e)))?;
    }
    Err(Error::Runtime("format of the file can not be guessed".to_string()))
}
