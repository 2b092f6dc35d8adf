//! Transparent decompression of `.gz` and `.bz2` inputs.
//!
//! Format probing needs a seekable stream, so the whole file is
//! decompressed into memory up front and served from a buffer.

use std::io::Read;

use bzip2::read::BzDecoder;
use flate2::read::MultiGzDecoder;

use super::error::{Error, Result};

// Streams that inflate past this are rejected before they exhaust
// memory.
const MAX_DECOMPRESSED: u64 = 1 << 30;

pub(crate) fn decompress_gz(f: impl Read) -> Result<Vec<u8>> {
    read_capped(MultiGzDecoder::new(f))
}

pub(crate) fn decompress_bz2(f: impl Read) -> Result<Vec<u8>> {
    read_capped(BzDecoder::new(f))
}

fn read_capped(decoder: impl Read) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    decoder
        .take(MAX_DECOMPRESSED + 1)
        .read_to_end(&mut out)
        .map_err(|e| Error::Runtime(format!("decompression failed: {}", e)))?;
    if out.len() as u64 > MAX_DECOMPRESSED {
        return Err(Error::Runtime(
            "ignoring very big (1GiB+ uncompressed) file".to_string(),
        ));
    }
    Ok(out)
}
