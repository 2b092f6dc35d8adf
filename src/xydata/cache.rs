//! Support for caching datasets read from files.
//!
//! Usage is similar to [`load_file`](super::load_file), but a shared
//! read-only handle is returned and repeated loads of an unchanged file
//! are served from memory:
//!
//! ```no_run
//! use xydata_reader::Cache;
//!
//! let mut cache = Cache::new();
//! let ds = cache.load_file("scan.csv", "", "")?;
//! # Ok::<(), xydata_reader::Error>(())
//! ```
//!
//! The cache is not safe for concurrent access; entries are `Rc`
//! handles, so a `Cache` cannot be sent to or shared with another
//! thread in the first place. Callers that want cross-thread caching
//! must wrap their own synchronization around a cache they own.

use std::fs;
use std::rc::Rc;
use std::time::SystemTime;

use log::debug;

use super::error::Result;
use super::model::DataSet;

// Last modification time, or None when it cannot be read.
fn file_mtime(path: &str) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

struct CachedFile {
    path: String,
    format_name: String,
    options: String,
    read_time: SystemTime,
    dataset: Rc<DataSet>,
}

/// A bounded list of recently loaded datasets.
///
/// Entries are keyed by (path, format name, options) and invalidated
/// when the file on disk is newer than the cached copy. Eviction is
/// strictly FIFO by insertion order, not LRU; with the default capacity
/// of one entry the distinction rarely matters, but callers may rely on
/// the documented order.
pub struct Cache {
    max_size: usize,
    entries: Vec<CachedFile>,
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

impl Cache {
    pub fn new() -> Self {
        Cache { max_size: 1, entries: Vec::new() }
    }

    /// Load a file through the cache.
    ///
    /// Arguments are the same as in [`load_file`](super::load_file). On
    /// a key match the file's modification time is compared with the
    /// entry's creation time; only an unchanged file is served from
    /// memory, a changed one is evicted and re-read. The returned
    /// handle is shared: do not mutate the dataset.
    pub fn load_file(
        &mut self,
        path: &str,
        format_name: &str,
        options: &str,
    ) -> Result<Rc<DataSet>> {
        let key_match = |e: &CachedFile| {
            e.path == path && e.format_name == format_name && e.options == options
        };
        if let Some(i) = self.entries.iter().position(key_match) {
            let fresh = file_mtime(path).map_or(false, |mtime| mtime < self.entries[i].read_time);
            if fresh {
                debug!("cache hit: {}", path);
                return Ok(Rc::clone(&self.entries[i].dataset));
            }
            debug!("cache entry for {} is stale", path);
            self.entries.remove(i);
        }

        let dataset = Rc::new(super::load_file(path, format_name, options)?);
        if self.max_size > 0 {
            if self.entries.len() >= self.max_size {
                self.entries.remove(0);
            }
            self.entries.push(CachedFile {
                path: path.to_string(),
                format_name: format_name.to_string(),
                options: options.to_string(),
                read_time: SystemTime::now(),
                dataset: Rc::clone(&dataset),
            });
        }
        Ok(dataset)
    }

    /// Maximum number of cached files, default 1.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Change the capacity; surplus entries are discarded immediately,
    /// oldest first.
    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
        while self.entries.len() > max_size {
            self.entries.remove(0);
        }
    }

    /// Drop all cached entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
