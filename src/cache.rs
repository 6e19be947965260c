//! Interface to the on-disk cache, consumed but not implemented here
//!
//! File layout, naming and eviction policy belong to the cache module that
//! owns the disk. Engines only need the narrow view below: which of the
//! three states the entry is in, and the transitions they are allowed to
//! drive.

use std::io;


/// What a stat of the cached file reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    /// Size in bytes (for a partial entry: the resume offset)
    pub size: u64,
    /// Modification time, epoch seconds UTC
    pub mtime: u64,
}

/// One resource in the cache, exclusively held by one engine for its run
///
/// The entry is in exactly one of three states: absent, partial or
/// complete. `partial()` and `full()` are never both `Some`.
pub trait CacheEntry {
    /// Stat of the partially downloaded file, if one exists
    fn partial(&self) -> Option<FileStat>;
    /// Stat of the complete file, if one exists
    fn full(&self) -> Option<FileStat>;

    /// Start writing the resource from scratch
    fn open_new(&mut self) -> io::Result<()>;
    /// Continue writing the partial file from `offset`
    fn open_partial(&mut self, offset: u64) -> io::Result<()>;
    /// Open the complete file for reading back to the client
    fn open_full(&mut self) -> io::Result<()>;
    /// Discard the partial file, the server refused to resume it
    fn remove_partial(&mut self) -> io::Result<()>;

    /// Record the total expected size as reported by the origin
    fn set_size(&mut self, size: u64);
    /// Record the origin's last-modified time, epoch seconds UTC
    fn set_mtime(&mut self, mtime: u64);
    fn size(&self) -> Option<u64>;
    fn mtime(&self) -> Option<u64>;
}
