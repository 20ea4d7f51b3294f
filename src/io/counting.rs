//! Counting file wrapper

use std::fmt;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// Cumulative call counts for one wrapped handle
///
/// These count calls, not bytes: `read_exact` on a short-reading handle
/// shows up as several reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoStats {
    pub reads: u64,
    pub writes: u64,
    pub seeks: u64,
    pub flushes: u64,
    pub syncs: u64,
}

impl IoStats {
    /// Counts accumulated since `earlier` was taken
    pub fn delta(&self, earlier: &IoStats) -> IoStats {
        IoStats {
            reads: self.reads.saturating_sub(earlier.reads),
            writes: self.writes.saturating_sub(earlier.writes),
            seeks: self.seeks.saturating_sub(earlier.seeks),
            flushes: self.flushes.saturating_sub(earlier.flushes),
            syncs: self.syncs.saturating_sub(earlier.syncs),
        }
    }

    /// Reads + writes + seeks
    pub fn total_calls(&self) -> u64 {
        self.reads + self.writes + self.seeks
    }
}

impl fmt::Display for IoStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "reads={}, writes={}, seeks={}",
            self.reads, self.writes, self.seeks
        )
    }
}

/// Wraps a handle and counts every `read`, `write` and `seek` call
pub struct CountingFile<F = File> {
    inner: F,
    stats: IoStats,
}

impl<F> CountingFile<F> {
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            stats: IoStats::default(),
        }
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> IoStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = IoStats::default();
    }

    pub fn get_ref(&self) -> &F {
        &self.inner
    }

    pub fn into_inner(self) -> F {
        self.inner
    }
}

impl CountingFile<File> {
    /// fsync file data (counted as a sync)
    pub fn sync_data(&mut self) -> io::Result<()> {
        self.stats.syncs += 1;
        self.inner.sync_data()
    }

    /// fsync data and metadata (counted as a sync)
    pub fn sync_all(&mut self) -> io::Result<()> {
        self.stats.syncs += 1;
        self.inner.sync_all()
    }
}

impl<F: Read> Read for CountingFile<F> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stats.reads += 1;
        self.inner.read(buf)
    }
}

impl<F: Write> Write for CountingFile<F> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stats.writes += 1;
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stats.flushes += 1;
        self.inner.flush()
    }
}

impl<F: Seek> Seek for CountingFile<F> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.stats.seeks += 1;
        self.inner.seek(pos)
    }
}

impl<F> fmt::Debug for CountingFile<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountingFile")
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
