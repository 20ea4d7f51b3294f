//! List Module
//!
//! The persistent singly-linked list, written once against
//! [`AddressingScheme`].
//!
//! ## Responsibilities
//! - Open/create the list file and validate its header
//! - Append, prepend and delete-first-by-value
//! - Logical (next-pointer) and physical (storage order) traversal
//! - Expose I/O counters for cost comparison
//!
//! ## Commit Ordering
//! Every mutation writes its records first and the header last. The header
//! write is the commit point: a failure before it can leave an unreachable
//! record behind but never a header pointing at an unwritten one.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use crate::config::{ListConfig, SyncStrategy};
use crate::error::{ListError, Result};
use crate::format::Record;
use crate::io::{CountingFile, IoStats};
use crate::scheme::{AddressingScheme, ListMeta, OffsetScheme, PageBuffer, PagedScheme};

/// List addressed by byte offset
pub type OffsetList = DiskList<OffsetScheme>;

/// List addressed by (page, slot)
pub type PagedList = DiskList<PagedScheme>;

/// Values of a logical traversal plus the pages it touched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageVisits {
    /// Live values in list order
    pub values: Vec<u32>,
    /// Page id → number of live records visited in it
    pub visits: BTreeMap<u32, u64>,
    /// Number of hops that landed on a different page than the previous one
    pub page_switches: u64,
}

impl PageVisits {
    pub fn unique_pages(&self) -> usize {
        self.visits.len()
    }
}

/// A singly-linked list of `u32` stored in one file
///
/// The header is loaded on open and kept in memory; each mutation updates
/// it and rewrites it as the final step. Single writer: all operations take
/// `&mut self`.
pub struct DiskList<S: AddressingScheme> {
    path: PathBuf,
    file: CountingFile<File>,
    scheme: S,
    meta: ListMeta<S::Addr>,
    sync_strategy: SyncStrategy,
}

impl<S: AddressingScheme> DiskList<S> {
    /// Open or create a list file
    ///
    /// An empty file, or `truncate`, gets a fresh header. Otherwise the
    /// header is read and validated; a wrong magic or version fails with
    /// `InvalidFormat` and a short file with `Io`.
    pub fn open(config: ListConfig) -> Result<Self> {
        config.validate()?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(config.truncate)
            .open(&config.path)?;
        let len = file.metadata()?.len();
        let mut file = CountingFile::new(file);

        if len == 0 || config.truncate {
            let scheme = S::fresh(config.page_size);
            let mut list = Self {
                path: config.path,
                file,
                scheme,
                meta: ListMeta::empty(S::NULL),
                sync_strategy: config.sync_strategy,
            };
            list.write_header()?;

            debug!(
                scheme = S::NAME,
                path = %list.path.display(),
                page_size = config.page_size,
                "initialized empty list"
            );
            return Ok(list);
        }

        let (scheme, meta) = Self::load_header(&mut file)?;
        if scheme.page_size() != config.page_size {
            warn!(
                scheme = S::NAME,
                configured = config.page_size,
                stored = scheme.page_size(),
                "page size differs from config; using the stored one"
            );
        }

        debug!(
            scheme = S::NAME,
            path = %config.path.display(),
            size = meta.size,
            "opened existing list"
        );

        Ok(Self {
            path: config.path,
            file,
            scheme,
            meta,
            sync_strategy: config.sync_strategy,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified path and truncate flag
    pub fn open_path(path: &Path, truncate: bool) -> Result<Self> {
        let config = ListConfig::builder().path(path).truncate(truncate).build();
        Self::open(config)
    }

    // =========================================================================
    // Header Store
    // =========================================================================

    fn load_header(file: &mut CountingFile<File>) -> Result<(S, ListMeta<S::Addr>)> {
        file.seek(SeekFrom::Start(0))?;
        let mut buf = vec![0u8; S::HEADER_SIZE];
        file.read_exact(&mut buf)?;

        let (scheme, meta) = S::load(&buf)?;
        Self::check_meta(&meta)?;
        Ok((scheme, meta))
    }

    /// An empty list has null ends and size 0; a non-empty one has neither
    fn check_meta(meta: &ListMeta<S::Addr>) -> Result<()> {
        let head_null = S::is_null(meta.head);
        let tail_null = S::is_null(meta.tail);
        let empty = meta.size == 0;

        if head_null != tail_null || head_null != empty {
            return Err(ListError::InvalidFormat(format!(
                "inconsistent header: head {:?}, tail {:?}, size {}",
                meta.head, meta.tail, meta.size
            )));
        }
        Ok(())
    }

    /// Re-read the header block from disk
    ///
    /// Does not replace the in-memory header; compare with [`Self::header`].
    pub fn read_header(&mut self) -> Result<S::Header> {
        let (scheme, meta) = Self::load_header(&mut self.file)?;
        Ok(scheme.header(&meta))
    }

    /// Persist the in-memory header at offset 0 (the commit point)
    fn write_header(&mut self) -> Result<()> {
        let bytes = self.scheme.encode_header(&self.meta);
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&bytes)?;

        if self.sync_strategy == SyncStrategy::EveryCommit {
            self.file.sync_data()?;
        }
        Ok(())
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `value` after the current tail
    pub fn append_tail(&mut self, value: u32) -> Result<()> {
        let addr = self.scheme.allocate(&mut self.file)?;
        self.scheme
            .write_record(&mut self.file, addr, &Record::live(value, S::NULL))?;

        if S::is_null(self.meta.head) {
            self.meta.head = addr;
        } else {
            let tail = self.meta.tail;
            let mut tail_record = self.scheme.read_record(&mut self.file, tail)?;
            tail_record.next = addr;
            self.scheme.write_record(&mut self.file, tail, &tail_record)?;
        }

        self.meta.tail = addr;
        self.meta.size += 1;
        trace!(scheme = S::NAME, value, addr = ?addr, "append_tail");

        self.write_header()
    }

    /// Add `value` before the current head
    pub fn prepend_head(&mut self, value: u32) -> Result<()> {
        let addr = self.scheme.allocate(&mut self.file)?;
        self.scheme
            .write_record(&mut self.file, addr, &Record::live(value, self.meta.head))?;

        if S::is_null(self.meta.head) {
            self.meta.tail = addr;
        }

        self.meta.head = addr;
        self.meta.size += 1;
        trace!(scheme = S::NAME, value, addr = ?addr, "prepend_head");

        self.write_header()
    }

    /// Tombstone the first live record holding `value` and unlink it
    ///
    /// Returns `Ok(false)` if no live record matches; nothing is written in
    /// that case. The record's bytes stay on disk.
    pub fn delete_first(&mut self, value: u32) -> Result<bool> {
        let mut prev = S::NULL;
        let mut cur = self.meta.head;
        let mut live = 0u64;

        while !S::is_null(cur) {
            let mut record = self.scheme.read_record(&mut self.file, cur)?;

            if record.is_live() {
                live += 1;
                self.check_chain_len(live)?;
            }

            if record.is_live() && record.value == value {
                let next = record.next;

                record.tomb = true;
                self.scheme.retire(&mut self.file, cur, record)?;

                if S::is_null(prev) {
                    self.meta.head = next;
                    if S::is_null(next) {
                        self.meta.tail = S::NULL;
                    }
                } else {
                    let mut prev_record = self.scheme.read_record(&mut self.file, prev)?;
                    prev_record.next = next;
                    self.scheme.write_record(&mut self.file, prev, &prev_record)?;

                    if cur == self.meta.tail {
                        self.meta.tail = prev;
                    }
                }

                self.meta.size = self.meta.size.saturating_sub(1);
                trace!(scheme = S::NAME, value, addr = ?cur, "delete_first");

                self.write_header()?;
                return Ok(true);
            }

            prev = cur;
            cur = record.next;
        }

        Ok(false)
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// Follow `next` from head, calling `visit` for each live record.
    ///
    /// Fails if the chain yields more live records than the header's size,
    /// which catches pointer cycles.
    fn walk(
        &mut self,
        buffered: bool,
        mut visit: impl FnMut(S::Addr, &Record<S::Addr>),
    ) -> Result<()> {
        let mut buffer = PageBuffer::new();
        let mut cur = self.meta.head;
        let mut live = 0u64;

        while !S::is_null(cur) {
            let record = if buffered {
                self.scheme
                    .read_record_buffered(&mut self.file, &mut buffer, cur)?
            } else {
                self.scheme.read_record(&mut self.file, cur)?
            };

            if record.is_live() {
                live += 1;
                self.check_chain_len(live)?;
                visit(cur, &record);
            }
            cur = record.next;
        }
        Ok(())
    }

    /// A chain with more live records than `size` is corrupt (usually a cycle)
    fn check_chain_len(&self, live: u64) -> Result<()> {
        if live > self.meta.size {
            return Err(ListError::InvalidFormat(format!(
                "chain holds more than the {} live records in the header",
                self.meta.size
            )));
        }
        Ok(())
    }

    /// Live values in list order, one record read per hop
    pub fn traverse(&mut self) -> Result<Vec<u32>> {
        let mut values = Vec::new();
        self.walk(false, |_, record| values.push(record.value))?;
        Ok(values)
    }

    /// Live values in list order, reading whole pages through a page buffer
    ///
    /// Consecutive hops within one page cost a single read. Offset lists
    /// have no pages and read exactly like [`Self::traverse`].
    pub fn traverse_buffered(&mut self) -> Result<Vec<u32>> {
        let mut values = Vec::new();
        self.walk(true, |_, record| values.push(record.value))?;
        Ok(values)
    }

    /// Live values in storage order
    ///
    /// For verification and statistics; the order usually differs from
    /// list order.
    pub fn traverse_physical(&mut self) -> Result<Vec<u32>> {
        let records = self.scheme.scan_physical(&mut self.file)?;
        Ok(records
            .into_iter()
            .filter(|r| r.is_live())
            .map(|r| r.value)
            .collect())
    }

    /// Logical traversal that also counts the pages each record lives in
    pub fn page_visits(&mut self) -> Result<PageVisits> {
        let mut hops = Vec::new();
        self.walk(false, |addr, record| hops.push((addr, record.value)))?;

        let mut stats = PageVisits::default();
        let mut last_page = None;
        for (addr, value) in hops {
            let page = self.scheme.page_of(addr);
            stats.values.push(value);
            *stats.visits.entry(page).or_insert(0) += 1;
            if last_page != Some(page) {
                stats.page_switches += 1;
                last_page = Some(page);
            }
        }
        Ok(stats)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Live record count
    pub fn len(&self) -> u64 {
        self.meta.size
    }

    pub fn is_empty(&self) -> bool {
        self.meta.size == 0
    }

    pub fn head(&self) -> S::Addr {
        self.meta.head
    }

    pub fn tail(&self) -> S::Addr {
        self.meta.tail
    }

    /// The in-memory header, as it was last written
    pub fn header(&self) -> S::Header {
        self.scheme.header(&self.meta)
    }

    pub fn scheme(&self) -> &S {
        &self.scheme
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cumulative I/O calls since open (or the last reset)
    pub fn io_stats(&self) -> IoStats {
        self.file.stats()
    }

    pub fn reset_io_stats(&mut self) {
        self.file.reset_stats();
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Flush and fsync the file
    pub fn sync(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Sync and release the file handle
    pub fn close(mut self) -> Result<()> {
        self.sync()?;
        debug!(
            scheme = S::NAME,
            path = %self.path.display(),
            size = self.meta.size,
            io = %self.file.stats(),
            "closed list"
        );
        Ok(())
    }
}

impl DiskList<OffsetScheme> {
    /// Offsets of tombstoned records, most recently deleted first
    pub fn free_chain(&mut self) -> Result<Vec<i64>> {
        self.scheme.free_chain(&mut self.file)
    }
}

impl DiskList<PagedScheme> {
    pub fn page_count(&self) -> u32 {
        self.scheme.page_count()
    }
}
