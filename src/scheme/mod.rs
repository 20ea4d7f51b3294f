//! Addressing Scheme Module
//!
//! One contract for "where does a record live", implemented twice:
//!
//! - [`OffsetScheme`]: a record's address is its absolute byte offset;
//!   allocation appends at end-of-file.
//! - [`PagedScheme`]: a record's address is a (page, slot) pair; allocation
//!   bump-allocates slots in the last page and adds a page when it fills.
//!
//! List algorithms in [`crate::list`] are written once against
//! [`AddressingScheme`]. The file is the arena and addresses are indices
//! into it; nothing beyond the record under inspection is held in memory.

mod buffer;
mod offset;
mod paged;

use std::fmt;
use std::io::{Read, Seek, Write};

use bytes::Bytes;

use crate::error::Result;
use crate::format::Record;

pub use buffer::PageBuffer;
pub use offset::OffsetScheme;
pub use paged::PagedScheme;

/// Anything a list can live in: a file, a counting wrapper, a cursor
pub trait Storage: Read + Write + Seek {}

impl<T: Read + Write + Seek> Storage for T {}

/// Scheme-independent part of the header: the list's ends and length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListMeta<A> {
    pub head: A,
    pub tail: A,
    /// Live record count
    pub size: u64,
}

impl<A: Copy> ListMeta<A> {
    pub fn empty(null: A) -> Self {
        Self {
            head: null,
            tail: null,
            size: 0,
        }
    }
}

/// Record placement and addressing for one on-disk format
pub trait AddressingScheme: Sized + fmt::Debug {
    /// Address of a record
    type Addr: Copy + Eq + fmt::Debug;

    /// Full decoded header, for inspection and round-trip checks
    type Header: Copy + fmt::Debug + PartialEq;

    /// Short name used in logs
    const NAME: &'static str;

    /// Size of the header block at offset 0
    const HEADER_SIZE: usize;

    /// The "no record" address
    const NULL: Self::Addr;

    fn is_null(addr: Self::Addr) -> bool;

    /// State for a freshly initialized file
    fn fresh(page_size: u16) -> Self;

    /// Decode and validate a header block
    fn load(header: &[u8]) -> Result<(Self, ListMeta<Self::Addr>)>;

    /// Assemble the full header from scheme state and list metadata
    fn header(&self, meta: &ListMeta<Self::Addr>) -> Self::Header;

    fn encode_header(&self, meta: &ListMeta<Self::Addr>) -> Bytes;

    fn page_size(&self) -> u16;

    /// Reserve space for one new record and return its address.
    ///
    /// May write to the file (new pages, page headers) and mutate scheme
    /// state that is persisted with the next header write.
    fn allocate<F: Storage>(&mut self, file: &mut F) -> Result<Self::Addr>;

    fn read_record<F: Storage>(&self, file: &mut F, addr: Self::Addr)
        -> Result<Record<Self::Addr>>;

    fn write_record<F: Storage>(
        &self,
        file: &mut F,
        addr: Self::Addr,
        record: &Record<Self::Addr>,
    ) -> Result<()>;

    /// Read a record through a page buffer.
    ///
    /// Schemes without pages read directly.
    fn read_record_buffered<F: Storage>(
        &self,
        file: &mut F,
        _buffer: &mut PageBuffer,
        addr: Self::Addr,
    ) -> Result<Record<Self::Addr>> {
        self.read_record(file, addr)
    }

    /// Write back a record that has just been tombstoned.
    ///
    /// Scheme state touched by retirement (such as a free list) changes
    /// only after the write succeeds.
    fn retire<F: Storage>(
        &mut self,
        file: &mut F,
        addr: Self::Addr,
        record: Record<Self::Addr>,
    ) -> Result<()> {
        self.write_record(file, addr, &record)
    }

    /// Every allocated record in storage order, tombstones included
    fn scan_physical<F: Storage>(&self, file: &mut F) -> Result<Vec<Record<Self::Addr>>>;

    /// Page an address falls in, for locality statistics
    fn page_of(&self, addr: Self::Addr) -> u32;
}
