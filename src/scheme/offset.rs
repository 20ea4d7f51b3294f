//! Offset addressing
//!
//! A record's address is its byte offset. Every record access is one seek
//! plus one read or write; there is no batching.

use std::io::{Read, Seek, SeekFrom, Write};

use bytes::Bytes;
use tracing::trace;

use crate::error::{ListError, Result};
use crate::format::offset::{
    self, OffsetHeader, HEADER_SIZE, MAGIC, NULL_OFFSET, RECORD_SIZE, VERSION,
};
use crate::format::Record;

use super::{AddressingScheme, ListMeta, Storage};

/// Byte-offset addressing with end-of-file allocation
///
/// Tombstoned records are pushed onto a free list (linked through their
/// `next` field) but `allocate` never takes from it: new records always go
/// to end-of-file.
#[derive(Debug, Clone)]
pub struct OffsetScheme {
    page_size: u16,
    free_list: i64,
}

impl OffsetScheme {
    /// Head of the tombstoned-record chain
    pub fn free_list(&self) -> i64 {
        self.free_list
    }

    /// Walk the free list, most recently deleted first
    pub fn free_chain<F: Storage>(&self, file: &mut F) -> Result<Vec<i64>> {
        let mut chain = Vec::new();
        let mut off = self.free_list;
        while off != NULL_OFFSET {
            chain.push(off);
            off = self.read_record(file, off)?.next;
        }
        Ok(chain)
    }

    fn check(&self, off: i64) -> Result<u64> {
        if off < HEADER_SIZE as i64 {
            return Err(ListError::InvalidFormat(format!(
                "record offset {} points into the header",
                off
            )));
        }
        Ok(off as u64)
    }
}

impl AddressingScheme for OffsetScheme {
    type Addr = i64;
    type Header = OffsetHeader;

    const NAME: &'static str = "offset";
    const HEADER_SIZE: usize = HEADER_SIZE;
    const NULL: i64 = NULL_OFFSET;

    fn is_null(addr: i64) -> bool {
        addr == NULL_OFFSET
    }

    fn fresh(page_size: u16) -> Self {
        Self {
            page_size,
            free_list: NULL_OFFSET,
        }
    }

    fn load(header: &[u8]) -> Result<(Self, ListMeta<i64>)> {
        let h = OffsetHeader::decode(header)?;
        let scheme = Self {
            page_size: h.page_size,
            free_list: h.free_list,
        };
        let meta = ListMeta {
            head: h.head,
            tail: h.tail,
            size: h.size as u64,
        };
        Ok((scheme, meta))
    }

    fn header(&self, meta: &ListMeta<i64>) -> OffsetHeader {
        OffsetHeader {
            magic: MAGIC,
            version: VERSION,
            page_size: self.page_size,
            head: meta.head,
            tail: meta.tail,
            size: meta.size as i64,
            free_list: self.free_list,
        }
    }

    fn encode_header(&self, meta: &ListMeta<i64>) -> Bytes {
        self.header(meta).encode()
    }

    fn page_size(&self) -> u16 {
        self.page_size
    }

    fn allocate<F: Storage>(&mut self, file: &mut F) -> Result<i64> {
        let end = file.seek(SeekFrom::End(0))?;
        trace!(offset = end, "allocated record at end of file");
        Ok(end as i64)
    }

    fn read_record<F: Storage>(&self, file: &mut F, addr: i64) -> Result<Record<i64>> {
        let pos = self.check(addr)?;
        file.seek(SeekFrom::Start(pos))?;

        let mut buf = [0u8; RECORD_SIZE];
        file.read_exact(&mut buf)?;
        offset::decode_record(&buf)
    }

    fn write_record<F: Storage>(&self, file: &mut F, addr: i64, record: &Record<i64>) -> Result<()> {
        let pos = self.check(addr)?;
        file.seek(SeekFrom::Start(pos))?;
        file.write_all(&offset::encode_record(record))?;
        Ok(())
    }

    fn retire<F: Storage>(
        &mut self,
        file: &mut F,
        addr: i64,
        mut record: Record<i64>,
    ) -> Result<()> {
        record.next = self.free_list;
        self.write_record(file, addr, &record)?;
        self.free_list = addr;
        Ok(())
    }

    fn scan_physical<F: Storage>(&self, file: &mut F) -> Result<Vec<Record<i64>>> {
        let end = file.seek(SeekFrom::End(0))?;
        file.seek(SeekFrom::Start(HEADER_SIZE as u64))?;

        let mut records = Vec::new();
        let mut pos = HEADER_SIZE as u64;
        let mut buf = [0u8; RECORD_SIZE];
        while pos + RECORD_SIZE as u64 <= end {
            file.read_exact(&mut buf)?;
            records.push(offset::decode_record(&buf)?);
            pos += RECORD_SIZE as u64;
        }
        Ok(records)
    }

    fn page_of(&self, addr: i64) -> u32 {
        let page_size = self.page_size.max(1) as i64;
        (addr.max(0) / page_size) as u32
    }
}
