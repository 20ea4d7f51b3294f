//! Paged / slotted addressing
//!
//! Pages follow the header back to back:
//! `page_offset(p) = HEADER_SIZE + p * page_size`. Inside a page, slot `s`
//! starts at `PAGE_HEADER_SIZE + s * RECORD_SIZE`.

use std::io::{Read, Seek, SeekFrom, Write};

use bytes::Bytes;
use tracing::{debug, trace};

use crate::error::{ListError, Result};
use crate::format::paged::{
    self, slots_per_page, PageHeader, PagedHeader, SlotAddr, HEADER_SIZE, MAGIC,
    PAGE_HEADER_SIZE, RECORD_SIZE, VERSION,
};
use crate::format::Record;

use super::{AddressingScheme, ListMeta, PageBuffer, Storage};

/// (page, slot) addressing with a bump allocator over the last page
///
/// Pages are never freed and a page's used-slot count only grows, so
/// tombstoned slots stay allocated and the file only grows.
#[derive(Debug, Clone)]
pub struct PagedScheme {
    page_size: u16,
    page_count: u32,
    slots_per_page: u16,
}

impl PagedScheme {
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn slots_per_page(&self) -> u16 {
        self.slots_per_page
    }

    pub fn page_offset(&self, page: u32) -> u64 {
        HEADER_SIZE as u64 + page as u64 * self.page_size as u64
    }

    /// Byte position of a slot inside its page
    fn slot_start(slot: u16) -> usize {
        PAGE_HEADER_SIZE + RECORD_SIZE * slot as usize
    }

    fn check(&self, addr: SlotAddr) -> Result<()> {
        if addr.page >= self.page_count || addr.slot >= self.slots_per_page {
            return Err(ListError::InvalidFormat(format!(
                "slot {} outside {} pages of {} slots",
                addr, self.page_count, self.slots_per_page
            )));
        }
        Ok(())
    }

    fn slot_offset(&self, addr: SlotAddr) -> Result<u64> {
        self.check(addr)?;
        Ok(self.page_offset(addr.page) + Self::slot_start(addr.slot) as u64)
    }

    /// Write a zero-filled page (used = 0)
    fn init_page<F: Storage>(&self, file: &mut F, page: u32) -> Result<()> {
        file.seek(SeekFrom::Start(self.page_offset(page)))?;
        file.write_all(&vec![0u8; self.page_size as usize])?;
        debug!(page, page_size = self.page_size, "initialized new page");
        Ok(())
    }

    pub fn read_page_header<F: Storage>(&self, file: &mut F, page: u32) -> Result<PageHeader> {
        file.seek(SeekFrom::Start(self.page_offset(page)))?;
        let mut buf = [0u8; PAGE_HEADER_SIZE];
        file.read_exact(&mut buf)?;
        PageHeader::decode(&buf)
    }

    fn write_page_header<F: Storage>(&self, file: &mut F, page: u32, ph: PageHeader) -> Result<()> {
        file.seek(SeekFrom::Start(self.page_offset(page)))?;
        file.write_all(&ph.encode())?;
        Ok(())
    }

    /// Used-slot count from a loaded page, clamped to page capacity
    fn used_in(&self, buffer: &PageBuffer) -> Result<u16> {
        let ph = PageHeader::decode(buffer.data())?;
        Ok(ph.used.min(self.slots_per_page))
    }

    fn decode_from(&self, buffer: &PageBuffer, slot: u16) -> Result<Record<SlotAddr>> {
        let bytes = buffer
            .slice(Self::slot_start(slot), RECORD_SIZE)
            .ok_or_else(|| {
                ListError::InvalidFormat(format!("slot {} beyond loaded page", slot))
            })?;
        paged::decode_record(bytes)
    }
}

impl AddressingScheme for PagedScheme {
    type Addr = SlotAddr;
    type Header = PagedHeader;

    const NAME: &'static str = "paged";
    const HEADER_SIZE: usize = HEADER_SIZE;
    const NULL: SlotAddr = SlotAddr::NULL;

    fn is_null(addr: SlotAddr) -> bool {
        addr.is_null()
    }

    fn fresh(page_size: u16) -> Self {
        Self {
            page_size,
            page_count: 0,
            slots_per_page: slots_per_page(page_size),
        }
    }

    fn load(header: &[u8]) -> Result<(Self, ListMeta<SlotAddr>)> {
        let h = PagedHeader::decode(header)?;
        let scheme = Self {
            page_size: h.page_size,
            page_count: h.page_count,
            slots_per_page: slots_per_page(h.page_size),
        };
        let meta = ListMeta {
            head: h.head,
            tail: h.tail,
            size: h.size,
        };
        Ok((scheme, meta))
    }

    fn header(&self, meta: &ListMeta<SlotAddr>) -> PagedHeader {
        PagedHeader {
            magic: MAGIC,
            version: VERSION,
            page_size: self.page_size,
            page_count: self.page_count,
            head: meta.head,
            tail: meta.tail,
            size: meta.size,
        }
    }

    fn encode_header(&self, meta: &ListMeta<SlotAddr>) -> Bytes {
        self.header(meta).encode()
    }

    fn page_size(&self) -> u16 {
        self.page_size
    }

    fn allocate<F: Storage>(&mut self, file: &mut F) -> Result<SlotAddr> {
        let (page, used) = if self.page_count == 0 {
            self.init_page(file, 0)?;
            self.page_count = 1;
            (0, 0)
        } else {
            let last = self.page_count - 1;
            let ph = self.read_page_header(file, last)?;
            if ph.used >= self.slots_per_page {
                let page = self.page_count;
                if page == paged::NULL_PAGE {
                    return Err(ListError::InvalidFormat(
                        "page id space exhausted".to_string(),
                    ));
                }
                self.init_page(file, page)?;
                self.page_count += 1;
                (page, 0)
            } else {
                (last, ph.used)
            }
        };

        self.write_page_header(file, page, PageHeader { used: used + 1 })?;

        let addr = SlotAddr::new(page, used);
        trace!(%addr, "allocated slot");
        Ok(addr)
    }

    fn read_record<F: Storage>(&self, file: &mut F, addr: SlotAddr) -> Result<Record<SlotAddr>> {
        let pos = self.slot_offset(addr)?;
        file.seek(SeekFrom::Start(pos))?;

        let mut buf = [0u8; RECORD_SIZE];
        file.read_exact(&mut buf)?;
        paged::decode_record(&buf)
    }

    fn write_record<F: Storage>(
        &self,
        file: &mut F,
        addr: SlotAddr,
        record: &Record<SlotAddr>,
    ) -> Result<()> {
        let pos = self.slot_offset(addr)?;
        file.seek(SeekFrom::Start(pos))?;
        file.write_all(&paged::encode_record(record))?;
        Ok(())
    }

    fn read_record_buffered<F: Storage>(
        &self,
        file: &mut F,
        buffer: &mut PageBuffer,
        addr: SlotAddr,
    ) -> Result<Record<SlotAddr>> {
        self.check(addr)?;
        if !buffer.holds(addr.page) {
            buffer.load(
                file,
                addr.page,
                self.page_offset(addr.page),
                self.page_size as usize,
            )?;
        }
        self.decode_from(buffer, addr.slot)
    }

    /// One page read per page; slots are decoded from the buffer
    fn scan_physical<F: Storage>(&self, file: &mut F) -> Result<Vec<Record<SlotAddr>>> {
        let mut buffer = PageBuffer::new();
        let mut records = Vec::new();

        for page in 0..self.page_count {
            buffer.load(file, page, self.page_offset(page), self.page_size as usize)?;
            let used = self.used_in(&buffer)?;
            for slot in 0..used {
                records.push(self.decode_from(&buffer, slot)?);
            }
        }
        Ok(records)
    }

    fn page_of(&self, addr: SlotAddr) -> u32 {
        addr.page
    }
}
