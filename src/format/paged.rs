//! Paged scheme layout
//!
//! Records live in fixed-size slots inside fixed-size pages and are
//! addressed by (page id, slot id).

use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{ListError, Result};

use super::{magic_str, Record, LIVE};

/// Magic bytes identifying a paged list ("Linked List, PaGed")
pub const MAGIC: [u8; 4] = *b"LLPG";

/// Current paged format version
pub const VERSION: u16 = 2;

/// Header size: 4 + 2 + 2 + 4 + 4 + 2 + 4 + 2 + 8 = 32 bytes
pub const HEADER_SIZE: usize = 32;

/// Page header size: Used (2)
pub const PAGE_HEADER_SIZE: usize = 2;

/// Slot size: Value (4) + NextPage (4) + NextSlot (2) + Tomb (1) + Pad (1) = 12 bytes
pub const RECORD_SIZE: usize = 12;

pub const NULL_PAGE: u32 = u32::MAX;
pub const NULL_SLOT: u16 = u16::MAX;

/// Number of slots that fit in one page after its header
pub fn slots_per_page(page_size: u16) -> u16 {
    let usable = (page_size as usize).saturating_sub(PAGE_HEADER_SIZE);
    (usable / RECORD_SIZE) as u16
}

/// Address of a slot: page id plus slot index within the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotAddr {
    pub page: u32,
    pub slot: u16,
}

impl SlotAddr {
    pub const NULL: SlotAddr = SlotAddr {
        page: NULL_PAGE,
        slot: NULL_SLOT,
    };

    pub fn new(page: u32, slot: u16) -> Self {
        Self { page, slot }
    }

    /// Either half being the sentinel means "no record"
    pub fn is_null(&self) -> bool {
        self.page == NULL_PAGE || self.slot == NULL_SLOT
    }
}

impl fmt::Display for SlotAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "(null)")
        } else {
            write!(f, "({}, {})", self.page, self.slot)
        }
    }
}

/// File header of a paged list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagedHeader {
    pub magic: [u8; 4],
    pub version: u16,
    pub page_size: u16,
    pub page_count: u32,
    pub head: SlotAddr,
    pub tail: SlotAddr,
    pub size: u64,
}

impl PagedHeader {
    /// Header of an empty list with no pages
    pub fn new(page_size: u16) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            page_size,
            page_count: 0,
            head: SlotAddr::NULL,
            tail: SlotAddr::NULL,
            size: 0,
        }
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE);
        buf.put_slice(&self.magic);
        buf.put_u16(self.version);
        buf.put_u16(self.page_size);
        buf.put_u32(self.page_count);
        buf.put_u32(self.head.page);
        buf.put_u16(self.head.slot);
        buf.put_u32(self.tail.page);
        buf.put_u16(self.tail.slot);
        buf.put_u64(self.size);
        buf.freeze()
    }

    /// Decode and validate a header block
    pub fn decode(mut buf: &[u8]) -> Result<Self> {
        if buf.remaining() < HEADER_SIZE {
            return Err(ListError::InvalidFormat(format!(
                "paged header needs {} bytes, got {}",
                HEADER_SIZE,
                buf.remaining()
            )));
        }

        let mut magic = [0u8; 4];
        buf.copy_to_slice(&mut magic);
        if magic != MAGIC {
            return Err(ListError::InvalidFormat(format!(
                "magic mismatch: expected {}, found {}",
                magic_str(&MAGIC),
                magic_str(&magic)
            )));
        }

        let version = buf.get_u16();
        if version != VERSION {
            return Err(ListError::InvalidFormat(format!(
                "unsupported paged list version: {}",
                version
            )));
        }

        let page_size = buf.get_u16();
        if slots_per_page(page_size) == 0 {
            return Err(ListError::InvalidFormat(format!(
                "page size {} holds no slots",
                page_size
            )));
        }

        let page_count = buf.get_u32();
        let head = SlotAddr::new(buf.get_u32(), buf.get_u16());
        let tail = SlotAddr::new(buf.get_u32(), buf.get_u16());
        let size = buf.get_u64();

        Ok(Self {
            magic,
            version,
            page_size,
            page_count,
            head,
            tail,
            size,
        })
    }
}

/// Per-page header: how many slots have been handed out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageHeader {
    pub used: u16,
}

impl PageHeader {
    pub fn encode(&self) -> [u8; PAGE_HEADER_SIZE] {
        self.used.to_be_bytes()
    }

    pub fn decode(mut buf: &[u8]) -> Result<Self> {
        if buf.remaining() < PAGE_HEADER_SIZE {
            return Err(ListError::InvalidFormat(
                "truncated page header".to_string(),
            ));
        }
        Ok(Self {
            used: buf.get_u16(),
        })
    }
}

pub fn encode_record(record: &Record<SlotAddr>) -> Bytes {
    let mut buf = BytesMut::with_capacity(RECORD_SIZE);
    buf.put_u32(record.value);
    buf.put_u32(record.next.page);
    buf.put_u16(record.next.slot);
    buf.put_u8(record.tomb_byte());
    buf.put_u8(0);
    buf.freeze()
}

pub fn decode_record(mut buf: &[u8]) -> Result<Record<SlotAddr>> {
    if buf.remaining() < RECORD_SIZE {
        return Err(ListError::InvalidFormat(format!(
            "paged record needs {} bytes, got {}",
            RECORD_SIZE,
            buf.remaining()
        )));
    }

    let value = buf.get_u32();
    let next = SlotAddr::new(buf.get_u32(), buf.get_u16());
    let tomb = buf.get_u8() != LIVE;

    Ok(Record { value, next, tomb })
}
