//! Offset scheme layout
//!
//! Records are addressed by their absolute byte offset in the file.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{ListError, Result};

use super::{magic_str, Record, LIVE};

/// Magic bytes identifying an offset-addressed list ("Linked List, OFfset")
pub const MAGIC: [u8; 4] = *b"LLOF";

/// Current offset format version
pub const VERSION: u16 = 1;

/// Header size: Magic (4) + Version (2) + PageSize (2) + 4 x i64 (32) = 40 bytes
pub const HEADER_SIZE: usize = 40;

/// Record size: Value (4) + Next (8) + Tomb (1) + Pad (3) = 16 bytes
pub const RECORD_SIZE: usize = 16;

const RECORD_PAD: usize = 3;

/// Sentinel offset meaning "no record"
pub const NULL_OFFSET: i64 = -1;

/// File header of an offset-addressed list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetHeader {
    pub magic: [u8; 4],
    pub version: u16,
    pub page_size: u16,
    pub head: i64,
    pub tail: i64,
    pub size: i64,
    /// Most recently tombstoned record; older ones chain through `next`
    pub free_list: i64,
}

impl OffsetHeader {
    /// Header of an empty list
    pub fn new(page_size: u16) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            page_size,
            head: NULL_OFFSET,
            tail: NULL_OFFSET,
            size: 0,
            free_list: NULL_OFFSET,
        }
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE);
        buf.put_slice(&self.magic);
        buf.put_u16(self.version);
        buf.put_u16(self.page_size);
        buf.put_i64(self.head);
        buf.put_i64(self.tail);
        buf.put_i64(self.size);
        buf.put_i64(self.free_list);
        buf.freeze()
    }

    /// Decode and validate a header block
    pub fn decode(mut buf: &[u8]) -> Result<Self> {
        if buf.remaining() < HEADER_SIZE {
            return Err(ListError::InvalidFormat(format!(
                "offset header needs {} bytes, got {}",
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
                "unsupported offset list version: {}",
                version
            )));
        }

        let header = Self {
            magic,
            version,
            page_size: buf.get_u16(),
            head: buf.get_i64(),
            tail: buf.get_i64(),
            size: buf.get_i64(),
            free_list: buf.get_i64(),
        };

        if header.size < 0 {
            return Err(ListError::InvalidFormat(format!(
                "negative list size: {}",
                header.size
            )));
        }

        Ok(header)
    }
}

pub fn encode_record(record: &Record<i64>) -> Bytes {
    let mut buf = BytesMut::with_capacity(RECORD_SIZE);
    buf.put_u32(record.value);
    buf.put_i64(record.next);
    buf.put_u8(record.tomb_byte());
    buf.put_bytes(0, RECORD_PAD);
    buf.freeze()
}

pub fn decode_record(mut buf: &[u8]) -> Result<Record<i64>> {
    if buf.remaining() < RECORD_SIZE {
        return Err(ListError::InvalidFormat(format!(
            "offset record needs {} bytes, got {}",
            RECORD_SIZE,
            buf.remaining()
        )));
    }

    let value = buf.get_u32();
    let next = buf.get_i64();
    let tomb = buf.get_u8() != LIVE;

    Ok(Record { value, next, tomb })
}
