//! On-disk Format Module
//!
//! Fixed-width, big-endian layouts for both addressing schemes.
//!
//! ## Offset Scheme (`LLOF`)
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │ Header (40 bytes)                                                │
//! │   Magic (4) | Version u16 | PageSize u16 | Head i64 | Tail i64   │
//! │   Size i64 | FreeList i64                                        │
//! ├──────────────────────────────────────────────────────────────────┤
//! │ Record (16 bytes) ... appended at end-of-file                    │
//! │   Value u32 | Next i64 | Tomb u8 | Pad (3)                       │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Paged Scheme (`LLPG`)
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │ Header (32 bytes)                                                │
//! │   Magic (4) | Version u16 | PageSize u16 | PageCount u32         │
//! │   HeadPage u32 | HeadSlot u16 | TailPage u32 | TailSlot u16      │
//! │   Size u64                                                       │
//! ├──────────────────────────────────────────────────────────────────┤
//! │ Page 0 (PageSize bytes)                                          │
//! │   Used u16 | Slot 0 | Slot 1 | ... | Slot N-1 | (unused tail)    │
//! │   Slot (12 bytes): Value u32 | NextPage u32 | NextSlot u16       │
//! │                    Tomb u8 | Pad u8                              │
//! ├──────────────────────────────────────────────────────────────────┤
//! │ Page 1 ...                                                       │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

pub mod offset;
pub mod paged;

pub use offset::OffsetHeader;
pub use paged::{PageHeader, PagedHeader, SlotAddr};

/// Default page size (bytes) written into fresh headers
pub const DEFAULT_PAGE_SIZE: u16 = 4096;

/// Tomb byte of a live record
pub(crate) const LIVE: u8 = 0;

/// Tomb byte of a logically deleted record
pub(crate) const TOMBSTONE: u8 = 1;

/// One stored value and its successor link.
///
/// `A` is the scheme's address type: a byte offset or a page/slot pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<A> {
    pub value: u32,
    pub next: A,
    pub tomb: bool,
}

impl<A> Record<A> {
    /// A live record pointing at `next`
    pub fn live(value: u32, next: A) -> Self {
        Self {
            value,
            next,
            tomb: false,
        }
    }

    pub fn is_live(&self) -> bool {
        !self.tomb
    }

    pub(crate) fn tomb_byte(&self) -> u8 {
        if self.tomb {
            TOMBSTONE
        } else {
            LIVE
        }
    }
}

/// Render a magic tag for error messages
pub(crate) fn magic_str(magic: &[u8]) -> String {
    String::from_utf8_lossy(magic).into_owned()
}
