//! # disklist
//!
//! A persistent singly-linked list of `u32` values stored in a single file,
//! with two interchangeable addressing schemes:
//! - Offset addressing: records located by absolute byte offset
//! - Paged addressing: records located by (page, slot) in fixed-size pages
//! - Tombstone deletion: deleted records stay on disk, unlinked
//! - I/O instrumentation: every seek/read/write call is counted
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    DiskList<S> (list)                        │
//! │   append_tail / prepend_head / delete_first / traverse       │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ AddressingScheme
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ OffsetScheme│          │ PagedScheme │──── PageBuffer
//!   │ (EOF alloc) │          │(bump alloc) │
//!   └──────┬──────┘          └──────┬──────┘
//!          │       format (codec)   │
//!          └────────────┬───────────┘
//!                       ▼
//!               ┌───────────────┐
//!               │ CountingFile  │
//!               │  (IoStats)    │
//!               └───────┬───────┘
//!                       ▼
//!                   list file
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use disklist::{ListConfig, PagedList};
//!
//! let config = ListConfig::builder().path("paged.llst").truncate(true).build();
//! let mut list = PagedList::open(config)?;
//! list.prepend_head(1)?;
//! list.append_tail(2)?;
//! assert_eq!(list.traverse()?, vec![1, 2]);
//! list.close()?;
//! # Ok::<(), disklist::ListError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod format;
pub mod io;
pub mod scheme;
pub mod list;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ListError, Result};
pub use config::{ListConfig, SyncStrategy};
pub use format::SlotAddr;
pub use io::IoStats;
pub use list::{DiskList, OffsetList, PageVisits, PagedList};
pub use scheme::{AddressingScheme, OffsetScheme, PagedScheme};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of disklist
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
