//! Configuration for disklist
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{ListError, Result};
use crate::format::{paged, DEFAULT_PAGE_SIZE};

/// Configuration for opening a list file
#[derive(Debug, Clone)]
pub struct ListConfig {
    // -------------------------------------------------------------------------
    // File Configuration
    // -------------------------------------------------------------------------
    /// Path of the list file (created if absent)
    pub path: PathBuf,

    /// Discard any existing contents and start with an empty list
    pub truncate: bool,

    // -------------------------------------------------------------------------
    // Layout Configuration
    // -------------------------------------------------------------------------
    /// Page size written into a fresh header.
    ///
    /// The paged scheme uses it as the real page size; the offset scheme
    /// only uses it to bucket offsets for page-visit statistics.
    /// An existing file keeps the page size recorded in its header.
    pub page_size: u16,

    // -------------------------------------------------------------------------
    // Durability Configuration
    // -------------------------------------------------------------------------
    /// When to fsync the file
    pub sync_strategy: SyncStrategy,
}

/// Sync strategy: how often to fsync the list file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync only on `close` (fast, relies on the OS page cache)
    OnClose,

    /// fsync after every header write (each mutation is durable on return)
    EveryCommit,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./list.llst"),
            truncate: false,
            page_size: DEFAULT_PAGE_SIZE,
            sync_strategy: SyncStrategy::OnClose,
        }
    }
}

impl ListConfig {
    /// Create a new config builder
    pub fn builder() -> ListConfigBuilder {
        ListConfigBuilder::default()
    }

    /// Check that the page size can hold a page header and at least one slot
    pub fn validate(&self) -> Result<()> {
        if paged::slots_per_page(self.page_size) == 0 {
            return Err(ListError::Config(format!(
                "page size {} cannot hold a {}-byte page header and one {}-byte slot",
                self.page_size,
                paged::PAGE_HEADER_SIZE,
                paged::RECORD_SIZE
            )));
        }
        Ok(())
    }
}

/// Builder for ListConfig
#[derive(Default)]
pub struct ListConfigBuilder {
    config: ListConfig,
}

impl ListConfigBuilder {
    /// Set the list file path
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Start from an empty list even if the file has contents
    pub fn truncate(mut self, truncate: bool) -> Self {
        self.config.truncate = truncate;
        self
    }

    /// Set the page size used for a fresh file (in bytes)
    pub fn page_size(mut self, page_size: u16) -> Self {
        self.config.page_size = page_size;
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    pub fn build(self) -> ListConfig {
        self.config
    }
}
