//! Single-page read buffer
//!
//! Holds at most one page. Loading a different page replaces it. There is
//! no write-through: writes go straight to the file, so a buffer must not
//! outlive the traversal that filled it.

use std::io::{Read, Seek, SeekFrom};

use crate::error::Result;

/// One cached page: id, raw bytes, validity
#[derive(Debug, Default)]
pub struct PageBuffer {
    page_id: u32,
    data: Vec<u8>,
    valid: bool,
}

impl PageBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `page_id` is loaded
    pub fn holds(&self, page_id: u32) -> bool {
        self.valid && self.page_id == page_id
    }

    /// Id of the loaded page, if any
    pub fn page_id(&self) -> Option<u32> {
        self.valid.then_some(self.page_id)
    }

    /// Read a whole page at `offset` with one seek and one read
    pub fn load<F: Read + Seek>(
        &mut self,
        file: &mut F,
        page_id: u32,
        offset: u64,
        page_size: usize,
    ) -> Result<()> {
        self.valid = false;
        self.data.resize(page_size, 0);

        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(&mut self.data)?;

        self.page_id = page_id;
        self.valid = true;
        Ok(())
    }

    /// The loaded page's bytes (empty when invalid)
    pub fn data(&self) -> &[u8] {
        if self.valid {
            &self.data
        } else {
            &[]
        }
    }

    /// `len` bytes at `start` within the loaded page
    pub fn slice(&self, start: usize, len: usize) -> Option<&[u8]> {
        self.data().get(start..start.checked_add(len)?)
    }

    pub fn invalidate(&mut self) {
        self.valid = false;
    }
}
