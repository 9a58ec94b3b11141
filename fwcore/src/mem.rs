use std::borrow::Cow;

use log::debug;

use crate::buf::pad_to;
use crate::error::ContainerError;
use crate::io::{checked_range, ByteSink, ByteSource};

// Whole container held in memory, reads are zero-copy
pub struct MemorySource<B: AsRef<[u8]> = Vec<u8>> {
    data: B,
}

impl<B: AsRef<[u8]>> MemorySource<B> {
    pub fn new(data: B) -> Self {
        MemorySource { data }
    }

    pub fn into_inner(self) -> B {
        self.data
    }
}

impl<B: AsRef<[u8]>> ByteSource for MemorySource<B> {
    fn size(&self) -> u64 {
        self.data.as_ref().len() as u64
    }

    fn read(&mut self, count: u64, offset: u64) -> Result<Cow<'_, [u8]>, ContainerError> {
        let range = checked_range(count, offset, self.size())?;
        Ok(Cow::Borrowed(&self.data.as_ref()[range]))
    }
}

/// Growable buffer with a rewindable write cursor.
///
/// Writes at an explicit offset never move the cursor, they only extend
/// the buffer (pad filled) when they land past its end.
#[derive(Default)]
pub struct MemorySink {
    buffer: Vec<u8>,
    index: u64,
}

impl MemorySink {
    pub fn new() -> Self {
        MemorySink::default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }
}

impl ByteSink for MemorySink {
    fn index(&self) -> u64 {
        self.index
    }

    fn rewind(&mut self, to: u64) -> Result<(), ContainerError> {
        if to > self.buffer.len() as u64 {
            debug!("rewind to {} past written length {}", to, self.buffer.len());
            return Err(ContainerError::InvalidOffset {
                offset: to,
                count: 0,
                size: self.buffer.len() as u64,
            });
        }
        self.index = to;
        Ok(())
    }

    fn write(&mut self, bytes: &[u8], offset: Option<u64>) -> Result<(), ContainerError> {
        let start = offset.unwrap_or(self.index);
        let count = bytes.len() as u64;
        let end = start
            .checked_add(count)
            .ok_or(ContainerError::InvalidOffset { offset: start, count, size: u64::MAX })?;

        let range = checked_range(count, start, end)?;
        pad_to(&mut self.buffer, range.end);
        self.buffer[range].copy_from_slice(bytes);

        if offset.is_none() {
            self.index = end;
        }
        Ok(())
    }

    fn read(&self, count: u64, offset: u64) -> Result<Cow<'_, [u8]>, ContainerError> {
        let range = checked_range(count, offset, self.buffer.len() as u64)?;
        Ok(Cow::Borrowed(&self.buffer[range]))
    }
}
