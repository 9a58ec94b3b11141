//! The storage contract a container is read from or written to.
//!
//! The codec never talks to a concrete transport. A [`ByteSource`] is a
//! bounded random-access reader, a [`ByteSink`] is a growable random-access
//! writer with a cursor that can be rewound for patching already allocated
//! slots. Each call is a single blocking operation, a failed call is never
//! retried here.
use std::borrow::Cow;
use std::ops::Range;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::ContainerError;

pub trait ByteSource {
    fn size(&self) -> u64;

    // Fails with InvalidOffset if offset + count exceeds size()
    fn read(&mut self, count: u64, offset: u64) -> Result<Cow<'_, [u8]>, ContainerError>;
}

pub trait ByteSink {
    // Sequential write cursor
    fn index(&self) -> u64;

    // Fails with InvalidOffset past the already written length
    fn rewind(&mut self, to: u64) -> Result<(), ContainerError>;

    // Writes at `offset` if given, otherwise at the cursor and advances it.
    // Any gap up to the write is pad filled.
    fn write(&mut self, bytes: &[u8], offset: Option<u64>) -> Result<(), ContainerError>;

    fn read(&self, count: u64, offset: u64) -> Result<Cow<'_, [u8]>, ContainerError>;
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn size(&self) -> u64 {
        (**self).size()
    }

    fn read(&mut self, count: u64, offset: u64) -> Result<Cow<'_, [u8]>, ContainerError> {
        (**self).read(count, offset)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn size(&self) -> u64 {
        (**self).size()
    }

    fn read(&mut self, count: u64, offset: u64) -> Result<Cow<'_, [u8]>, ContainerError> {
        (**self).read(count, offset)
    }
}

/// Bounds check `offset + count <= size` and convert to a slice range.
pub fn checked_range(count: u64, offset: u64, size: u64) -> Result<Range<usize>, ContainerError> {
    let invalid = || ContainerError::InvalidOffset { offset, count, size };

    let end = offset.checked_add(count).ok_or_else(invalid)?;
    if end > size {
        return Err(invalid());
    }

    let start = usize::try_from(offset).map_err(|_| invalid())?;
    let end = usize::try_from(end).map_err(|_| invalid())?;
    Ok(start..end)
}

/// Sequential little endian field reader on top of a [`ByteSource`].
pub struct SourceCursor<'a, S: ByteSource + ?Sized> {
    source: &'a mut S,
    index: u64,
}

impl<'a, S: ByteSource + ?Sized> SourceCursor<'a, S> {
    pub fn new(source: &'a mut S) -> Self {
        SourceCursor { source, index: 0 }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn size(&self) -> u64 {
        self.source.size()
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ContainerError> {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.source.read(N as u64, self.index)?);
        self.index += N as u64;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, ContainerError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, ContainerError> {
        Ok(LittleEndian::read_u16(&self.read_array::<2>()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, ContainerError> {
        Ok(LittleEndian::read_u32(&self.read_array::<4>()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, ContainerError> {
        Ok(LittleEndian::read_u64(&self.read_array::<8>()?))
    }

    pub fn read_bytes<const N: usize>(&mut self) -> Result<[u8; N], ContainerError> {
        self.read_array::<N>()
    }

    // Consume and discard, still bounds checked against the source
    pub fn skip(&mut self, count: u64) -> Result<(), ContainerError> {
        self.source.read(count, self.index)?;
        self.index += count;
        Ok(())
    }
}

#[cfg(test)]
mod test_source_cursor {
    use super::*;
    use crate::mem::MemorySource;

    #[test]
    fn reads_little_endian_fields() {
        let mut src = MemorySource::new(vec![
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e,
            0x0f,
        ]);
        let mut cursor = SourceCursor::new(&mut src);

        assert_eq!(cursor.read_u8().unwrap(), 0x01);
        assert_eq!(cursor.read_u16().unwrap(), 0x0302);
        assert_eq!(cursor.read_u32().unwrap(), 0x0706_0504);
        assert_eq!(cursor.index(), 7);
        assert_eq!(cursor.read_bytes::<4>().unwrap(), [0x08, 0x09, 0x0a, 0x0b]);

        // Only 4 bytes left, a failed read leaves the cursor alone
        assert!(cursor.read_u64().is_err());
        assert_eq!(cursor.index(), 11);
    }

    #[test]
    fn skip_is_bounds_checked() {
        let mut src = MemorySource::new(vec![0; 4]);
        let mut cursor = SourceCursor::new(&mut src);

        cursor.skip(3).unwrap();
        assert!(matches!(
            cursor.skip(2),
            Err(ContainerError::InvalidOffset { offset: 3, count: 2, size: 4 })
        ));
    }
}
