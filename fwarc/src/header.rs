use std::fmt;

use bitflags::bitflags;
use byteorder::{ByteOrder, LittleEndian};
use log::debug;

use fwcore::guid::ModelGuid;
use fwcore::io::{ByteSink, ByteSource, SourceCursor};
use fwcore::ContainerError;

pub const MAGIC_NUMBER: u32 = 0xCFF1_A00C;
pub const HEADER_VERSION_1: u32 = 1;

// magic(4) version(4) header_size(2) flags(2) model_count(2) component_count(2)
pub const HEADER_BASE_SIZE: u16 = 16;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct HeaderFlags: u16 {
        // No bits are defined yet, keep whatever the writer set
        const _ = !0;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub header_version: u32,
    pub header_size: u16,
    pub header_flags: HeaderFlags,
    pub component_count: u16,
    pub models: Vec<ModelGuid>,
}

impl Header {
    pub fn new(
        header_flags: HeaderFlags,
        models: Vec<ModelGuid>,
        component_count: u16,
    ) -> Result<Self, ContainerError> {
        if models.is_empty() {
            return Err(ContainerError::InvalidModelCount);
        }
        let header_size = Header::size_for(models.len()).ok_or_else(|| {
            ContainerError::InvalidParameter(format!("{} models do not fit a header", models.len()))
        })?;

        Ok(Header {
            header_version: HEADER_VERSION_1,
            header_size,
            header_flags,
            component_count,
            models,
        })
    }

    /// Size of the known header fields for `model_count` models, `None` if
    /// it does not fit the 16 bit size field.
    pub fn size_for(model_count: usize) -> Option<u16> {
        let models = u16::try_from(model_count).ok()?;
        models
            .checked_mul(ModelGuid::LEN as u16)?
            .checked_add(HEADER_BASE_SIZE)
    }

    pub fn model_count(&self) -> u16 {
        self.models.len() as u16
    }

    // Known fields only, header_size is written as stored
    pub fn to_bytes(&self) -> Vec<u8> {
        let base = HEADER_BASE_SIZE as usize;
        let mut out = vec![0u8; base + self.models.len() * ModelGuid::LEN];

        LittleEndian::write_u32(&mut out[0..4], MAGIC_NUMBER);
        LittleEndian::write_u32(&mut out[4..8], self.header_version);
        LittleEndian::write_u16(&mut out[8..10], self.header_size);
        LittleEndian::write_u16(&mut out[10..12], self.header_flags.bits());
        LittleEndian::write_u16(&mut out[12..14], self.model_count());
        LittleEndian::write_u16(&mut out[14..16], self.component_count);

        for (model, slot) in self.models.iter().zip(out[base..].chunks_exact_mut(ModelGuid::LEN)) {
            slot.copy_from_slice(&model.to_bytes());
        }
        out
    }

    /// Known fields with `header_size` reset to the size derived from the
    /// model count, i.e. what this writer would have produced. Extension
    /// bytes of a newer writer are neither kept nor counted.
    pub fn to_canonical_bytes(&self) -> Vec<u8> {
        let mut out = self.to_bytes();
        if let Some(size) = Header::size_for(self.models.len()) {
            LittleEndian::write_u16(&mut out[8..10], size);
        }
        out
    }

    pub fn encode<K: ByteSink + ?Sized>(&self, sink: &mut K) -> Result<(), ContainerError> {
        sink.write(&self.to_bytes(), None)
    }

    pub fn decode<S: ByteSource + ?Sized>(
        cursor: &mut SourceCursor<'_, S>,
    ) -> Result<Self, ContainerError> {
        let start = cursor.index();

        let magic = cursor.read_u32()?;
        if magic != MAGIC_NUMBER {
            return Err(ContainerError::InvalidMagicNumber(magic));
        }

        let header_version = cursor.read_u32()?;
        if header_version != HEADER_VERSION_1 {
            return Err(ContainerError::UnknownHeaderVersion(header_version));
        }

        let header_size = cursor.read_u16()?;
        if header_size < HEADER_BASE_SIZE {
            return Err(ContainerError::InvalidHeaderSize {
                have: header_size,
                need: HEADER_BASE_SIZE,
            });
        }

        let header_flags = HeaderFlags::from_bits_retain(cursor.read_u16()?);

        let model_count = cursor.read_u16()?;
        if model_count == 0 {
            return Err(ContainerError::InvalidModelCount);
        }

        // The declared size must at least hold every model
        match Header::size_for(model_count as usize) {
            Some(need) if header_size >= need => (),
            need => {
                return Err(ContainerError::InvalidHeaderSize {
                    have: header_size,
                    need: need.unwrap_or(u16::MAX),
                })
            }
        }

        let component_count = cursor.read_u16()?;

        let mut models = Vec::with_capacity(model_count as usize);
        for _ in 0..model_count {
            models.push(ModelGuid::from_bytes(&cursor.read_bytes::<{ ModelGuid::LEN }>()?));
        }

        // Skip any fields a newer writer appended
        let consumed = cursor.index() - start;
        let unknown = header_size as u64 - consumed;
        if unknown > 0 {
            debug!("skipping {} unknown header bytes", unknown);
            cursor.skip(unknown)?;
        }

        Ok(Header {
            header_version,
            header_size,
            header_flags,
            component_count,
            models,
        })
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Header(version: {:#010x}, size: {}, flags: {:#06x}, components: {}, models: [",
            self.header_version,
            self.header_size,
            self.header_flags.bits(),
            self.component_count
        )?;
        for (i, model) in self.models.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", model)?;
        }
        write!(f, "])")
    }
}
