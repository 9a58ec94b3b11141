use std::fmt;

use bitflags::bitflags;
use byteorder::{ByteOrder, LittleEndian};

use fwcore::guid::ComponentId;
use fwcore::io::{ByteSink, ByteSource, SourceCursor};
use fwcore::ContainerError;

pub const DESCRIPTOR_SIZE: usize = 48;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ComponentFlags: u16 {
        const LOCAL = 1 << 0;
        const CRITICAL = 1 << 1;
        const SUPPORTS_UNSEQUENCED = 1 << 2;

        // Preserve bits a newer writer may define
        const _ = !0;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ComponentDescriptor {
    pub component: ComponentId,
    pub flags: ComponentFlags,

    pub major: u32,
    pub minor: u32,
    pub build: u32,

    // Assigned by the encoder layout, (0, 0) means absent
    pub image_offset: u64,
    pub image_size: u64,
    pub verify_offset: u64,
    pub verify_size: u64,
}

impl ComponentDescriptor {
    pub fn new(
        component: ComponentId,
        flags: ComponentFlags,
        major: u32,
        minor: u32,
        build: u32,
    ) -> Self {
        ComponentDescriptor {
            component,
            flags,
            major,
            minor,
            build,
            ..Default::default()
        }
    }

    pub fn has_image(&self) -> bool {
        self.image_offset != 0
    }

    pub fn has_verify(&self) -> bool {
        self.verify_offset != 0
    }

    pub fn to_bytes(&self) -> [u8; DESCRIPTOR_SIZE] {
        let mut out = [0u8; DESCRIPTOR_SIZE];

        LittleEndian::write_u16(&mut out[0..2], self.component);
        LittleEndian::write_u16(&mut out[2..4], self.flags.bits());
        LittleEndian::write_u32(&mut out[4..8], self.major);
        LittleEndian::write_u32(&mut out[8..12], self.minor);
        LittleEndian::write_u32(&mut out[12..16], self.build);
        LittleEndian::write_u64(&mut out[16..24], self.image_offset);
        LittleEndian::write_u64(&mut out[24..32], self.image_size);
        LittleEndian::write_u64(&mut out[32..40], self.verify_offset);
        LittleEndian::write_u64(&mut out[40..48], self.verify_size);

        out
    }

    pub fn encode<K: ByteSink + ?Sized>(&self, sink: &mut K) -> Result<(), ContainerError> {
        sink.write(&self.to_bytes(), None)
    }

    pub fn decode<S: ByteSource + ?Sized>(
        cursor: &mut SourceCursor<'_, S>,
    ) -> Result<Self, ContainerError> {
        let container = cursor.size();

        let component = cursor.read_u16()?;
        let flags = ComponentFlags::from_bits_retain(cursor.read_u16()?);

        let major = cursor.read_u32()?;
        let minor = cursor.read_u32()?;
        let build = cursor.read_u32()?;

        let image_offset = cursor.read_u64()?;
        let image_size = cursor.read_u64()?;
        if !within(image_offset, image_size, container) {
            return Err(ContainerError::InvalidImageSize {
                offset: image_offset,
                size: image_size,
                container,
            });
        }

        let verify_offset = cursor.read_u64()?;
        let verify_size = cursor.read_u64()?;
        if !within(verify_offset, verify_size, container) {
            return Err(ContainerError::InvalidVerifySize {
                offset: verify_offset,
                size: verify_size,
                container,
            });
        }

        Ok(ComponentDescriptor {
            component,
            flags,
            major,
            minor,
            build,
            image_offset,
            image_size,
            verify_offset,
            verify_size,
        })
    }
}

fn within(offset: u64, size: u64, container: u64) -> bool {
    matches!(offset.checked_add(size), Some(end) if end <= container)
}

impl fmt::Display for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ComponentDescriptor(component: {:#06x}, flags: {:#06x}, version: {}.{}.{})",
            self.component,
            self.flags.bits(),
            self.major,
            self.minor,
            self.build
        )
    }
}
