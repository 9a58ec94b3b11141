use std::collections::HashSet;

use log::debug;

use fwcore::buf::align_up;
use fwcore::guid::ModelGuid;
use fwcore::io::ByteSink;
use fwcore::mem::MemorySink;
use fwcore::ContainerError;

use crate::checksum::{checksum_descriptor, AggregateDigest, CHECKSUM_COMPONENT, CHECKSUM_LEN};
use crate::component::{DataFn, FirmwareComponent};
use crate::descriptor::{ComponentDescriptor, DESCRIPTOR_SIZE};
use crate::header::{Header, HeaderFlags};

// Caller supplied components plus the synthesized checksum, always last
enum Slot {
    Supplied(Box<dyn FirmwareComponent>),
    Checksum,
}

impl Slot {
    fn descriptor(&self) -> ComponentDescriptor {
        match self {
            Slot::Supplied(component) => component.descriptor(),
            Slot::Checksum => checksum_descriptor(),
        }
    }
}

/// Resolved descriptor table, one entry per component in table order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    pub descriptors: Vec<ComponentDescriptor>,
    pub total_size: u64,
}

pub struct Encoder {
    header: Header,
    components: Vec<Slot>,
    layout: Option<Layout>,
}

impl Encoder {
    pub fn new(
        header_flags: HeaderFlags,
        models: Vec<ModelGuid>,
        components: Vec<Box<dyn FirmwareComponent>>,
    ) -> Result<Self, ContainerError> {
        // Component count is a u16 and has to hold the checksum component
        let component_count = u16::try_from(components.len() + 1).map_err(|_| {
            ContainerError::InvalidParameter(format!("{} components is too many", components.len()))
        })?;

        let mut seen = HashSet::new();
        for component in components.iter() {
            let id = component.descriptor().component;
            if id == CHECKSUM_COMPONENT {
                return Err(ContainerError::InvalidComponent(format!(
                    "{:#06x} is reserved for the aggregate checksum",
                    id
                )));
            }
            if !seen.insert(id) {
                return Err(ContainerError::InvalidComponent(format!(
                    "duplicate component {:#06x}",
                    id
                )));
            }
        }

        let header = Header::new(header_flags, models, component_count)?;

        let mut components: Vec<Slot> = components.into_iter().map(Slot::Supplied).collect();
        components.push(Slot::Checksum);

        Ok(Encoder {
            header,
            components,
            layout: None,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    // Layout of the last successful encode
    pub fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }

    fn with_image_data(&self, slot: &Slot, body: DataFn<'_>) -> Result<(), ContainerError> {
        match slot {
            Slot::Supplied(component) => component.with_image_data(body),
            Slot::Checksum => body(&[]),
        }
    }

    fn with_verify_data(
        &self,
        slot: &Slot,
        layout: Option<&Layout>,
        body: DataFn<'_>,
    ) -> Result<(), ContainerError> {
        match slot {
            Slot::Supplied(component) => component.with_verify_data(body),
            Slot::Checksum => body(&self.checksum_payload(layout)?),
        }
    }

    // Zero placeholder of the final size until a layout exists
    fn checksum_payload(
        &self,
        layout: Option<&Layout>,
    ) -> Result<[u8; CHECKSUM_LEN], ContainerError> {
        match layout {
            None => Ok([0u8; CHECKSUM_LEN]),
            Some(layout) => self.digest(layout),
        }
    }

    // Re-derives the digest from the in memory components, never from the sink
    fn digest(&self, layout: &Layout) -> Result<[u8; CHECKSUM_LEN], ContainerError> {
        let mut digest = AggregateDigest::new(&self.header.to_canonical_bytes());

        for (slot, descriptor) in self.components.iter().zip(layout.descriptors.iter()) {
            if !digest.descriptor(descriptor) {
                continue;
            }

            let mut feed = |data: &[u8]| -> Result<(), ContainerError> {
                digest.payload(data);
                Ok(())
            };
            if descriptor.has_image() {
                self.with_image_data(slot, &mut feed)?;
            }
            if descriptor.has_verify() {
                self.with_verify_data(slot, Some(layout), &mut feed)?;
            }
        }

        Ok(digest.finalize())
    }

    /// Assign every payload its offset and size.
    ///
    /// Pure function of the payload sizes. The checksum component is sized
    /// by its placeholder so its offsets are final before any digest exists.
    pub fn compute_layout(&self) -> Result<Layout, ContainerError> {
        let table = (self.components.len() * DESCRIPTOR_SIZE) as u64;
        let mut current = self.header.header_size as u64 + table;
        let mut descriptors = Vec::with_capacity(self.components.len());

        for slot in self.components.iter() {
            let mut descriptor = slot.descriptor();

            let mut image_len = 0;
            self.with_image_data(slot, &mut |data: &[u8]| -> Result<(), ContainerError> {
                image_len = data.len() as u64;
                Ok(())
            })?;
            (descriptor.image_offset, descriptor.image_size) = place(&mut current, image_len);

            let mut verify_len = 0;
            self.with_verify_data(slot, None, &mut |data: &[u8]| -> Result<(), ContainerError> {
                verify_len = data.len() as u64;
                Ok(())
            })?;
            (descriptor.verify_offset, descriptor.verify_size) = place(&mut current, verify_len);

            debug!(
                "layout {:#06x}: image {:#x}+{:#x} verify {:#x}+{:#x}",
                descriptor.component,
                descriptor.image_offset,
                descriptor.image_size,
                descriptor.verify_offset,
                descriptor.verify_size
            );
            descriptors.push(descriptor);
        }

        Ok(Layout {
            descriptors,
            total_size: current,
        })
    }

    pub fn encode<K: ByteSink + ?Sized>(&mut self, sink: &mut K) -> Result<(), ContainerError> {
        let layout = self.compute_layout()?;
        self.render(&layout, sink)?;

        debug!("encoded {} components, {} bytes", layout.descriptors.len(), layout.total_size);
        self.layout = Some(layout);
        Ok(())
    }

    fn render<K: ByteSink + ?Sized>(
        &self,
        layout: &Layout,
        sink: &mut K,
    ) -> Result<(), ContainerError> {
        self.header.encode(sink)?;
        let mut slot_offset = sink.index();

        for (slot, descriptor) in self.components.iter().zip(layout.descriptors.iter()) {
            sink.rewind(slot_offset)?;
            descriptor.encode(sink)?;

            if cfg!(debug_assertions) {
                let written = sink.read(DESCRIPTOR_SIZE as u64, slot_offset)?;
                debug_assert_eq!(&written[..], &descriptor.to_bytes()[..]);
            }
            slot_offset += DESCRIPTOR_SIZE as u64;

            if descriptor.has_image() {
                let offset = descriptor.image_offset;
                assert!(offset < layout.total_size, "image offset outside of layout");
                let mut write =
                    |data: &[u8]| -> Result<(), ContainerError> { sink.write(data, Some(offset)) };
                self.with_image_data(slot, &mut write)?;
            }
            if descriptor.has_verify() {
                let offset = descriptor.verify_offset;
                assert!(offset < layout.total_size, "verify offset outside of layout");
                let mut write =
                    |data: &[u8]| -> Result<(), ContainerError> { sink.write(data, Some(offset)) };
                self.with_verify_data(slot, Some(layout), &mut write)?;
            }
        }
        Ok(())
    }

    /// Digest stored in the checksum component, available once encoded.
    pub fn aggregate_checksum(&self) -> Result<[u8; CHECKSUM_LEN], ContainerError> {
        match &self.layout {
            None => Err(ContainerError::EncodingNotBegun),
            Some(layout) => self.digest(layout),
        }
    }
}

// Hand out `len` bytes at the cursor then realign it, empty payloads are (0, 0)
fn place(current: &mut u64, len: u64) -> (u64, u64) {
    if len == 0 {
        return (0, 0);
    }
    let offset = *current;
    *current = align_up(offset + len);
    (offset, len)
}

pub fn encode_to_vec(
    header_flags: HeaderFlags,
    models: Vec<ModelGuid>,
    components: Vec<Box<dyn FirmwareComponent>>,
) -> Result<Vec<u8>, ContainerError> {
    let mut encoder = Encoder::new(header_flags, models, components)?;
    let mut sink = MemorySink::new();
    encoder.encode(&mut sink)?;
    Ok(sink.into_inner())
}
