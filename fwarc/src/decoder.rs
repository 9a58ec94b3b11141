use log::{debug, warn};

use fwcore::guid::ComponentId;
use fwcore::io::{ByteSource, SourceCursor};
use fwcore::mem::MemorySource;
use fwcore::ContainerError;

use crate::checksum::{AggregateDigest, CHECKSUM_COMPONENT};
use crate::descriptor::ComponentDescriptor;
use crate::header::Header;

/// Reader over an encoded container.
///
/// Construction parses the header and the whole descriptor table. Unless
/// built with [`Decoder::new_unverified`] the aggregate checksum is checked
/// before the decoder is handed out, so a decoder that exists is a decoder
/// whose content matched its digest.
pub struct Decoder<S: ByteSource> {
    header: Header,
    descriptors: Vec<ComponentDescriptor>,
    source: S,
    verified: bool,
}

impl<B: AsRef<[u8]>> Decoder<MemorySource<B>> {
    pub fn from_bytes(bytes: B) -> Result<Self, ContainerError> {
        Decoder::new(MemorySource::new(bytes))
    }
}

impl<S: ByteSource> Decoder<S> {
    pub fn new(source: S) -> Result<Self, ContainerError> {
        let mut decoder = Decoder::new_unverified(source)?;
        decoder.verify_aggregate_image_checksum()?;
        decoder.verified = true;
        Ok(decoder)
    }

    // Parse only, the checksum is left for the caller
    pub fn new_unverified(mut source: S) -> Result<Self, ContainerError> {
        let mut cursor = SourceCursor::new(&mut source);
        let header = Header::decode(&mut cursor)?;
        debug!("parsed header: {}", header);

        let mut descriptors = Vec::with_capacity(header.component_count as usize);
        for _ in 0..header.component_count {
            let descriptor = ComponentDescriptor::decode(&mut cursor)?;
            debug!("parsed descriptor: {}", descriptor);
            descriptors.push(descriptor);
        }

        Ok(Decoder {
            header,
            descriptors,
            source,
            verified: false,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn component_descriptors(&self) -> &[ComponentDescriptor] {
        &self.descriptors
    }

    pub fn component_count(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_verified(&self) -> bool {
        self.verified
    }

    pub fn into_inner(self) -> S {
        self.source
    }

    /// Hand the descriptor, image and verify data of the component at
    /// `index` to `f`. The byte slices only live for the call.
    pub fn with_component<T, F>(&mut self, index: usize, f: F) -> Result<T, ContainerError>
    where
        F: FnOnce(&ComponentDescriptor, &[u8], &[u8]) -> Result<T, ContainerError>,
    {
        let descriptor = *self.descriptors.get(index).ok_or(ContainerError::InvalidComponentIndex {
            index,
            count: self.descriptors.len(),
        })?;

        let verify = self
            .source
            .read(descriptor.verify_size, descriptor.verify_offset)?
            .into_owned();
        let image = self.source.read(descriptor.image_size, descriptor.image_offset)?;

        f(&descriptor, &image[..], &verify[..])
    }

    // First match in table order wins
    pub fn with_component_id<T, F>(&mut self, id: ComponentId, f: F) -> Result<T, ContainerError>
    where
        F: FnOnce(&ComponentDescriptor, &[u8], &[u8]) -> Result<T, ContainerError>,
    {
        match self.position(id) {
            Some(index) => self.with_component(index, f),
            None => {
                warn!("no component {:#06x} in container", id);
                Err(ContainerError::UnknownComponent(id))
            }
        }
    }

    pub fn with_components<F>(&mut self, mut f: F) -> Result<(), ContainerError>
    where
        F: FnMut(&ComponentDescriptor, &[u8], &[u8]) -> Result<(), ContainerError>,
    {
        for index in 0..self.descriptors.len() {
            self.with_component(index, &mut f)?;
        }
        Ok(())
    }

    fn position(&self, id: ComponentId) -> Option<usize> {
        self.descriptors.iter().position(|d| d.component == id)
    }

    /// Recompute the container digest from the source and compare it with
    /// the verify data of the checksum component.
    pub fn verify_aggregate_image_checksum(&mut self) -> Result<(), ContainerError> {
        let checksum = self
            .position(CHECKSUM_COMPONENT)
            .map(|index| self.descriptors[index])
            .ok_or_else(|| {
                warn!("container has no checksum component");
                ContainerError::UnknownComponent(CHECKSUM_COMPONENT)
            })?;

        // Re-encoded header, skipped extension bytes are not digested
        let mut digest = AggregateDigest::new(&self.header.to_canonical_bytes());

        for descriptor in self.descriptors.iter() {
            if !digest.descriptor(descriptor) {
                continue;
            }
            digest.payload(&self.source.read(descriptor.image_size, descriptor.image_offset)?);
            digest.payload(&self.source.read(descriptor.verify_size, descriptor.verify_offset)?);
        }
        let computed = digest.finalize();

        let stored = self.source.read(checksum.verify_size, checksum.verify_offset)?;
        if stored[..] != computed[..] {
            warn!("aggregate checksum mismatch");
            return Err(ContainerError::ChecksumVerificationFailed);
        }

        debug!("aggregate checksum verified");
        Ok(())
    }
}
