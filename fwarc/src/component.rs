use std::fmt;

use fwcore::ContainerError;

use crate::descriptor::ComponentDescriptor;

// Scoped read-only view of a payload, only valid for the duration of the call
pub type DataFn<'a> = &'a mut dyn FnMut(&[u8]) -> Result<(), ContainerError>;

/// A component handed to the [`crate::Encoder`].
///
/// The descriptor supplies identity, flags and version. Its offsets and
/// sizes are ignored, the encoder derives them from the payloads.
pub trait FirmwareComponent {
    fn descriptor(&self) -> ComponentDescriptor;
    fn with_image_data(&self, body: DataFn<'_>) -> Result<(), ContainerError>;
    fn with_verify_data(&self, body: DataFn<'_>) -> Result<(), ContainerError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryComponent {
    pub descriptor: ComponentDescriptor,
    pub image: Vec<u8>,
    pub verify: Vec<u8>,
}

impl MemoryComponent {
    pub fn new(descriptor: ComponentDescriptor, image: Vec<u8>, verify: Vec<u8>) -> Self {
        MemoryComponent {
            descriptor,
            image,
            verify,
        }
    }
}

impl FirmwareComponent for MemoryComponent {
    fn descriptor(&self) -> ComponentDescriptor {
        self.descriptor
    }

    fn with_image_data(&self, body: DataFn<'_>) -> Result<(), ContainerError> {
        body(&self.image)
    }

    fn with_verify_data(&self, body: DataFn<'_>) -> Result<(), ContainerError> {
        body(&self.verify)
    }
}

impl fmt::Display for MemoryComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.descriptor, f)
    }
}
