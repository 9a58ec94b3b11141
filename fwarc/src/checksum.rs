use fwcore::guid::ComponentId;
use fwcore::hash::{Checksum, DIGEST_LEN};

use crate::descriptor::ComponentDescriptor;

// Reserved identifier of the aggregate checksum component
pub const CHECKSUM_COMPONENT: ComponentId = 0x8001;

// Size of the checksum verify data, fixed before its content is known
pub const CHECKSUM_LEN: usize = DIGEST_LEN;

// Identity of the synthesized component, offsets filled in by layout
pub fn checksum_descriptor() -> ComponentDescriptor {
    ComponentDescriptor {
        component: CHECKSUM_COMPONENT,
        ..Default::default()
    }
}

/// Feeds the container to SHA-512 in canonical order.
///
/// `SHA512(header || for each descriptor: descriptor || image || verify)`,
/// the checksum component contributes only its descriptor.
pub struct AggregateDigest {
    hash: Checksum,
}

impl AggregateDigest {
    pub fn new(header: &[u8]) -> Self {
        let mut hash = Checksum::new();
        hash.update(header);
        AggregateDigest { hash }
    }

    // Returns whether the payloads of this component are part of the digest
    pub fn descriptor(&mut self, descriptor: &ComponentDescriptor) -> bool {
        self.hash.update(&descriptor.to_bytes());
        descriptor.component != CHECKSUM_COMPONENT
    }

    pub fn payload(&mut self, data: &[u8]) {
        self.hash.update(data);
    }

    pub fn finalize(self) -> [u8; CHECKSUM_LEN] {
        self.hash.finalize()
    }
}
