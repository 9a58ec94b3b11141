use std::fmt;
use std::str::FromStr;

use crate::error::ContainerError;

// Component identifier as carried in a descriptor
pub type ComponentId = u16;

// Three byte organization (manufacturer) code, opaque to the container
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct OrganizationId(pub [u8; 3]);

/// Identifies one device model a container targets.
///
/// On the wire this is `reserved(1) | mfr_code(3) | model_code(4, LE)`.
/// The text form is 16 hex digits with the model code written big endian,
/// so `0001020304050607` is reserved `0x00`, manufacturer `01 02 03` and
/// model `0x04050607`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ModelGuid {
    pub reserved: u8,
    pub mfr_code: OrganizationId,
    pub model_code: u32,
}

impl ModelGuid {
    pub const LEN: usize = 8;

    pub fn new(mfr_code: OrganizationId, model_code: u32) -> Self {
        ModelGuid {
            reserved: 0,
            mfr_code,
            model_code,
        }
    }

    pub fn to_bytes(&self) -> [u8; ModelGuid::LEN] {
        let mut out = [0u8; ModelGuid::LEN];
        out[0] = self.reserved;
        out[1..4].copy_from_slice(&self.mfr_code.0);
        out[4..8].copy_from_slice(&self.model_code.to_le_bytes());
        out
    }

    pub fn from_bytes(buf: &[u8; ModelGuid::LEN]) -> Self {
        ModelGuid {
            reserved: buf[0],
            mfr_code: OrganizationId([buf[1], buf[2], buf[3]]),
            model_code: u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
        }
    }
}

impl fmt::Display for ModelGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}{}{:08x}",
            self.reserved,
            hex::encode(self.mfr_code.0),
            self.model_code
        )
    }
}

impl FromStr for ModelGuid {
    type Err = ContainerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = hex::decode(s.trim_start_matches("0x"))
            .map_err(|e| ContainerError::InvalidParameter(format!("model guid {:?}: {}", s, e)))?;

        let raw: [u8; ModelGuid::LEN] = raw.try_into().map_err(|_| {
            ContainerError::InvalidParameter(format!("model guid {:?} is not 8 bytes", s))
        })?;

        Ok(ModelGuid {
            reserved: raw[0],
            mfr_code: OrganizationId([raw[1], raw[2], raw[3]]),
            model_code: u32::from_be_bytes([raw[4], raw[5], raw[6], raw[7]]),
        })
    }
}
