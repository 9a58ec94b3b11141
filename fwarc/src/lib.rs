//! Firmware Image Container format
//!
//! A container bundles one or more versioned firmware components (an image
//! plus detached verify data each) under a single header, and carries a
//! built-in SHA-512 digest over the whole container, itself included.
//!
//! Unless other wise noted everything is stored in Little Endian format.
//!
//! # Top Level
//!
//! | Section     | Size               | Description |
//! | ----------- | ------------------ | ----------- |
//! | Header      | `header_size`      | Container wide metadata, see [`header::Header`] |
//! | Descriptors | 48 x `component_count` | One [`descriptor::ComponentDescriptor`] per component |
//! | Payloads    | variable           | For each component in table order: image then verify data |
//!
//! ## Header
//!
//! | Type      | Name            | Description |
//! | --------: | --------------- | ----------- |
//! | u32       | magic           | `0xCFF1A00C` |
//! | u32       | version         | Header version, currently `1` |
//! | u16       | header_size     | `16 + 8 x model_count`, readers skip anything past that |
//! | u16       | flags           | Header flags, no bits defined yet |
//! | u16       | model_count     | Must be at least 1 |
//! | u16       | component_count | Includes the checksum component |
//! | [u8; 8] x N | models        | Target models, see [`fwcore::guid::ModelGuid`] |
//!
//! ## Component Descriptor
//!
//! | Type | Name          | Description |
//! | ---: | ------------- | ----------- |
//! | u16  | component     | Component identifier |
//! | u16  | flags         | `LOCAL`, `CRITICAL`, `SUPPORTS_UNSEQUENCED` |
//! | u32  | major         | |
//! | u32  | minor         | |
//! | u32  | build         | |
//! | u64  | image_offset  | `0` together with a `0` size means absent |
//! | u64  | image_size    | |
//! | u64  | verify_offset | |
//! | u64  | verify_size   | |
//!
//! ## Payloads
//!
//! Every non-empty image or verify region starts on an 8 byte boundary,
//! gaps are filled with [`fwcore::buf::PAD_BYTE`]. Padding is not covered
//! by the checksum.
//!
//! ## Aggregate Checksum
//!
//! The encoder always appends a component with the reserved identifier
//! [`checksum::CHECKSUM_COMPONENT`]. Its image is empty and its verify data
//! is `SHA512(header || for each descriptor: descriptor || image || verify)`
//! where image and verify of the checksum component itself are skipped. The
//! header is digested as re-encoded by this version (see
//! [`header::Header::to_canonical_bytes`]), extension bytes past the known
//! fields are not covered. The digest length is fixed so the layout can be
//! resolved before the digest content is known.
pub mod checksum;
pub mod component;
pub mod decoder;
pub mod descriptor;
pub mod encoder;
pub mod header;

pub use component::{FirmwareComponent, MemoryComponent};
pub use decoder::Decoder;
pub use descriptor::{ComponentDescriptor, ComponentFlags};
pub use encoder::{encode_to_vec, Encoder, Layout};
pub use header::{Header, HeaderFlags};
