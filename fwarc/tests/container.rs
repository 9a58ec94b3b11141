use proptest::prelude::*;

use fwarc::checksum::{CHECKSUM_COMPONENT, CHECKSUM_LEN};
use fwarc::descriptor::DESCRIPTOR_SIZE;
use fwarc::{
    encode_to_vec, ComponentDescriptor, ComponentFlags, Decoder, FirmwareComponent, HeaderFlags,
    MemoryComponent,
};
use fwcore::buf::is_aligned;
use fwcore::guid::{ModelGuid, OrganizationId};
use fwcore::hash::Checksum;
use fwcore::ContainerError;

fn boxed(components: &[MemoryComponent]) -> Vec<Box<dyn FirmwareComponent>> {
    components
        .iter()
        .cloned()
        .map(|c| Box::new(c) as Box<dyn FirmwareComponent>)
        .collect()
}

fn model() -> ModelGuid {
    ModelGuid::new(OrganizationId([0xaa, 0xbb, 0xcc]), 0x1234_5678)
}

fn simple(id: u16, image: &[u8], verify: &[u8]) -> MemoryComponent {
    MemoryComponent::new(
        ComponentDescriptor::new(id, ComponentFlags::empty(), 1, 0, 0),
        image.to_vec(),
        verify.to_vec(),
    )
}

fn encode(components: &[MemoryComponent]) -> Vec<u8> {
    encode_to_vec(HeaderFlags::empty(), vec![model()], boxed(components)).unwrap()
}

// Read every caller component back out, checksum excluded
fn extract(bytes: &[u8]) -> Vec<MemoryComponent> {
    let mut decoder = Decoder::from_bytes(bytes).unwrap();
    let mut out = Vec::new();
    decoder
        .with_components(|desc, image, verify| {
            if desc.component != CHECKSUM_COMPONENT {
                out.push(MemoryComponent::new(*desc, image.to_vec(), verify.to_vec()));
            }
            Ok(())
        })
        .unwrap();
    out
}

#[test]
fn empty_component_payload() {
    let bytes = encode(&[simple(7, b"", b"")]);
    let decoder = Decoder::from_bytes(&bytes[..]).unwrap();

    let desc = decoder.component_descriptors()[0];
    assert_eq!(desc.component, 7);
    assert_eq!(
        (desc.image_offset, desc.image_size, desc.verify_offset, desc.verify_size),
        (0, 0, 0, 0)
    );
}

#[test]
fn out_of_range_access() {
    let bytes = encode(&[simple(1, b"abc", b"")]);
    let mut decoder = Decoder::from_bytes(bytes).unwrap();
    assert_eq!(decoder.component_count(), 2);

    assert!(matches!(
        decoder.with_component(5, |_, _, _| Ok(())),
        Err(ContainerError::InvalidComponentIndex { index: 5, .. })
    ));
    assert!(matches!(
        decoder.with_component_id(0xDEAD, |_, _, _| Ok(())),
        Err(ContainerError::UnknownComponent(0xDEAD))
    ));
}

#[test]
fn header_version_mismatch() {
    let mut bytes = encode(&[simple(1, b"abc", b"")]);
    bytes[4..8].copy_from_slice(&0xFFFF_FFFFu32.to_le_bytes());

    assert!(matches!(
        Decoder::from_bytes(bytes),
        Err(ContainerError::UnknownHeaderVersion(0xFFFF_FFFF))
    ));
}

#[test]
fn truncated_container() {
    let bytes = encode(&[simple(1, b"abcdef", b"")]);

    // Header and both descriptors survive, the payloads do not
    let table_end = 24 + 2 * 48;
    assert!(matches!(
        Decoder::from_bytes(&bytes[..table_end + 1]),
        Err(ContainerError::InvalidImageSize { .. })
    ));
}

#[test]
fn missing_checksum_component() {
    let mut bytes = encode(&[simple(1, b"abc", b"")]);

    // Rename the checksum component, its descriptor is the second in the table
    let slot = 24 + 48;
    bytes[slot..slot + 2].copy_from_slice(&0x0002u16.to_le_bytes());

    assert!(matches!(
        Decoder::from_bytes(bytes),
        Err(ContainerError::UnknownComponent(CHECKSUM_COMPONENT))
    ));
}

#[test]
fn duplicate_ids_resolve_first() {
    // Not producible by the encoder, patch the second id to match the first
    let mut bytes = encode_to_vec(
        HeaderFlags::empty(),
        vec![model()],
        boxed(&[simple(1, b"first", b""), simple(2, b"second", b"")]),
    )
    .unwrap();
    let slot = 24 + 48;
    bytes[slot..slot + 2].copy_from_slice(&1u16.to_le_bytes());

    let mut decoder = Decoder::new_unverified(fwcore::mem::MemorySource::new(bytes)).unwrap();
    decoder
        .with_component_id(1, |_, image, _| {
            assert_eq!(image, b"first");
            Ok(())
        })
        .unwrap();
}

const EXTENSION: u64 = 8;

// Same container as a newer writer would emit it: extension bytes after the
// known header fields, everything behind them shifted along
fn with_header_extension(bytes: &[u8]) -> Vec<u8> {
    let decoder = Decoder::from_bytes(bytes).unwrap();
    let header = decoder.header().clone();
    let table_end = header.header_size as usize + decoder.component_count() * DESCRIPTOR_SIZE;

    let shift = |offset: u64| if offset == 0 { 0 } else { offset + EXTENSION };
    let descriptors: Vec<ComponentDescriptor> = decoder
        .component_descriptors()
        .iter()
        .map(|desc| {
            let mut desc = *desc;
            desc.image_offset = shift(desc.image_offset);
            desc.verify_offset = shift(desc.verify_offset);
            desc
        })
        .collect();

    let mut extended = header.clone();
    extended.header_size += EXTENSION as u16;

    let mut out = extended.to_bytes();
    out.extend_from_slice(&[0xEE; EXTENSION as usize]);
    for desc in descriptors.iter() {
        out.extend_from_slice(&desc.to_bytes());
    }
    out.extend_from_slice(&bytes[table_end..]);

    // Known header fields as version 1 encodes them, then the table order
    let mut hash = Checksum::new();
    hash.update(&header.to_bytes());
    for desc in descriptors.iter() {
        hash.update(&desc.to_bytes());
        if desc.component != CHECKSUM_COMPONENT {
            hash.update(&out[desc.image_offset as usize..][..desc.image_size as usize]);
            hash.update(&out[desc.verify_offset as usize..][..desc.verify_size as usize]);
        }
    }
    let digest = hash.finalize();

    let checksum = descriptors
        .iter()
        .find(|desc| desc.component == CHECKSUM_COMPONENT)
        .unwrap();
    out[checksum.verify_offset as usize..][..CHECKSUM_LEN].copy_from_slice(&digest);
    out
}

fn two_components() -> Vec<u8> {
    encode_to_vec(
        HeaderFlags::empty(),
        vec![model()],
        boxed(&[simple(1, b"abc", b"sig"), simple(2, b"", b"defgh")]),
    )
    .unwrap()
}

#[test]
fn extended_header_verifies() {
    let extended = with_header_extension(&two_components());
    let mut decoder = Decoder::from_bytes(&extended[..]).unwrap();

    assert!(decoder.is_verified());
    assert_eq!(decoder.header().header_size, 24 + EXTENSION as u16);
    decoder
        .with_component_id(1, |_, image, verify| {
            assert_eq!(image, b"abc");
            assert_eq!(verify, b"sig");
            Ok(())
        })
        .unwrap();
    decoder
        .with_component_id(2, |_, image, verify| {
            assert!(image.is_empty());
            assert_eq!(verify, b"defgh");
            Ok(())
        })
        .unwrap();
}

#[test]
fn extension_bytes_outside_digest() {
    let mut extended = with_header_extension(&two_components());
    extended[24] ^= 0xff;
    assert!(Decoder::from_bytes(&extended[..]).is_ok());

    // The known fields still are
    extended[10] ^= 0x01;
    assert!(matches!(
        Decoder::from_bytes(&extended[..]),
        Err(ContainerError::ChecksumVerificationFailed)
    ));
}

fn component_strategy() -> impl Strategy<Value = (u16, u32, u32, u32, Vec<u8>, Vec<u8>)> {
    (
        any::<u16>(),
        any::<u32>(),
        any::<u32>(),
        any::<u32>(),
        prop::collection::vec(any::<u8>(), 0..40),
        prop::collection::vec(any::<u8>(), 0..24),
    )
}

fn container_strategy(
) -> impl Strategy<Value = (HeaderFlags, Vec<ModelGuid>, Vec<MemoryComponent>)> {
    (
        any::<u16>(),
        prop::collection::vec((any::<u8>(), any::<[u8; 3]>(), any::<u32>()), 1..4),
        prop::collection::vec(component_strategy(), 0..5),
    )
        .prop_map(|(flags, models, components)| {
            let models = models
                .into_iter()
                .map(|(reserved, mfr, code)| ModelGuid {
                    reserved,
                    mfr_code: OrganizationId(mfr),
                    model_code: code,
                })
                .collect();

            // Identifiers are unique by position
            let components = components
                .into_iter()
                .enumerate()
                .map(|(i, (flags, major, minor, build, image, verify))| {
                    let desc = ComponentDescriptor::new(
                        i as u16 + 1,
                        ComponentFlags::from_bits_retain(flags),
                        major,
                        minor,
                        build,
                    );
                    MemoryComponent::new(desc, image, verify)
                })
                .collect();

            (HeaderFlags::from_bits_retain(flags), models, components)
        })
}

// Byte ranges the checksum covers, everything else is padding
fn covered(bytes: &[u8]) -> Vec<usize> {
    let decoder = Decoder::from_bytes(bytes).unwrap();
    let table_end = decoder.header().header_size as usize + decoder.component_count() * 48;

    let mut out: Vec<usize> = (0..table_end).collect();
    for desc in decoder.component_descriptors() {
        out.extend(desc.image_offset as usize..(desc.image_offset + desc.image_size) as usize);
        out.extend(desc.verify_offset as usize..(desc.verify_offset + desc.verify_size) as usize);
    }
    out
}

proptest! {
    #[test]
    fn round_trip((flags, models, components) in container_strategy()) {
        let bytes = encode_to_vec(flags, models.clone(), boxed(&components)).unwrap();
        let decoder = Decoder::from_bytes(&bytes[..]).unwrap();

        prop_assert_eq!(decoder.header().header_flags, flags);
        prop_assert_eq!(&decoder.header().models, &models);
        prop_assert_eq!(decoder.component_count(), components.len() + 1);

        let decoded = extract(&bytes);
        prop_assert_eq!(decoded.len(), components.len());
        for (have, want) in decoded.iter().zip(components.iter()) {
            prop_assert_eq!(have.descriptor.component, want.descriptor.component);
            prop_assert_eq!(have.descriptor.flags, want.descriptor.flags);
            prop_assert_eq!(
                (have.descriptor.major, have.descriptor.minor, have.descriptor.build),
                (want.descriptor.major, want.descriptor.minor, want.descriptor.build)
            );
            prop_assert_eq!(&have.image, &want.image);
            prop_assert_eq!(&have.verify, &want.verify);
        }
    }

    #[test]
    fn offsets_aligned_and_in_bounds((flags, models, components) in container_strategy()) {
        let bytes = encode_to_vec(flags, models, boxed(&components)).unwrap();
        let decoder = Decoder::from_bytes(&bytes[..]).unwrap();
        let total = bytes.len() as u64;
        let table_end = decoder.header().header_size as u64 + decoder.component_count() as u64 * 48;

        let mut regions = Vec::new();
        for desc in decoder.component_descriptors() {
            let regions_of = [
                (desc.image_offset, desc.image_size),
                (desc.verify_offset, desc.verify_size),
            ];
            for (offset, size) in regions_of {
                prop_assert!(offset + size <= total);
                if size != 0 {
                    prop_assert!(is_aligned(offset));
                    prop_assert!(offset >= table_end);
                    regions.push((offset, offset + size));
                }
            }
        }

        regions.sort();
        for pair in regions.windows(2) {
            prop_assert!(pair[0].1 <= pair[1].0);
        }
    }

    #[test]
    fn re_encode_is_identical((flags, models, components) in container_strategy()) {
        let first = encode_to_vec(flags, models.clone(), boxed(&components)).unwrap();
        let second = encode_to_vec(flags, models, boxed(&extract(&first))).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn any_covered_flip_fails(
        (flags, models, components) in container_strategy(),
        pick in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let mut bytes = encode_to_vec(flags, models, boxed(&components)).unwrap();
        let covered = covered(&bytes);
        let at = covered[pick.index(covered.len())];

        bytes[at] ^= 1 << bit;
        prop_assert!(Decoder::from_bytes(&bytes[..]).is_err());
    }

    #[test]
    fn payload_flip_fails_checksum(
        (flags, models, components) in container_strategy(),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut bytes = encode_to_vec(flags, models, boxed(&components)).unwrap();
        let table_end = {
            let decoder = Decoder::from_bytes(&bytes[..]).unwrap();
            decoder.header().header_size as usize + decoder.component_count() * 48
        };

        let payload: Vec<usize> = covered(&bytes).into_iter().filter(|&i| i >= table_end).collect();
        let at = payload[pick.index(payload.len())];

        bytes[at] ^= 0xff;
        prop_assert!(matches!(
            Decoder::from_bytes(&bytes[..]),
            Err(ContainerError::ChecksumVerificationFailed)
        ));
    }
}
