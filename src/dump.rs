use std::io::Write;

use log::warn;

use fwarc::Decoder;
use fwcore::io::ByteSource;
use remote::Locator;

use crate::error::CliError;

/// Dump every locator, carrying on past failures.
pub fn run<W: Write>(
    out: &mut W,
    locators: &[Locator],
    endpoint: Option<&str>,
) -> Result<(), CliError> {
    let mut failed = 0;

    for locator in locators {
        writeln!(out, "{}:", locator)?;

        let res = remote::open(locator, endpoint)
            .map_err(CliError::from)
            .and_then(|source| dump(&mut *out, source));

        if let Err(e) = res {
            warn!("{}: {}", locator, e);
            writeln!(out, "  error: {}", e)?;
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(CliError::Failed {
            failed,
            total: locators.len(),
        });
    }
    Ok(())
}

// Print as much as parsed before checking the digest
fn dump<W: Write, S: ByteSource>(out: &mut W, source: S) -> Result<(), CliError> {
    let mut decoder = Decoder::new_unverified(source)?;
    let header = decoder.header();

    writeln!(
        out,
        "  version {}, flags {:#06x}, {} models, {} components",
        header.header_version,
        header.header_flags.bits(),
        header.models.len(),
        header.component_count
    )?;
    for model in header.models.iter() {
        writeln!(out, "  model {}", model)?;
    }

    for (index, desc) in decoder.component_descriptors().iter().enumerate() {
        writeln!(
            out,
            "  [{}] component {:#06x} flags {:#06x} version {}.{}.{}",
            index, desc.component, desc.flags.bits(), desc.major, desc.minor, desc.build
        )?;
        writeln!(
            out,
            "      image {:#x}+{:#x} verify {:#x}+{:#x}",
            desc.image_offset, desc.image_size, desc.verify_offset, desc.verify_size
        )?;
    }

    decoder.verify_aggregate_image_checksum()?;
    writeln!(out, "  checksum ok")?;
    Ok(())
}
