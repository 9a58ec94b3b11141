use std::fs;
use std::path::Path;

use log::{debug, info};

use fwarc::{
    encode_to_vec, ComponentDescriptor, ComponentFlags, FirmwareComponent, HeaderFlags,
    MemoryComponent,
};
use fwcore::guid::ModelGuid;
use remote::file::AtomicFile;

use crate::cli::Manifest;
use crate::error::CliError;

// Missing path means an empty payload
fn read_payload(base: &Path, path: Option<&Path>) -> Result<Vec<u8>, CliError> {
    match path {
        None => Ok(Vec::new()),
        Some(path) => {
            let full = base.join(path);
            debug!("reading {}", full.display());
            Ok(fs::read(full)?)
        }
    }
}

/// Encode the container described by the manifest at `manifest_path`.
pub fn build(manifest_path: &Path) -> Result<Vec<u8>, CliError> {
    let manifest: Manifest = toml::from_str(&fs::read_to_string(manifest_path)?)?;
    let base = manifest_path.parent().unwrap_or(Path::new("."));

    let models = manifest
        .models
        .iter()
        .map(|m| m.parse::<ModelGuid>())
        .collect::<Result<Vec<_>, _>>()?;

    let mut components: Vec<Box<dyn FirmwareComponent>> =
        Vec::with_capacity(manifest.components.len());
    for entry in manifest.components.iter() {
        let flags = entry
            .flags
            .iter()
            .fold(ComponentFlags::empty(), |acc, &f| acc | ComponentFlags::from(f));
        let [major, minor, build] = entry.version;

        components.push(Box::new(MemoryComponent::new(
            ComponentDescriptor::new(entry.id, flags, major, minor, build),
            read_payload(base, entry.image.as_deref())?,
            read_payload(base, entry.verify.as_deref())?,
        )));
    }

    Ok(encode_to_vec(
        HeaderFlags::from_bits_retain(manifest.flags),
        models,
        components,
    )?)
}

pub fn run(manifest_path: &Path, output: &Path) -> Result<(), CliError> {
    let bytes = build(manifest_path)?;

    let mut out = AtomicFile::create(output)?;
    out.write_all(&bytes)?;
    out.commit()?;

    info!("packed {} ({} bytes)", output.display(), bytes.len());
    Ok(())
}
