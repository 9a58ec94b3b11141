use std::ffi::OsString;
use std::path::{Path, PathBuf};

use log::{info, warn};

use fwarc::Decoder;
use remote::file::AtomicFile;
use remote::Locator;

use crate::error::CliError;

fn sig_path(output: &Path) -> PathBuf {
    let mut name = OsString::from(output.as_os_str());
    name.push(".sig");
    PathBuf::from(name)
}

/// Write the image of component `index` to `output`, and its verify data
/// (if any) next to it with a `.sig` suffix.
pub fn run(
    locator: &Locator,
    index: usize,
    output: &Path,
    endpoint: Option<&str>,
) -> Result<(), CliError> {
    let source = remote::open(locator, endpoint)?;
    let mut decoder = Decoder::new(source)?;

    // Index is checked before the closure runs, nothing is created on a bad index
    decoder.with_component(index, |desc, image, verify| {
        let mut image_out = AtomicFile::create(output)?;
        image_out.write_all(image)?;

        let verify_out = if verify.is_empty() {
            None
        } else {
            let mut out = AtomicFile::create(sig_path(output))?;
            out.write_all(verify)?;
            Some(out)
        };

        image_out.commit()?;
        if let Some(out) = verify_out {
            // Both files or neither
            if let Err(e) = out.commit() {
                if let Err(cleanup) = std::fs::remove_file(output) {
                    warn!("could not remove {}: {}", output.display(), cleanup);
                }
                return Err(e);
            }
        }

        info!(
            "extracted component {:#06x} ({} image, {} verify bytes)",
            desc.component,
            image.len(),
            verify.len()
        );
        Ok(())
    })?;

    Ok(())
}
