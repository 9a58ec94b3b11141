use log::info;

use fwcore::mem::MemorySource;
use fwcore::ContainerError;

use crate::remote_err;

/// GET `url` and serve the body from memory.
///
/// Non-success statuses are reported as [`ContainerError::Remote`].
pub fn fetch(url: &str) -> Result<MemorySource<Vec<u8>>, ContainerError> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let data = rt.block_on(async {
        let res = reqwest::get(url)
            .await
            .map_err(remote_err)?
            .error_for_status()
            .map_err(remote_err)?;

        let body = res.bytes().await.map_err(remote_err)?;
        Ok::<_, ContainerError>(body.to_vec())
    })?;

    info!("fetched {} ({} bytes)", url, data.len());
    Ok(MemorySource::new(data))
}
