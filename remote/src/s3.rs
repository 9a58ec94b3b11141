use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use log::info;

use fwcore::mem::MemorySource;
use fwcore::ContainerError;

use crate::remote_err;

/// Fetch a whole object and serve it from memory.
///
/// The container is parsed with random access, so the object is pulled
/// once up front instead of issuing a ranged GET per read.
pub fn fetch(
    bucket: &str,
    key: &str,
    endpoint: Option<&str>,
) -> Result<MemorySource<Vec<u8>>, ContainerError> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let client = rt.block_on(connect(endpoint));

    let data = rt.block_on(async {
        let res = client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(remote_err)?;

        let body = res.body.collect().await.map_err(remote_err)?;
        Ok::<_, ContainerError>(body.into_bytes().to_vec())
    })?;

    info!("fetched s3://{}/{} ({} bytes)", bucket, key, data.len());
    Ok(MemorySource::new(data))
}

async fn connect(endpoint: Option<&str>) -> Client {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(endpoint) = endpoint {
        loader = loader.endpoint_url(endpoint);
    }
    let conf = loader.load().await;

    let s3_conf = aws_sdk_s3::config::Builder::from(&conf)
        .force_path_style(endpoint.is_some())
        .build();
    Client::from_conf(s3_conf)
}
