//! Transports a container can be read from or written to.
//!
//! Sources are named by a [`Locator`]: a filesystem path, an
//! `s3://bucket/key` object when built with the `s3` feature, or an
//! `http(s)://` URL when built with the `http` feature.
pub mod file;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "s3")]
pub mod s3;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use log::info;

use fwcore::io::ByteSource;
use fwcore::ContainerError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Locator {
    Path(PathBuf),
    S3 { bucket: String, key: String },
    Http(String),
}

#[cfg(any(feature = "s3", feature = "http"))]
pub(crate) fn remote_err<E: fmt::Display>(e: E) -> ContainerError {
    ContainerError::Remote(e.to_string())
}

impl FromStr for Locator {
    type Err = ContainerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix("http://").or_else(|| s.strip_prefix("https://")) {
            if rest.is_empty() {
                return Err(ContainerError::InvalidParameter(format!("missing host in {:?}", s)));
            }
            return Ok(Locator::Http(s.to_string()));
        }

        let Some(rest) = s.strip_prefix("s3://") else {
            return Ok(Locator::Path(PathBuf::from(s)));
        };

        match rest.split_once('/') {
            Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => Ok(Locator::S3 {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            _ => Err(ContainerError::InvalidParameter(format!(
                "expected s3://bucket/key, got {:?}",
                s
            ))),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Path(path) => write!(f, "{}", path.display()),
            Locator::S3 { bucket, key } => write!(f, "s3://{}/{}", bucket, key),
            Locator::Http(url) => write!(f, "{}", url),
        }
    }
}

/// Open the container behind `locator` for reading.
///
/// `endpoint` overrides the S3 endpoint, it is ignored otherwise.
pub fn open(
    locator: &Locator,
    endpoint: Option<&str>,
) -> Result<Box<dyn ByteSource>, ContainerError> {
    info!("opening {}", locator);

    match locator {
        Locator::Path(path) => Ok(Box::new(file::FileSource::open(path)?)),

        #[cfg(feature = "s3")]
        Locator::S3 { bucket, key } => Ok(Box::new(s3::fetch(bucket, key, endpoint)?)),

        #[cfg(not(feature = "s3"))]
        Locator::S3 { .. } => {
            let _ = endpoint;
            Err(ContainerError::InvalidParameter(format!(
                "{} needs a build with the s3 feature",
                locator
            )))
        }

        #[cfg(feature = "http")]
        Locator::Http(url) => Ok(Box::new(http::fetch(url)?)),

        #[cfg(not(feature = "http"))]
        Locator::Http(_) => Err(ContainerError::InvalidParameter(format!(
            "{} needs a build with the http feature",
            locator
        ))),
    }
}
