use thiserror::Error;

use fwcore::ContainerError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Container(#[from] ContainerError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("manifest: {0}")]
    Manifest(#[from] toml::de::Error),
    #[error("{failed} of {total} containers failed")]
    Failed { failed: usize, total: usize },
}
