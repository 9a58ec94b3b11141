use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Deserialize;

use fwarc::ComponentFlags;
use remote::Locator;

#[derive(Parser)]
#[command(name = "ocafw")]
#[command(about = "Inspect, unpack and build firmware image containers")]
#[command(author, version, long_about = None)]
pub struct Cli {
    /// Log debug output, RUST_LOG takes precedence
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// S3 endpoint for s3:// locators
    #[arg(long, global = true, value_name = "URL")]
    pub endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the header and component table of containers
    Dump {
        /// Path, s3://bucket/key or http(s):// URL
        #[arg(required = true)]
        locators: Vec<Locator>,
    },

    /// Write one component's image (and verify data to <OUTPUT>.sig)
    Extract {
        locator: Locator,

        /// Position in the component table
        index: usize,

        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Build a container from a TOML manifest
    Pack {
        manifest: PathBuf,

        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
}

// Pack manifest, paths are relative to the manifest itself
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub flags: u16,
    pub models: Vec<String>,

    #[serde(default)]
    pub components: Vec<ManifestComponent>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct ManifestComponent {
    pub id: u16,

    #[serde(default)]
    pub flags: Vec<FlagName>,

    // major, minor, build
    #[serde(default)]
    pub version: [u32; 3],

    pub image: Option<PathBuf>,
    pub verify: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FlagName {
    Local,
    Critical,
    SupportsUnsequenced,
}

impl From<FlagName> for ComponentFlags {
    fn from(flag: FlagName) -> Self {
        match flag {
            FlagName::Local => ComponentFlags::LOCAL,
            FlagName::Critical => ComponentFlags::CRITICAL,
            FlagName::SupportsUnsequenced => ComponentFlags::SUPPORTS_UNSEQUENCED,
        }
    }
}
