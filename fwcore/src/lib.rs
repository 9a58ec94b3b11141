//! Shared primitives for the firmware image container crates.
//!
//! Everything that both the codec (`fwarc`) and the transports (`remote`)
//! need lives here: the error taxonomy, the byte source/sink contract, the
//! in-memory buffers, the aggregate digest and the fixed-width identifiers.
pub mod buf;
pub mod error;
pub mod guid;
pub mod hash;
pub mod io;
pub mod mem;

pub use error::ContainerError;
