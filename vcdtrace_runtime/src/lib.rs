#![deny(unsafe_code)]
#![deny(clippy::all)]

//! Runtime half of vcdtrace: traced value cells, the VCD wire encoding, and the [`Tracer`] that
//! merges buffered samples into timestamped value-change sections.

mod data;
mod history;
mod registry;
mod render;
mod sequence;
mod tracer;
mod value;
pub mod wire;

// Re-exports
pub use data::*;
pub use history::*;
pub use registry::*;
pub use render::*;
pub use sequence::*;
pub use tracer::*;
pub use value::*;
pub use wire::Encoding;

pub use vcdtrace_core::{Identifier, Tick, Timescale, VarKind};

#[derive(thiserror::Error, Debug)]
pub enum RuntimeError {
    #[error("Invalid width {width}, must be within 1..={natural}")]
    InvalidWidth { width: u32, natural: u32 },

    #[error("History depth must be at least 1")]
    ZeroDepth,

    #[error("A history depth of {depth} requires a sequence counter")]
    MissingSequenceCounter { depth: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
