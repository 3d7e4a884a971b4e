//! Core types shared between the elaboration-time builder and the runtime tracer.
#![deny(unsafe_code)]
#![deny(clippy::all)]

mod ident;
mod time;
mod var;

pub use crate::time::*;
pub use ident::*;
pub use var::*;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Identifier space exhausted: all {digits}-digit identifiers are allocated")]
    IdentifiersExhausted { digits: usize },

    #[error("Unsupported timescale: '{0}'")]
    InvalidTimescale(String),
}
