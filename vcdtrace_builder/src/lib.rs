#![deny(unsafe_code)]
#![deny(clippy::all)]

//! Elaboration API for vcdtrace: build the scope tree, bind values to it, and finalize the header
//! into a running [`runtime::Tracer`].

mod env;
mod path;
mod scope;

pub use env::*;
pub use path::*;
pub use scope::*;

use vcdtrace_runtime as runtime;

#[derive(thiserror::Error, Debug)]
pub enum BuilderError {
    #[error("Duplicate Scope Definition: {}.{}", parent_path, scope_name)]
    DuplicateScopeDefinition {
        parent_path: String,
        scope_name: String,
    },

    #[error("Duplicate Var Definition: {0}")]
    DuplicateVarDefinition(String),

    #[error("ScopeKey not found: {0:?}")]
    ScopeKeyNotFound(BuilderScopeKey),

    #[error("A Scope named '{0}' was not found.")]
    NamedScopeNotFound(String),

    #[error("Value '{name}' is already bound as '{identifier}'")]
    AlreadyBound {
        name: String,
        identifier: vcdtrace_core::Identifier,
    },

    #[error("Invalid path or name: '{0}'")]
    InvalidPath(String),

    #[error(transparent)]
    Core(#[from] vcdtrace_core::CoreError),

    #[error(transparent)]
    Runtime(#[from] runtime::RuntimeError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    DateFormat(#[from] time::error::Format),
}
