#![doc=include_str!("../README.md")]
//! ## Feature flags
#![doc = document_features::document_features!()]
#![deny(unsafe_code)]
#![deny(clippy::all)]

pub use vcdtrace_builder as builder;
pub use vcdtrace_runtime as runtime;

pub use vcdtrace_core::*;

pub mod prelude {
    //! Re-exports of the types needed to declare values, elaborate them and drive a trace.

    pub use crate::builder::{
        BuilderError, BuilderScopeKey, ScopeBuilderState, TraceBuilder, TraceScope,
    };
    pub use crate::runtime::{
        Config, SampleState, SequenceCounter, TimeUpdate, Traceable, Tracer, Value,
    };
    pub use crate::Timescale;
}
