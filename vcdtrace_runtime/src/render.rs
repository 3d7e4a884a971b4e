use std::io::{self, Write};

use vcdtrace_core::Identifier;

use crate::Sequence;

/// Outcome of one [`Renderable::render`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DumpStatus {
    /// Sequence number of the sample that was written, if any.
    pub dumped: Option<Sequence>,
    /// Sequence number of the next pending sample, if any.
    pub next: Option<Sequence>,
}

impl DumpStatus {
    /// Nothing written, nothing pending.
    pub const END: DumpStatus = DumpStatus {
        dumped: None,
        next: None,
    };
}

/// Type-erased rendering interface stored in the registry for each traced value.
pub trait Renderable: std::fmt::Debug {
    /// With `start == true`, single-sample values write their pending change and buffered values
    /// only report the sequence number of their oldest pending sample. With `start == false`,
    /// buffered values write their oldest pending sample and report the next one.
    fn render(
        &mut self,
        out: &mut dyn Write,
        identifier: &Identifier,
        start: bool,
    ) -> io::Result<DumpStatus>;

    /// Whether the value behind this renderer has been dropped.
    fn is_dropped(&self) -> bool {
        false
    }
}

/// Stand-in for a value that was dropped before the trace finished. Renders nothing.
#[derive(Debug, Default)]
pub struct Detached;

impl Renderable for Detached {
    fn render(
        &mut self,
        _out: &mut dyn Write,
        _identifier: &Identifier,
        _start: bool,
    ) -> io::Result<DumpStatus> {
        Ok(DumpStatus::END)
    }
}
