//! Per-value sample storage: either the single latest sample, or a bounded queue of
//! sequence-stamped samples waiting for the next flush.

use std::{
    collections::VecDeque,
    io::{self, Write},
};

use vcdtrace_core::Identifier;

use crate::{
    wire::{self, Encoding},
    DumpStatus, Sequence, SequenceCounter, TraceData,
};

/// The logical state of a traced value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SampleState<T> {
    /// Never assigned, or explicitly marked unknown. Written as `x`.
    #[default]
    Unknown,
    /// High impedance. Written as `z`.
    Undriven,
    Known(T),
}

impl<T> SampleState<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> SampleState<U> {
        match self {
            SampleState::Unknown => SampleState::Unknown,
            SampleState::Undriven => SampleState::Undriven,
            SampleState::Known(value) => SampleState::Known(f(value)),
        }
    }

    pub fn known(&self) -> Option<&T> {
        match self {
            SampleState::Known(value) => Some(value),
            _ => None,
        }
    }
}

/// A buffered sample and the sequence number it was recorded at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample<T> {
    pub sequence: Sequence,
    pub state: SampleState<T>,
}

#[derive(Debug)]
pub enum History<T> {
    /// Depth 1: only the latest state is kept, and written on the next flush if it changed.
    Single { state: SampleState<T>, pending: bool },
    /// Depth 2 or more: up to `depth` samples queued in sequence order.
    Buffered {
        counter: SequenceCounter,
        depth: usize,
        samples: VecDeque<Sample<T>>,
        /// Most recently accepted state.
        last: Option<SampleState<T>>,
    },
}

impl<T: TraceData> History<T> {
    /// A single-sample history. The initial state is always written on the first flush.
    pub fn single(initial: SampleState<T>) -> Self {
        History::Single {
            state: initial,
            pending: true,
        }
    }

    /// A buffered history. A known initial value is queued at the counter's current reading.
    pub fn buffered(counter: SequenceCounter, depth: usize, initial: Option<T>) -> Self {
        let mut samples = VecDeque::with_capacity(depth);
        let last = initial.map(|value| {
            samples.push_back(Sample {
                sequence: counter.get(),
                state: SampleState::Known(value),
            });
            SampleState::Known(value)
        });
        History::Buffered {
            counter,
            depth,
            samples,
            last,
        }
    }

    /// The most recently recorded state.
    pub fn current(&self) -> SampleState<T> {
        match self {
            History::Single { state, .. } => *state,
            History::Buffered { last, .. } => last.unwrap_or_default(),
        }
    }

    /// Number of samples waiting to be written.
    pub fn pending(&self) -> usize {
        match self {
            History::Single { pending, .. } => usize::from(*pending),
            History::Buffered { samples, .. } => samples.len(),
        }
    }

    /// Record a new state.
    ///
    /// A single-sample history ignores repeats of its current state. A buffered history ignores
    /// repeats of its newest queued sample; once drained, the next write is always queued.
    pub fn record(&mut self, next: SampleState<T>) {
        match self {
            History::Single { state, pending } => {
                if *state != next {
                    *state = next;
                    *pending = true;
                }
            }
            History::Buffered {
                counter,
                depth,
                samples,
                last,
            } => {
                if samples.back().is_some_and(|back| back.state == next) {
                    return;
                }
                let sequence = counter.get();
                if let Some(back) = samples.back_mut().filter(|back| back.sequence == sequence) {
                    back.state = next;
                } else if samples.len() >= *depth {
                    tracing::trace!(sequence, depth = *depth, "History full, dropping sample.");
                    return;
                } else {
                    samples.push_back(Sample {
                        sequence,
                        state: next,
                    });
                }
                *last = Some(next);
            }
        }
    }

    /// Write pending output for this history. See [`crate::Renderable::render`].
    pub fn render(
        &mut self,
        out: &mut dyn Write,
        encoding: Encoding,
        identifier: &Identifier,
        start: bool,
    ) -> io::Result<DumpStatus> {
        match self {
            History::Single { state, pending } => {
                if start && *pending {
                    wire::write_sample(out, encoding, &state.map(|v| v.to_wire()), identifier)?;
                    *pending = false;
                }
                Ok(DumpStatus::END)
            }
            History::Buffered { samples, .. } if start => Ok(DumpStatus {
                dumped: None,
                next: samples.front().map(|sample| sample.sequence),
            }),
            History::Buffered { samples, .. } => match samples.pop_front() {
                Some(sample) => {
                    let state = sample.state.map(|v| v.to_wire());
                    wire::write_sample(out, encoding, &state, identifier)?;
                    Ok(DumpStatus {
                        dumped: Some(sample.sequence),
                        next: samples.front().map(|sample| sample.sequence),
                    })
                }
                None => Ok(DumpStatus::END),
            },
        }
    }
}
