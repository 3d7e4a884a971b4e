//! The [`Tracer`] owns the registry of elaborated values and the trace timeline. Each time
//! advance drains every pending sample, ordering buffered samples by their sequence numbers and
//! spreading them over the ticks that follow the last written time marker.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    io::{self, Write},
};

use time::Duration;
use vcdtrace_core::{Identifier, Tick, Timescale};

use crate::{Registry, RuntimeError, Sequence, ValueKey};

#[cfg(test)]
mod tests;

/// Tracer configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Unit of one tick, written to the `$timescale` section
    pub timescale: Timescale,
    /// Text of the `$version` section
    pub version: String,
    /// Whether to annotate the trace with `$comment` lines describing each merge step
    pub debug_comments: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timescale: Timescale::default(),
            version: concat!("vcdtrace ", env!("CARGO_PKG_VERSION")).to_owned(),
            debug_comments: false,
        }
    }
}

impl Config {
    pub fn with_timescale(mut self, timescale: Timescale) -> Self {
        self.timescale = timescale;
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_debug_comments(mut self, debug_comments: bool) -> Self {
        self.debug_comments = debug_comments;
        self
    }
}

/// How a time advance is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUpdate {
    /// Time since the start of the trace.
    Absolute(Duration),
    /// Offset from the last written time marker. May be negative.
    Relative(Duration),
}

impl fmt::Display for TimeUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeUpdate::Absolute(time) => write!(f, "abs {time}"),
            TimeUpdate::Relative(delta) => write!(f, "delta {delta}"),
        }
    }
}

/// Ticks [`Tracer::finalize_trace`] advances to flush residual samples.
pub const SETTLE_TICKS: Tick = 1;
/// Further ticks [`Tracer::finalize_trace`] advances to leave the final values visible.
pub const VIEW_TICKS: Tick = 1000;

#[derive(Debug)]
pub struct Tracer {
    /// Renderers of all elaborated values
    registry: Registry,
    config: Config,
    /// The last time marker written to the output
    tracepoint: Tick,
    /// The time most recently requested by the host
    timestamp: Tick,
}

impl Tracer {
    pub fn new(registry: Registry, config: Config) -> Self {
        Self {
            registry,
            config,
            tracepoint: 0,
            timestamp: 0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The last time marker written to the output.
    pub fn tracepoint(&self) -> Tick {
        self.tracepoint
    }

    /// The current logical time.
    pub fn timestamp(&self) -> Tick {
        self.timestamp
    }

    /// Look up the identifier of a value by its dotted registration path.
    pub fn identifier_of(&self, path: &str) -> Option<&Identifier> {
        self.registry
            .find(path)
            .and_then(|key| self.registry.identifier(key))
    }

    /// Write the initial `#0` marker and the power-up state of every value.
    #[tracing::instrument(skip(self, out))]
    pub fn start(&mut self, out: &mut dyn Write) -> Result<(), RuntimeError> {
        tracing::info!(values = self.registry.len(), "Starting the trace.");
        writeln!(out, "#0")?;
        self.tracepoint = 0;
        self.timestamp = 0;
        self.comment(out, format_args!("LOG TIME start"))?;
        self.flush(out)
    }

    /// Drain all pending samples without requesting a new time.
    #[tracing::instrument(skip(self, out))]
    pub fn flush(&mut self, out: &mut dyn Write) -> Result<(), RuntimeError> {
        self.registry.detach_dropped();

        // First pass: single-sample values write now, buffered values report their next sample.
        self.comment(out, format_args!("first pass"))?;
        let mut pending: BTreeMap<Sequence, BTreeSet<ValueKey>> = BTreeMap::new();
        let keys: Vec<ValueKey> = self.registry.keys().collect();
        for key in keys {
            if let Some(next) = self.registry.render(key, out, true)?.next {
                pending.entry(next).or_default().insert(key);
                self.comment(out, format_args!("first pass found: {key:?} @ {next}"))?;
            }
        }

        let Some(&first) = pending.keys().next() else {
            return Ok(());
        };
        let base = self.tracepoint;
        tracing::trace!(first, base, sequences = pending.len(), "Merging buffered samples.");

        // Second pass: write samples in sequence order, one tick per sequence step.
        self.comment(out, format_args!("second pass {}", pending.len()))?;
        while let Some((sequence, keys)) = pending.pop_first() {
            let delta = sequence.saturating_sub(first);
            self.log_time(out, base.saturating_add(delta), "seq")?;
            self.comment(out, format_args!("seq={sequence}, delta={delta}"))?;
            for key in keys {
                match self.registry.render(key, out, false)?.next {
                    Some(next) => {
                        pending.entry(next).or_default().insert(key);
                        self.comment(
                            out,
                            format_args!("second pass found: {key:?} @ {sequence} -> {next}"),
                        )?;
                    }
                    None => {
                        self.comment(
                            out,
                            format_args!("second pass not found: {key:?} @ {sequence}"),
                        )?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Drain all pending samples, then move time to the requested point.
    ///
    /// Requests that would move time before the last written marker are clamped to it. Returns
    /// the resulting timestamp.
    #[tracing::instrument(skip(self, out))]
    pub fn advance(&mut self, out: &mut dyn Write, update: TimeUpdate) -> Result<Tick, RuntimeError> {
        let requested = match update {
            TimeUpdate::Absolute(time) => self.config.timescale.ticks(time),
            TimeUpdate::Relative(delta) => {
                i128::from(self.tracepoint) + self.config.timescale.ticks(delta)
            }
        };
        self.comment(out, format_args!("{update}"))?;
        self.advance_to_tick(out, requested)
    }

    fn advance_to_tick(&mut self, out: &mut dyn Write, requested: i128) -> Result<Tick, RuntimeError> {
        if requested < i128::from(self.tracepoint) {
            tracing::warn!(
                requested,
                tracepoint = self.tracepoint,
                "Time moved backwards, clamping to the tracepoint."
            );
        }

        self.flush(out)?;

        let target = Tick::try_from(requested.max(0)).unwrap_or(Tick::MAX);
        if target < self.tracepoint {
            self.comment(
                out,
                format_args!("SYNC TIME WITH TRACEPOINT {}", self.tracepoint),
            )?;
        }
        self.timestamp = target.max(self.tracepoint);
        self.log_time(out, self.timestamp, "advance")?;
        Ok(self.timestamp)
    }

    pub fn advance_to(&mut self, out: &mut dyn Write, time: Duration) -> Result<Tick, RuntimeError> {
        self.advance(out, TimeUpdate::Absolute(time))
    }

    pub fn advance_by(
        &mut self,
        out: &mut dyn Write,
        delta: Duration,
    ) -> Result<Tick, RuntimeError> {
        self.advance(out, TimeUpdate::Relative(delta))
    }

    /// Flush residual samples and leave the final values visible for a short while.
    ///
    /// Both steps are counted in ticks, so the trace ends with a fresh time marker whatever the
    /// timescale.
    #[tracing::instrument(skip(self, out))]
    pub fn finalize_trace(&mut self, out: &mut dyn Write) -> Result<Tick, RuntimeError> {
        for ticks in [SETTLE_TICKS, VIEW_TICKS] {
            self.comment(out, format_args!("delta {ticks} ticks"))?;
            self.advance_to_tick(out, i128::from(self.tracepoint) + i128::from(ticks))?;
        }
        let end = self.timestamp;
        out.flush()?;
        tracing::info!(end, "Trace finalized.");
        Ok(end)
    }

    /// Write a time marker unless it equals the tracepoint. Never moves time backwards.
    fn log_time(&mut self, out: &mut dyn Write, time: Tick, reason: &str) -> io::Result<()> {
        if time > self.tracepoint {
            writeln!(out, "#{time}")?;
            self.tracepoint = time;
            self.comment(out, format_args!("LOG TIME {reason}"))
        } else {
            self.comment(out, format_args!("NO LOG TIME {reason}"))
        }
    }

    fn comment(&self, out: &mut dyn Write, text: fmt::Arguments<'_>) -> io::Result<()> {
        if self.config.debug_comments {
            writeln!(out, "$comment {text} $end")?;
        }
        Ok(())
    }
}
