use std::{fmt::Display, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// A point on the trace timeline, counted in units of the [`Timescale`].
pub type Tick = u64;

/// The unit of one trace tick, written to the `$timescale` section of the header.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timescale {
    #[default]
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    /// Written as `??`; durations are still counted in nanoseconds.
    Unspecified,
}

impl Timescale {
    /// The unit suffix used in the header.
    pub fn unit(&self) -> &'static str {
        match self {
            Timescale::Nanoseconds => "ns",
            Timescale::Microseconds => "us",
            Timescale::Milliseconds => "ms",
            Timescale::Seconds => "s",
            Timescale::Unspecified => "??",
        }
    }

    fn nanos_per_tick(&self) -> i128 {
        match self {
            Timescale::Nanoseconds | Timescale::Unspecified => 1,
            Timescale::Microseconds => 1_000,
            Timescale::Milliseconds => 1_000_000,
            Timescale::Seconds => 1_000_000_000,
        }
    }

    /// Convert a (possibly negative) duration into whole ticks, truncating towards zero.
    pub fn ticks(&self, duration: ::time::Duration) -> i128 {
        duration.whole_nanoseconds() / self.nanos_per_tick()
    }
}

impl Display for Timescale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "1{}", self.unit())
    }
}

impl FromStr for Timescale {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('1') {
            "ns" => Ok(Timescale::Nanoseconds),
            "us" => Ok(Timescale::Microseconds),
            "ms" => Ok(Timescale::Milliseconds),
            "s" => Ok(Timescale::Seconds),
            _ => Err(CoreError::InvalidTimescale(s.to_owned())),
        }
    }
}
