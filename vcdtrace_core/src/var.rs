use std::fmt::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Identifier;

/// The VCD variable category of a traced value.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarKind {
    /// A bit-vector (or single bit) signal.
    Wire,
    /// A floating-point signal.
    Real,
}

impl Display for VarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VarKind::Wire => f.write_str("wire"),
            VarKind::Real => f.write_str("real"),
        }
    }
}

/// Elaboration-time description of one traced variable.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDescriptor {
    /// Local instance name written to the `$var` line.
    pub name: String,
    /// Dotted registration path, unique within one trace.
    pub path: String,
    pub width: u32,
    pub kind: VarKind,
    pub identifier: Identifier,
}

impl Display for VarDescriptor {
    /// Formats the `$var` declaration line, without the trailing newline.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "$var {} {} {} {} $end",
            self.kind, self.width, self.identifier, self.name
        )
    }
}
