//! Rendering of samples into VCD value-change lines.

use std::io::{self, Write};

use vcdtrace_core::{Identifier, VarKind};

use crate::{SampleState, TraceData, WireValue};

/// Significant digits used for `real` values.
const REAL_PRECISION: i32 = 16;

/// How a value is written to the trace. Resolved once when the value is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// `0`, `1`, `x` or `z` immediately followed by the identifier.
    Scalar,
    /// `b<bits> <identifier>`, with redundant leading bits removed.
    Vector { width: u32 },
    /// `r<decimal> <identifier>`.
    Real,
}

impl Encoding {
    /// Encoding of a `kind` variable of `width` bits. Wires are always vectors, even at width 1.
    pub fn new(kind: VarKind, width: u32) -> Self {
        match kind {
            VarKind::Real => Encoding::Real,
            VarKind::Wire => Encoding::Vector { width },
        }
    }

    /// Encoding of a value holding `T`. Only scalar types such as `bool` use [`Encoding::Scalar`].
    pub fn for_data<T: TraceData>(width: u32) -> Self {
        if T::SCALAR {
            Encoding::Scalar
        } else {
            Encoding::new(T::KIND, width)
        }
    }
}

impl WireValue {
    fn bits(&self) -> u64 {
        match *self {
            WireValue::Bit(bit) => u64::from(bit),
            WireValue::Bits(bits) => bits,
            WireValue::Real(real) => real as u64,
        }
    }

    fn real(&self) -> f64 {
        match *self {
            WireValue::Bit(bit) => f64::from(u8::from(bit)),
            WireValue::Bits(bits) => bits as f64,
            WireValue::Real(real) => real,
        }
    }
}

/// Write one value-change line for `state` under `identifier`.
pub fn write_sample(
    out: &mut dyn Write,
    encoding: Encoding,
    state: &SampleState<WireValue>,
    identifier: &Identifier,
) -> io::Result<()> {
    match (encoding, state) {
        (Encoding::Scalar, SampleState::Unknown) => writeln!(out, "x{identifier}"),
        (Encoding::Scalar, SampleState::Undriven) => writeln!(out, "z{identifier}"),
        (Encoding::Scalar, SampleState::Known(value)) => {
            let bit = if value.bits() & 1 == 1 { '1' } else { '0' };
            writeln!(out, "{bit}{identifier}")
        }
        (Encoding::Vector { .. }, SampleState::Unknown) => writeln!(out, "bx {identifier}"),
        (Encoding::Vector { .. }, SampleState::Undriven) => writeln!(out, "bz {identifier}"),
        (Encoding::Vector { width }, SampleState::Known(value)) => {
            writeln!(out, "b{} {identifier}", compress_bits(value.bits(), width))
        }
        (Encoding::Real, SampleState::Unknown) => writeln!(out, "rx {identifier}"),
        (Encoding::Real, SampleState::Undriven) => writeln!(out, "rz {identifier}"),
        (Encoding::Real, SampleState::Known(value)) => {
            writeln!(out, "r{} {identifier}", format_real(value.real()))
        }
    }
}

/// Render the low `width` bits of `bits`, most significant first.
///
/// A run of identical leading bits is reduced to its first bit, so extending the result with its
/// leading bit reproduces the full-width value. The least significant bit is always written.
/// `width` is clamped to `1..=64`.
pub(crate) fn compress_bits(bits: u64, width: u32) -> String {
    let width = width.clamp(1, u64::BITS);
    let bit = |i: u32| (bits >> i) & 1 == 1;
    let digit = |set: bool| if set { '1' } else { '0' };

    let mut rendered = String::with_capacity(width as usize);
    let mut prev = bit(width - 1);
    let mut compress = true;
    for i in (0..width - 1).rev() {
        let this = bit(i);
        if !compress || this != prev {
            compress = false;
            rendered.push(digit(prev));
        }
        prev = this;
    }
    rendered.push(digit(prev));
    rendered
}

/// Format a real value with 16 significant digits in the style of C's `%.16g`.
pub fn format_real(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_owned();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_owned();
    }

    // The exponent after rounding to the target precision selects the notation.
    let scientific = format!("{:.*e}", (REAL_PRECISION - 1) as usize, value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return scientific;
    };

    if exponent < -4 || exponent >= REAL_PRECISION {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{sign}{:02}",
            trim_fraction(mantissa),
            exponent.unsigned_abs()
        )
    } else {
        let decimals = (REAL_PRECISION - 1 - exponent) as usize;
        trim_fraction(&format!("{value:.decimals$}")).to_owned()
    }
}

fn trim_fraction(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}
