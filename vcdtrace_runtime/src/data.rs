//! Trait definitions for the element types that can be stored in a [`crate::Value`].
//!
//! Each type states its natural bit width and VCD variable kind once; [`crate::Encoding`] is
//! resolved from these when a value is declared and never re-derived while tracing.

use std::fmt::Debug;

use vcdtrace_core::VarKind;

/// A sample converted to one of the three wire representations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WireValue {
    Bit(bool),
    /// Two's complement bits, sign-extended to 64 bits for signed types.
    Bits(u64),
    Real(f64),
}

/// Types implementing this trait can be traced by a [`crate::Value`].
pub trait TraceData: Copy + PartialEq + Debug + 'static {
    /// Number of bits used when no explicit width is declared.
    const NATURAL_WIDTH: u32;
    /// The VCD variable kind this type is declared as.
    const KIND: VarKind;
    /// Whether samples are written as a bare `0`/`1`/`x`/`z` rather than a bit vector.
    const SCALAR: bool = false;

    fn to_wire(&self) -> WireValue;
}

impl TraceData for bool {
    const NATURAL_WIDTH: u32 = 1;
    const KIND: VarKind = VarKind::Wire;
    const SCALAR: bool = true;

    fn to_wire(&self) -> WireValue {
        WireValue::Bit(*self)
    }
}

macro_rules! impl_trace_data_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl TraceData for $ty {
                const NATURAL_WIDTH: u32 = <$ty>::BITS;
                const KIND: VarKind = VarKind::Wire;

                fn to_wire(&self) -> WireValue {
                    WireValue::Bits(*self as u64)
                }
            }
        )*
    };
}

impl_trace_data_int!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl TraceData for f32 {
    const NATURAL_WIDTH: u32 = 32;
    const KIND: VarKind = VarKind::Real;

    fn to_wire(&self) -> WireValue {
        WireValue::Real(f64::from(*self))
    }
}

impl TraceData for f64 {
    const NATURAL_WIDTH: u32 = 64;
    const KIND: VarKind = VarKind::Real;

    fn to_wire(&self) -> WireValue {
        WireValue::Real(*self)
    }
}
