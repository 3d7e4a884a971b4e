//! Short printable identifiers used to refer to a variable in the body of a VCD trace.

use std::{cmp::Ordering, fmt::Display};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// The lowest symbol of the identifier alphabet.
pub const FIRST_SYMBOL: u8 = b'!';
/// The highest symbol of the identifier alphabet.
pub const LAST_SYMBOL: u8 = b'z';
/// Number of symbols available for each identifier digit.
pub const ALPHABET_SIZE: usize = (LAST_SYMBOL - FIRST_SYMBOL + 1) as usize;
/// The longest identifier the generator will hand out.
pub const MAX_IDENTIFIER_DIGITS: usize = 15;

/// A VCD identifier code such as `!`, `"` or `!z`.
///
/// Identifiers order by allocation: shorter codes come first, codes of equal length compare by
/// their symbols.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Identifier(String);

impl Identifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Generates the sequence of unique identifiers `!`, `"`, .., `z`, `!!`, `!"`, ..
///
/// This is a bijective base-90 counter: overflowing the lowest digit carries into the next one,
/// and a carry out of the highest digit grows the identifier by one symbol, the same way
/// spreadsheet columns are named.
#[derive(Debug, Default, Clone)]
pub struct IdentifierGenerator {
    /// Digits of the most recently allocated identifier, most significant first.
    digits: Vec<u8>,
}

impl IdentifierGenerator {
    pub fn new() -> Self {
        Default::default()
    }

    /// Allocate the next identifier.
    ///
    /// Fails once every identifier of [`MAX_IDENTIFIER_DIGITS`] digits has been handed out; the
    /// generator state is left untouched in that case.
    pub fn allocate(&mut self) -> Result<Identifier, CoreError> {
        if self.digits.len() == MAX_IDENTIFIER_DIGITS
            && self.digits.iter().all(|&digit| digit == LAST_SYMBOL)
        {
            return Err(CoreError::IdentifiersExhausted {
                digits: MAX_IDENTIFIER_DIGITS,
            });
        }

        let mut carry = true;
        for digit in self.digits.iter_mut().rev() {
            if *digit == LAST_SYMBOL {
                *digit = FIRST_SYMBOL;
            } else {
                *digit += 1;
                carry = false;
                break;
            }
        }
        if carry {
            self.digits.insert(0, FIRST_SYMBOL);
        }

        // Every digit lies within `FIRST_SYMBOL..=LAST_SYMBOL`, which is plain ASCII.
        let code = self.digits.iter().copied().map(char::from).collect();
        Ok(Identifier(code))
    }

    /// Number of digits of the most recently allocated identifier.
    pub fn digits(&self) -> usize {
        self.digits.len()
    }
}
