// Copyright (C) 2025 Pastel Network
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Fixed-point decimal numbers for coin amounts.
//!
//! The daemon reports amounts as JSON numbers with up to 8 fractional digits.
//! Reading them as `f64` loses precision, so responses are parsed with their
//! literal text intact and amounts are carried as a [`Decimal`]: an integer
//! coefficient plus a scale (the number of fractional digits).
//!
//! When sent back to the daemon as call arguments, decimals are rounded to
//! [`AMOUNT_DECIMALS`] places (half-even) and emitted as JSON floats.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Number of fractional digits the daemon works with
pub const AMOUNT_DECIMALS: u32 = 8;

/// Largest supported scale; `10^MAX_SCALE` still fits in an `i128`
pub const MAX_SCALE: u32 = 38;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// An error occurred parsing a decimal literal
pub enum DecimalError {
    /// Nothing to parse
    #[error("empty decimal literal")]
    Empty,
    /// The literal is not a decimal number
    #[error("invalid decimal literal: {0}")]
    Invalid(String),
    /// The literal has more digits than the representation can hold
    #[error("decimal literal out of range: {0}")]
    Overflow(String),
}

/// A signed decimal number `coefficient * 10^-scale`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Decimal {
    coefficient: i128,
    scale: u32,
}

fn pow10(exp: u32) -> Option<i128> {
    10i128.checked_pow(exp)
}

impl Decimal {
    /// Zero
    pub const ZERO: Decimal = Decimal {
        coefficient: 0,
        scale: 0,
    };

    /// Build `coefficient * 10^-scale`.
    ///
    /// # Errors
    ///
    /// Returns `DecimalError::Overflow` if `scale` exceeds [`MAX_SCALE`].
    pub fn new(coefficient: i128, scale: u32) -> Result<Self, DecimalError> {
        if scale > MAX_SCALE {
            return Err(DecimalError::Overflow(format!(
                "scale {scale} exceeds {MAX_SCALE}"
            )));
        }
        Ok(Decimal { coefficient, scale })
    }

    /// The integer coefficient.
    pub fn coefficient(&self) -> i128 {
        self.coefficient
    }

    /// The number of fractional digits.
    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Is this number negative?
    pub fn is_negative(&self) -> bool {
        self.coefficient < 0
    }

    /// Is this number zero?
    pub fn is_zero(&self) -> bool {
        self.coefficient == 0
    }

    /// Round to `places` fractional digits, ties to even.
    pub fn round_dp(&self, places: u32) -> Decimal {
        if self.scale <= places {
            return *self;
        }
        // scale <= MAX_SCALE, so the divisor always fits
        let divisor = pow10(self.scale - places).unwrap_or(i128::MAX);
        let mut quotient = self.coefficient / divisor;
        let remainder = (self.coefficient % divisor).unsigned_abs();
        let step = if self.coefficient < 0 { -1 } else { 1 };
        match (remainder * 2).cmp(&divisor.unsigned_abs()) {
            Ordering::Greater => quotient += step,
            Ordering::Equal if quotient % 2 != 0 => quotient += step,
            _ => {}
        }
        Decimal {
            coefficient: quotient,
            scale: places,
        }
    }

    /// Drop trailing fractional zeros: `1.500` becomes `1.5`.
    pub fn normalize(&self) -> Decimal {
        let mut out = *self;
        while out.scale > 0 && out.coefficient % 10 == 0 {
            out.coefficient /= 10;
            out.scale -= 1;
        }
        out
    }

    /// Nearest `f64` to this number.
    pub fn to_f64(&self) -> f64 {
        // the decimal text always parses
        self.to_string().parse().unwrap_or(f64::NAN)
    }

    /// The value in the daemon's smallest unit (`10^-8`), if it has no finer digits.
    pub fn to_base_units(&self) -> Option<i128> {
        let normalized = self.normalize();
        if normalized.scale > AMOUNT_DECIMALS {
            return None;
        }
        normalized
            .coefficient
            .checked_mul(pow10(AMOUNT_DECIMALS - normalized.scale)?)
    }

    /// Build a decimal from a count of the daemon's smallest unit (`10^-8`).
    pub fn from_base_units(units: i128) -> Decimal {
        Decimal {
            coefficient: units,
            scale: AMOUNT_DECIMALS,
        }
    }

    /// Checked addition.
    pub fn checked_add(&self, other: &Decimal) -> Option<Decimal> {
        let scale = self.scale.max(other.scale);
        let lhs = self.rescaled(scale)?;
        let rhs = other.rescaled(scale)?;
        Some(Decimal {
            coefficient: lhs.checked_add(rhs)?,
            scale,
        })
    }

    /// Coefficient expressed at a larger scale.
    fn rescaled(&self, scale: u32) -> Option<i128> {
        self.coefficient
            .checked_mul(pow10(scale.checked_sub(self.scale)?)?)
    }

    /// Read a decimal out of a JSON value: numbers use their exact literal text,
    /// strings are parsed as decimal literals.
    pub fn from_json(value: &Value) -> Result<Decimal, DecimalError> {
        match value {
            Value::Number(number) => number.to_string().parse(),
            Value::String(text) => text.parse(),
            other => Err(DecimalError::Invalid(other.to_string())),
        }
    }
}

impl FromStr for Decimal {
    type Err = DecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Err(DecimalError::Empty);
        }
        let invalid = || DecimalError::Invalid(text.to_string());

        let (negative, unsigned) = match text.as_bytes()[0] {
            b'-' => (true, &text[1..]),
            b'+' => (false, &text[1..]),
            _ => (false, text),
        };

        let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
            Some(pos) => {
                let exponent: i64 = unsigned[pos + 1..].parse().map_err(|_| invalid())?;
                (&unsigned[..pos], exponent)
            }
            None => (unsigned, 0),
        };

        let (int_part, frac_part) = match mantissa.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (mantissa, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let digits = format!("{int_part}{frac_part}");
        let digits = digits.trim_start_matches('0');
        let overflow = || DecimalError::Overflow(text.to_string());
        let mut coefficient: i128 = if digits.is_empty() {
            0
        } else {
            digits.parse().map_err(|_| overflow())?
        };

        let mut scale = (frac_part.len() as i64)
            .checked_sub(exponent)
            .ok_or_else(overflow)?;
        if coefficient == 0 {
            scale = scale.clamp(0, MAX_SCALE as i64);
        }
        if scale < 0 {
            let shift = u32::try_from(-scale).map_err(|_| overflow())?;
            coefficient = coefficient
                .checked_mul(pow10(shift).ok_or_else(overflow)?)
                .ok_or_else(overflow)?;
            scale = 0;
        }
        // trailing zeros beyond the supported scale carry no information
        while scale > MAX_SCALE as i64 && coefficient % 10 == 0 {
            coefficient /= 10;
            scale -= 1;
        }
        if scale > MAX_SCALE as i64 {
            return Err(overflow());
        }

        Ok(Decimal {
            coefficient: if negative { -coefficient } else { coefficient },
            scale: scale as u32,
        })
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.coefficient < 0 { "-" } else { "" };
        let digits = self.coefficient.unsigned_abs().to_string();
        let scale = self.scale as usize;
        if scale == 0 {
            return write!(f, "{sign}{digits}");
        }
        if digits.len() > scale {
            let (int_part, frac_part) = digits.split_at(digits.len() - scale);
            write!(f, "{sign}{int_part}.{frac_part}")
        } else {
            write!(f, "{sign}0.{digits:0>scale$}")
        }
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Decimal {}

impl Hash for Decimal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let normalized = self.normalize();
        normalized.coefficient.hash(state);
        normalized.scale.hash(state);
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.normalize();
        let rhs = other.normalize();
        let scale = lhs.scale.max(rhs.scale);
        match (lhs.rescaled(scale), rhs.rescaled(scale)) {
            (Some(a), Some(b)) => a.cmp(&b),
            // one side overflows when widened, so it has the larger magnitude
            (None, Some(_)) => {
                if lhs.is_negative() {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            }
            (Some(_), None) => {
                if rhs.is_negative() {
                    Ordering::Greater
                } else {
                    Ordering::Less
                }
            }
            (None, None) => lhs.to_f64().total_cmp(&rhs.to_f64()),
        }
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Decimal {
            coefficient: value.into(),
            scale: 0,
        }
    }
}

impl From<u64> for Decimal {
    fn from(value: u64) -> Self {
        Decimal {
            coefficient: value.into(),
            scale: 0,
        }
    }
}

impl TryFrom<&Value> for Decimal {
    type Error = DecimalError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Decimal::from_json(value)
    }
}

impl Serialize for Decimal {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(self.round_dp(AMOUNT_DECIMALS).to_f64())
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Decimal::from_json(&value).map_err(D::Error::custom)
    }
}

impl From<Decimal> for Value {
    fn from(amount: Decimal) -> Self {
        serde_json::Number::from_f64(amount.round_dp(AMOUNT_DECIMALS).to_f64())
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}
