use std::{
    fmt::{self, Display},
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{
    de::{self, Visitor},
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
};
use sqlx::Type;
use thiserror::Error;

use crate::op;

/// Largest amount (in whole units) we accept from text or floating point input. Keeps the cent conversion exact.
const MAX_UNITS: f64 = 1e13;

//--------------------------------------       Money         ---------------------------------------------------------
/// A fixed-point currency amount with two decimal places, stored as a whole number of cents.
///
/// On the wire, money is a plain JSON number (`3.5` is three units and fifty cents). Decimal strings such as `"7.00"`
/// are accepted on input as well, since that is how most SQL drivers render `DECIMAL(10, 2)` columns.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash)]
#[sqlx(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, AddAssign, add_assign);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from_cents(self.cents() * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Value cannot be represented as a currency amount: {0}")]
pub struct MoneyConversionError(String);

impl Money {
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn from_units(units: i64) -> Self {
        Self(units * 100)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    /// `None` if the result does not fit.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// `None` if the result does not fit.
    pub fn checked_mul(self, rhs: i64) -> Option<Self> {
        self.0.checked_mul(rhs).map(Self)
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Rounds a floating point amount to the nearest cent.
    pub fn try_from_f64(value: f64) -> Result<Self, MoneyConversionError> {
        if !value.is_finite() || value.abs() > MAX_UNITS {
            return Err(MoneyConversionError(value.to_string()));
        }
        #[allow(clippy::cast_possible_truncation)]
        let cents = (value * 100.0).round() as i64;
        Ok(Self(cents))
    }
}

impl From<i64> for Money {
    fn from(cents: i64) -> Self {
        Self(cents)
    }
}

impl TryFrom<f64> for Money {
    type Error = MoneyConversionError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::try_from_f64(value)
    }
}

impl FromStr for Money {
    type Err = MoneyConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().parse::<f64>().map_err(|e| MoneyConversionError(format!("{s}. {e}")))?;
        Self::try_from_f64(value)
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        f.pad(&format!("{sign}{}.{:02}", abs / 100, abs % 100))
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a currency amount as a number or decimal string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        v.checked_mul(100).map(Money::from_cents).ok_or_else(|| E::custom(format!("amount {v} is too large")))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        let v = i64::try_from(v).map_err(|_| E::custom(format!("amount {v} is too large")))?;
        self.visit_i64(v)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Money::try_from_f64(v).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse().map_err(E::custom)
    }
}
