//! Balanced pairs: the 50/50 and 52/48 checks shared by every subsystem.
//!
//! A pair is two non-negative numbers. Its balance is the percentage split
//! `(|a| / total * 100, |b| / total * 100)`. Two tolerance profiles exist:
//! [`Tolerance::EXACT`] for the META 50/50 check and [`Tolerance::LOOSE`]
//! for the looser "approximately operational" readings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BalanceError {
    #[error("balance is undefined when both sides are zero")]
    ZeroTotal,
    #[error("{field} cannot be negative (got {value})")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },
    #[error("Parameter '{name}' violates META 50/50: got {positive:.2}/{negative:.2}")]
    Violation {
        name: String,
        positive: f64,
        negative: f64,
    },
}

/// Maximum allowed distance, in percentage points, from a target split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance(f64);

impl Tolerance {
    pub const EXACT: Self = Self(0.01);
    pub const LOOSE: Self = Self(0.5);

    #[must_use]
    pub const fn new(epsilon: f64) -> Self {
        Self(epsilon)
    }

    #[must_use]
    pub const fn epsilon(self) -> f64 {
        self.0
    }

    #[must_use]
    pub fn accepts(self, deviation: f64) -> bool {
        deviation.abs() < self.0
    }
}

/// A target percentage split, e.g. 50/50 or 52/48.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TargetRatio {
    a: f64,
    b: f64,
}

impl TargetRatio {
    pub const META: Self = Self { a: 50.0, b: 50.0 };
    pub const OPERATIONAL: Self = Self { a: 52.0, b: 48.0 };

    #[must_use]
    pub const fn a(self) -> f64 {
        self.a
    }

    #[must_use]
    pub const fn b(self) -> f64 {
        self.b
    }
}

/// Percentage split of two values. Errors when both are zero.
pub fn percentages(a: f64, b: f64) -> Result<(f64, f64), BalanceError> {
    let total = a.abs() + b.abs();
    if total == 0.0 {
        return Err(BalanceError::ZeroTotal);
    }
    Ok((a.abs() / total * 100.0, b.abs() / total * 100.0))
}

/// Checked balance test against an arbitrary target split.
pub fn is_balanced_to(
    a: f64,
    b: f64,
    target: TargetRatio,
    tolerance: Tolerance,
) -> Result<bool, BalanceError> {
    let (pct_a, _) = percentages(a, b)?;
    Ok(tolerance.accepts(pct_a - target.a))
}

/// META 50/50 check under the exact profile.
///
/// An empty pair (both sides zero) has nothing out of balance and passes.
#[must_use]
pub fn verify_meta(a: f64, b: f64) -> bool {
    match is_balanced_to(a, b, TargetRatio::META, Tolerance::EXACT) {
        Ok(balanced) => balanced,
        Err(_) => true,
    }
}

/// Percentage split, reporting `(50, 50)` for an empty pair.
#[must_use]
pub fn calculate_balance(a: f64, b: f64) -> (f64, f64) {
    percentages(a, b).unwrap_or((50.0, 50.0))
}

/// Whether a structure/flexibility pair sits at 52/48. An empty pair does not.
#[must_use]
pub fn enables_meta(structure: f64, flexibility: f64) -> bool {
    is_balanced_to(
        structure,
        flexibility,
        TargetRatio::OPERATIONAL,
        Tolerance::EXACT,
    )
    .unwrap_or(false)
}

#[must_use]
pub fn split_50_50(total: f64) -> (f64, f64) {
    let half = total / 2.0;
    (half, half)
}

#[must_use]
pub fn split_52_48(total: f64) -> (f64, f64) {
    (total * 0.52, total * 0.48)
}

/// Rejects negative and non-finite inputs, returning the value unchanged.
pub fn non_negative(field: &'static str, value: f64) -> Result<f64, BalanceError> {
    if !value.is_finite() {
        return Err(BalanceError::NonFinite { field });
    }
    if value < 0.0 {
        return Err(BalanceError::Negative { field, value });
    }
    Ok(value)
}

/// Anything that carries a positive/negative style pair.
pub trait Balanced {
    fn pair(&self) -> (f64, f64);

    fn balance(&self) -> (f64, f64) {
        let (a, b) = self.pair();
        calculate_balance(a, b)
    }

    fn is_balanced(&self) -> bool {
        let (a, b) = self.pair();
        verify_meta(a, b)
    }

    /// Distance of the first side from 50%, in percentage points.
    fn deviation(&self) -> f64 {
        (self.balance().0 - 50.0).abs()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BalancedPair {
    a: f64,
    b: f64,
}

impl BalancedPair {
    pub fn new(a: f64, b: f64) -> Result<Self, BalanceError> {
        Ok(Self {
            a: non_negative("a", a)?,
            b: non_negative("b", b)?,
        })
    }

    #[must_use]
    pub const fn zero() -> Self {
        Self { a: 0.0, b: 0.0 }
    }

    /// Both sides set to half of `total`.
    pub fn even(total: f64) -> Result<Self, BalanceError> {
        let (a, b) = split_50_50(non_negative("total", total)?);
        Ok(Self { a, b })
    }

    #[must_use]
    pub const fn a(&self) -> f64 {
        self.a
    }

    #[must_use]
    pub const fn b(&self) -> f64 {
        self.b
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.a + self.b
    }

    #[must_use]
    pub fn net(&self) -> f64 {
        self.a - self.b
    }

    /// Component-wise sum. Both inputs are non-negative, so the result is too.
    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        Self {
            a: self.a + other.a,
            b: self.b + other.b,
        }
    }
}

impl Balanced for BalancedPair {
    fn pair(&self) -> (f64, f64) {
        (self.a, self.b)
    }
}
