//! Ratios, the 52/48 operational ratio and its π/6 derivation.
//!
//! sin(π/6) is exactly one half, which is where 50/50 comes from. Rounding
//! π/6 (0.5236) to two places gives 52, leaving 48 for the other side.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::balance::{BalanceError, Tolerance, calculate_balance, percentages};

pub const PI_OVER_6: f64 = PI / 6.0;
pub const PI_OVER_6_ROUNDED: f64 = 0.5236;
pub const PI_OVER_6_DEGREES: f64 = 30.0;
pub const OPERATIONAL_STRUCTURE: f64 = 0.52;
pub const OPERATIONAL_FLEXIBILITY: f64 = 0.48;
pub const SIN_PI_6: f64 = 0.5;
/// √3 / 2
pub const COS_PI_6: f64 = 0.866_025_403_784_438_6;
pub const STRUCTURE_FLEXIBILITY_RATIO: f64 = 52.0 / 48.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RatioError {
    #[error("ratio '{name}' has a zero denominator")]
    ZeroDenominator { name: String },
    #[error("operational ratio is undefined for a zero total")]
    ZeroTotal,
    #[error("operational ratio must be 52/48, got {structure:.2}/{flexibility:.2}")]
    NotOperational { structure: f64, flexibility: f64 },
    #[error("cannot verify an empty ratio chain")]
    EmptyChain,
}

crate::string_enum! {
    /// Which target a ratio is validated against.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Level: Level {
        Meta => "meta",
        Operational => "operational",
    }
}

impl Level {
    #[must_use]
    pub const fn expected(self) -> (f64, f64) {
        match self {
            Level::Meta => (50.0, 50.0),
            Level::Operational => (52.0, 48.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ratio {
    numerator: f64,
    denominator: f64,
    name: String,
}

impl Ratio {
    pub fn new(numerator: f64, denominator: f64, name: impl Into<String>) -> Result<Self, RatioError> {
        let name = name.into();
        if denominator == 0.0 {
            return Err(RatioError::ZeroDenominator { name });
        }
        Ok(Self {
            numerator,
            denominator,
            name,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn numerator(&self) -> f64 {
        self.numerator
    }

    #[must_use]
    pub const fn denominator(&self) -> f64 {
        self.denominator
    }

    #[must_use]
    pub fn value(&self) -> f64 {
        self.numerator / self.denominator
    }

    /// Percentage split of `|numerator|` and `|denominator|`.
    #[must_use]
    pub fn percentage(&self) -> (f64, f64) {
        calculate_balance(self.numerator, self.denominator)
    }

    pub fn inverse(&self) -> Result<Self, RatioError> {
        Self::new(
            self.denominator,
            self.numerator,
            format!("{}_inverse", self.name),
        )
    }

    #[must_use]
    pub fn is_balanced(&self) -> bool {
        (self.numerator.abs() - self.denominator.abs()).abs() < f64::EPSILON
    }

    #[must_use]
    pub fn distance_from_balance(&self) -> f64 {
        (self.percentage().0 - 50.0).abs()
    }
}

/// Structure/flexibility pair held at 52/48.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OperationalRatio {
    structure: f64,
    flexibility: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationalProof {
    pub structure: f64,
    pub flexibility: f64,
    pub ratio: f64,
    pub asymmetry: f64,
    pub enables_meta: bool,
}

impl OperationalRatio {
    pub fn new(structure: f64, flexibility: f64) -> Result<Self, RatioError> {
        let (pct_s, pct_f) = percentages(structure, flexibility).map_err(|_| RatioError::ZeroTotal)?;
        if (pct_s - 52.0).abs() > Tolerance::EXACT.epsilon() {
            return Err(RatioError::NotOperational {
                structure: pct_s,
                flexibility: pct_f,
            });
        }
        Ok(Self {
            structure,
            flexibility,
        })
    }

    /// 52/48 split of `total`.
    pub fn from_total(total: f64) -> Result<Self, RatioError> {
        if total == 0.0 {
            return Err(RatioError::ZeroTotal);
        }
        Ok(Self {
            structure: total * OPERATIONAL_STRUCTURE,
            flexibility: total * OPERATIONAL_FLEXIBILITY,
        })
    }

    /// Derives 52/48 by rounding π/6 to a whole percentage.
    #[must_use]
    pub fn from_pi_6() -> Self {
        let structure = (PI_OVER_6 * 100.0).round();
        Self {
            structure,
            flexibility: 100.0 - structure,
        }
    }

    #[must_use]
    pub const fn structure(&self) -> f64 {
        self.structure
    }

    #[must_use]
    pub const fn flexibility(&self) -> f64 {
        self.flexibility
    }

    #[must_use]
    pub fn ratio(&self) -> f64 {
        self.structure / self.flexibility
    }

    #[must_use]
    pub fn as_percentage(&self) -> (f64, f64) {
        calculate_balance(self.structure, self.flexibility)
    }

    #[must_use]
    pub fn prove_enables_meta(&self) -> OperationalProof {
        let (structure, flexibility) = self.as_percentage();
        OperationalProof {
            structure,
            flexibility,
            ratio: self.ratio(),
            asymmetry: structure - flexibility,
            enables_meta: (structure - 52.0).abs() < Tolerance::EXACT.epsilon(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pi6Connection {
    pub pi_6_value: f64,
    pub pi_6_percentage: f64,
    pub sin_pi_6: f64,
    pub sin_equals_half: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Pi6Proportion;

impl Pi6Proportion {
    #[must_use]
    pub fn value(self) -> f64 {
        PI_OVER_6
    }

    #[must_use]
    pub fn as_percentage(self) -> f64 {
        PI_OVER_6 * 100.0
    }

    #[must_use]
    pub fn sin(self) -> f64 {
        PI_OVER_6.sin()
    }

    #[must_use]
    pub fn cos(self) -> f64 {
        PI_OVER_6.cos()
    }

    #[must_use]
    pub fn to_operational_ratio(self) -> OperationalRatio {
        OperationalRatio::from_pi_6()
    }

    #[must_use]
    pub fn verify_meta_connection(self) -> Pi6Connection {
        let sin = self.sin();
        Pi6Connection {
            pi_6_value: self.value(),
            pi_6_percentage: self.as_percentage(),
            sin_pi_6: sin,
            sin_equals_half: (sin - SIN_PI_6).abs() < 1e-10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatioValidation {
    pub ratio: String,
    pub value: f64,
    pub percentage: (f64, f64),
    pub level: Level,
    pub expected: (f64, f64),
    pub is_valid: bool,
    pub distance_from_expected: f64,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProportionSummary {
    pub validated_ratios: usize,
    pub all_maintain_meta: bool,
    pub ratios: Vec<(String, bool)>,
}

/// Validates ratios against the META or operational target and keeps
/// the ones that passed.
#[derive(Debug, Clone, Default)]
pub struct ProportionValidator {
    validated: Vec<Ratio>,
}

impl ProportionValidator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn verify_maintains_meta(&self, ratio: &Ratio) -> bool {
        ratio.is_balanced()
    }

    #[must_use]
    pub fn verify_enables_meta(&self, ratio: &Ratio) -> bool {
        let (num, den) = ratio.percentage();
        Tolerance::EXACT.accepts(num - 52.0) && Tolerance::EXACT.accepts(den - 48.0)
    }

    pub fn validate_ratio(&mut self, ratio: &Ratio, level: Level) -> RatioValidation {
        let percentage = ratio.percentage();
        let expected = level.expected();
        let is_valid = match level {
            Level::Meta => self.verify_maintains_meta(ratio),
            Level::Operational => self.verify_enables_meta(ratio),
        };
        let note = match (level, is_valid) {
            (Level::Meta, true) => "Ratio maintains META 50/50 balance",
            (Level::Meta, false) => "Ratio violates META 50/50 balance",
            (Level::Operational, true) => "Ratio enables META through 52/48 asymmetry",
            (Level::Operational, false) => "Ratio does not match the 52/48 operational split",
        };
        if is_valid {
            self.validated.push(ratio.clone());
        }
        RatioValidation {
            ratio: ratio.name().to_string(),
            value: ratio.value(),
            percentage,
            level,
            expected,
            is_valid,
            distance_from_expected: (percentage.0 - expected.0).abs(),
            note: note.to_string(),
        }
    }

    /// Both ratios must be balanced on their own.
    #[must_use]
    pub fn validate_pair_maintains_meta(&self, first: &Ratio, second: &Ratio) -> bool {
        first.is_balanced() && second.is_balanced()
    }

    /// The value that pairs with `value` at the given level.
    #[must_use]
    pub fn derive_complement(&self, value: f64, level: Level) -> f64 {
        match level {
            Level::Meta => value,
            Level::Operational => value * 48.0 / 52.0,
        }
    }

    #[must_use]
    pub fn validated_ratios(&self) -> &[Ratio] {
        &self.validated
    }

    #[must_use]
    pub fn prove_all_maintain_meta(&self) -> ProportionSummary {
        let ratios: Vec<(String, bool)> = self
            .validated
            .iter()
            .map(|r| (r.name().to_string(), r.is_balanced()))
            .collect();
        ProportionSummary {
            validated_ratios: self.validated.len(),
            all_maintain_meta: ratios.iter().all(|(_, ok)| *ok),
            ratios,
        }
    }
}

#[must_use]
pub fn calculate_52_48(total: f64) -> (f64, f64) {
    (total * OPERATIONAL_STRUCTURE, total * OPERATIONAL_FLEXIBILITY)
}

#[must_use]
pub fn calculate_50_50(total: f64) -> (f64, f64) {
    (total / 2.0, total / 2.0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatioAnalysis {
    pub numerator: f64,
    pub denominator: f64,
    pub ratio: f64,
    pub percentage: (f64, f64),
    pub maintains_meta: bool,
    pub enables_meta: bool,
    pub meaning: String,
}

/// Reads a raw numerator/denominator as META, operational, or neither.
///
/// The ratio value is `+inf` when the denominator is zero; a zero total
/// is rejected.
pub fn ratio_to_meta_meaning(numerator: f64, denominator: f64) -> Result<RatioAnalysis, BalanceError> {
    let percentage = percentages(numerator, denominator)?;
    let ratio = if denominator == 0.0 {
        f64::INFINITY
    } else {
        numerator / denominator
    };
    let maintains_meta = Tolerance::EXACT.accepts(percentage.0 - 50.0);
    let enables_meta =
        Tolerance::LOOSE.accepts(percentage.0 - 52.0) && Tolerance::LOOSE.accepts(percentage.1 - 48.0);
    let meaning = if maintains_meta {
        "Ratio maintains META 50/50 equilibrium"
    } else if enables_meta {
        "Ratio enables META through 52/48 operational asymmetry"
    } else {
        "Ratio neither maintains nor enables META directly"
    };
    Ok(RatioAnalysis {
        numerator,
        denominator,
        ratio,
        percentage,
        maintains_meta,
        enables_meta,
        meaning: meaning.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainVerification {
    pub chain_length: usize,
    pub ratios: Vec<String>,
    pub product_ratio: f64,
    pub product_balanced: bool,
    pub maintains_meta: bool,
}

/// Multiplies a chain of ratios and checks the product still balances.
pub fn verify_ratio_chain(ratios: &[Ratio]) -> Result<ChainVerification, RatioError> {
    if ratios.is_empty() {
        return Err(RatioError::EmptyChain);
    }
    let numerator: f64 = ratios.iter().map(Ratio::numerator).product();
    let denominator: f64 = ratios.iter().map(Ratio::denominator).product();
    let product = Ratio::new(numerator, denominator, "chain_product")?;
    let product_balanced = product.is_balanced();
    Ok(ChainVerification {
        chain_length: ratios.len(),
        ratios: ratios.iter().map(|r| r.name().to_string()).collect(),
        product_ratio: product.value(),
        product_balanced,
        maintains_meta: product_balanced,
    })
}
