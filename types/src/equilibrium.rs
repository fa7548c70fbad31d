use std::collections::BTreeMap;

use serde::Serialize;

use crate::balance::{Balanced, BalanceError, calculate_balance, enables_meta, verify_meta};

/// Registry of named positive/negative parameters, each verified at 50/50.
#[derive(Debug, Clone, Default)]
pub struct MetaEquilibrium {
    parameters: BTreeMap<String, (f64, f64)>,
}

impl MetaEquilibrium {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn verify_balance(&self, positive: f64, negative: f64) -> bool {
        verify_meta(positive, negative)
    }

    #[must_use]
    pub fn calculate_balance(&self, positive: f64, negative: f64) -> (f64, f64) {
        calculate_balance(positive, negative)
    }

    /// Records the parameter only if it holds at 50/50.
    pub fn register_parameter(
        &mut self,
        name: impl Into<String>,
        positive: f64,
        negative: f64,
    ) -> Result<(), BalanceError> {
        let name = name.into();
        if !verify_meta(positive, negative) {
            let (positive, negative) = calculate_balance(positive, negative);
            return Err(BalanceError::Violation {
                name,
                positive,
                negative,
            });
        }
        self.parameters.insert(name, (positive, negative));
        Ok(())
    }

    #[must_use]
    pub fn validate_operational_enables_meta(&self, structure: f64, flexibility: f64) -> bool {
        enables_meta(structure, flexibility)
    }

    #[must_use]
    pub fn validated_parameters(&self) -> &BTreeMap<String, (f64, f64)> {
        &self.parameters
    }

    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<(f64, f64)> {
        self.parameters.get(name).copied()
    }
}

/// A named parameter that is guaranteed to have passed META validation.
#[derive(Debug, Clone, PartialEq)]
pub struct SubParameter {
    name: String,
    positive: f64,
    negative: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubParameterProof {
    pub name: String,
    pub positive: f64,
    pub negative: f64,
    pub balance: String,
    pub meta_valid: bool,
}

impl SubParameter {
    pub fn new(
        name: impl Into<String>,
        positive: f64,
        negative: f64,
        meta: &mut MetaEquilibrium,
    ) -> Result<Self, BalanceError> {
        let name = name.into();
        meta.register_parameter(name.clone(), positive, negative)?;
        Ok(Self {
            name,
            positive,
            negative,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn values(&self) -> (f64, f64) {
        (self.positive, self.negative)
    }

    #[must_use]
    pub fn proof(&self) -> SubParameterProof {
        let (pos, neg) = self.balance();
        SubParameterProof {
            name: self.name.clone(),
            positive: self.positive,
            negative: self.negative,
            balance: format!("{pos:.2}/{neg:.2}"),
            meta_valid: self.is_balanced(),
        }
    }
}

impl Balanced for SubParameter {
    fn pair(&self) -> (f64, f64) {
        (self.positive, self.negative)
    }
}
