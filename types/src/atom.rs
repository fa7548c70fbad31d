//! The three-state atom: two polar wave states plus a neutral one.

use serde::{Deserialize, Serialize};

use crate::balance::{BalanceError, calculate_balance, enables_meta, non_negative, verify_meta};

crate::string_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum WaveState: WaveState {
        #[serde(rename = "w-")]
        Minus => "w-",
        #[serde(rename = "w0")]
        Zero => "w0",
        #[serde(rename = "w+")]
        Plus => "w+",
    }
}

impl WaveState {
    /// Superscript rendering used in reports.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            WaveState::Minus => "w⁻",
            WaveState::Zero => "w⁰",
            WaveState::Plus => "w⁺",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AtomState {
    w_minus: f64,
    w_zero: f64,
    w_plus: f64,
}

impl AtomState {
    pub fn new(w_minus: f64, w_zero: f64, w_plus: f64) -> Result<Self, BalanceError> {
        Ok(Self {
            w_minus: non_negative("w_minus", w_minus)?,
            w_zero: non_negative("w_zero", w_zero)?,
            w_plus: non_negative("w_plus", w_plus)?,
        })
    }

    #[must_use]
    pub const fn weight(&self, state: WaveState) -> f64 {
        match state {
            WaveState::Minus => self.w_minus,
            WaveState::Zero => self.w_zero,
            WaveState::Plus => self.w_plus,
        }
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.w_minus + self.w_zero + self.w_plus
    }

    /// Split between the two polar states; `(50, 50)` when both are empty.
    #[must_use]
    pub fn polar_balance(&self) -> (f64, f64) {
        calculate_balance(self.w_minus, self.w_plus)
    }

    #[must_use]
    pub fn is_polar_balanced(&self) -> bool {
        verify_meta(self.w_minus, self.w_plus)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    state: AtomState,
    structure: f64,
    flexibility: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtomBalance {
    pub w_minus: f64,
    pub w_plus: f64,
    pub is_50_50: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtomOperational {
    pub structure: f64,
    pub flexibility: f64,
    pub is_52_48: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtomProof {
    pub meta_valid: bool,
    pub meta_balance: AtomBalance,
    pub operational_valid: bool,
    pub operational_ratio: AtomOperational,
    pub state: AtomState,
}

impl Default for Atom {
    fn default() -> Self {
        Self {
            state: AtomState {
                w_minus: 0.5,
                w_zero: 0.0,
                w_plus: 0.5,
            },
            structure: 0.52,
            flexibility: 0.48,
        }
    }
}

impl Atom {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> AtomState {
        self.state
    }

    /// Replaces the state; rejected when the polar states drift from 50/50.
    pub fn set_state(&mut self, state: AtomState) -> Result<(), BalanceError> {
        if !state.is_polar_balanced() {
            let (positive, negative) = state.polar_balance();
            return Err(BalanceError::Violation {
                name: "polar states".to_string(),
                positive,
                negative,
            });
        }
        self.state = state;
        Ok(())
    }

    #[must_use]
    pub fn validate_meta_compliance(&self) -> bool {
        self.state.is_polar_balanced()
    }

    #[must_use]
    pub fn validate_operational_compliance(&self) -> bool {
        enables_meta(self.structure, self.flexibility)
    }

    #[must_use]
    pub fn proof(&self) -> AtomProof {
        let (w_minus, w_plus) = self.state.polar_balance();
        let (structure, flexibility) = calculate_balance(self.structure, self.flexibility);
        AtomProof {
            meta_valid: self.validate_meta_compliance(),
            meta_balance: AtomBalance {
                w_minus,
                w_plus,
                is_50_50: self.validate_meta_compliance(),
            },
            operational_valid: self.validate_operational_compliance(),
            operational_ratio: AtomOperational {
                structure,
                flexibility,
                is_52_48: self.validate_operational_compliance(),
            },
            state: self.state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_atom_is_compliant() {
        let atom = Atom::new();
        let proof = atom.proof();
        assert!(proof.meta_valid);
        assert!(proof.operational_valid);
        assert!((proof.operational_ratio.structure - 52.0).abs() < 1e-9);
        assert!((proof.meta_balance.w_minus - 50.0).abs() < 1e-9);
    }

    #[test]
    fn set_state_keeps_polar_balance() {
        let mut atom = Atom::new();
        atom.set_state(AtomState::new(2.0, 5.0, 2.0).unwrap()).unwrap();
        assert!((atom.state().total() - 9.0).abs() < 1e-12);

        let err = atom
            .set_state(AtomState::new(3.0, 0.0, 1.0).unwrap())
            .unwrap_err();
        assert!(matches!(err, BalanceError::Violation { .. }));
        assert!((atom.state().weight(WaveState::Minus) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn atom_state_rejects_negative_weights() {
        assert!(AtomState::new(0.0, -0.1, 0.0).is_err());
    }

    #[test]
    fn wave_state_parses_and_renders_symbols() {
        assert_eq!(WaveState::parse("w+"), Ok(WaveState::Plus));
        assert_eq!(WaveState::Zero.symbol(), "w⁰");
    }
}
