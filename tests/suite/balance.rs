//! Balanced-pair properties shared by every subsystem.

use civhub_types::{
    Balanced, BalanceError, BalancedPair, MetaEquilibrium, OperationalRatio, Pi6Proportion,
    Ratio, TargetRatio, Tolerance, enables_meta, is_balanced_to, split_50_50, split_52_48,
    verify_meta,
};

use crate::common::approx;

#[test]
fn equal_sides_balance_under_exact_profile() {
    for value in [0.001, 1.0, 42.5, 1e6] {
        assert!(verify_meta(value, value), "{value}/{value} should balance");
        assert!(BalancedPair::new(value, value).unwrap().is_balanced());
    }
    assert!(!verify_meta(50.02, 49.98));
}

#[test]
fn fifty_fifty_split_halves_total() {
    for total in [0.0, 1.0, 99.0, 1234.5] {
        let (a, b) = split_50_50(total);
        assert!(approx(a, b));
        assert!(approx(a + b, total));
    }
}

#[test]
fn fifty_two_forty_eight_split_sums_to_total() {
    let (structure, flexibility) = split_52_48(250.0);
    assert!(approx(structure + flexibility, 250.0));
    assert!((structure / flexibility - 52.0 / 48.0).abs() < 1e-9);
    assert!(enables_meta(structure, flexibility));
    assert!(!enables_meta(0.0, 0.0));
}

#[test]
fn balanced_delta_preserves_balance() {
    let pair = BalancedPair::even(100.0).unwrap();
    let delta = BalancedPair::new(7.5, 7.5).unwrap();
    assert!(pair.add(&delta).is_balanced());
}

#[test]
fn unbalanced_delta_breaks_balance_until_compensated() {
    let pair = BalancedPair::even(100.0).unwrap();
    let skewed = pair.add(&BalancedPair::new(10.0, 0.0).unwrap());
    assert!(!skewed.is_balanced());

    let compensated = skewed.add(&BalancedPair::new(0.0, 10.0).unwrap());
    assert!(compensated.is_balanced());
}

#[test]
fn negative_and_non_finite_sides_are_rejected() {
    assert!(matches!(
        BalancedPair::new(-1.0, 1.0),
        Err(BalanceError::Negative { field: "a", .. })
    ));
    assert!(matches!(
        BalancedPair::new(1.0, f64::NAN),
        Err(BalanceError::NonFinite { field: "b" })
    ));
}

#[test]
fn checked_balance_reports_zero_total() {
    assert_eq!(
        is_balanced_to(0.0, 0.0, TargetRatio::META, Tolerance::EXACT),
        Err(BalanceError::ZeroTotal)
    );
    assert_eq!(
        is_balanced_to(51.0, 49.0, TargetRatio::META, Tolerance::new(1.5)),
        Ok(true)
    );
}

#[test]
fn pi_6_derives_operational_ratio() {
    let connection = Pi6Proportion.verify_meta_connection();
    assert!(connection.sin_equals_half);

    let ratio = OperationalRatio::from_pi_6();
    assert!(ratio.prove_enables_meta().enables_meta);
}

#[test]
fn equilibrium_rejects_unbalanced_parameters() {
    let mut meta = MetaEquilibrium::new();
    meta.register_parameter("knowledge", 30.0, 30.0).unwrap();
    assert!(meta.register_parameter("skewed", 70.0, 30.0).is_err());
    assert_eq!(meta.validated_parameters().len(), 1);
}

#[test]
fn ratio_inverse_of_balanced_is_balanced() {
    let ratio = Ratio::new(5.0, 5.0, "even").unwrap();
    assert!(ratio.is_balanced());
    assert!(ratio.inverse().unwrap().is_balanced());
    assert!(Ratio::new(1.0, 0.0, "broken").is_err());
}
