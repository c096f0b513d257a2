//! Expansion of features into canonical single-bit assertions.

use super::*;

/// Expands a feature into canonical form: single-bit assertions with the
/// implicit value 1, where bit 0 is written without an address.
///
/// A feature whose value is 0 expands to nothing. Inputs violating the
/// model invariants (a multi-bit value without a range address) panic.
pub fn canonical_features(set_feature: &SetFeature) -> Vec<SetFeature> {
    let mut out = Vec::new();
    if set_feature.value.is_zero() {
        return out;
    }

    let start = match set_feature.start {
        None => {
            assert!(set_feature.end.is_none());
            assert!(set_feature.value.is_one(),
                    "scalar feature {} must have value 1", set_feature.feature);
            out.push(SetFeature::scalar(set_feature.feature.clone()));
            return out;
        }
        Some(start) => start,
    };

    let end = match set_feature.end {
        None => {
            assert!(set_feature.value.is_one(),
                    "single-bit feature {} must have value 1", set_feature.feature);
            let mut atom = SetFeature::scalar(set_feature.feature.clone());
            if start != 0 {
                atom.start = Some(start);
            }
            out.push(atom);
            return out;
        }
        Some(end) => end,
    };

    for address in start..=end {
        if set_feature.value.bit(address - start) {
            let mut atom = SetFeature::scalar(set_feature.feature.clone());
            if address != 0 {
                atom.start = Some(address);
            }
            out.push(atom);
        }
    }
    out
}

#[test]
fn test_canonical_features() {
    let range = SetFeature {
        feature: "A.B".into(),
        start: Some(0),
        end: Some(3),
        value: FasmValue::from_u128(0b1010),
        value_format: Some(ValueFormat::VerilogBinary),
    };
    let atoms = canonical_features(&range);
    assert_eq!(atoms, vec![
        SetFeature { start: Some(1), ..SetFeature::scalar("A.B") },
        SetFeature { start: Some(3), ..SetFeature::scalar("A.B") },
    ]);

    let zero = SetFeature { value: FasmValue::zero(),
                            value_format: Some(ValueFormat::VerilogHex),
                            ..range.clone() };
    assert_eq!(canonical_features(&zero), vec![]);

    let bit0 = SetFeature { start: Some(0), end: None,
                            ..SetFeature::scalar("A.B") };
    assert_eq!(canonical_features(&bit0), vec![SetFeature::scalar("A.B")]);
}
