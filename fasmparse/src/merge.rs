//! Grouping, address merging and sorted output of FASM lines.

use std::collections::{ BTreeSet, HashMap, HashSet };

use super::*;

/// Combines features with varying addresses but the same feature name.
///
/// `A[0] = 1` and `A[1] = 1` become `A[1:0] = 2'b11`, while `A[5] = 1`
/// and `A[7] = 1` become `A[7:0] = 8'b10100000`. A bit asserted set by
/// one input and cleared by another is a programmer error and panics.
pub(crate) fn merge_features(features: &[SetFeature]) -> SetFeature {
    assert!(!features.is_empty());
    assert!(features.iter().all(|f| f.feature == features[0].feature),
            "cannot merge features with different names");

    let mut set_bits = BTreeSet::new();
    let mut cleared_bits = BTreeSet::new();

    for feature in features {
        let start = feature.start.unwrap_or(0);
        let end = feature.end.unwrap_or(start);
        for bit in start..=end {
            if feature.value.bit(bit - start) {
                assert!(!cleared_bits.contains(&bit),
                        "bit {} of {} is both set and cleared", bit, feature.feature);
                set_bits.insert(bit);
            } else {
                assert!(!set_bits.contains(&bit),
                        "bit {} of {} is both set and cleared", bit, feature.feature);
                cleared_bits.insert(bit);
            }
        }
    }

    let max_bit = *set_bits.iter().chain(cleared_bits.iter()).max().unwrap();

    SetFeature {
        feature: features[0].feature.clone(),
        start: Some(0),
        end: Some(max_bit),
        value: FasmValue::from_set_bits(&set_bits),
        value_format: Some(ValueFormat::VerilogBinary),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    NoGroup,
    InCommentGroup,
    InAnnotationGroup,
}

/// Groups lines for merging: consecutive comments attach to the next
/// non-comment entry, consecutive annotations group together, blank
/// lines are discarded.
struct MergeModel {
    state: State,
    groups: Vec<Vec<FasmLine>>,
    current_group: Option<Vec<FasmLine>>,
}

impl MergeModel {
    fn new() -> MergeModel {
        MergeModel {
            state: State::NoGroup,
            groups: Vec::new(),
            current_group: None,
        }
    }

    fn close_current(&mut self) {
        if let Some(group) = self.current_group.take() {
            self.groups.push(group);
        }
    }

    fn start_comment_group(&mut self, line: FasmLine) {
        self.close_current();
        self.state = State::InCommentGroup;
        self.current_group = Some(vec![line]);
    }

    fn start_annotation_group(&mut self, line: FasmLine) {
        self.close_current();
        self.state = State::InAnnotationGroup;
        self.current_group = Some(vec![line]);
    }

    /// Adds a line. Stateful: insertion order decides the grouping.
    fn add(&mut self, line: FasmLine) {
        match self.state {
            State::NoGroup => {
                if line.is_only_comment() {
                    self.start_comment_group(line);
                } else if line.is_only_annotation() {
                    self.start_annotation_group(line);
                } else if !line.is_blank() {
                    self.groups.push(vec![line]);
                }
            }
            State::InCommentGroup => {
                if line.is_only_comment() {
                    self.current_group.as_mut().unwrap().push(line);
                } else if line.is_only_annotation() {
                    self.current_group.as_mut().unwrap().push(line);
                    self.state = State::InAnnotationGroup;
                } else {
                    if !line.is_blank() {
                        self.current_group.as_mut().unwrap().push(line);
                    }
                    self.close_current();
                    self.state = State::NoGroup;
                }
            }
            State::InAnnotationGroup => {
                if line.is_only_comment() {
                    self.start_comment_group(line);
                } else if line.is_only_annotation() {
                    self.current_group.as_mut().unwrap().push(line);
                } else {
                    self.close_current();
                    self.state = State::NoGroup;
                    self.add(line);
                }
            }
        }
    }

    fn finish(&mut self) {
        self.close_current();
    }

    /// Coalesces addresses of features that appear alone in their group.
    /// A feature name that also shows up in a commented or annotated
    /// group is left untouched everywhere.
    fn merge_addresses(&mut self) {
        fn eligible_feature(group: &[FasmLine]) -> Option<&SetFeature> {
            if group.len() > 1 {
                return None;
            }
            let line = &group[0];
            if line.has_annotations() || line.comment.is_some() {
                return None;
            }
            line.set_feature.as_ref()
        }

        let mut eligible_order: Vec<CompactString> = Vec::new();
        let mut eligible: HashMap<CompactString, Vec<SetFeature>> = HashMap::new();
        let mut non_eligible_groups: Vec<Vec<FasmLine>> = Vec::new();
        let mut non_eligible_features: HashSet<CompactString> = HashSet::new();

        for group in self.groups.drain(..) {
            match eligible_feature(&group).cloned() {
                Some(feature) => {
                    if !eligible.contains_key(&feature.feature) {
                        eligible_order.push(feature.feature.clone());
                    }
                    eligible.entry(feature.feature.clone()).or_default().push(feature);
                }
                None => {
                    for line in &group {
                        if let Some(feature) = &line.set_feature {
                            non_eligible_features.insert(feature.feature.clone());
                        }
                    }
                    non_eligible_groups.push(group);
                }
            }
        }

        self.groups = non_eligible_groups;

        let feature_line = |feature| FasmLine {
            set_feature: Some(feature),
            annotations: None,
            comment: None,
        };
        for name in eligible_order {
            let features = eligible.remove(&name).unwrap();
            if !non_eligible_features.contains(&name) && features.len() > 1 {
                self.groups.push(vec![feature_line(merge_features(&features))]);
            } else {
                for feature in features {
                    self.groups.push(vec![feature_line(feature)]);
                }
            }
        }
    }

    /// Sorts groups by their group id (the first dotted atom), then by
    /// the full name of their first feature, and emits the lines with a
    /// blank separator between groups. Groups without any feature come
    /// last, in input order.
    fn output_sorted_lines<Z, S, K>(
        self, zero_function: Option<Z>, sort_key: Option<S>,
    ) -> Vec<FasmLine>
    where Z: Fn(&str) -> bool, S: Fn(&str) -> K, K: Ord {
        let mut id_order: Vec<CompactString> = Vec::new();
        let mut feature_groups: HashMap<CompactString, Vec<Vec<FasmLine>>> = HashMap::new();
        let mut non_feature_groups: Vec<Vec<FasmLine>> = Vec::new();

        for group in self.groups {
            let group_id = group.iter().find_map(|line| {
                line.set_feature.as_ref().map(
                    |f| CompactString::from(f.feature.split('.').next().unwrap()))
            });
            match group_id {
                Some(id) => {
                    if !feature_groups.contains_key(&id) {
                        id_order.push(id.clone());
                    }
                    feature_groups.entry(id).or_default().push(group);
                }
                None => non_feature_groups.push(group),
            }
        }

        match &sort_key {
            Some(key) => id_order.sort_by_key(|id| key(id.as_str())),
            None => id_order.sort(),
        }

        fn first_feature(group: &[FasmLine]) -> &str {
            for line in group {
                if let Some(feature) = &line.set_feature {
                    return &feature.feature;
                }
            }
            unreachable!("feature group without a feature line")
        }

        let mut output_groups: Vec<Vec<FasmLine>> = Vec::new();
        for id in &id_order {
            let mut groups = feature_groups.remove(id).unwrap();
            groups.sort_by(|a, b| first_feature(a).cmp(first_feature(b)));
            let flattened: Vec<FasmLine> = groups.into_iter().flatten().collect();

            if let Some(zero) = &zero_function {
                let all_zero = flattened.iter()
                    .filter_map(|line| line.set_feature.as_ref())
                    .all(|f| zero(&f.feature));
                if all_zero {
                    continue;
                }
            }
            output_groups.push(flattened);
        }
        output_groups.extend(non_feature_groups);

        let num_groups = output_groups.len();
        let mut out = Vec::new();
        for (idx, group) in output_groups.into_iter().enumerate() {
            out.extend(group);
            if idx + 1 != num_groups {
                out.push(FasmLine::default());
            }
        }
        out
    }
}

/// Groups, merges and sorts a FASM model for pretty non-canonical output.
///
/// Group ids are ordered lexicographically; use [merge_and_sort_custom]
/// for custom orders or to drop all-zero group ids.
pub fn merge_and_sort(model: &[FasmLine]) -> Vec<FasmLine> {
    merge_and_sort_custom(model, None::<fn(&str) -> bool>, None::<fn(&str) -> String>)
}

/// [merge_and_sort] with optional custom behaviors.
///
/// `zero_function` reports whether a feature has no bits set; a group id
/// whose features all return true is dropped from the output, which lets
/// callers omit tiles that only carry default values.
///
/// `sort_key` maps a group id to an ordering key, so that e.g.
/// `A_X2Y100` can sort after `A_X2Y2` by parsing out `("A", 2, 100)`.
pub fn merge_and_sort_custom<Z, S, K>(
    model: &[FasmLine], zero_function: Option<Z>, sort_key: Option<S>,
) -> Vec<FasmLine>
where Z: Fn(&str) -> bool, S: Fn(&str) -> K, K: Ord {
    let mut merged = MergeModel::new();
    for line in model {
        merged.add(line.clone());
    }
    merged.finish();
    merged.merge_addresses();
    merged.output_sorted_lines(zero_function, sort_key)
}

#[test]
fn test_merge_features() {
    let a0 = SetFeature {
        feature: "A".into(),
        start: Some(0),
        end: None,
        value: FasmValue::one(),
        value_format: Some(ValueFormat::Plain),
    };
    let a1 = SetFeature { start: Some(1), ..a0.clone() };
    let merged = merge_features(&[a0, a1]);
    assert_eq!(merged.start, Some(0));
    assert_eq!(merged.end, Some(1));
    assert_eq!(merged.value, FasmValue::from_u128(0b11));
    assert_eq!(merged.value_format, Some(ValueFormat::VerilogBinary));

    let sparse = [
        SetFeature { start: Some(5), ..SetFeature::scalar("B") },
        SetFeature { start: Some(7), ..SetFeature::scalar("B") },
    ];
    let merged = merge_features(&sparse);
    assert_eq!(merged.end, Some(7));
    assert_eq!(merged.value, FasmValue::from_u128(0b10100000));
}
