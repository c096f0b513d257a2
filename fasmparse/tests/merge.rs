//! tests for the merge and sort engine

use fasmparse::*;
use lazy_static::lazy_static;
use regex::Regex;

static INIT_LOGGING: std::sync::Once = std::sync::Once::new();
fn init_logging() {
    INIT_LOGGING.call_once(|| clilog::init_stderr_color_debug());
}

fn parse(s: &str) -> Vec<FasmLine> {
    Fasm::parse_str(s).expect("parse error").lines
}

#[test]
fn test_merge_adjacent_bits() {
    init_logging();
    let lines = merge_and_sort(&parse("A[0] = 1\nA[1] = 1\n"));
    assert_eq!(fasm_to_string(&lines, false), "A[1:0] = 2'b11\n");
}

#[test]
fn test_merge_sparse_bits() {
    init_logging();
    let lines = merge_and_sort(&parse("A[5] = 1\nA[7] = 1\n"));
    assert_eq!(fasm_to_string(&lines, false), "A[7:0] = 8'b10100000\n");
}

#[test]
fn test_merge_scalar_and_bit() {
    init_logging();
    let lines = merge_and_sort(&parse("A\nA[2] = 1\n"));
    assert_eq!(fasm_to_string(&lines, false), "A[2:0] = 3'b101\n");
}

#[test]
fn test_merge_preserves_bits() {
    init_logging();
    let model = parse("C.F[0] = 1\nC.F[3] = 1\nC.F[9] = 1\nC.G[1:0] = 2'b10\n");
    let merged = merge_and_sort(&model);
    assert_eq!(fasm_to_string(&merged, true), fasm_to_string(&model, true));
}

#[test]
fn test_annotated_feature_not_merged() {
    init_logging();
    let lines = merge_and_sort(&parse("B[1] = 1 { keep = \"1\" }\nB[0] = 1\n"));
    assert_eq!(fasm_to_string(&lines, false),
               "B[1] = 1 { keep = \"1\" }\nB[0] = 1\n");
}

#[test]
fn test_comment_attaches_to_feature() {
    init_logging();
    let lines = merge_and_sort(&parse("# about B\nB.X[0] = 1\nA.Y\n"));
    assert_eq!(fasm_to_string(&lines, false),
               "A.Y\n\n# about B\nB.X[0] = 1\n");
}

#[test]
fn test_annotation_groups_come_last() {
    init_logging();
    let lines = merge_and_sort(&parse("{ meta = \"1\" }\nZ.F\n"));
    assert_eq!(fasm_to_string(&lines, false), "Z.F\n\n{ meta = \"1\" }\n");
}

#[test]
fn test_group_ids_sorted_with_blank_separators() {
    init_logging();
    let lines = merge_and_sort(&parse("B.ONE\nA.TWO\nB.THREE\nA.FOUR\n"));
    assert_eq!(fasm_to_string(&lines, false),
               "A.FOUR\nA.TWO\n\nB.ONE\nB.THREE\n");
}

#[test]
fn test_zero_function() {
    init_logging();
    let model = parse("UNUSED.A\nUNUSED.B\nUSED.C\n");
    let lines = merge_and_sort_custom(
        &model,
        Some(|feature: &str| feature.starts_with("UNUSED")),
        None::<fn(&str) -> String>,
    );
    assert_eq!(fasm_to_string(&lines, false), "USED.C\n");
}

lazy_static! {
    static ref RE_TILE: Regex = Regex::new(r"^([A-Za-z]+)_X(\d+)Y(\d+)$").unwrap();
}

fn tile_key(group_id: &str) -> (String, usize, usize) {
    match RE_TILE.captures(group_id) {
        Some(caps) => (
            caps[1].to_string(),
            caps[2].parse().unwrap(),
            caps[3].parse().unwrap(),
        ),
        None => (group_id.to_string(), 0, 0),
    }
}

#[test]
fn test_custom_sort_key() {
    init_logging();
    let model = parse("TILE_X2Y100.F\nTILE_X2Y1.F\nTILE_X2Y2.F\n");

    // lexicographic default puts Y100 before Y2
    let lines = merge_and_sort(&model);
    assert_eq!(fasm_to_string(&lines, false),
               "TILE_X2Y1.F\n\nTILE_X2Y100.F\n\nTILE_X2Y2.F\n");

    let lines = merge_and_sort_custom(
        &model, None::<fn(&str) -> bool>, Some(tile_key));
    assert_eq!(fasm_to_string(&lines, false),
               "TILE_X2Y1.F\n\nTILE_X2Y2.F\n\nTILE_X2Y100.F\n");
}

#[test]
fn test_blank_lines_discarded() {
    init_logging();
    let lines = merge_and_sort(&parse("A.F\n\n\nA.G\n"));
    assert_eq!(fasm_to_string(&lines, false), "A.F\nA.G\n");
}
