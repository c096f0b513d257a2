//! unit tests for fasmparse

use fasmparse::*;

static INIT_LOGGING: std::sync::Once = std::sync::Once::new();
fn init_logging() {
    INIT_LOGGING.call_once(|| clilog::init_stderr_color_debug());
}

const FASM_BLANK: &str = include_str!("blank.fasm");
const FASM_COMMENT: &str = include_str!("comment.fasm");
const FASM_FEATURE_ONLY: &str = include_str!("feature_only.fasm");
const FASM_MANY: &str = include_str!("many.fasm");

fn check_round_trip(fasm: &Fasm) {
    let s = fasm_to_string(&fasm.lines, false);
    let reparsed = Fasm::parse_str(&s).expect("reparse error");
    assert_eq!(&reparsed, fasm);
}

#[test]
fn test_blank_file() {
    init_logging();
    let parsed = Fasm::parse_str(FASM_BLANK).expect("parse error");
    assert_eq!(parsed.lines, vec![]);
    assert_eq!(fasm_to_string(&parsed.lines, false), "\n");
    check_round_trip(&parsed);

    let parsed = Fasm::parse_str("").expect("parse error");
    assert_eq!(parsed.lines, vec![]);
    let parsed = Fasm::parse_str(" \t \n").expect("parse error");
    assert_eq!(parsed.lines, vec![]);
}

#[test]
fn test_comment_file() {
    init_logging();
    let parsed = Fasm::parse_str(FASM_COMMENT).expect("parse error");
    assert_eq!(parsed.lines, vec![FasmLine {
        set_feature: None,
        annotations: None,
        comment: Some(" Only a comment.".into()),
    }]);
    check_round_trip(&parsed);
}

#[test]
fn test_one_line_feature() {
    init_logging();
    let parsed = Fasm::parse_str(FASM_FEATURE_ONLY).expect("parse error");
    assert_eq!(parsed.lines, vec![FasmLine {
        set_feature: Some(SetFeature::scalar("EXAMPLE_FEATURE.X0.Y0.BLAH")),
        annotations: None,
        comment: None,
    }]);
    assert_eq!(fasm_to_string(&parsed.lines, false),
               "EXAMPLE_FEATURE.X0.Y0.BLAH\n");
    check_round_trip(&parsed);
}

#[test]
fn test_full_line() {
    init_logging();
    let parsed = Fasm::parse_str("FOO.BAR[7:0] = 8'hFF { key = \"v\" } # note\n")
        .expect("parse error");
    assert_eq!(parsed.lines.len(), 1);
    let line = &parsed.lines[0];

    let feature = line.set_feature.as_ref().unwrap();
    assert_eq!(feature.feature, "FOO.BAR");
    assert_eq!(feature.start, Some(0));
    assert_eq!(feature.end, Some(7));
    assert_eq!(feature.address_width(), 8);
    assert_eq!(feature.value, FasmValue::from_u128(255));
    assert_eq!(feature.value_format, Some(ValueFormat::VerilogHex));

    assert_eq!(line.annotations.as_ref().unwrap(),
               &vec![Annotation { name: "key".into(), value: "v".into() }]);
    assert_eq!(line.comment.as_deref(), Some(" note"));

    assert_eq!(fasm_to_string(&parsed.lines, false),
               "FOO.BAR[7:0] = 8'hFF { key = \"v\" } # note\n");
    check_round_trip(&parsed);
}

#[test]
fn test_whitespace_normalization() {
    init_logging();
    let parsed = Fasm::parse_str("\tFOO.BAR[7:0]\t=  8'hFF  {key=\"v\",w = \"\"}#x\n")
        .expect("parse error");
    assert_eq!(fasm_to_string(&parsed.lines, false),
               "FOO.BAR[7:0] = 8'hFF { key = \"v\", w = \"\" } #x\n");
}

#[test]
fn test_value_formats() {
    init_logging();
    let parsed = Fasm::parse_str(FASM_MANY).expect("parse error");
    let feature = |name: &str| {
        parsed.lines.iter()
            .filter_map(|l| l.set_feature.as_ref())
            .find(|f| f.feature == name)
            .unwrap_or_else(|| panic!("missing feature {}", name))
    };

    assert_eq!(feature("EXAMPLE.ENABLE").value_format, None);
    assert!(feature("EXAMPLE.ENABLE").value.is_one());
    assert_eq!(feature("EXAMPLE.INIT").value, FasmValue::from_u128(0xDEADBEEF));
    assert_eq!(feature("EXAMPLE.INIT").value_format, Some(ValueFormat::VerilogHex));
    assert_eq!(feature("EXAMPLE.MASK").value, FasmValue::from_u128(0b10100101));
    assert_eq!(feature("EXAMPLE.COUNT").value, FasmValue::from_u128(123));
    assert_eq!(feature("EXAMPLE.MODE").value, FasmValue::from_u128(0o52));
    assert_eq!(feature("EXAMPLE.BIT").start, Some(5));
    assert_eq!(feature("EXAMPLE.BIT").end, None);
    assert_eq!(feature("EXAMPLE.PLAIN").value, FasmValue::from_u128(9));
    assert_eq!(feature("EXAMPLE.PLAIN").value_format, Some(ValueFormat::Plain));

    for line in &parsed.lines {
        if let Some(f) = &line.set_feature {
            assert!(f.value.fits_width(f.address_width()));
        }
    }
    check_round_trip(&parsed);
}

#[test]
fn test_wide_value() {
    init_logging();
    let parsed = Fasm::parse_str(
        "LUT.INIT[191:0] = 192'hFFFF_FFFF_FFFF_FFFF_FFFF_FFFF_FFFF_FFFF_0000_0000_0000_0001\n"
    ).expect("parse error");
    let feature = parsed.lines[0].set_feature.as_ref().unwrap();
    assert_eq!(feature.address_width(), 192);
    assert_eq!(feature.value.sig_bits(), 192);
    assert!(feature.value.bit(0) && feature.value.bit(191) && !feature.value.bit(1));
    check_round_trip(&parsed);
}

#[test]
fn test_canonical_scenarios() {
    init_logging();
    let canon = |s: &str| {
        fasm_to_string(&Fasm::parse_str(s).expect("parse error").lines, true)
    };
    assert_eq!(canon(""), "\n");
    assert_eq!(canon("# just a comment\n"), "\n");
    assert_eq!(canon("A.B.C\n"), "A.B.C\n");
    assert_eq!(canon("A[3:0] = 4'b1010\n"), "A[1]\nA[3]\n");
    assert_eq!(canon("X[0] = 1\nX[2] = 1\n"), "X\nX[2]\n");
    assert_eq!(canon("A[7:0] = 8'h00\n"), "\n");
    // duplicates collapse
    assert_eq!(canon("A.B\nA.B\n"), "A.B\n");
    // annotations and comments are dropped
    assert_eq!(canon("F[1] { key = \"v\" } # note\n"), "F[1]\n");
}

#[test]
fn test_canonical_idempotent() {
    init_logging();
    let parsed = Fasm::parse_str(FASM_MANY).expect("parse error");
    let once = fasm_to_string(&parsed.lines, true);
    let twice = fasm_to_string(&Fasm::parse_str(&once).expect("parse error").lines, true);
    assert_eq!(once, twice);

    // ascending and duplicate-free
    let lines: Vec<&str> = once.lines().collect();
    let mut sorted = lines.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(lines, sorted);
}

#[test]
fn test_semantic_errors() {
    init_logging();
    let err = Fasm::parse_str("A[3:0] = 16\n").unwrap_err();
    assert!(matches!(err.kind, FasmErrorKind::Semantic(_)), "{:?}", err);
    assert_eq!(err.line, Some(1));

    // declared width larger than the address width
    let err = Fasm::parse_str("A = 8'hFF\n").unwrap_err();
    assert!(matches!(err.kind, FasmErrorKind::Semantic(_)), "{:?}", err);

    // value wider than the declared width
    let err = Fasm::parse_str("A[7:0] = 4'hFF\n").unwrap_err();
    assert!(matches!(err.kind, FasmErrorKind::Semantic(_)), "{:?}", err);

    let err = Fasm::parse_str("A[0:3] = 4'b1010\n").unwrap_err();
    assert!(matches!(err.kind, FasmErrorKind::Semantic(_)), "{:?}", err);

    let msg = format!("{}", Fasm::parse_str("A[3:0] = 16\n").unwrap_err());
    assert!(msg.starts_with("parse error at 1:"), "{}", msg);
}

#[test]
fn test_syntax_and_lex_errors() {
    init_logging();
    let err = Fasm::parse_str("B =\n").unwrap_err();
    assert!(matches!(err.kind, FasmErrorKind::Syntax(_)), "{:?}", err);

    let err = Fasm::parse_str("B[\n").unwrap_err();
    assert!(matches!(err.kind, FasmErrorKind::Syntax(_)), "{:?}", err);

    let err = Fasm::parse_str("B[3:0] = 4'q1010\n").unwrap_err();
    assert!(matches!(err.kind, FasmErrorKind::Syntax(_)), "{:?}", err);

    let err = Fasm::parse_str("B[3:0] = 4'b1019\n").unwrap_err();
    assert!(matches!(err.kind, FasmErrorKind::Lex(_)), "{:?}", err);

    let err = Fasm::parse_str("X { a = \"oops\n").unwrap_err();
    assert!(matches!(err.kind, FasmErrorKind::Lex(_)), "{:?}", err);

    let err = Fasm::parse_str("X { }\n").unwrap_err();
    assert!(matches!(err.kind, FasmErrorKind::Syntax(_)), "{:?}", err);

    let err = Fasm::parse_str("GOOD\n%BAD\n").unwrap_err();
    assert!(matches!(err.kind, FasmErrorKind::Lex(_)), "{:?}", err);
    assert_eq!(err.line, Some(2));
    assert_eq!(err.column, Some(1));
}

#[test]
fn test_parse_file_missing() {
    init_logging();
    let err = Fasm::parse_file("does_not_exist.fasm").unwrap_err();
    assert!(matches!(err.kind, FasmErrorKind::Io(_)), "{:?}", err);
    assert_eq!(err.line, None);
}
