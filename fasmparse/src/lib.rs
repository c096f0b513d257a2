//! A FASM (FPGA assembly) parser and formatter written in Rust.
//!
//! # Usage
//!
//! Just pass a `&str` to [Fasm::parse_str]. Example:
//! ```
//! use fasmparse::Fasm;
//!
//! let parsed = Fasm::parse_str(
//!     "CLB_X2Y3.SLICE.CLKINV # clock inverter\n\
//!      CLB_X2Y3.SLICE.ALUT.INIT[15:0] = 16'hA5A5\n").expect("parse error");
//! assert_eq!(parsed.lines.len(), 2);
//! ```
//!
//! The parsed model can be rendered back with [fasm_to_string] (either
//! verbatim or in canonical single-bit form), expanded with
//! [canonical_features], or regrouped and coalesced with [merge_and_sort].

use std::io;
use compact_str::CompactString;

mod value;
pub use value::FasmValue;

/// Number format a FASM feature value was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    /// E.g. `42`.
    Plain,
    /// E.g. `8'd42`.
    VerilogDecimal,
    /// E.g. `8'h2a`.
    VerilogHex,
    /// E.g. `8'b00101010`.
    VerilogBinary,
    /// E.g. `8'o52`.
    VerilogOctal,
}

/// A single feature assertion, e.g. `CLB.SLICE.AMUX[7:0] = 8'hFF`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetFeature {
    /// Dotted hierarchical feature name. E.g. `CLB_X2Y3.SLICE.CLKINV`.
    pub feature: CompactString,
    /// First addressed bit, when an address is present.
    pub start: Option<usize>,
    /// Last addressed bit. Only present for an `[end:start]` range.
    pub end: Option<usize>,
    /// Value asserted for the addressed bits. Defaults to 1.
    pub value: FasmValue,
    /// How the value was spelled in the source. `None` means the value
    /// was omitted (and therefore is 1).
    pub value_format: Option<ValueFormat>,
}

impl SetFeature {
    /// Number of bits selected by the feature address.
    #[inline]
    pub fn address_width(&self) -> usize {
        match (self.start, self.end) {
            (Some(start), Some(end)) => end - start + 1,
            _ => 1,
        }
    }

    /// A scalar `FEATURE` assertion with the implicit value 1.
    pub fn scalar(feature: impl Into<CompactString>) -> SetFeature {
        SetFeature {
            feature: feature.into(),
            start: None,
            end: None,
            value: FasmValue::one(),
            value_format: None,
        }
    }
}

/// A `name = "value"` metadata pair attached to a line.
///
/// The value keeps its source text verbatim between the quotes; escape
/// sequences are not decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Annotation name. E.g. `source`.
    pub name: CompactString,
    /// Annotation value. May be empty.
    pub value: CompactString,
}

/// One line of a FASM file: an optional feature assertion, optional
/// annotations, and an optional comment.
///
/// The all-`None` line is representable (the merge engine emits it as a
/// blank separator) but the parser never produces it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FasmLine {
    /// Feature assertion, if the line has one.
    pub set_feature: Option<SetFeature>,
    /// Annotations in `{ ... }`, if present.
    pub annotations: Option<Vec<Annotation>>,
    /// Comment text after `#`, verbatim up to the end of line.
    pub comment: Option<CompactString>,
}

impl FasmLine {
    fn has_annotations(&self) -> bool {
        self.annotations.as_ref().map_or(false, |a| !a.is_empty())
    }

    /// True if the line carries only a comment.
    pub fn is_only_comment(&self) -> bool {
        self.set_feature.is_none() && !self.has_annotations() && self.comment.is_some()
    }

    /// True if the line carries only annotations.
    pub fn is_only_annotation(&self) -> bool {
        self.set_feature.is_none() && self.has_annotations() && self.comment.is_none()
    }

    /// True if all three slots are empty.
    pub fn is_blank(&self) -> bool {
        self.set_feature.is_none() && !self.has_annotations() && self.comment.is_none()
    }
}

/// Kinds of FASM parse failure.
#[derive(Debug)]
pub enum FasmErrorKind {
    /// Unrecognized character, unterminated string, or a digit invalid
    /// for the radix.
    Lex(String),
    /// Token sequence does not match the grammar.
    Syntax(String),
    /// Width or range violation.
    Semantic(String),
    /// The input file could not be read.
    Io(io::Error),
}

/// Error raised when FASM parsing fails.
///
/// Positions are 1-based and refer to the offending token. They are
/// absent for I/O failures.
#[derive(Debug)]
pub struct FasmError {
    /// What went wrong.
    pub kind: FasmErrorKind,
    /// Line number, when known.
    pub line: Option<usize>,
    /// Column number, when known.
    pub column: Option<usize>,
}

impl FasmError {
    pub(crate) fn lex(line: usize, column: usize, message: impl Into<String>) -> FasmError {
        FasmError {
            kind: FasmErrorKind::Lex(message.into()),
            line: Some(line),
            column: Some(column),
        }
    }

    pub(crate) fn syntax(line: usize, column: usize, message: impl Into<String>) -> FasmError {
        FasmError {
            kind: FasmErrorKind::Syntax(message.into()),
            line: Some(line),
            column: Some(column),
        }
    }

    pub(crate) fn semantic(line: usize, column: usize, message: impl Into<String>) -> FasmError {
        FasmError {
            kind: FasmErrorKind::Semantic(message.into()),
            line: Some(line),
            column: Some(column),
        }
    }
}

impl From<io::Error> for FasmError {
    fn from(e: io::Error) -> FasmError {
        FasmError {
            kind: FasmErrorKind::Io(e),
            line: None,
            column: None,
        }
    }
}

/// Packages all lines of a parsed FASM file, in source order.
///
/// Blank source lines are not represented; everything else round-trips
/// through [fasm_to_string] modulo whitespace normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fasm {
    /// The parsed lines.
    pub lines: Vec<FasmLine>,
}

mod fasmnom;

impl Fasm {
    /// Parses a string of FASM source into its line model.
    #[inline]
    pub fn parse_str(s: &str) -> Result<Fasm, FasmError> {
        Ok(Fasm { lines: fasmnom::parse_fasm(s.as_bytes())? })
    }

    /// Parses the FASM file at the given path.
    pub fn parse_file(path: impl AsRef<std::path::Path>) -> Result<Fasm, FasmError> {
        let raw = std::fs::read(&path)?;
        let s = match String::from_utf8(raw) {
            Ok(s) => s,
            Err(_) => return Err(FasmError {
                kind: FasmErrorKind::Lex("file is not valid UTF-8".into()),
                line: None,
                column: None,
            }),
        };
        Fasm::parse_str(&s)
    }
}

mod fmt;
pub use fmt::fasm_to_string;

mod canonical;
pub use canonical::canonical_features;

mod merge;
pub use merge::{ merge_and_sort, merge_and_sort_custom };
