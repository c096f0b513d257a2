use std::fmt;
use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;

use super::*;
use crate::canonical::canonical_features;

lazy_static! {
    static ref RE_FEATURE: Regex = Regex::new(
        r"^[a-zA-Z_][a-zA-Z0-9_]*(\.[a-zA-Z_][a-zA-Z0-9_]*)*$").unwrap();
}

/// Renders `value` the way [ValueFormat] spells it, with `width` as the
/// Verilog width prefix.
fn value_to_str(value: &FasmValue, width: usize, format: ValueFormat) -> String {
    use ValueFormat::*;
    match format {
        Plain => value.to_radix_str(10, false),
        VerilogDecimal => format!("{}'d{}", width, value.to_radix_str(10, false)),
        VerilogHex => format!("{}'h{}", width, value.to_radix_str(16, true)),
        VerilogBinary => format!("{}'b{}", width, value.to_radix_str(2, false)),
        VerilogOctal => format!("{}'o{}", width, value.to_radix_str(8, false)),
    }
}

impl fmt::Display for SetFeature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        assert!(RE_FEATURE.is_match(&self.feature),
                "malformed feature name {:?}", self.feature);
        let width = self.address_width();
        assert!(self.value.fits_width(width),
                "value of {} does not fit in {} bits", self.feature, width);

        write!(f, "{}", self.feature)?;
        match (self.start, self.end) {
            (Some(start), Some(end)) => write!(f, "[{}:{}]", end, start)?,
            (Some(start), None) => write!(f, "[{}]", start)?,
            _ => {}
        }
        if let Some(format) = self.value_format {
            write!(f, " = {}", value_to_str(&self.value, width, format))?;
        }
        Ok(())
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} = \"{}\"", self.name, self.value)
    }
}

impl fmt::Display for FasmLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut need_space = false;
        if let Some(feature) = &self.set_feature {
            write!(f, "{}", feature)?;
            need_space = true;
        }
        if let Some(annotations) = &self.annotations {
            if need_space {
                f.write_str(" ")?;
            }
            write!(f, "{{ {} }}", annotations.iter().format(", "))?;
            need_space = true;
        }
        if let Some(comment) = &self.comment {
            if need_space {
                f.write_str(" ")?;
            }
            write!(f, "#{}", comment)?;
        }
        Ok(())
    }
}

impl fmt::Display for Fasm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&fasm_to_string(&self.lines, false))
    }
}

/// asserts the canonical form constraints on an emitted feature.
fn check_canonical(feature: &SetFeature) {
    assert_eq!(feature.address_width(), 1,
               "canonical feature {} is wider than one bit", feature.feature);
    assert!(feature.end.is_none());
    assert_ne!(feature.start, Some(0),
               "canonical bit 0 of {} must drop its address", feature.feature);
    assert!(feature.value_format.is_none() && feature.value.is_one());
}

/// Renders a sequence of lines back to FASM text, ending with a newline.
///
/// In canonical mode every feature expands to single-bit assertions,
/// annotations and comments are dropped, and the output lines are
/// deduplicated and sorted.
pub fn fasm_to_string<'a>(
    lines: impl IntoIterator<Item = &'a FasmLine>, canonical: bool,
) -> String {
    let mut rendered: Vec<String> = Vec::new();
    for line in lines {
        if canonical {
            if let Some(feature) = &line.set_feature {
                for atom in canonical_features(feature) {
                    check_canonical(&atom);
                    rendered.push(atom.to_string());
                }
            }
        } else {
            rendered.push(line.to_string());
        }
    }
    if canonical {
        rendered.sort();
        rendered.dedup();
    }
    let mut out = rendered.join("\n");
    out.push('\n');
    out
}

impl fmt::Display for FasmErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use FasmErrorKind::*;
        match self {
            Lex(msg) | Syntax(msg) | Semantic(msg) => f.write_str(msg),
            Io(e) => write!(f, "{}", e),
        }
    }
}

impl fmt::Display for FasmError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) =>
                write!(f, "parse error at {}:{} - {}", line, column, self.kind),
            _ => write!(f, "parse error - {}", self.kind),
        }
    }
}

impl std::error::Error for FasmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            FasmErrorKind::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FasmError> for String {
    fn from(e: FasmError) -> String {
        format!("{}", e)
    }
}
