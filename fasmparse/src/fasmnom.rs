use super::*;
use std::str::FromStr;
use nom::{
    IResult,
    combinator::{ map_res, recognize },
    multi::many0_count,
    sequence::pair,
    character::is_alphanumeric,
    // the format is strictly line oriented. every parser here runs on
    // a single line with the newline already stripped, so only
    // complete combinators are used.
    character::complete::{ char, satisfy, digit1 },
    bytes::complete::{ take_till, take_till1 },
};

fn u82str_unsafe(i: &[u8]) -> &str {
    unsafe { std::str::from_utf8_unchecked(i) }
}

/// skips spaces and tabs. newlines never reach this because the input
/// is split into lines first.
fn skip_hs(i: &[u8]) -> &[u8] {
    let mut n = 0;
    while n < i.len() && (i[n] == b' ' || i[n] == b'\t') {
        n += 1;
    }
    &i[n..]
}

/// Parse an identifier.
fn ident(i: &[u8]) -> IResult<&[u8], &[u8]> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        take_till(|c| !is_alphanumeric(c) && c != b'_'),
    ))(i)
}

/// Parse a dotted feature name.
fn feature(i: &[u8]) -> IResult<&[u8], &[u8]> {
    recognize(pair(
        ident,
        many0_count(pair(char('.'), ident)),
    ))(i)
}

fn uint(i: &[u8]) -> IResult<&[u8], usize> {
    map_res(digit1, |d| usize::from_str(u82str_unsafe(d)))(i)
}

fn dec_digits(i: &[u8]) -> IResult<&[u8], &[u8]> {
    digit1(i)
}

/// digit run for any Verilog radix. a digit invalid for the actual
/// radix is caught during value conversion, with a better message than
/// a grammar mismatch would give.
fn radix_digits(i: &[u8]) -> IResult<&[u8], &[u8]> {
    take_till1(|c: u8| !c.is_ascii_hexdigit() && c != b'_')(i)
}

/// Raw per-line syntax before semantic checks. Digit strings are kept
/// verbatim; columns are 1-based positions used for error reporting.
struct ValueAst<'i> {
    width: Option<usize>,
    format: ValueFormat,
    digits: &'i [u8],
    col: usize,
}

struct SetFeatureAst<'i> {
    feature: CompactString,
    /// `(first, second)` from `[first]` or `[first:second]`, i.e. the
    /// source order `[end:start]`.
    address: Option<(usize, Option<usize>)>,
    address_col: usize,
    value: Option<ValueAst<'i>>,
}

struct LineCtx<'i> {
    line: &'i [u8],
    lineno: usize,
}

impl<'i> LineCtx<'i> {
    fn col(&self, rest: &[u8]) -> usize {
        self.line.len() - rest.len() + 1
    }

    fn lex(&self, rest: &[u8], msg: impl Into<String>) -> FasmError {
        FasmError::lex(self.lineno, self.col(rest), msg)
    }

    fn syntax(&self, rest: &[u8], msg: impl Into<String>) -> FasmError {
        FasmError::syntax(self.lineno, self.col(rest), msg)
    }
}

/// parses `feature ('[' uint (':' uint)? ']')? ('=' value)?`.
fn set_feature_ast<'i>(
    ctx: &LineCtx<'i>, i: &'i [u8],
) -> Result<(&'i [u8], SetFeatureAst<'i>), FasmError> {
    let (mut i, name) = match feature(i) {
        Ok((rest, name)) => (rest, CompactString::from(u82str_unsafe(name))),
        Err(_) => return Err(ctx.lex(i, "expected a feature name")),
    };

    let address_col = ctx.col(i);
    let mut address = None;
    if i.first() == Some(&b'[') {
        let (r, first) = match uint(&i[1..]) {
            Ok(x) => x,
            Err(_) => return Err(ctx.syntax(&i[1..], "expected a bit index after '['")),
        };
        let (r, second) = if r.first() == Some(&b':') {
            match uint(&r[1..]) {
                Ok((r2, v)) => (r2, Some(v)),
                Err(_) => return Err(ctx.syntax(&r[1..], "expected a bit index after ':'")),
            }
        } else {
            (r, None)
        };
        if r.first() != Some(&b']') {
            return Err(ctx.syntax(r, "expected ']' to close the feature address"));
        }
        address = Some((first, second));
        i = &r[1..];
    }

    let mut value = None;
    let j = skip_hs(i);
    if j.first() == Some(&b'=') {
        let j = skip_hs(&j[1..]);
        let (rest, ast) = feature_value(ctx, j)?;
        value = Some(ast);
        i = rest;
    }

    Ok((i, SetFeatureAst { feature: name, address, address_col, value }))
}

/// parses a plain decimal or `<width>'<radix><digits>` literal.
fn feature_value<'i>(
    ctx: &LineCtx<'i>, i: &'i [u8],
) -> Result<(&'i [u8], ValueAst<'i>), FasmError> {
    let col = ctx.col(i);
    let (r, digits) = match dec_digits(i) {
        Ok(x) => x,
        Err(_) => return Err(ctx.syntax(i, "expected a value after '='")),
    };
    if r.first() != Some(&b'\'') {
        return Ok((r, ValueAst {
            width: None,
            format: ValueFormat::Plain,
            digits,
            col,
        }));
    }

    let width = match usize::from_str(u82str_unsafe(digits)) {
        Ok(w) => w,
        Err(_) => return Err(ctx.lex(i, "literal width out of range")),
    };
    let r = &r[1..];
    let format = match r.first().copied() {
        Some(b'h') => ValueFormat::VerilogHex,
        Some(b'd') => ValueFormat::VerilogDecimal,
        Some(b'b') => ValueFormat::VerilogBinary,
        Some(b'o') => ValueFormat::VerilogOctal,
        _ => return Err(ctx.syntax(r, "expected radix 'h', 'd', 'b' or 'o'")),
    };
    let r2 = &r[1..];
    let (rest, digits) = match radix_digits(r2) {
        Ok(x) => x,
        Err(_) => return Err(ctx.syntax(r2, "expected digits after the radix")),
    };
    Ok((rest, ValueAst { width: Some(width), format, digits, col }))
}

/// parses `'{' annotation (',' annotation)* '}'` starting at the `{`.
fn annotations_block<'i>(
    ctx: &LineCtx<'i>, i: &'i [u8],
) -> Result<(&'i [u8], Vec<Annotation>), FasmError> {
    let mut r = skip_hs(&i[1..]);
    let mut anns = Vec::new();
    loop {
        let (rest, name) = match ident(r) {
            Ok(x) => x,
            Err(_) => return Err(ctx.syntax(r, "expected an annotation name")),
        };
        let name = CompactString::from(u82str_unsafe(name));
        let mut rest = skip_hs(rest);
        let mut value = CompactString::new("");
        if rest.first() == Some(&b'=') {
            let after_eq = skip_hs(&rest[1..]);
            let (r2, s) = string_lit(ctx, after_eq)?;
            value = s;
            rest = skip_hs(r2);
        }
        anns.push(Annotation { name, value });
        match rest.first() {
            Some(&b',') => r = skip_hs(&rest[1..]),
            Some(&b'}') => return Ok((&rest[1..], anns)),
            _ => return Err(ctx.syntax(rest, "expected ',' or '}' in annotations")),
        }
    }
}

/// parses a double-quoted string, keeping escape sequences verbatim.
fn string_lit<'i>(
    ctx: &LineCtx<'i>, i: &'i [u8],
) -> Result<(&'i [u8], CompactString), FasmError> {
    if i.first() != Some(&b'"') {
        return Err(ctx.syntax(i, "expected a quoted annotation value"));
    }
    let body = &i[1..];
    let mut n = 0;
    while n < body.len() {
        match body[n] {
            b'"' => {
                let s = CompactString::from(u82str_unsafe(&body[..n]));
                return Ok((&body[n + 1..], s));
            }
            b'\\' => {
                if n + 1 >= body.len() {
                    break;
                }
                n += 2;
            }
            _ => n += 1,
        }
    }
    Err(ctx.lex(i, "unterminated string"))
}

/// semantic pass: widths and value ranges per the FASM rules.
fn analyze_set_feature(ctx: &LineCtx, ast: SetFeatureAst) -> Result<SetFeature, FasmError> {
    let (start, end, address_width) = match ast.address {
        None => (None, None, 1),
        Some((first, None)) => (Some(first), None, 1),
        Some((end_idx, Some(start_idx))) => {
            if end_idx < start_idx {
                return Err(FasmError::semantic(
                    ctx.lineno, ast.address_col,
                    format!("feature address end {} is less than start {}",
                            end_idx, start_idx)));
            }
            (Some(start_idx), Some(end_idx), end_idx - start_idx + 1)
        }
    };

    let (value, value_format) = match ast.value {
        None => (FasmValue::one(), None),
        Some(ast_value) => {
            let (radix, radix_name) = match ast_value.format {
                ValueFormat::Plain | ValueFormat::VerilogDecimal => (10, "decimal"),
                ValueFormat::VerilogHex => (16, "hex"),
                ValueFormat::VerilogBinary => (2, "binary"),
                ValueFormat::VerilogOctal => (8, "octal"),
            };
            let value = match FasmValue::parse_radix(ast_value.digits, radix) {
                Some(v) => v,
                None => return Err(FasmError::lex(
                    ctx.lineno, ast_value.col,
                    format!("invalid digits for a {} literal", radix_name))),
            };
            if let Some(width) = ast_value.width {
                if !value.fits_width(width) {
                    return Err(FasmError::semantic(
                        ctx.lineno, ast_value.col,
                        format!("value does not fit in the declared width {}", width)));
                }
                if width > address_width {
                    return Err(FasmError::semantic(
                        ctx.lineno, ast_value.col,
                        format!("declared width {} exceeds the address width {}",
                                width, address_width)));
                }
            }
            if !value.fits_width(address_width) {
                return Err(FasmError::semantic(
                    ctx.lineno, ast_value.col,
                    format!("value does not fit in the address width {}", address_width)));
            }
            (value, Some(ast_value.format))
        }
    };

    Ok(SetFeature { feature: ast.feature, start, end, value, value_format })
}

/// parses one line. blank lines produce `None`.
fn parse_line(ctx: &LineCtx) -> Result<Option<FasmLine>, FasmError> {
    let mut i = skip_hs(ctx.line);

    let mut set_feature = None;
    if matches!(i.first(), Some(&c) if c.is_ascii_alphabetic() || c == b'_') {
        let (rest, ast) = set_feature_ast(ctx, i)?;
        set_feature = Some(analyze_set_feature(ctx, ast)?);
        i = skip_hs(rest);
    }

    let mut annotations = None;
    if i.first() == Some(&b'{') {
        let (rest, anns) = annotations_block(ctx, i)?;
        annotations = Some(anns);
        i = skip_hs(rest);
    }

    let mut comment = None;
    if i.first() == Some(&b'#') {
        comment = Some(CompactString::from(u82str_unsafe(&i[1..])));
        i = &i[i.len()..];
    }

    if !i.is_empty() {
        return Err(ctx.lex(i, format!("unexpected character {:?}", i[0] as char)));
    }

    if set_feature.is_none() && annotations.is_none() && comment.is_none() {
        return Ok(None);
    }
    Ok(Some(FasmLine { set_feature, annotations, comment }))
}

/// Parses full FASM source, producing one model line per non-blank
/// source line. The input must be valid UTF-8.
pub(crate) fn parse_fasm(input: &[u8]) -> Result<Vec<FasmLine>, FasmError> {
    let mut lines = Vec::new();
    let mut chunks = input.split(|&c| c == b'\n').peekable();
    let mut lineno = 0;
    while let Some(mut raw) = chunks.next() {
        lineno += 1;
        // the chunk after a trailing newline is not a line.
        if raw.is_empty() && chunks.peek().is_none() {
            break;
        }
        if raw.last() == Some(&b'\r') {
            raw = &raw[..raw.len() - 1];
        }
        let ctx = LineCtx { line: raw, lineno };
        if let Some(line) = parse_line(&ctx)? {
            lines.push(line);
        }
    }
    Ok(lines)
}
