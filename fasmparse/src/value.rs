//! Arbitrary precision feature values.

use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use awint::ExtAwi;

/// An unsigned feature value of arbitrary bit width.
///
/// FASM values are not bounded by a machine word (a 128-bit LUT init
/// mask is legal), so the digits are kept in an [awint::ExtAwi].
/// The backing width is normalized to `max(1, significant bits)`, which
/// makes equality a plain bit comparison.
#[derive(Debug, Clone)]
pub struct FasmValue(ExtAwi);

impl PartialEq for FasmValue {
    fn eq(&self, other: &FasmValue) -> bool {
        self.0.bw() == other.0.bw()
            && (0..self.0.bw()).all(|i| self.0.get(i) == other.0.get(i))
    }
}

impl Eq for FasmValue {}

impl FasmValue {
    fn normalize(awi: ExtAwi) -> FasmValue {
        let sig = awi.sig().max(1);
        if sig == awi.bw() {
            return FasmValue(awi);
        }
        let mut out = ExtAwi::zero(NonZeroUsize::new(sig).unwrap());
        out.zero_resize_(&awi);
        FasmValue(out)
    }

    /// The zero value.
    pub fn zero() -> FasmValue {
        FasmValue(ExtAwi::zero(NonZeroUsize::new(1).unwrap()))
    }

    /// The value 1, the implicit value of a bare feature line.
    pub fn one() -> FasmValue {
        FasmValue::parse_radix(b"1", 2).unwrap()
    }

    /// Builds a value from a `u128`.
    pub fn from_u128(v: u128) -> FasmValue {
        let digits = format!("{:x}", v);
        FasmValue::parse_radix(digits.as_bytes(), 16).unwrap()
    }

    /// Parses digit bytes in the given radix (2, 8, 10 or 16).
    /// Underscores are ignored. Returns `None` when a digit is invalid
    /// for the radix or no digit is present at all.
    pub fn parse_radix(digits: &[u8], radix: u8) -> Option<FasmValue> {
        if digits.iter().all(|&c| c == b'_') {
            return None;
        }
        let bits_per_digit = match radix {
            2 => 1,
            8 => 3,
            10 => 4,
            16 => 4,
            _ => panic!("unsupported radix {}", radix),
        };
        // capacity from the digit count; always enough to hold the value.
        let cap = NonZeroUsize::new(digits.len() * bits_per_digit).unwrap();
        let awi = ExtAwi::from_bytes_radix(None, digits, radix, cap).ok()?;
        Some(FasmValue::normalize(awi))
    }

    /// Number of significant bits. 0 for the zero value.
    #[inline]
    pub fn sig_bits(&self) -> usize {
        self.0.sig()
    }

    /// Whether the value is representable in `width` bits,
    /// i.e. `value < 2^width`.
    #[inline]
    pub fn fits_width(&self, width: usize) -> bool {
        self.0.sig() <= width
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Whether the value is exactly 1.
    #[inline]
    pub fn is_one(&self) -> bool {
        self.0.sig() == 1 && self.bit(0)
    }

    /// The bit at index `i`. Bits at or above the significant width
    /// read as 0.
    #[inline]
    pub fn bit(&self, i: usize) -> bool {
        self.0.get(i).unwrap_or(false)
    }

    /// Builds the value that has exactly the given bits set.
    pub fn from_set_bits(bits: &BTreeSet<usize>) -> FasmValue {
        let max = match bits.iter().next_back() {
            Some(&max) => max,
            None => return FasmValue::zero(),
        };
        let mut awi = ExtAwi::zero(NonZeroUsize::new(max + 1).unwrap());
        for &b in bits {
            awi.set(b, true).unwrap();
        }
        FasmValue(awi)
    }

    /// Renders the value in the given radix, without any prefix.
    /// `upper` selects uppercase hex digits.
    pub fn to_radix_str(&self, radix: u8, upper: bool) -> String {
        ExtAwi::bits_to_string_radix(&self.0, false, radix, upper, 1).unwrap()
    }
}

#[test]
fn test_value() {
    let v = FasmValue::parse_radix(b"ff", 16).unwrap();
    assert_eq!(v.sig_bits(), 8);
    assert!(v.fits_width(8));
    assert!(!v.fits_width(7));
    assert!(v.bit(0) && v.bit(7) && !v.bit(8));
    assert_eq!(v.to_radix_str(16, true), "FF");
    assert_eq!(v.to_radix_str(2, false), "11111111");
    assert_eq!(v, FasmValue::from_u128(255));

    assert!(FasmValue::parse_radix(b"0", 16).unwrap().is_zero());
    assert!(FasmValue::one().is_one());
    assert_eq!(FasmValue::one(), FasmValue::parse_radix(b"1", 10).unwrap());
    assert!(FasmValue::parse_radix(b"12", 2).is_none());
    assert!(FasmValue::parse_radix(b"___", 16).is_none());

    let wide = FasmValue::parse_radix(
        b"1_0000_0000_0000_0000_0000_0000_0000_0000", 16).unwrap();
    assert_eq!(wide.sig_bits(), 129);
    assert!(wide.bit(128) && !wide.bit(0));
    assert_eq!(wide.to_radix_str(10, false),
               "340282366920938463463374607431768211456");

    let bits: BTreeSet<usize> = [0, 3, 9].into_iter().collect();
    assert_eq!(FasmValue::from_set_bits(&bits), FasmValue::from_u128(0x209));
}
