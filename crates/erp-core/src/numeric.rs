//! # Numeric Coercion
//!
//! Turns the many ways a number can arrive in a payload into one `f64`, and
//! renders computed values back in their most natural JSON form.
//!
//! ## Why Normalize?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE REPRESENTATION PROBLEM                                             │
//! │                                                                         │
//! │  Caller sends:      30      "30"     30.0     " 30 "                    │
//! │  Derived total:     2 × 5 + 3 × 10 = 40.0                               │
//! │                                                                         │
//! │  Without normalization the stored payload mixes 30, "30" and 30.0,      │
//! │  and a client expecting `40` receives `40.0`.                          │
//! │                                                                         │
//! │  OUR SOLUTION                                                           │
//! │    to_float()  : any numeric shape ──► f64                              │
//! │    normalize() : f64 ──► integer if whole, else 4-decimal float         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use erp_core::numeric::{normalize, to_float};
//! use serde_json::json;
//!
//! assert_eq!(to_float(&json!("12.5")), Some(12.5));
//! assert_eq!(to_float(&json!("")), None);
//! assert_eq!(normalize(30.0), json!(30));
//! assert_eq!(normalize(30.12345), json!(30.1235));
//! ```

use serde_json::{Number, Value};

/// Decimal places kept for fractional values.
pub const DECIMAL_PLACES: i32 = 4;

const SCALE: f64 = 10_000.0;

// =============================================================================
// Coercion
// =============================================================================

/// Anything that may carry a number.
///
/// Implemented for JSON values, strings, and every native integer and float
/// width, so derivations can coerce whatever a transport decoded.
pub trait ToFloat {
    /// Returns the value as `f64`, or `None` when it is not numeric.
    fn to_float(&self) -> Option<f64>;
}

macro_rules! impl_to_float_for_primitive {
    ($($t:ty),* $(,)?) => {
        $(
            impl ToFloat for $t {
                #[inline]
                fn to_float(&self) -> Option<f64> {
                    finite(*self as f64)
                }
            }
        )*
    };
}

impl_to_float_for_primitive!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl ToFloat for str {
    fn to_float(&self) -> Option<f64> {
        let clean = self.trim();
        if clean.is_empty() {
            return None;
        }
        clean.parse::<f64>().ok().and_then(finite)
    }
}

impl ToFloat for String {
    fn to_float(&self) -> Option<f64> {
        self.as_str().to_float()
    }
}

impl ToFloat for Value {
    /// Numbers and numeric strings coerce; booleans, arrays, objects and
    /// null do not.
    fn to_float(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64().and_then(finite),
            Value::String(s) => s.to_float(),
            _ => None,
        }
    }
}

impl<T: ToFloat + ?Sized> ToFloat for &T {
    fn to_float(&self) -> Option<f64> {
        (**self).to_float()
    }
}

/// Coerces a raw value to `f64`.
///
/// ## Rules
/// - Integers of any width and floats coerce directly
/// - Strings are trimmed, then parsed as decimal floats; empty → `None`
/// - `NaN` and infinities are rejected
/// - Anything else → `None`
pub fn to_float<T: ToFloat + ?Sized>(raw: &T) -> Option<f64> {
    raw.to_float()
}

/// Coerces an optional payload slot; a missing slot is not numeric.
pub fn opt_to_float(raw: Option<&Value>) -> Option<f64> {
    raw.and_then(Value::to_float)
}

#[inline]
fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

// =============================================================================
// Normalization
// =============================================================================

/// Renders a number in its canonical JSON form.
///
/// ## Rules
/// - Fractional values are rounded half away from zero to 4 decimals
/// - A whole result becomes an integer JSON number (`30`, never `30.0`)
/// - Otherwise the rounded float is returned
///
/// Rounding happens before the whole-number check, so `2.99999` renders as
/// `3`. That keeps the function idempotent on its own output.
///
/// ## Example
/// ```rust
/// use erp_core::numeric::normalize;
/// use serde_json::json;
///
/// assert_eq!(normalize(40.0), json!(40));
/// assert!(normalize(40.0).is_i64());
/// assert_eq!(normalize(0.1 + 0.2), json!(0.3));
/// ```
pub fn normalize(value: f64) -> Value {
    let rounded = if value.fract() == 0.0 {
        value
    } else {
        (value * SCALE).round() / SCALE
    };

    if rounded.fract() == 0.0 && rounded >= i64::MIN as f64 && rounded < i64::MAX as f64 {
        return Value::from(rounded as i64);
    }

    Number::from_f64(rounded)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_float_json_shapes() {
        assert_eq!(to_float(&json!(12)), Some(12.0));
        assert_eq!(to_float(&json!(-3)), Some(-3.0));
        assert_eq!(to_float(&json!(u64::MAX)), Some(u64::MAX as f64));
        assert_eq!(to_float(&json!(2.5)), Some(2.5));
        assert_eq!(to_float(&json!("12.5")), Some(12.5));
        assert_eq!(to_float(&json!("  7 ")), Some(7.0));
        assert_eq!(to_float(&json!("1e3")), Some(1000.0));

        assert_eq!(to_float(&json!("")), None);
        assert_eq!(to_float(&json!("   ")), None);
        assert_eq!(to_float(&json!("abc")), None);
        assert_eq!(to_float(&json!("NaN")), None);
        assert_eq!(to_float(&json!("inf")), None);
        assert_eq!(to_float(&Value::Null), None);
        assert_eq!(to_float(&json!(true)), None);
        assert_eq!(to_float(&json!([1])), None);
        assert_eq!(to_float(&json!({"v": 1})), None);
    }

    #[test]
    fn test_to_float_native_widths() {
        assert_eq!(to_float(&7u8), Some(7.0));
        assert_eq!(to_float(&-7i16), Some(-7.0));
        assert_eq!(to_float(&70_000u32), Some(70_000.0));
        assert_eq!(to_float(&1.5f32), Some(1.5));
        assert_eq!(to_float(&f64::NAN), None);
        assert_eq!(to_float("3.25"), Some(3.25));
        assert_eq!(to_float(&String::from("4")), Some(4.0));
    }

    #[test]
    fn test_opt_to_float() {
        assert_eq!(opt_to_float(None), None);
        assert_eq!(opt_to_float(Some(&json!("9"))), Some(9.0));
    }

    #[test]
    fn test_normalize_whole_numbers_become_integers() {
        let v = normalize(30.0);
        assert_eq!(v, json!(30));
        assert!(v.is_i64());

        assert!(normalize(-2.0).is_i64());
        assert!(normalize(0.0).is_i64());
    }

    #[test]
    fn test_normalize_rounds_to_four_decimals() {
        assert_eq!(normalize(30.12345), json!(30.1235));
        assert_eq!(normalize(1.23444), json!(1.2344));
        assert_eq!(normalize(-1.00005), json!(-1.0001));
        assert_eq!(normalize(0.1 + 0.2), json!(0.3));
    }

    #[test]
    fn test_normalize_rounding_to_whole_yields_integer() {
        let v = normalize(2.99999);
        assert_eq!(v, json!(3));
        assert!(v.is_i64());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for x in [30.0, 30.12345, 0.1 + 0.2, 2.99999, -17.55555, 1e-9, 123456.789] {
            let once = normalize(x);
            let twice = normalize(to_float(&once).unwrap());
            assert_eq!(once, twice, "normalize not idempotent for {x}");
        }
    }

    #[test]
    fn test_normalize_huge_whole_values_stay_floats() {
        let v = normalize(1e300);
        assert!(v.is_f64());
    }
}
