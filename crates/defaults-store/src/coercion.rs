//! Best-effort conversions from stored values to the shapes typed accessors return.
//!
//! Every conversion is total: a value of the wrong shape yields the accessor's default instead
//! of an error, so absence and mismatch look the same to the caller.

use url::Url;

use crate::{locator, Dictionary, Value};

impl Value {
    /// Strings are returned as-is and numbers as their decimal text (`true`/`false` as
    /// `"1"`/`"0"`). Any other shape yields `None`.
    pub fn coerce_string(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_owned()),
            _ => None,
        }
    }

    /// Numbers convert directly (floats truncate toward zero, saturating), booleans become
    /// `1`/`0` and strings are parsed from their leading integer. Anything else is `0`.
    pub fn coerce_integer(&self) -> i64 {
        match self {
            Value::Integer(i) => *i,
            Value::Float(f) => *f as i64,
            Value::Bool(b) => i64::from(*b),
            Value::String(s) => parse_leading_integer(s).unwrap_or(0),
            _ => 0,
        }
    }

    /// Numbers convert directly and strings are parsed from their leading number. Booleans are
    /// not converted. Anything else is `0.0`.
    pub fn coerce_double(&self) -> f64 {
        match self {
            Value::Integer(i) => *i as f64,
            Value::Float(f) => *f,
            Value::String(s) => parse_leading_float(s).unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Single precision variant of [`Value::coerce_double`].
    pub fn coerce_float(&self) -> f32 {
        self.coerce_double() as f32
    }

    /// Nonzero numbers are `true`. Strings are `true` for `yes`/`true` (any case) or a nonzero
    /// leading integer such as `"1"`. Anything else is `false`.
    pub fn coerce_bool(&self) -> bool {
        match self {
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Bool(b) => *b,
            Value::String(s) => parse_bool(s),
            _ => false,
        }
    }

    /// String paths become file URLs and archived locators are decoded.
    pub fn coerce_url(&self) -> Option<Url> {
        match self {
            Value::String(path) => locator::file_url(path),
            Value::Data(bytes) => locator::unarchive(bytes),
            _ => None,
        }
    }

    /// Returns the sequence if this is an [`Value::Array`].
    pub fn into_array(self) -> Option<Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the strings if this is an [`Value::Array`] made only of strings. Numbers are not
    /// converted.
    pub fn into_string_array(self) -> Option<Vec<String>> {
        match self {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }

    /// Returns the mapping if this is a [`Value::Dictionary`].
    pub fn into_dictionary(self) -> Option<Dictionary> {
        match self {
            Value::Dictionary(members) => Some(members),
            _ => None,
        }
    }

    /// Returns the bytes if this is a [`Value::Data`].
    pub fn into_data(self) -> Option<Vec<u8>> {
        match self {
            Value::Data(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// Parses optional leading whitespace, an optional sign and as many digits as follow.
/// Saturates instead of overflowing. Returns `None` when no digit is present.
fn parse_leading_integer(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let mut value: i64 = 0;
    let mut seen_digit = false;
    for digit in digits.chars().map_while(|c| c.to_digit(10)) {
        seen_digit = true;
        value = value.saturating_mul(10);
        value = if negative {
            value.saturating_sub(i64::from(digit))
        } else {
            value.saturating_add(i64::from(digit))
        };
    }

    seen_digit.then_some(value)
}

/// Parses the longest prefix of `text` (after leading whitespace) that is a float literal.
fn parse_leading_float(text: &str) -> Option<f64> {
    let candidate: String = text
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
        .collect();

    (1..=candidate.len())
        .rev()
        .find_map(|end| candidate.get(..end)?.parse::<f64>().ok())
}

fn parse_bool(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.eq_ignore_ascii_case("yes")
        || trimmed.eq_ignore_ascii_case("true")
        || parse_leading_integer(trimmed).is_some_and(|value| value != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_coercion() {
        assert_eq!(Value::from("hi").coerce_string().as_deref(), Some("hi"));
        assert_eq!(Value::from(42).coerce_string().as_deref(), Some("42"));
        assert_eq!(Value::from(1.5).coerce_string().as_deref(), Some("1.5"));
        assert_eq!(Value::from(true).coerce_string().as_deref(), Some("1"));
        assert_eq!(Value::from(["a"]).coerce_string(), None);
        assert_eq!(Value::data(b"hi".to_vec()).coerce_string(), None);
    }

    #[test]
    fn integer_coercion() {
        assert_eq!(Value::from(7).coerce_integer(), 7);
        assert_eq!(Value::from(-7.9).coerce_integer(), -7);
        assert_eq!(Value::from(f64::MAX).coerce_integer(), i64::MAX);
        assert_eq!(Value::from(true).coerce_integer(), 1);
        assert_eq!(Value::from(false).coerce_integer(), 0);
        assert_eq!(Value::from(" 12abc").coerce_integer(), 12);
        assert_eq!(Value::from("-3.7").coerce_integer(), -3);
        assert_eq!(Value::from("99999999999999999999").coerce_integer(), i64::MAX);
        assert_eq!(Value::from("abc").coerce_integer(), 0);
        assert_eq!(Value::from(["1"]).coerce_integer(), 0);
    }

    #[test]
    fn double_coercion_does_not_convert_booleans() {
        assert_eq!(Value::from(2).coerce_double(), 2.0);
        assert_eq!(Value::from(2.25).coerce_double(), 2.25);
        assert_eq!(Value::from("3.5 meters").coerce_double(), 3.5);
        assert_eq!(Value::from("1e3").coerce_double(), 1000.0);
        assert_eq!(Value::from("1e").coerce_double(), 1.0);
        assert_eq!(Value::from("-").coerce_double(), 0.0);
        assert_eq!(Value::from(true).coerce_double(), 0.0);
        assert_eq!(Value::from(0.5).coerce_float(), 0.5_f32);
    }

    #[test]
    fn bool_coercion() {
        assert!(Value::from(2).coerce_bool());
        assert!(!Value::from(0).coerce_bool());
        assert!(Value::from(0.1).coerce_bool());
        assert!(Value::from("YES").coerce_bool());
        assert!(Value::from("yes").coerce_bool());
        assert!(Value::from("TRUE").coerce_bool());
        assert!(Value::from("1").coerce_bool());
        assert!(!Value::from("NO").coerce_bool());
        assert!(!Value::from("0").coerce_bool());
        assert!(!Value::from("maybe").coerce_bool());
        assert!(!Value::from(Dictionary::new()).coerce_bool());
    }

    #[test]
    fn container_coercions_require_exact_shape() {
        assert_eq!(Value::from(["a", "b"]).into_array().map(|a| a.len()), Some(2));
        assert_eq!(Value::from("a").into_array(), None);

        assert_eq!(
            Value::from(["a", "b"]).into_string_array(),
            Some(vec!["a".to_owned(), "b".to_owned()])
        );
        assert_eq!(Value::Array(vec!["a".into(), 1.into()]).into_string_array(), None);

        assert_eq!(Value::from(Dictionary::new()).into_dictionary(), Some(Dictionary::new()));
        assert_eq!(Value::from(["a"]).into_dictionary(), None);

        assert_eq!(Value::data(vec![1, 2]).into_data(), Some(vec![1, 2]));
        assert_eq!(Value::from("bytes").into_data(), None);
    }
}
