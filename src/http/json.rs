//! JSON text rendering for gateway response bodies.
//!
//! Bodies are written with `", "` and `": "` separators and every non-ASCII
//! character escaped as `\uXXXX`. Clients of the gateway already compare
//! against that format, so the compact `serde_json` output is not used here.
//!
//! Numbers keep their full precision: integers are written back digit for
//! digit, and floats use the shortest round-trip digits with exponents shown
//! as `1e-07` / `1e+22`.

use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use std::io::{self, Write};

/// `serde_json` formatter producing spaced separators and ASCII-only output.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpacedAsciiFormatter;

impl Formatter for SpacedAsciiFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(b": ")
    }

    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(float_repr(value).as_bytes())
    }

    fn write_number_str<W>(&mut self, writer: &mut W, value: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        let digits = value.strip_prefix('-').unwrap_or(value);
        if digits.bytes().all(|b| b.is_ascii_digit()) {
            // Integer text, any length. `-0` is plain zero.
            if digits.bytes().all(|b| b == b'0') {
                return writer.write_all(b"0");
            }
            return writer.write_all(value.as_bytes());
        }

        match value.parse::<f64>() {
            Ok(float) => writer.write_all(float_repr(float).as_bytes()),
            Err(_) => writer.write_all(value.as_bytes()),
        }
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if fragment.is_ascii() {
            return writer.write_all(fragment.as_bytes());
        }

        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if ch.is_ascii() {
                writer.write_all(&[ch as u8])?;
            } else {
                // Astral characters become a surrogate pair.
                for unit in ch.encode_utf16(&mut units).iter() {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

/// Render a float the way the gateway body format expects.
///
/// Positional notation is used while the decimal point sits between 4 places
/// left and 16 places right of the first digit; otherwise scientific notation
/// with a signed exponent of at least two digits.
fn float_repr(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    // `{:e}` yields the shortest round-trip digits, e.g. `-1.25e-7`.
    let sci = format!("{:e}", value);
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let point = exponent + 1;
    let len = digits.len() as i32;

    let body = if point <= -4 || point > 16 {
        let (head, tail) = digits.split_at(1);
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        if tail.is_empty() {
            format!("{}e{}{:02}", head, exp_sign, exponent.abs())
        } else {
            format!("{}.{}e{}{:02}", head, tail, exp_sign, exponent.abs())
        }
    } else if point <= 0 {
        format!("0.{}{}", "0".repeat((-point) as usize), digits)
    } else if point < len {
        let (int, frac) = digits.split_at(point as usize);
        format!("{}.{}", int, frac)
    } else {
        format!("{}{}.0", digits, "0".repeat((point - len) as usize))
    };

    format!("{}{}", sign, body)
}

/// Serialize `value` into gateway body text.
pub fn to_string<T>(value: &T) -> Result<String, serde_json::Error>
where
    T: ?Sized + Serialize,
{
    let mut buf = Vec::with_capacity(128);
    let mut serializer = Serializer::with_formatter(&mut buf, SpacedAsciiFormatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_separators() {
        let value: serde_json::Value = serde_json::from_str(r#"{"id":42,"name":"widget"}"#).unwrap();
        assert_eq!(to_string(&value).unwrap(), r#"{"id": 42, "name": "widget"}"#);
    }

    #[test]
    fn test_key_order_is_preserved() {
        let value: serde_json::Value = serde_json::from_str(r#"{"z":1,"a":2,"m":3}"#).unwrap();
        assert_eq!(to_string(&value).unwrap(), r#"{"z": 1, "a": 2, "m": 3}"#);
    }

    #[test]
    fn test_nested_arrays() {
        let value = json!({"items": [1, 2, {"ok": true}], "empty": [], "none": null});
        assert_eq!(
            to_string(&value).unwrap(),
            r#"{"items": [1, 2, {"ok": true}], "empty": [], "none": null}"#
        );
    }

    #[test]
    fn test_empty_containers() {
        assert_eq!(to_string(&json!({})).unwrap(), "{}");
        assert_eq!(to_string(&json!([])).unwrap(), "[]");
    }

    #[test]
    fn test_non_ascii_is_escaped() {
        assert_eq!(to_string(&json!("café")).unwrap(), r#""caf\u00e9""#);
        assert_eq!(to_string(&json!("😀")).unwrap(), r#""\ud83d\ude00""#);
    }

    #[test]
    fn test_big_integers_pass_through() {
        let value: serde_json::Value = serde_json::from_str(
            r#"{"n": 123456789012345678901234567890, "m": -98765432109876543210987654321}"#,
        )
        .unwrap();
        assert_eq!(
            to_string(&value).unwrap(),
            r#"{"n": 123456789012345678901234567890, "m": -98765432109876543210987654321}"#
        );
    }

    #[test]
    fn test_negative_zero_integer() {
        let value: serde_json::Value = serde_json::from_str("[-0, 0, -0.0]").unwrap();
        assert_eq!(to_string(&value).unwrap(), "[0, 0, -0.0]");
    }

    #[test]
    fn test_float_exponent_layout() {
        let value: serde_json::Value =
            serde_json::from_str(r#"{"a": 1e-7, "b": 1e22, "c": 1.5E-5, "d": 2.5e300}"#).unwrap();
        assert_eq!(
            to_string(&value).unwrap(),
            r#"{"a": 1e-07, "b": 1e+22, "c": 1.5e-05, "d": 2.5e+300}"#
        );
    }

    #[test]
    fn test_float_positional_layout() {
        let value: serde_json::Value =
            serde_json::from_str("[1.0, 1.50, 0.0001, 123.456, 1E5, 1e15, 1e16, -2.5]").unwrap();
        assert_eq!(
            to_string(&value).unwrap(),
            "[1.0, 1.5, 0.0001, 123.456, 100000.0, 1000000000000000.0, 1e+16, -2.5]"
        );
    }

    #[test]
    fn test_typed_floats_use_same_layout() {
        assert_eq!(to_string(&0.00001f64).unwrap(), "1e-05");
        assert_eq!(to_string(&0.1f64).unwrap(), "0.1");
    }

    #[test]
    fn test_control_characters_still_escaped() {
        assert_eq!(to_string(&json!("a\"b\n")).unwrap(), r#""a\"b\n""#);
    }
}
