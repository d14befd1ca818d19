//! Deterministic serialization of payload values.
//!
//! The output feeds the transaction hash, so it must be reproducible
//! byte-for-byte by any other implementation (node, SDKs, the browser
//! wallet). The format is compact JSON with:
//!
//! - map keys sorted by UTF-16 code unit, the order JavaScript's default
//!   `Array.prototype.sort` produces
//! - numbers printed as ECMAScript `Number::toString` prints them
//!   (`1e+21`, `1e-7`, `0.1`, integers without a fraction), non-finite ones
//!   as `null`
//! - strings escaped exactly as `JSON.stringify` escapes them
//! - no whitespace anywhere
//!
//! A shared node that recurs inside itself is a [`CryptoError::CircularReference`].
//! The same node appearing in two sibling positions is fine.

use modulr_types::{Number, Value};
use std::cmp::Ordering;
use std::fmt::Write;

use crate::CryptoError;

/// 2^53, the largest magnitude below which every integer is exact in an f64.
const MAX_SAFE_MAGNITUDE: u64 = 1 << 53;

/// Canonical bytes of `value` (UTF-8).
pub fn stable_serialize(value: &Value) -> Result<Vec<u8>, CryptoError> {
    stable_stringify(value).map(String::into_bytes)
}

/// Canonical text of `value`.
pub fn stable_stringify(value: &Value) -> Result<String, CryptoError> {
    let mut out = String::new();
    let mut path = Vec::new();
    write_value(value, &mut out, &mut path)?;
    Ok(out)
}

fn write_value(value: &Value, out: &mut String, path: &mut Vec<usize>) -> Result<(), CryptoError> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&format_number(n)),
        Value::String(s) => write_string(s, out)?,
        Value::List(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out, path)?;
            }
            out.push(']');
        }
        Value::Map(entries) => {
            let mut sorted: Vec<_> = entries.iter().collect();
            sorted.sort_by(|a, b| utf16_cmp(a.0, b.0));
            out.push('{');
            for (i, (key, item)) in sorted.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(key, out)?;
                out.push(':');
                write_value(item, out, path)?;
            }
            out.push('}');
        }
        Value::Shared(node) => {
            // Identity is checked before locking: re-locking a node already
            // held further up the stack would deadlock.
            let id = node.id();
            if path.contains(&id) {
                return Err(CryptoError::CircularReference);
            }
            path.push(id);
            let result = write_value(&node.read(), out, path);
            path.pop();
            result?;
        }
    }
    Ok(())
}

fn utf16_cmp(a: &str, b: &str) -> Ordering {
    a.encode_utf16().cmp(b.encode_utf16())
}

fn write_string(s: &str, out: &mut String) -> Result<(), CryptoError> {
    let quoted = serde_json::to_string(s).map_err(|e| CryptoError::Serialization(e.to_string()))?;
    out.push_str(&quoted);
    Ok(())
}

fn format_number(n: &Number) -> String {
    if let Some(u) = n.as_u64() {
        format_js_u64(u)
    } else if let Some(i) = n.as_i64() {
        if i.unsigned_abs() <= MAX_SAFE_MAGNITUDE {
            i.to_string()
        } else {
            format_js_number(i as f64)
        }
    } else {
        format_js_number(n.as_f64().unwrap_or(f64::NAN))
    }
}

/// Format an unsigned integer the way JavaScript prints the same quantity.
///
/// Integers up to 2^53 print verbatim. Larger ones pass through an f64 first,
/// exactly as they would when handed to a JavaScript `Number`.
pub fn format_js_u64(n: u64) -> String {
    if n <= MAX_SAFE_MAGNITUDE {
        n.to_string()
    } else {
        format_js_number(n as f64)
    }
}

/// Format an f64 as ECMAScript `Number.prototype.toString` does, with
/// non-finite values rendered as `null` (the `JSON.stringify` behavior).
pub fn format_js_number(x: f64) -> String {
    if !x.is_finite() {
        return "null".to_string();
    }
    if x == 0.0 {
        return "0".to_string();
    }
    if x < 0.0 {
        return format!("-{}", format_js_number(-x));
    }

    // `{:e}` yields the shortest round-tripping digits: "d.ddde±x".
    let sci = format!("{x:e}");
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let exp: i32 = exp.parse().unwrap_or(0);
    let k = digits.len() as i32;
    let n = exp + 1;

    let mut out = String::new();
    if k <= n && n <= 21 {
        out.push_str(&digits);
        out.extend(std::iter::repeat('0').take((n - k) as usize));
    } else if 0 < n && n <= 21 {
        out.push_str(&digits[..n as usize]);
        out.push('.');
        out.push_str(&digits[n as usize..]);
    } else if -6 < n && n <= 0 {
        out.push_str("0.");
        out.extend(std::iter::repeat('0').take((-n) as usize));
        out.push_str(&digits);
    } else {
        let e = n - 1;
        out.push_str(&digits[..1]);
        if k > 1 {
            out.push('.');
            out.push_str(&digits[1..]);
        }
        let sign = if e < 0 { '-' } else { '+' };
        let _ = write!(out, "e{sign}{}", e.abs());
    }
    out
}
