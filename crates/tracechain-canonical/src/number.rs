//! Number rendering that matches ECMAScript `Number.prototype.toString`.
//!
//! The legacy profile must reproduce hashes computed by a JavaScript backend,
//! so every JSON number is rendered as the IEEE-754 double it parses to,
//! formatted with the ECMAScript algorithm rather than `serde_json`'s.

/// Formats a double the way ECMAScript does.
///
/// Non-finite values render as `null`, which is what `JSON.stringify` emits.
pub fn format_js_number(value: f64) -> String {
    if !value.is_finite() {
        return "null".to_string();
    }
    // Covers -0 as well.
    if value == 0.0 {
        return "0".to_string();
    }
    if value < 0.0 {
        return format!("-{}", format_js_number(-value));
    }

    // Shortest round-trip digits in scientific form, e.g. `1.2345e2`.
    let scientific = format!("{:e}", value);
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let exponent: i32 = exponent.parse().unwrap_or(0);

    // value = 0.d1d2..dk * 10^n
    let k = digits.len() as i32;
    let n = exponent + 1;

    if k <= n && n <= 21 {
        format!("{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let split = n as usize;
        format!("{}.{}", &digits[..split], &digits[split..])
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat((-n) as usize), digits)
    } else {
        let e = n - 1;
        let sign = if e < 0 { '-' } else { '+' };
        if k == 1 {
            format!("{}e{}{}", digits, sign, e.abs())
        } else {
            format!("{}.{}e{}{}", &digits[..1], &digits[1..], sign, e.abs())
        }
    }
}

/// Formats a JSON number through its double value.
pub fn format_json_number(number: &serde_json::Number) -> String {
    match number.as_f64() {
        Some(value) => format_js_number(value),
        None => number.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_drop_fraction() {
        assert_eq!(format_js_number(1.0), "1");
        assert_eq!(format_js_number(100.0), "100");
        assert_eq!(format_js_number(-42.0), "-42");
    }

    #[test]
    fn negative_zero_is_zero() {
        assert_eq!(format_js_number(-0.0), "0");
    }

    #[test]
    fn fractions_use_plain_decimal() {
        assert_eq!(format_js_number(0.1), "0.1");
        assert_eq!(format_js_number(1.5), "1.5");
        assert_eq!(format_js_number(-2.25), "-2.25");
        assert_eq!(format_js_number(123.456), "123.456");
        assert_eq!(format_js_number(0.000001), "0.000001");
    }

    #[test]
    fn exponent_thresholds() {
        assert_eq!(format_js_number(1e20), "100000000000000000000");
        assert_eq!(format_js_number(1e21), "1e+21");
        assert_eq!(format_js_number(1.5e21), "1.5e+21");
        assert_eq!(format_js_number(1e-7), "1e-7");
        assert_eq!(format_js_number(1.25e-7), "1.25e-7");
    }

    #[test]
    fn large_integers_follow_double_precision() {
        let number: serde_json::Number = serde_json::from_str("9007199254740993").unwrap();
        assert_eq!(format_json_number(&number), "9007199254740992");
    }

    #[test]
    fn non_finite_renders_null() {
        assert_eq!(format_js_number(f64::NAN), "null");
        assert_eq!(format_js_number(f64::INFINITY), "null");
    }
}
