//! SPICE value strings: SI-suffix parsing and `{name}` parameter
//! substitution.

use std::collections::HashMap;

/// Parse a SPICE value string with an optional engineering suffix.
///
/// Suffixes are case-insensitive single letters (`k`, `m`, `u`, `n`, `p`,
/// `f`, `t`, `g`) with `meg` as the three-letter exception; `m` alone is
/// milli. Trailing unit text after the suffix is ignored (`10kOhm` parses
/// as 10000).
pub fn parse_spice_value(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let bytes = s.as_bytes();
    let mut numeric_end = s.len();
    for (i, c) in s.char_indices() {
        let ok = c.is_ascii_digit()
            || c == '.'
            || ((c == '+' || c == '-')
                && (i == 0 || bytes[i - 1] == b'e' || bytes[i - 1] == b'E'))
            || ((c == 'e' || c == 'E')
                && s[..i].chars().any(|d| d.is_ascii_digit())
                && bytes
                    .get(i + 1)
                    .map(|&n| n.is_ascii_digit() || n == b'+' || n == b'-')
                    .unwrap_or(false));
        if !ok {
            numeric_end = i;
            break;
        }
    }

    let base: f64 = s[..numeric_end].parse().ok()?;
    let suffix = s[numeric_end..].to_ascii_lowercase();

    let multiplier = if suffix.starts_with("meg") {
        1e6
    } else {
        match suffix.chars().next() {
            None => 1.0,
            Some('t') => 1e12,
            Some('g') => 1e9,
            Some('k') => 1e3,
            Some('m') => 1e-3,
            Some('u') => 1e-6,
            Some('n') => 1e-9,
            Some('p') => 1e-12,
            Some('f') => 1e-15,
            Some(_) => 1.0,
        }
    };

    Some(base * multiplier)
}

/// Expand `{name}` parameter references against a parameter map.
///
/// Unknown names are left in place so the error surfaces downstream as an
/// unparseable value rather than silently becoming zero.
pub fn substitute_params(value: &str, params: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        match rest[start..].find('}') {
            Some(rel_end) => {
                let name = &rest[start + 1..start + rel_end];
                match params.get(name) {
                    Some(v) => out.push_str(v),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &rest[start + rel_end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Suffix application multiplies, so the result can differ from a
    /// literal by rounding in the last bit; compare with a tolerance.
    fn assert_value(input: &str, expected: f64) {
        let v = parse_spice_value(input).unwrap_or_else(|| panic!("{:?} did not parse", input));
        assert!(
            (v - expected).abs() <= 1e-12 * expected.abs().max(1.0),
            "{:?} parsed as {}, expected {}",
            input,
            v,
            expected
        );
    }

    #[test]
    fn plain_numbers() {
        assert_eq!(parse_spice_value("100"), Some(100.0));
        assert_eq!(parse_spice_value("4.7"), Some(4.7));
        assert_eq!(parse_spice_value("-2.5"), Some(-2.5));
        assert_eq!(parse_spice_value("1e-6"), Some(1e-6));
        assert_eq!(parse_spice_value(""), None);
        assert_eq!(parse_spice_value("abc"), None);
    }

    #[test]
    fn single_letter_suffixes() {
        assert_value("10k", 10_000.0);
        assert_value("10K", 10_000.0);
        assert_value("1m", 1e-3);
        assert_value("100u", 100e-6);
        assert_value("47n", 47e-9);
        assert_value("22p", 22e-12);
        assert_value("1f", 1e-15);
        assert_value("2t", 2e12);
        assert_value("3g", 3e9);
    }

    #[test]
    fn meg_is_the_three_letter_exception() {
        assert_value("1meg", 1e6);
        assert_value("2.2MEG", 2.2e6);
        // A bare 'm' stays milli
        assert_value("1m", 1e-3);
    }

    #[test]
    fn trailing_units_ignored() {
        assert_value("10kOhm", 10_000.0);
        assert_value("100nF", 100e-9);
    }

    #[test]
    fn parameter_substitution() {
        let mut params = HashMap::new();
        params.insert("rload".to_string(), "10k".to_string());
        params.insert("c".to_string(), "47n".to_string());

        assert_eq!(substitute_params("{rload}", &params), "10k");
        assert_eq!(substitute_params("{c}F", &params), "47nF");
        assert_eq!(substitute_params("{missing}", &params), "{missing}");
        assert_eq!(substitute_params("plain", &params), "plain");
    }
}
