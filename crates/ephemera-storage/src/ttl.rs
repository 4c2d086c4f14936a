//! Secret lifetime validation.
//!
//! Caller-supplied TTLs arrive as raw JSON (request bodies, query strings
//! forwarded as strings). A TTL is honored only when it is a finite,
//! non-negative whole number of seconds no larger than [`MAX_EXPIRE_SECS`];
//! anything else is silently replaced by
//! [`DEFAULT_SECRET_TTL_SECS`]. An invalid TTL is never an error.

use ephemera_traits::MAX_EXPIRE_SECS;
use serde_json::Value;

/// Lifetime applied when no valid TTL is supplied: one day.
pub const DEFAULT_SECRET_TTL_SECS: u64 = 60 * 60 * 24;

/// Numeric core of the predicate: finite, non-negative, integral and within
/// the engine's expiration range.
pub fn is_valid_ttl_secs(value: f64) -> bool {
    value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= MAX_EXPIRE_SECS as f64
}

/// Whether `candidate` is an acceptable TTL.
pub fn is_valid_ttl(candidate: &Value) -> bool {
    parse_ttl(candidate).is_some()
}

/// Extract the TTL in seconds, or `None` if `candidate` is not a valid TTL.
///
/// Numbers are accepted as-is, strings are trimmed and parsed as numbers.
/// `"3600"`, `3600` and `3600.0` are all one hour; `-1`, `1.5`, `"abc"`,
/// `""`, `null` and `true` are all invalid, as is anything above
/// [`MAX_EXPIRE_SECS`].
pub fn parse_ttl(candidate: &Value) -> Option<u64> {
    let secs = match candidate {
        Value::Number(number) => match number.as_u64() {
            Some(secs) => Some(secs),
            None => number.as_f64().and_then(secs_from_f64),
        },
        Value::String(raw) => {
            let raw = raw.trim();
            if raw.is_empty() {
                return None;
            }
            raw.parse::<u64>()
                .ok()
                .or_else(|| raw.parse::<f64>().ok().and_then(secs_from_f64))
        }
        _ => None,
    }?;
    (secs <= MAX_EXPIRE_SECS).then_some(secs)
}

/// The TTL to apply for `candidate`: its value when valid, the default otherwise.
pub fn resolve_ttl(candidate: Option<&Value>) -> u64 {
    candidate
        .and_then(parse_ttl)
        .unwrap_or(DEFAULT_SECRET_TTL_SECS)
}

fn secs_from_f64(value: f64) -> Option<u64> {
    is_valid_ttl_secs(value).then_some(value as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accepts_non_negative_integers() {
        assert!(is_valid_ttl(&json!(0)));
        assert!(is_valid_ttl(&json!(3600)));
        assert!(is_valid_ttl(&json!(3600.0)));
        assert!(is_valid_ttl(&json!("604800")));
        assert!(is_valid_ttl(&json!(" 60 ")));
    }

    #[test]
    fn test_ttl_beyond_engine_range_falls_back_to_default() {
        assert_eq!(parse_ttl(&json!(MAX_EXPIRE_SECS)), Some(MAX_EXPIRE_SECS));
        assert_eq!(parse_ttl(&json!(MAX_EXPIRE_SECS + 1)), None);
        assert_eq!(parse_ttl(&json!("18446744073709551615")), None);
        assert_eq!(parse_ttl(&json!(1e300)), None);
        assert!(!is_valid_ttl_secs(u64::MAX as f64));
        assert_eq!(
            resolve_ttl(Some(&json!("18446744073709551615"))),
            DEFAULT_SECRET_TTL_SECS
        );
    }

    #[test]
    fn test_rejects_everything_else() {
        for candidate in [
            json!(-1),
            json!(-0.5),
            json!(1.5),
            json!("1.5"),
            json!("abc"),
            json!(""),
            json!("NaN"),
            json!("inf"),
            json!("-60"),
            json!(null),
            json!(true),
            json!([60]),
            json!({"ttl": 60}),
        ] {
            assert!(!is_valid_ttl(&candidate), "{candidate} should be invalid");
        }
    }

    #[test]
    fn test_numeric_predicate() {
        assert!(is_valid_ttl_secs(0.0));
        assert!(is_valid_ttl_secs(86_400.0));
        assert!(!is_valid_ttl_secs(f64::NAN));
        assert!(!is_valid_ttl_secs(f64::INFINITY));
        assert!(!is_valid_ttl_secs(-1.0));
        assert!(!is_valid_ttl_secs(0.25));
    }

    #[test]
    fn test_resolve_falls_back_to_default() {
        assert_eq!(resolve_ttl(None), DEFAULT_SECRET_TTL_SECS);
        assert_eq!(resolve_ttl(Some(&json!("soon"))), DEFAULT_SECRET_TTL_SECS);
        assert_eq!(resolve_ttl(Some(&json!(-5))), DEFAULT_SECRET_TTL_SECS);
        assert_eq!(resolve_ttl(Some(&json!(300))), 300);
        assert_eq!(resolve_ttl(Some(&json!("300"))), 300);
        assert_eq!(resolve_ttl(Some(&json!(0))), 0);
    }

    #[test]
    fn test_default_is_one_day() {
        assert_eq!(DEFAULT_SECRET_TTL_SECS, 86_400);
    }
}
