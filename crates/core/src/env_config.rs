//! Environment variable parsing with warn-level logging for invalid values.

use std::fmt::Display;
use std::str::FromStr;

/// Parse a raw variable value with a default fallback.
///
/// - If the value is absent: returns `default` silently (expected case).
/// - If the value is present but cannot be parsed: logs a warning and returns `default`.
pub fn parse_with_default<T: FromStr + Display>(var: &str, raw: Option<&str>, default: T) -> T {
    match raw {
        Some(v) => match v.trim().parse() {
            Ok(n) => n,
            Err(_) => {
                tracing::warn!(
                    var,
                    value = %v,
                    default = %default,
                    "invalid env var value, using default"
                );
                default
            },
        },
        None => default,
    }
}

/// [`parse_with_default`] against the process environment.
pub fn env_parse_with_default<T: FromStr + Display>(var: &str, default: T) -> T {
    parse_with_default(var, std::env::var(var).ok().as_deref(), default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_value() {
        let result: u32 = parse_with_default("ZTOQ_TEST", Some("42"), 10);
        assert_eq!(result, 42);
    }

    #[test]
    fn test_parse_invalid_value() {
        let result: u32 = parse_with_default("ZTOQ_TEST", Some("banana"), 10);
        assert_eq!(result, 10);
    }

    #[test]
    fn test_parse_missing_value() {
        let result: u32 = parse_with_default("ZTOQ_TEST", None, 10);
        assert_eq!(result, 10);
    }

    #[test]
    fn test_parse_empty_value() {
        let result: u32 = parse_with_default("ZTOQ_TEST", Some(""), 10);
        assert_eq!(result, 10);
    }

    #[test]
    fn test_env_missing_var() {
        let result: u32 = env_parse_with_default("ZTOQ_TEST_SURELY_UNSET_98273", 7);
        assert_eq!(result, 7);
    }
}
