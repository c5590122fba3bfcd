//! Environment variable parsing with warn-level logging for invalid values.

/// Parse a string value with a default fallback, warning on garbage.
///
/// Split out from the env lookup so the parse path is testable without
/// mutating process environment.
pub fn parse_with_default<T: std::str::FromStr + std::fmt::Display>(
    var: &str,
    value: Option<&str>,
    default: T,
) -> T {
    match value {
        Some(v) => match v.parse() {
            Ok(n) => n,
            Err(_) => {
                tracing::warn!(var, value = %v, default = %default, "invalid value, using default");
                default
            },
        },
        None => default,
    }
}

/// Parse an environment variable with a default fallback.
///
/// Unset variables fall back silently (expected case); set-but-unparseable
/// values log a warning instead of being swallowed.
pub fn env_parse_with_default<T: std::str::FromStr + std::fmt::Display>(
    var: &str,
    default: T,
) -> T {
    let value = std::env::var(var).ok();
    parse_with_default(var, value.as_deref(), default)
}

/// Read an environment variable, treating empty strings as unset.
#[must_use]
pub fn env_nonempty(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_value() {
        let result: u32 = parse_with_default("X", Some("42"), 10);
        assert_eq!(result, 42);
    }

    #[test]
    fn parse_invalid_value_falls_back() {
        let result: u32 = parse_with_default("X", Some("banana"), 10);
        assert_eq!(result, 10);
    }

    #[test]
    fn parse_missing_value_falls_back() {
        let result: u32 = parse_with_default("X", None, 10);
        assert_eq!(result, 10);
    }

    #[test]
    fn parse_empty_value_falls_back() {
        let result: u32 = parse_with_default("X", Some(""), 10);
        assert_eq!(result, 10);
    }
}
