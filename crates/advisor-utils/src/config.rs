//! Typed access to environment variables

use std::str::FromStr;
use thiserror::Error;

/// Error raised when an environment variable holds an unparsable value
#[derive(Debug, Error)]
#[error("Invalid value for {name}: {value:?} ({detail})")]
pub struct EnvError {
    pub name: String,
    pub value: String,
    pub detail: String,
}

/// Read a non-empty environment variable
pub fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read and parse an environment variable
///
/// Returns `Ok(None)` when the variable is unset or blank.
pub fn env_parse<T>(name: &str) -> Result<Option<T>, EnvError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_var(name) {
        None => Ok(None),
        Some(raw) => raw.parse::<T>().map(Some).map_err(|e| EnvError {
            name: name.to_string(),
            value: raw,
            detail: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_parse_unset_is_none() {
        let parsed: Option<u32> = env_parse("ADVISOR_UTILS_TEST_UNSET").unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn test_env_parse_value() {
        // SAFETY: the variable name is unique to this test
        unsafe {
            std::env::set_var("ADVISOR_UTILS_TEST_NUMBER", " 42 ");
        }
        let parsed: Option<u32> = env_parse("ADVISOR_UTILS_TEST_NUMBER").unwrap();
        assert_eq!(parsed, Some(42));
    }

    #[test]
    fn test_env_parse_invalid() {
        // SAFETY: the variable name is unique to this test
        unsafe {
            std::env::set_var("ADVISOR_UTILS_TEST_BAD", "many");
        }
        let err = env_parse::<u32>("ADVISOR_UTILS_TEST_BAD").unwrap_err();
        assert_eq!(err.name, "ADVISOR_UTILS_TEST_BAD");
        assert!(err.to_string().contains("many"));
    }
}
