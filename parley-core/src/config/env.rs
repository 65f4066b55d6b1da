//! Environment variable interpolation for configuration

use super::error::ConfigError;
use regex::{Captures, Regex};
use std::env;
use std::sync::LazyLock;

static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("valid env var pattern"));

/// Replace every `${VAR}` reference in `content` with the variable's value
///
/// Fails on the first variable that is not set.
pub fn interpolate_env_vars(content: &str) -> Result<String, ConfigError> {
    let mut missing = None;

    let result = ENV_VAR_PATTERN.replace_all(content, |cap: &Captures<'_>| {
        match env::var(&cap[1]) {
            Ok(value) => value,
            Err(_) => {
                missing.get_or_insert_with(|| cap[1].to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(var) => Err(ConfigError::EnvVarNotFound { var }),
        None => Ok(result.into_owned()),
    }
}

/// Names of the variables referenced in `text`, in order of appearance
pub fn referenced_vars(text: &str) -> Vec<String> {
    ENV_VAR_PATTERN
        .captures_iter(text)
        .map(|cap| cap[1].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_env_vars() {
        env::set_var("PARLEY_TEST_VAR", "test_value");

        let content = "cancel_literal: ${PARLEY_TEST_VAR}";
        let result = interpolate_env_vars(content).unwrap();
        assert_eq!(result, "cancel_literal: test_value");

        env::remove_var("PARLEY_TEST_VAR");
    }

    #[test]
    fn test_missing_env_var() {
        let result = interpolate_env_vars("max_steps: ${PARLEY_MISSING_VAR}");

        match result {
            Err(ConfigError::EnvVarNotFound { var }) => assert_eq!(var, "PARLEY_MISSING_VAR"),
            other => panic!("Expected EnvVarNotFound error, got {other:?}"),
        }
    }

    #[test]
    fn test_referenced_vars() {
        let vars = referenced_vars("a: ${PARLEY_A}, b: ${PARLEY_B}, c: $NOT_BRACED");
        assert_eq!(vars, vec!["PARLEY_A".to_string(), "PARLEY_B".to_string()]);
    }
}
