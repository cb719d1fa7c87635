//! `${VAR}` / `${VAR:-default}` expansion for configuration strings.
//!
//! Bare `$VAR` is left alone so that literal dollar signs in paths and
//! hosts survive.

use std::env::VarError;

use crate::ConfigError;

/// Expand braced environment variable references in `value`.
///
/// `field` names the config key for error messages (e.g. `site[0].source_dir`).
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    let lookup = |name: &str| -> Result<Option<String>, UnsetVar> {
        match std::env::var(name) {
            Ok(val) => Ok(Some(val)),
            Err(VarError::NotPresent | VarError::NotUnicode(_)) => Err(UnsetVar(name.to_owned())),
        }
    };

    shellexpand::env_with_context(value, lookup)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", e.cause.0),
        })
}

struct UnsetVar(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_set_var() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("DROP_TEST_EXPAND_HOST", "0.0.0.0");
        }
        let result = expand_env("${DROP_TEST_EXPAND_HOST}", "server.host").unwrap();
        assert_eq!(result, "0.0.0.0");
        unsafe {
            std::env::remove_var("DROP_TEST_EXPAND_HOST");
        }
    }

    #[test]
    fn test_expand_default_when_unset() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("DROP_TEST_EXPAND_UNSET");
        }
        let result =
            expand_env("${DROP_TEST_EXPAND_UNSET:-dist}/site", "build.destination_dir").unwrap();
        assert_eq!(result, "dist/site");
    }

    #[test]
    fn test_expand_missing_var_names_field() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("DROP_TEST_EXPAND_MISSING");
        }
        let err = expand_env("${DROP_TEST_EXPAND_MISSING}", "site[0].source_dir").unwrap_err();

        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("DROP_TEST_EXPAND_MISSING"));
        assert!(err.to_string().contains("site[0].source_dir"));
    }

    #[test]
    fn test_bare_dollar_untouched() {
        assert_eq!(expand_env("cost-$5", "x").unwrap(), "cost-$5");
        assert_eq!(expand_env("plain", "x").unwrap(), "plain");
    }
}
