//! Process environment lookups used for settings overrides.

use std::env::VarError;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvVarError {
    #[error("environment variable {0} is not set")]
    Unset(String),

    #[error("environment variable {0} is not valid UTF-8")]
    NotUnicode(String),
}

/// Reads `name`, keeping unset and non-UTF-8 values apart.
pub fn get_env_var(name: &str) -> Result<String, EnvVarError> {
    std::env::var(name).map_err(|e| match e {
        VarError::NotPresent => EnvVarError::Unset(name.to_string()),
        VarError::NotUnicode(_) => EnvVarError::NotUnicode(name.to_string()),
    })
}

/// Reads an optional setting such as a config path override.
///
/// Unset and blank values are both `None`, so an exported but empty variable
/// does not shadow a command-line default. A non-UTF-8 value is logged and
/// ignored.
pub fn get_env_var_opt(name: &str) -> Option<String> {
    match get_env_var(name) {
        Ok(v) => Some(v.trim().to_string()).filter(|v| !v.is_empty()),
        Err(EnvVarError::Unset(_)) => None,
        Err(e) => {
            tracing::warn!(%e, "ignoring environment override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_var_is_reported_by_name() {
        let err = get_env_var("SHARED_UTILS_SURELY_UNSET_VAR").unwrap_err();
        assert_eq!(err, EnvVarError::Unset("SHARED_UTILS_SURELY_UNSET_VAR".into()));
        assert!(err.to_string().contains("SHARED_UTILS_SURELY_UNSET_VAR"));
    }

    #[test]
    fn optional_var_unset_is_none() {
        assert!(get_env_var_opt("SHARED_UTILS_SURELY_UNSET_VAR").is_none());
    }

    #[test]
    fn path_is_an_always_set_var() {
        assert!(get_env_var("PATH").is_ok());
    }
}
