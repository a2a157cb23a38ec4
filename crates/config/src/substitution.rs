use anyhow::Result;
use regex::{Captures, Regex};
use std::env;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// `${VAR}`, `${VAR:-fallback}` or `$VAR`
fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$\{(\w+)(?::-([^}]*))?\}|\$(\w+)").expect("placeholder pattern is valid")
    })
}

/// Substitute environment variables in the format `${VAR}`, `${VAR:-default}` or `$VAR`
///
/// Unset variables without a fallback are left in place so the validator
/// can report them.
pub fn substitute_env_vars(content: &str) -> Result<String> {
    let mut missing_vars = Vec::new();

    let result = placeholder_regex().replace_all(content, |caps: &Captures| {
        let var_name = caps
            .get(1)
            .or_else(|| caps.get(3))
            .map(|m| m.as_str())
            .unwrap_or_default();

        match (env::var(var_name), caps.get(2)) {
            (Ok(value), _) => {
                debug!("Substituting environment variable: {}", var_name);
                value
            }
            (Err(_), Some(fallback)) => {
                debug!("Environment variable '{}' not set, using fallback", var_name);
                fallback.as_str().to_string()
            }
            (Err(_), None) => {
                warn!("Environment variable '{}' not set", var_name);
                missing_vars.push(var_name.to_string());
                caps[0].to_string()
            }
        }
    });

    if !missing_vars.is_empty() {
        debug!(
            "Environment variables not set (will fail validation if used): {:?}",
            missing_vars
        );
    }

    Ok(result.into_owned())
}

/// Check if a string contains unresolved environment variable placeholders
pub fn has_unresolved_env_vars(content: &str) -> bool {
    placeholder_regex().is_match(content)
}
