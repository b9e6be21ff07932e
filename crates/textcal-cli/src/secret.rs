//! Secret reference resolution.
//!
//! Secret-bearing values in `config.toml` can name where the secret lives
//! instead of holding it:
//!
//! - `env:VAR` reads the environment variable `VAR`
//! - `pass:entry` takes the first line of `pass show entry`
//!
//! Anything without a recognized prefix is used as written.

use std::process::Command;

/// A classified secret value.
enum SecretRef<'a> {
    Env(&'a str),
    Pass(&'a str),
    Literal(&'a str),
}

fn classify(value: &str) -> SecretRef<'_> {
    match value.split_once(':') {
        Some(("env", var)) => SecretRef::Env(var),
        Some(("pass", entry)) => SecretRef::Pass(entry),
        _ => SecretRef::Literal(value),
    }
}

/// Returns true when the value is a reference rather than a literal.
///
/// References only name where a secret lives, so config dumps may show
/// them without leaking anything.
pub fn is_reference(value: &str) -> bool {
    !matches!(classify(value), SecretRef::Literal(_))
}

/// Resolves a config value into the secret it stands for.
///
/// # Errors
///
/// Returns an error when the referenced environment variable is unset or
/// `pass show` fails.
pub fn resolve(value: &str) -> Result<String, String> {
    match classify(value) {
        SecretRef::Env(var) => {
            std::env::var(var).map_err(|_| format!("environment variable `{}` is not set", var))
        }
        SecretRef::Pass(entry) => first_pass_line(entry),
        SecretRef::Literal(text) => Ok(text.to_string()),
    }
}

fn first_pass_line(entry: &str) -> Result<String, String> {
    let output = Command::new("pass")
        .args(["show", entry])
        .output()
        .map_err(|e| format!("could not run pass: {}", e))?;

    if !output.status.success() {
        let detail = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "pass show {} exited with {}: {}",
            entry,
            output.status,
            detail.trim()
        ));
    }

    match String::from_utf8_lossy(&output.stdout).lines().next() {
        Some(line) if !line.is_empty() => Ok(line.to_string()),
        _ => Err(format!("pass show {} printed nothing", entry)),
    }
}
