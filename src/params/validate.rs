//! Shape checks for individual parameter values.
//!
//! Arguments are always passed to the external program as a discrete vector,
//! so nothing here is about quoting. These checks reject values that would be
//! misread as flags, that smuggle control characters, or that do not look like
//! the kind of value the parameter names.

use crate::error::{NixkilError, Result};
use regex::Regex;
use std::sync::LazyLock;

/// Characters a positional token may never contain.
const FORBIDDEN_CHARS: &[char] = &[';', '|', '`', '$', '<', '>', '\\', '\'', '"', '(', ')', '{', '}'];

static PACKAGE_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.+-]*$").expect("Invalid package name regex")
});

static OPTION_PATH_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[A-Za-z_][A-Za-z0-9_'-]*(\.([A-Za-z0-9_'<>*-]+|"[^"\\\s]+"))*$"#)
        .expect("Invalid option path regex")
});

static HOST_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9._-]+@)?[A-Za-z0-9._:\[\]-]+$").expect("Invalid host regex")
});

static ATTR_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.-]*$").expect("Invalid attribute name regex")
});

static INPUT_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_/-]*$").expect("Invalid input name regex")
});

fn invalid(field: &str, value: &str, reason: &str) -> NixkilError {
    NixkilError::invalid(format!("parameter '{}' ({:?}) {}", field, value, reason))
}

/// Free text (queries, expressions): non-empty, no NUL, no control characters
/// other than newline and tab.
pub fn text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(field, value, "must not be empty"));
    }
    if value
        .chars()
        .any(|c| c.is_control() && c != '\n' && c != '\t')
    {
        return Err(invalid(field, value, "must not contain control characters"));
    }
    Ok(())
}

/// Text that is also passed positionally, so it must not look like a flag.
pub fn positional_text(field: &str, value: &str) -> Result<()> {
    text(field, value)?;
    if value.starts_with('-') {
        return Err(invalid(field, value, "must not start with '-'"));
    }
    Ok(())
}

/// A single positional token such as a flake reference or installable.
pub fn token(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(invalid(field, value, "must not be empty"));
    }
    if value.starts_with('-') {
        return Err(invalid(field, value, "must not start with '-'"));
    }
    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid(
            field,
            value,
            "must not contain whitespace or control characters",
        ));
    }
    if let Some(c) = value.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(invalid(
            field,
            value,
            &format!("must not contain shell metacharacter '{}'", c),
        ));
    }
    Ok(())
}

/// A package attribute name such as `hello` or `python311Packages.requests`.
pub fn package_name(field: &str, value: &str) -> Result<()> {
    token(field, value)?;
    if value.contains("..") || value.contains('/') {
        return Err(invalid(field, value, "must not contain path components"));
    }
    if !PACKAGE_NAME_REGEX.is_match(value) {
        return Err(invalid(
            field,
            value,
            "must be an attribute name (letters, digits, '_', '.', '+', '-')",
        ));
    }
    Ok(())
}

/// A package given either as a bare name or as `flake#attr`.
pub fn installable(field: &str, value: &str) -> Result<()> {
    match value.split_once('#') {
        Some((flake, attr)) => {
            token(field, flake)?;
            package_name(field, attr)
        }
        None => package_name(field, value),
    }
}

/// A filesystem path passed positionally.
pub fn path(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(invalid(field, value, "must not be empty"));
    }
    if value.starts_with('-') {
        return Err(invalid(
            field,
            value,
            "must not start with '-' (prefix it with './')",
        ));
    }
    if value.chars().any(|c| c.is_control()) {
        return Err(invalid(field, value, "must not contain control characters"));
    }
    Ok(())
}

/// A dotted NixOS option path such as `services.nginx.enable`.
pub fn option_path(field: &str, value: &str) -> Result<()> {
    if !OPTION_PATH_REGEX.is_match(value) {
        return Err(invalid(
            field,
            value,
            "must be a dotted option path such as 'services.nginx.enable'",
        ));
    }
    Ok(())
}

/// An SSH destination: `host` or `user@host`.
pub fn host(field: &str, value: &str) -> Result<()> {
    if value.starts_with('-') || !HOST_REGEX.is_match(value) {
        return Err(invalid(
            field,
            value,
            "must be a host name or user@host",
        ));
    }
    Ok(())
}

/// A flake attribute name such as a NixOS configuration name.
pub fn attr_name(field: &str, value: &str) -> Result<()> {
    if !ATTR_NAME_REGEX.is_match(value) {
        return Err(invalid(field, value, "must be an attribute name"));
    }
    Ok(())
}

/// A flake input name such as `nixpkgs` or `home-manager/nixpkgs`.
pub fn input_name(field: &str, value: &str) -> Result<()> {
    if !INPUT_NAME_REGEX.is_match(value) {
        return Err(invalid(field, value, "must be a flake input name"));
    }
    Ok(())
}

/// An argument forwarded verbatim to another program.
pub fn argument(field: &str, value: &str) -> Result<()> {
    if value.contains('\0') {
        return Err(invalid(field, value, "must not contain NUL bytes"));
    }
    Ok(())
}

/// A positive count.
pub fn positive(field: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(NixkilError::invalid(format!(
            "parameter '{}' must be greater than 0",
            field
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_names() {
        for ok in ["hello", "python311Packages.requests", "gtk+3", "_7zz", "nix-output-monitor"] {
            assert!(package_name("name", ok).is_ok(), "{} should be accepted", ok);
        }
        for bad in ["", "../etc/passwd", "hello;rm", "-hello", "he llo", "a/b", "$(id)", "x`y`"] {
            assert!(package_name("name", bad).is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn installables_accept_flake_prefixes() {
        assert!(installable("packages", "nixpkgs#hello").is_ok());
        assert!(installable("packages", "github:owner/repo#tool").is_ok());
        assert!(installable("packages", "cowsay").is_ok());
        assert!(installable("packages", "nixpkgs#../x").is_err());
        assert!(installable("packages", "-x#hello").is_err());
    }

    #[test]
    fn tokens_reject_flags_and_metacharacters() {
        assert!(token("flake", "github:NixOS/nixpkgs/nixos-25.11").is_ok());
        assert!(token("flake", "git+https://example.com/r?ref=main&rev=abc").is_ok());
        assert!(token("flake", "--impure").is_err());
        assert!(token("flake", "a b").is_err());
        assert!(token("flake", "a|b").is_err());
        assert!(token("flake", "a\nb").is_err());
    }

    #[test]
    fn option_paths() {
        assert!(option_path("option", "services.nginx.enable").is_ok());
        assert!(option_path("option", "services.nginx.virtualHosts.\"example.com\".root").is_ok());
        assert!(option_path("option", "networking.firewall.allowedTCPPorts").is_ok());
        assert!(option_path("option", "services..enable").is_err());
        assert!(option_path("option", "services.nginx; reboot").is_err());
        assert!(option_path("option", "-I").is_err());
    }

    #[test]
    fn hosts() {
        assert!(host("target_host", "localhost").is_ok());
        assert!(host("target_host", "root@192.168.1.10").is_ok());
        assert!(host("target_host", "-oProxyCommand=evil").is_err());
        assert!(host("target_host", "a b").is_err());
    }

    #[test]
    fn text_allows_newlines_but_not_nul() {
        assert!(text("expression", "let x = 1;\nin x").is_ok());
        assert!(text("expression", "1\0").is_err());
        assert!(text("expression", "   ").is_err());
        assert!(positional_text("query", "-rf").is_err());
    }

    #[test]
    fn paths() {
        assert!(path("path", "../flake.nix").is_ok());
        assert!(path("path", "./-weird.nix").is_ok());
        assert!(path("path", "-weird.nix").is_err());
        assert!(path("path", "").is_err());
    }

    #[test]
    fn positive_counts() {
        assert!(positive("max_results", 1).is_ok());
        assert!(positive("max_results", 0).is_err());
    }
}
