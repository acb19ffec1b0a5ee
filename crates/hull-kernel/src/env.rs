//! Allowlist-gated environment variable capability.
//!
//! Scripts may only read environment variables whose names appear in
//! the application's declared allowlist. Anything else reads as
//! absent, whether or not the variable is actually set in the process
//! environment: a disallowed name and an unset variable are
//! indistinguishable from inside the sandbox. Matching is exact string
//! equality; there are no prefix or pattern rules.

use std::collections::BTreeSet;

/// The set of environment variable names readable through the
/// capability.
///
/// Built once from the application's manifest and immutable
/// afterwards.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    allowed: BTreeSet<String>,
}

impl EnvConfig {
    /// Builds the allowlist from an iterator of names.
    #[must_use]
    pub fn new(allowed: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `name` is a member of the allowlist.
    #[must_use]
    pub fn is_allowed(&self, name: &str) -> bool {
        self.allowed.contains(name)
    }
}

/// Reads an environment variable through the allowlist.
///
/// Returns `None` if `name` is not allowlisted, is not set, or is set
/// to a non-UTF-8 value.
#[must_use]
pub fn get(cfg: &EnvConfig, name: &str) -> Option<String> {
    if !cfg.is_allowed(name) {
        tracing::debug!(name, "env: name not in allowlist");
        return None;
    }
    std::env::var(name).ok()
}
