//! Engine configuration.
//!
//! [`DerivationConfig`] can be built in code, taken from its `Default`, or
//! parsed from TOML:
//!
//! ```
//! use fscore::utils::conf::{DerivationConfig, FailurePolicy, PassVisibility};
//!
//! let conf = DerivationConfig::from_toml_str(
//!     r#"
//!     visibility = "next_pass"
//!     failure_policy = "skip"
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(conf.visibility, PassVisibility::NextPass);
//! assert_eq!(conf.failure_policy, FailurePolicy::Skip);
//! ```
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIs};

use crate::{
    magic::ENV_DERIVATION_CONFIG,
    utils::error::{FsError, FsResult},
};

/// When records created during a pass become candidates for other relations.
///
/// Both modes reach the same fixed point; they differ only in the order in
/// which records are discovered and in the number of passes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIs)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PassVisibility {
    /// Records added by a relation are candidates for every relation visited
    /// later in the same pass. A relation's own candidate list is fixed when
    /// its turn starts.
    #[default]
    Immediate,

    /// Candidates are restricted to the records that existed when the pass
    /// started.
    NextPass,
}

/// What to do when a formula fails on an otherwise valid input combination.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIs)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the whole run. No partial result is returned.
    #[default]
    Abort,

    /// Log the failure, drop that single candidate derivation and continue.
    Skip,
}

/// Settings of a derivation run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DerivationConfig {
    pub visibility: PassVisibility,
    pub failure_policy: FailurePolicy,
}

impl DerivationConfig {
    /// Parse a configuration from TOML. Missing keys take their default.
    pub fn from_toml_str(source: &str) -> FsResult<Self> {
        toml::from_str(source).map_err(|source| FsError::ConfigParse { source })
    }

    /// Read the configuration from the TOML held in [`ENV_DERIVATION_CONFIG`].
    ///
    /// Falls back to the default configuration when the variable is unset.
    pub fn from_env() -> FsResult<Self> {
        match std::env::var(ENV_DERIVATION_CONFIG) {
            Ok(source) => Self::from_toml_str(&source),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn with_visibility(mut self, visibility: PassVisibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let conf = DerivationConfig::from_toml_str("").unwrap();
        assert_eq!(conf, DerivationConfig::default());
        assert!(conf.visibility.is_immediate());
        assert!(conf.failure_policy.is_abort());
    }

    #[test]
    fn environment_overrides_default() {
        // Only test touching this variable.
        unsafe { std::env::remove_var(ENV_DERIVATION_CONFIG) };
        assert_eq!(DerivationConfig::from_env().unwrap(), DerivationConfig::default());

        unsafe { std::env::set_var(ENV_DERIVATION_CONFIG, r#"failure_policy = "skip""#) };
        let conf = DerivationConfig::from_env();
        unsafe { std::env::set_var(ENV_DERIVATION_CONFIG, "visibility = 3") };
        let bad = DerivationConfig::from_env();
        unsafe { std::env::remove_var(ENV_DERIVATION_CONFIG) };

        let conf = conf.unwrap();
        assert!(conf.failure_policy.is_skip());
        assert!(conf.visibility.is_immediate());
        assert!(bad.unwrap_err().is_config_parse());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = DerivationConfig::from_toml_str("max_passes = 3").unwrap_err();
        assert!(err.is_config_parse());
    }

    #[test]
    fn unknown_variant_is_rejected() {
        let err = DerivationConfig::from_toml_str(r#"visibility = "eventually""#).unwrap_err();
        assert!(err.is_config_parse());
    }

    #[test]
    fn display_matches_toml_spelling() {
        assert_eq!(PassVisibility::NextPass.to_string(), "next_pass");
        assert_eq!(FailurePolicy::Skip.to_string(), "skip");
    }
}
