/// Name of the environment variable holding a TOML derivation configuration.
///
/// See [`DerivationConfig::from_env`](crate::utils::conf::DerivationConfig::from_env).
pub const ENV_DERIVATION_CONFIG: &str = "FS_DERIVATION_CONFIG";

/// Inline capacity for per-record input lists and lineage keys.
///
/// Relations rarely tie more than four variables together, so a derived
/// record rarely has more than three direct inputs.
pub const INLINE_INPUTS: usize = 4;
