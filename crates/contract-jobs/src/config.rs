//! Execution context configuration.
//!
//! Defaults, artifact directories and the variables available to
//! placeholder substitution. Loaded from the environment, from a TOML
//! file, or built in code.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{JobError, Result};

pub const DEFAULT_AMOUNT: &str = "9999";
pub const DEFAULT_FEE: &str = "1234";
pub const DEFAULT_GAS: &str = "1111111111";

/// Configuration shared by every job of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Directory holding saved ABIs, keyed by object name or address
    pub abi_path: PathBuf,
    /// Directory holding binaries, and the fallback search root for contracts
    pub bin_path: PathBuf,
    /// Account used when a job names no source
    pub account: String,
    pub default_amount: String,
    pub default_fee: String,
    pub default_gas: String,
    /// Current block height, available as `$block`
    pub block_height: Option<u64>,
    /// Named accounts, available as `$name`
    pub accounts: BTreeMap<String, String>,
    /// Results of earlier jobs, available as `$job_name`
    pub variables: BTreeMap<String, String>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            abi_path: PathBuf::from("abi"),
            bin_path: PathBuf::from("bin"),
            account: String::new(),
            default_amount: DEFAULT_AMOUNT.to_string(),
            default_fee: DEFAULT_FEE.to_string(),
            default_gas: DEFAULT_GAS.to_string(),
            block_height: None,
            accounts: BTreeMap::new(),
            variables: BTreeMap::new(),
        }
    }
}

impl ContextConfig {
    /// Build a config from `CJOBS_*` environment variables over the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = std::env::var("CJOBS_ABI_PATH") {
            config.abi_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("CJOBS_BIN_PATH") {
            config.bin_path = PathBuf::from(path);
        }
        if let Ok(account) = std::env::var("CJOBS_ACCOUNT") {
            config.account = account;
        }
        if let Ok(amount) = std::env::var("CJOBS_DEFAULT_AMOUNT") {
            config.default_amount = amount;
        }
        if let Ok(fee) = std::env::var("CJOBS_DEFAULT_FEE") {
            config.default_fee = fee;
        }
        if let Ok(gas) = std::env::var("CJOBS_DEFAULT_GAS") {
            config.default_gas = gas;
        }
        config
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| JobError::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| JobError::fs(path, e))?;
        Self::from_toml_str(&text)
    }

    /// Record a job result so later jobs can reference it.
    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(name.into(), value.into());
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = account.into();
        self
    }

    pub fn with_paths(mut self, abi_path: impl Into<PathBuf>, bin_path: impl Into<PathBuf>) -> Self {
        self.abi_path = abi_path.into();
        self.bin_path = bin_path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ContextConfig::default();
        assert_eq!(config.default_amount, "9999");
        assert_eq!(config.default_fee, "1234");
        assert_eq!(config.default_gas, "1111111111");
        assert_eq!(config.abi_path, PathBuf::from("abi"));
    }

    #[test]
    fn test_from_toml_partial() {
        let config = ContextConfig::from_toml_str(
            r#"
            account = "0x00000000000000000000000000000000000000aa"
            bin_path = "build/bin"
            block_height = 42

            [variables]
            deploy_token = "0x00000000000000000000000000000000000000bb"
            "#,
        )
        .unwrap();
        assert_eq!(config.bin_path, PathBuf::from("build/bin"));
        assert_eq!(config.abi_path, PathBuf::from("abi"));
        assert_eq!(config.block_height, Some(42));
        assert_eq!(config.default_fee, DEFAULT_FEE);
        assert!(config.variables.contains_key("deploy_token"));
    }

    #[test]
    fn test_from_toml_rejects_bad_types() {
        let err = ContextConfig::from_toml_str("block_height = \"soon\"").unwrap_err();
        assert!(matches!(err, JobError::Config(_)));
    }

    #[test]
    fn test_from_toml_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = ContextConfig::from_toml_file(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, JobError::Filesystem { .. }));
    }
}
