//! ABI store: JSON ABI files keyed by object name or deployed address.

use std::path::{Path, PathBuf};

use alloy_json_abi::JsonAbi;

use super::AbiSource;
use crate::error::{JobError, Result};

/// File name an ABI is saved under.
///
/// Object names may carry a source path (`contracts/Token.sol:Token`);
/// path separators are flattened so every key is a single file.
pub fn abi_key(name: &str) -> String {
    name.replace(['/', '\\'], "_")
}

/// Read access to saved ABIs.
#[derive(Debug, Clone)]
pub struct AbiStore {
    root: PathBuf,
}

impl AbiStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a source resolves to.
    pub fn path_for(&self, source: &AbiSource) -> PathBuf {
        match source {
            AbiSource::ByName(name) => self.root.join(abi_key(name)),
            AbiSource::ByOverride(abi) => {
                let direct = Path::new(abi);
                if direct.is_file() {
                    direct.to_path_buf()
                } else {
                    self.root.join(abi_key(abi))
                }
            }
            AbiSource::ByAddress(address) => self.root.join(address.to_string()),
        }
    }

    /// Load and parse the ABI for a source.
    pub fn load(&self, source: &AbiSource) -> Result<JsonAbi> {
        let path = self.path_for(source);
        let text = std::fs::read_to_string(&path).map_err(|e| JobError::AbiMismatch {
            abi_source: source.to_string(),
            function: String::new(),
            message: format!("no ABI at {}: {}", path.display(), e),
        })?;
        parse_abi(&text).map_err(|message| JobError::AbiMismatch {
            abi_source: source.to_string(),
            function: String::new(),
            message,
        })
    }
}

/// Parse ABI JSON text.
pub fn parse_abi(text: &str) -> std::result::Result<JsonAbi, String> {
    serde_json::from_str::<JsonAbi>(text).map_err(|e| format!("unreadable ABI: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;

    const ABI: &str = r#"[{"type":"function","name":"get","inputs":[],"outputs":[{"name":"","type":"uint256"}],"stateMutability":"view"}]"#;

    #[test]
    fn test_abi_key_flattens_paths() {
        assert_eq!(abi_key("contracts/Token.sol:Token"), "contracts_Token.sol:Token");
        assert_eq!(abi_key("Token"), "Token");
    }

    #[test]
    fn test_load_by_name_and_address() {
        let dir = tempfile::tempdir().unwrap();
        let address = Address::repeat_byte(0x42);
        std::fs::write(dir.path().join("Store"), ABI).unwrap();
        std::fs::write(dir.path().join(address.to_string()), ABI).unwrap();
        let store = AbiStore::new(dir.path());

        let by_name = store.load(&AbiSource::ByName("Store".to_string())).unwrap();
        assert!(by_name.function("get").is_some());
        let by_addr = store.load(&AbiSource::ByAddress(address)).unwrap();
        assert!(by_addr.function("get").is_some());
    }

    #[test]
    fn test_override_accepts_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("custom.json");
        std::fs::write(&file, ABI).unwrap();
        let store = AbiStore::new(dir.path().join("abi"));

        let source = AbiSource::ByOverride(file.display().to_string());
        assert_eq!(store.path_for(&source), file);
        assert!(store.load(&source).is_ok());
    }

    #[test]
    fn test_missing_abi_is_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let store = AbiStore::new(dir.path());
        let err = store.load(&AbiSource::ByName("Nope".to_string())).unwrap_err();
        assert!(matches!(err, JobError::AbiMismatch { .. }));
        assert!(err.to_string().contains("no ABI at"));
    }

    #[test]
    fn test_garbage_abi_is_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Bad"), "not json").unwrap();
        let store = AbiStore::new(dir.path());
        let err = store.load(&AbiSource::ByName("Bad".to_string())).unwrap_err();
        assert!(err.to_string().contains("unreadable ABI"));
    }
}
