//! Artifact persistence: ABIs by object name and by address, binaries.
//!
//! Every write goes to a temp file in the target directory and is then
//! persisted over the target path, so readers never see a partial file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use alloy_primitives::Address;
use tempfile::NamedTempFile;

use crate::abi::abi_key;
use crate::error::{JobError, Result};

/// Writable ABI and binary directories.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    abi_path: PathBuf,
    bin_path: PathBuf,
}

impl ArtifactStore {
    pub fn new(abi_path: impl Into<PathBuf>, bin_path: impl Into<PathBuf>) -> Self {
        Self {
            abi_path: abi_path.into(),
            bin_path: bin_path.into(),
        }
    }

    /// Create both directories if they do not exist yet.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.abi_path, &self.bin_path] {
            fs::create_dir_all(dir).map_err(|e| JobError::fs(dir, e))?;
        }
        Ok(())
    }

    /// Save an ABI under an object name.
    ///
    /// Returns `None` without writing when the name is blank.
    pub fn save_abi_by_name(&self, name: &str, abi: &str) -> Result<Option<PathBuf>> {
        if name.trim().is_empty() {
            return Ok(None);
        }
        let path = self.abi_path.join(abi_key(name));
        write_atomic(&path, abi.as_bytes())?;
        Ok(Some(path))
    }

    /// Save an ABI under the address a contract was deployed to.
    pub fn save_abi_by_address(&self, address: &Address, abi: &str) -> Result<PathBuf> {
        let path = self.abi_path.join(address.to_string());
        write_atomic(&path, abi.as_bytes())?;
        Ok(path)
    }

    /// Save bytecode hex as `<bin_path>/<name>.bin`.
    pub fn save_binary(&self, name: &str, bytecode: &str) -> Result<PathBuf> {
        let path = self.bin_path.join(format!("{}.bin", abi_key(name)));
        write_atomic(&path, bytecode.as_bytes())?;
        Ok(path)
    }
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|e| JobError::fs(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| JobError::fs(dir, e))?;
    tmp.write_all(contents).map_err(|e| JobError::fs(path, e))?;
    tmp.persist(path).map_err(|e| JobError::fs(path, e.error))?;
    Ok(())
}
