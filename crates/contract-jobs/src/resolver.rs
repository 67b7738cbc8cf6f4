//! Contract artifact resolution.
//!
//! A contract identifier is looked up through an ordered chain of
//! [`ResolveStrategy`]s; the first candidate that exists on disk wins.
//! The default chain tries the identifier as given, then under the binary
//! directory, then its base name under the binary directory.

use std::path::{Path, PathBuf};

use crate::error::{JobError, Result};

/// What the resolved file needs before it can be deployed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Precompiled `.bin` file: link only
    Binary,
    /// Source file: full compilation
    Source,
}

impl ArtifactKind {
    /// Classify by the extension of the identifier.
    pub fn classify(identifier: &str) -> Self {
        match Path::new(identifier).extension().and_then(|e| e.to_str()) {
            Some("bin") => ArtifactKind::Binary,
            _ => ArtifactKind::Source,
        }
    }
}

/// A located contract file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub path: PathBuf,
    pub kind: ArtifactKind,
    /// Name of the strategy that found it
    pub found_by: &'static str,
}

/// One location to look for a contract.
pub trait ResolveStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// The path this strategy would use, or `None` when it does not apply.
    fn candidate(&self, identifier: &Path, bin_path: &Path) -> Option<PathBuf>;
}

/// The identifier itself, absolute or relative to the working directory.
pub struct AsGiven;

impl ResolveStrategy for AsGiven {
    fn name(&self) -> &'static str {
        "as_given"
    }

    fn candidate(&self, identifier: &Path, _bin_path: &Path) -> Option<PathBuf> {
        Some(identifier.to_path_buf())
    }
}

/// `bin_path/identifier`
pub struct UnderBinPath;

impl ResolveStrategy for UnderBinPath {
    fn name(&self) -> &'static str {
        "under_bin_path"
    }

    fn candidate(&self, identifier: &Path, bin_path: &Path) -> Option<PathBuf> {
        Some(bin_path.join(identifier))
    }
}

/// `bin_path/basename(identifier)`
pub struct BasenameUnderBinPath;

impl ResolveStrategy for BasenameUnderBinPath {
    fn name(&self) -> &'static str {
        "basename_under_bin_path"
    }

    fn candidate(&self, identifier: &Path, bin_path: &Path) -> Option<PathBuf> {
        identifier.file_name().map(|base| bin_path.join(base))
    }
}

/// Prioritized chain of strategies.
pub struct ArtifactResolver {
    strategies: Vec<Box<dyn ResolveStrategy>>,
}

impl Default for ArtifactResolver {
    fn default() -> Self {
        Self::new(vec![
            Box::new(AsGiven),
            Box::new(UnderBinPath),
            Box::new(BasenameUnderBinPath),
        ])
    }
}

impl ArtifactResolver {
    pub fn new(strategies: Vec<Box<dyn ResolveStrategy>>) -> Self {
        Self { strategies }
    }

    /// Locate `identifier`, trying each strategy in order.
    ///
    /// On failure the error lists every path that was tried.
    pub fn resolve(&self, identifier: &str, bin_path: &Path) -> Result<ResolvedArtifact> {
        let id = Path::new(identifier);
        let mut attempted = Vec::with_capacity(self.strategies.len());

        for strategy in &self.strategies {
            let Some(candidate) = strategy.candidate(id, bin_path) else {
                continue;
            };
            if candidate.exists() {
                return Ok(ResolvedArtifact {
                    path: candidate,
                    kind: ArtifactKind::classify(identifier),
                    found_by: strategy.name(),
                });
            }
            attempted.push(candidate);
        }

        Err(JobError::PathNotFound {
            contract: identifier.to_string(),
            attempted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(ArtifactKind::classify("Token.bin"), ArtifactKind::Binary);
        assert_eq!(ArtifactKind::classify("build/Token.bin"), ArtifactKind::Binary);
        assert_eq!(ArtifactKind::classify("Token.sol"), ArtifactKind::Source);
        assert_eq!(ArtifactKind::classify("Token"), ArtifactKind::Source);
    }

    #[test]
    fn test_as_given_wins() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Token.sol");
        std::fs::write(&file, "contract Token {}").unwrap();

        let found = ArtifactResolver::default()
            .resolve(file.to_str().unwrap(), &dir.path().join("bin"))
            .unwrap();
        assert_eq!(found.path, file);
        assert_eq!(found.found_by, "as_given");
        assert_eq!(found.kind, ArtifactKind::Source);
    }

    #[test]
    fn test_falls_back_to_bin_path() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("bin");
        std::fs::create_dir_all(bin.join("nested")).unwrap();
        std::fs::write(bin.join("nested/Token.bin"), "60fe").unwrap();

        let found = ArtifactResolver::default()
            .resolve("nested/Token.bin", &bin)
            .unwrap();
        assert_eq!(found.path, bin.join("nested/Token.bin"));
        assert_eq!(found.found_by, "under_bin_path");
        assert_eq!(found.kind, ArtifactKind::Binary);
    }

    #[test]
    fn test_falls_back_to_basename() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        std::fs::write(bin.join("Token.bin"), "60fe").unwrap();

        let found = ArtifactResolver::default()
            .resolve("elsewhere/Token.bin", &bin)
            .unwrap();
        assert_eq!(found.path, bin.join("Token.bin"));
        assert_eq!(found.found_by, "basename_under_bin_path");
    }

    #[test]
    fn test_not_found_lists_all_three_paths() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("bin");

        let err = ArtifactResolver::default()
            .resolve("missing/Nope.sol", &bin)
            .unwrap_err();
        match &err {
            JobError::PathNotFound { attempted, .. } => {
                assert_eq!(attempted.len(), 3);
                assert_eq!(attempted[0], PathBuf::from("missing/Nope.sol"));
                assert_eq!(attempted[1], bin.join("missing/Nope.sol"));
                assert_eq!(attempted[2], bin.join("Nope.sol"));
            }
            other => panic!("unexpected error: {other}"),
        }
        let msg = err.to_string();
        assert!(msg.contains("missing/Nope.sol"));
        assert!(msg.contains(&bin.join("Nope.sol").display().to_string()));
    }
}
