//! Local `solc` adapter.
//!
//! Runs the Solidity compiler as a child process and reads its combined
//! JSON output. Binary linkage is done in-process: library placeholders in
//! a `.bin` file are replaced with the configured library addresses.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use alloy_primitives::keccak256;
use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;
use tracing::debug;

use crate::compiler::{CompileResponse, CompiledObject, CompilerService, Libraries, LinkResponse};
use crate::error::{GatewayError, GatewayResult};

/// Length of a library placeholder (and of a hex address).
const PLACEHOLDER_LEN: usize = 40;

/// Compiler service backed by a local `solc` binary.
#[derive(Debug, Clone)]
pub struct SolcCompiler {
    binary: PathBuf,
    optimize: bool,
}

impl Default for SolcCompiler {
    fn default() -> Self {
        Self {
            binary: std::env::var("SOLC_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("solc")),
            optimize: false,
        }
    }
}

impl SolcCompiler {
    /// Create an adapter using `SOLC_PATH`, or `solc` from `PATH`.
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Use a specific compiler binary.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            optimize: false,
        }
    }

    /// Pass `--optimize` to the compiler.
    pub fn with_optimizer(mut self) -> Self {
        self.optimize = true;
        self
    }
}

#[async_trait]
impl CompilerService for SolcCompiler {
    async fn compile(&self, path: &Path, libraries: &Libraries) -> GatewayResult<CompileResponse> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--combined-json").arg("abi,bin");
        if self.optimize {
            cmd.arg("--optimize");
        }
        if !libraries.is_empty() {
            cmd.arg("--libraries").arg(format_libraries(libraries));
        }
        cmd.arg(path).stdout(Stdio::piped()).stderr(Stdio::piped());

        debug!(compiler = %self.binary.display(), path = %path.display(), "Running compiler");
        let output = cmd.output().await.map_err(|e| {
            GatewayError::CompilerUnavailable(format!("{}: {}", self.binary.display(), e))
        })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            let error = if stderr.is_empty() {
                format!(
                    "compiler exited with code {}",
                    output.status.code().unwrap_or(-1)
                )
            } else {
                stderr
            };
            return Ok(CompileResponse {
                objects: Vec::new(),
                error,
                warning: String::new(),
            });
        }

        Ok(CompileResponse {
            objects: parse_combined_json(&output.stdout)?,
            error: String::new(),
            warning: stderr,
        })
    }

    async fn link_binary(&self, path: &Path, libraries: &Libraries) -> GatewayResult<LinkResponse> {
        let code = tokio::fs::read_to_string(path).await?;
        Ok(match link_bytecode(code.trim(), libraries) {
            Ok(binary) => LinkResponse {
                binary,
                error: String::new(),
            },
            Err(error) => LinkResponse {
                binary: String::new(),
                error,
            },
        })
    }
}

/// Render libraries the way `solc --libraries` expects them.
fn format_libraries(libraries: &Libraries) -> String {
    libraries
        .iter()
        .map(|(name, address)| format!("{}={}", name, address))
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse `solc --combined-json abi,bin` output.
///
/// Older compilers emit the ABI as an embedded JSON string, newer ones as
/// an array. Both end up as ABI text.
pub fn parse_combined_json(stdout: &[u8]) -> GatewayResult<Vec<CompiledObject>> {
    let root: Value = serde_json::from_slice(stdout)?;
    let contracts = root
        .get("contracts")
        .and_then(Value::as_object)
        .ok_or_else(|| GatewayError::MalformedOutput("missing `contracts` object".to_string()))?;

    let mut objects = Vec::with_capacity(contracts.len());
    for (name, entry) in contracts {
        let abi = match entry.get("abi") {
            Some(Value::String(text)) => text.clone(),
            Some(other) => serde_json::to_string(other)?,
            None => "[]".to_string(),
        };
        let bytecode = entry
            .get("bin")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        objects.push(CompiledObject::new(name.clone(), abi, bytecode));
    }
    Ok(objects)
}

/// Replace library placeholders in hex bytecode.
///
/// Both placeholder styles are understood: the legacy `__Name____…` form
/// (name padded with `_` to 40 characters) and the hashed `__$…$__` form.
/// Any placeholder left after substitution is an error.
pub fn link_bytecode(code: &str, libraries: &Libraries) -> Result<String, String> {
    let mut linked = code.trim_start_matches("0x").to_string();

    for (name, address) in libraries {
        let address = address.trim().trim_start_matches("0x");
        if address.len() != PLACEHOLDER_LEN || !address.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("library {} has an invalid address: {}", name, address));
        }
        let short = name.rsplit(':').next().unwrap_or(name);
        for candidate in [name.as_str(), short] {
            linked = linked.replace(&legacy_placeholder(candidate), address);
        }
        linked = linked.replace(&hashed_placeholder(name), address);
    }

    if let Some(pos) = linked.find("__") {
        let placeholder: String = linked[pos..].chars().take(PLACEHOLDER_LEN).collect();
        return Err(format!(
            "unresolved library placeholder {} in binary",
            placeholder
        ));
    }
    if let Some(bad) = linked.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(format!("binary is not hex: unexpected character {:?}", bad));
    }
    Ok(linked)
}

fn legacy_placeholder(name: &str) -> String {
    let truncated: String = name.chars().take(PLACEHOLDER_LEN - 4).collect();
    format!("{:_<width$}", format!("__{}", truncated), width = PLACEHOLDER_LEN)
}

fn hashed_placeholder(qualified_name: &str) -> String {
    let hash = hex::encode(keccak256(qualified_name.as_bytes()));
    format!("__${}$__", &hash[..34])
}
