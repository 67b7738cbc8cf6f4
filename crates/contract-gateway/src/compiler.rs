//! Compiler service contract.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GatewayResult;

/// Library name → deployed library address.
pub type Libraries = BTreeMap<String, String>;

/// One object emitted by a compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledObject {
    /// Object name, possibly namespaced as `file:Name`
    pub name: String,
    /// JSON ABI text
    pub abi: String,
    /// Creation bytecode as hex, empty for interfaces and abstract contracts
    pub bytecode: String,
}

impl CompiledObject {
    pub fn new(name: impl Into<String>, abi: impl Into<String>, bytecode: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            abi: abi.into(),
            bytecode: bytecode.into(),
        }
    }

    /// Whether this object has code that can be deployed.
    pub fn is_deployable(&self) -> bool {
        !self.bytecode.trim().is_empty()
    }
}

/// Response to a compile request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileResponse {
    pub objects: Vec<CompiledObject>,
    /// Source-level error reported by the compiler. Empty when none.
    pub error: String,
    /// Non-fatal diagnostics. Empty when none.
    pub warning: String,
}

/// Response to a binary link request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkResponse {
    /// Linked bytecode as hex
    pub binary: String,
    /// Link error. Empty when none.
    pub error: String,
}

/// External compiler service.
///
/// A returned `Err` means the service itself failed (could not be run,
/// produced garbage). Problems with the submitted source are reported
/// through the `error` field of an `Ok` response instead.
#[async_trait]
pub trait CompilerService: Send + Sync {
    /// Compile a source file.
    async fn compile(&self, path: &Path, libraries: &Libraries) -> GatewayResult<CompileResponse>;

    /// Link a precompiled binary against the given libraries.
    async fn link_binary(&self, path: &Path, libraries: &Libraries) -> GatewayResult<LinkResponse>;
}
