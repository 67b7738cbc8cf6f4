//! In-memory fakes for the gateway traits (testing only)
//!
//! Provides `MemoryChain` and `ScriptedCompiler`, which satisfy the trait
//! contracts without a node or a compiler binary.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::chain::*;
use crate::compiler::*;
use crate::error::{GatewayError, GatewayResult};

// ---------------------------------------------------------------------------
// MemoryChain
// ---------------------------------------------------------------------------

/// In-memory chain that records every payload it is handed.
///
/// Scripted executions are consumed first, in push order. Once the script
/// is empty the chain answers on its own: creates get a fresh non-zero
/// address derived from the code, calls return `default_return`.
#[derive(Debug, Default)]
pub struct MemoryChain {
    script: Mutex<VecDeque<GatewayResult<TxExecution>>>,
    payloads: Mutex<Vec<TxPayload>>,
    default_return: Mutex<Bytes>,
}

impl MemoryChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an execution to be returned by the next broadcast.
    pub fn push_execution(&self, execution: TxExecution) {
        self.script.lock().unwrap().push_back(Ok(execution));
    }

    /// Queue a failure to be returned by the next broadcast.
    pub fn push_failure(&self, err: GatewayError) {
        self.script.lock().unwrap().push_back(Err(err));
    }

    /// Return data used for unscripted calls.
    pub fn set_default_return(&self, data: Bytes) {
        *self.default_return.lock().unwrap() = data;
    }

    /// Every payload broadcast so far, in order.
    pub fn payloads(&self) -> Vec<TxPayload> {
        self.payloads.lock().unwrap().clone()
    }

    fn answer(&self, payload: &TxPayload, nonce: usize) -> TxExecution {
        let mut hasher = Sha256::new();
        hasher.update(payload.input.as_bytes());
        hasher.update(&payload.data);
        hasher.update(nonce.to_be_bytes());
        let digest: [u8; 32] = hasher.finalize().into();
        let tx_hash = B256::from(digest);

        if payload.is_create() {
            TxExecution {
                receipt: Receipt {
                    tx_hash,
                    creates_contract: true,
                    contract_address: Address::from_slice(&digest[12..]),
                },
                result: ExecResult::default(),
                exception: None,
            }
        } else {
            TxExecution {
                receipt: Receipt {
                    tx_hash,
                    creates_contract: false,
                    contract_address: Address::ZERO,
                },
                result: ExecResult {
                    return_data: self.default_return.lock().unwrap().clone(),
                },
                exception: None,
            }
        }
    }
}

#[async_trait]
impl ChainClient for MemoryChain {
    async fn sign_and_broadcast(&self, payload: TxPayload) -> GatewayResult<TxExecution> {
        let nonce = {
            let mut payloads = self.payloads.lock().unwrap();
            payloads.push(payload.clone());
            payloads.len()
        };
        let scripted = self.script.lock().unwrap().pop_front();
        match scripted {
            Some(outcome) => outcome,
            None => Ok(self.answer(&payload, nonce)),
        }
    }
}

// ---------------------------------------------------------------------------
// ScriptedCompiler
// ---------------------------------------------------------------------------

/// Compiler that returns canned responses and counts how it was used.
#[derive(Debug, Default)]
pub struct ScriptedCompiler {
    compile_response: CompileResponse,
    link_response: LinkResponse,
    unavailable: Option<String>,
    compile_calls: AtomicUsize,
    link_calls: AtomicUsize,
    requested: Mutex<Vec<PathBuf>>,
}

impl ScriptedCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_objects(mut self, objects: Vec<CompiledObject>) -> Self {
        self.compile_response.objects = objects;
        self
    }

    pub fn with_warning(mut self, warning: &str) -> Self {
        self.compile_response.warning = warning.to_string();
        self
    }

    pub fn with_error(mut self, error: &str) -> Self {
        self.compile_response.error = error.to_string();
        self
    }

    pub fn with_link(mut self, response: LinkResponse) -> Self {
        self.link_response = response;
        self
    }

    /// Make every request fail as if the compiler could not be run.
    pub fn unavailable(mut self, reason: &str) -> Self {
        self.unavailable = Some(reason.to_string());
        self
    }

    pub fn compile_calls(&self) -> usize {
        self.compile_calls.load(Ordering::SeqCst)
    }

    pub fn link_calls(&self) -> usize {
        self.link_calls.load(Ordering::SeqCst)
    }

    /// Paths handed to either operation, in order.
    pub fn requested_paths(&self) -> Vec<PathBuf> {
        self.requested.lock().unwrap().clone()
    }

    fn check_available(&self) -> GatewayResult<()> {
        match &self.unavailable {
            Some(reason) => Err(GatewayError::CompilerUnavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CompilerService for ScriptedCompiler {
    async fn compile(&self, path: &Path, _libraries: &Libraries) -> GatewayResult<CompileResponse> {
        self.compile_calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(path.to_path_buf());
        self.check_available()?;
        Ok(self.compile_response.clone())
    }

    async fn link_binary(&self, path: &Path, _libraries: &Libraries) -> GatewayResult<LinkResponse> {
        self.link_calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(path.to_path_buf());
        self.check_available()?;
        Ok(self.link_response.clone())
    }
}
