//! Contract-Gateway: external collaborators of the contract job engine
//!
//! The job engine never talks to a node or a compiler directly. This crate
//! defines the two seams it goes through, plus implementations for them.
//!
//! ## Key Components
//!
//! - `ChainClient`: builds, signs and broadcasts transactions
//! - `CompilerService`: compiles sources and links precompiled binaries
//! - `SolcCompiler`: `CompilerService` backed by a local `solc` binary
//! - `fakes`: in-memory `MemoryChain` and `ScriptedCompiler` for tests

pub mod chain;
pub mod compiler;
mod error;
pub mod fakes;
pub mod solc;

pub use chain::{CallArg, ChainClient, ExecResult, Receipt, TxExecution, TxPayload};
pub use compiler::{CompileResponse, CompiledObject, CompilerService, Libraries, LinkResponse};
pub use error::{GatewayError, GatewayResult};
pub use solc::SolcCompiler;
