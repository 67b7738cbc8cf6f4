//! Error types for contract-gateway

use thiserror::Error;

/// Errors raised by chain clients and compiler services.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The chain node could not be reached or dropped the connection
    #[error("chain transport failed: {0}")]
    Transport(String),

    /// The chain accepted the connection but rejected the transaction
    #[error("transaction rejected: {0}")]
    Rejected(String),

    /// A transaction field could not be turned into a payload
    #[error("invalid transaction field {field}: {value}")]
    InvalidField { field: String, value: String },

    /// The account used as transaction source is unknown to the signer
    #[error("unknown signing account: {0}")]
    UnknownAccount(String),

    /// ABI resolution or packing failed before anything reached the chain
    #[error("abi error: {0}")]
    Abi(String),

    /// The compiler service could not be run
    #[error("compiler unavailable: {0}")]
    CompilerUnavailable(String),

    /// Compiler output could not be understood
    #[error("malformed compiler output: {0}")]
    MalformedOutput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for gateway operations
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;
