//! Mapping of collaborator failures onto job errors.
//!
//! Chain failures and ABI failures share one operator channel: both are
//! passed through the chain client's `translate_error` before they are
//! reported.

use contract_gateway::{ChainClient, CompileResponse, GatewayError};

use crate::error::{CompileErrorKind, JobError};
use crate::obs::{JobObserver, Stage};

/// A sign-and-broadcast failure.
pub fn broadcast_failure(
    chain: &dyn ChainClient,
    observer: &dyn JobObserver,
    account: &str,
    err: GatewayError,
) -> JobError {
    observer.error(
        Stage::Transaction,
        "Chain rejected the transaction",
        &[("account", account.to_string()), ("error", err.to_string())],
    );
    JobError::ChainBroadcast(chain.translate_error(&err, account))
}

/// An execution exception carried by an otherwise successful broadcast.
pub fn execution_exception(
    chain: &dyn ChainClient,
    observer: &dyn JobObserver,
    account: &str,
    exception: &str,
) -> JobError {
    broadcast_failure(
        chain,
        observer,
        account,
        GatewayError::Rejected(exception.to_string()),
    )
}

/// An ABI failure that is not the fallback special case.
///
/// Non-ABI errors are returned unchanged.
pub fn abi_failure(chain: &dyn ChainClient, account: &str, err: JobError) -> JobError {
    match err {
        JobError::AbiMismatch {
            abi_source,
            function,
            message,
        } => {
            let translated = chain.translate_error(&GatewayError::Abi(message), account);
            JobError::AbiMismatch {
                abi_source,
                function,
                message: translated,
            }
        }
        other => other,
    }
}

/// A compiler service that could not do its job at all.
pub fn tooling_failure(path: &str, err: GatewayError) -> JobError {
    JobError::Compile {
        kind: CompileErrorKind::Tooling,
        path: path.to_string(),
        message: err.to_string(),
    }
}

/// Split a compile response into a fatal error, or an optional warning.
pub fn compile_outcome(path: &str, response: &CompileResponse) -> Result<Option<String>, JobError> {
    if !response.error.trim().is_empty() {
        return Err(JobError::Compile {
            kind: CompileErrorKind::Language,
            path: path.to_string(),
            message: response.error.clone(),
        });
    }
    if response.warning.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(response.warning.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obs::RecordingObserver;
    use contract_gateway::fakes::MemoryChain;

    #[test]
    fn test_broadcast_failure_is_translated() {
        let chain = MemoryChain::new();
        let obs = RecordingObserver::new();
        let err = broadcast_failure(
            &chain,
            &obs,
            "alice",
            GatewayError::Transport("connection refused".to_string()),
        );
        match err {
            JobError::ChainBroadcast(msg) => {
                assert!(msg.contains("connection refused"));
                assert!(msg.contains("alice"));
            }
            other => panic!("unexpected: {other}"),
        }
        assert_eq!(obs.for_stage(Stage::Transaction).len(), 1);
    }

    #[test]
    fn test_abi_failure_goes_through_translation() {
        let chain = MemoryChain::new();
        let err = abi_failure(
            &chain,
            "alice",
            JobError::AbiMismatch {
                abi_source: "Token".to_string(),
                function: "mint".to_string(),
                message: "no function mint".to_string(),
            },
        );
        match err {
            JobError::AbiMismatch { message, function, .. } => {
                assert_eq!(function, "mint");
                assert!(message.contains("no function mint"));
                assert!(message.contains("alice"));
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn test_abi_failure_passes_other_errors() {
        let chain = MemoryChain::new();
        let err = abi_failure(&chain, "alice", JobError::InvalidJob("x".to_string()));
        assert!(matches!(err, JobError::InvalidJob(_)));
    }

    #[test]
    fn test_compile_outcome_classes() {
        let mut response = CompileResponse::default();
        assert_eq!(compile_outcome("A.sol", &response).unwrap(), None);

        response.warning = "shadowed declaration".to_string();
        assert_eq!(
            compile_outcome("A.sol", &response).unwrap().as_deref(),
            Some("shadowed declaration")
        );

        response.error = "ParserError".to_string();
        let err = compile_outcome("A.sol", &response).unwrap_err();
        assert!(matches!(
            err,
            JobError::Compile {
                kind: CompileErrorKind::Language,
                ..
            }
        ));
    }

    #[test]
    fn test_tooling_failure() {
        let err = tooling_failure("A.sol", GatewayError::CompilerUnavailable("no solc".to_string()));
        assert!(err.to_string().starts_with("compiler error for A.sol"));
    }
}
