//! Transaction building and receipt checks.
//!
//! Builds the `CallArg` for a create or a call, hands it to the chain
//! client for one sign-and-broadcast round trip, and interprets what comes
//! back.

use alloy_primitives::{Address, Bytes};
use contract_gateway::{CallArg, ChainClient, Receipt, TxExecution};

use crate::classify;
use crate::error::{JobError, Result};
use crate::job::{ResolvedCallJob, ResolvedDeployJob};
use crate::obs::{JobObserver, Stage};

/// Request creating a contract from `code`.
pub fn deploy_arg(job: &ResolvedDeployJob, code: Vec<u8>) -> CallArg {
    CallArg {
        input: job.source.clone(),
        address: None,
        amount: job.amount.clone(),
        fee: job.fee.clone(),
        gas: job.gas.clone(),
        sequence: job.sequence.clone(),
        data: Bytes::from(code),
    }
}

/// Request calling the job's destination with `data`.
///
/// The destination is passed through as written; the chain client rejects
/// one that is not an address.
pub fn call_arg(job: &ResolvedCallJob, data: Vec<u8>) -> CallArg {
    CallArg {
        input: job.source.clone(),
        address: Some(job.destination.clone()),
        amount: job.amount.clone(),
        fee: job.fee.clone(),
        gas: job.gas.clone(),
        sequence: job.sequence.clone(),
        data: Bytes::from(data),
    }
}

/// Build, sign and broadcast one transaction.
///
/// A transaction that was included but failed on chain is reported the
/// same way as a rejected broadcast.
pub async fn broadcast(
    chain: &dyn ChainClient,
    observer: &dyn JobObserver,
    arg: &CallArg,
) -> Result<TxExecution> {
    let payload = chain
        .build_call_tx(arg)
        .map_err(|e| JobError::InvalidJob(e.to_string()))?;

    observer.debug(
        Stage::Transaction,
        "Broadcasting transaction",
        &[
            ("account", arg.input.clone()),
            (
                "to",
                arg.address.clone().unwrap_or_else(|| "<create>".to_string()),
            ),
            ("bytes", arg.data.len().to_string()),
        ],
    );

    let execution = chain
        .sign_and_broadcast(payload)
        .await
        .map_err(|e| classify::broadcast_failure(chain, observer, &arg.input, e))?;

    if let Some(exception) = &execution.exception {
        return Err(classify::execution_exception(chain, observer, &arg.input, exception));
    }
    Ok(execution)
}

/// The address a deploy receipt reports.
///
/// A receipt that did not create a contract, or claims to have created one
/// at the zero address, is inconsistent with a create transaction.
pub fn check_deploy_receipt(receipt: &Receipt) -> Result<Address> {
    if !receipt.creates_contract {
        return Err(JobError::BrokenInvariant(format!(
            "create transaction {} did not create a contract",
            tx_hash_hex(receipt)
        )));
    }
    if receipt.contract_address == Address::ZERO {
        return Err(JobError::BrokenInvariant(format!(
            "create transaction {} reports contract address zero",
            tx_hash_hex(receipt)
        )));
    }
    Ok(receipt.contract_address)
}

/// Transaction hash as upper-case hex without prefix.
pub fn tx_hash_hex(receipt: &Receipt) -> String {
    hex::encode_upper(receipt.tx_hash)
}
