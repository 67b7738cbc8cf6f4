//! Chain client contract.
//!
//! The job engine never signs or broadcasts anything itself. It hands a
//! [`CallArg`] to a [`ChainClient`], which turns it into a [`TxPayload`],
//! signs it, broadcasts it and blocks until a [`TxExecution`] is available.

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, GatewayResult};

/// Loosely typed transaction request, as produced by job preprocessing.
///
/// Numeric fields are still strings here: they come straight out of
/// variable substitution and are only parsed when a payload is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallArg {
    /// Signing account (address or key name understood by the client)
    pub input: String,
    /// Call target. `None` creates a contract from `data`.
    pub address: Option<String>,
    pub amount: String,
    pub fee: String,
    pub gas: String,
    /// Empty means "let the client pick the next sequence".
    pub sequence: String,
    /// Creation code or call data
    pub data: Bytes,
}

/// Transaction payload ready for signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxPayload {
    pub input: String,
    pub address: Option<Address>,
    pub amount: u64,
    pub fee: u64,
    pub gas: u64,
    pub sequence: Option<u64>,
    pub data: Bytes,
}

impl TxPayload {
    /// Parse a [`CallArg`] into a payload.
    ///
    /// Shared by client implementations that do not need anything beyond
    /// field parsing to build their envelope.
    pub fn from_call_arg(arg: &CallArg) -> GatewayResult<Self> {
        let address = match arg.address.as_deref() {
            None => None,
            Some(raw) => Some(raw.trim().parse::<Address>().map_err(|_| {
                GatewayError::InvalidField {
                    field: "address".to_string(),
                    value: raw.to_string(),
                }
            })?),
        };
        let sequence = if arg.sequence.trim().is_empty() {
            None
        } else {
            Some(parse_u64("sequence", &arg.sequence)?)
        };

        Ok(Self {
            input: arg.input.clone(),
            address,
            amount: parse_u64("amount", &arg.amount)?,
            fee: parse_u64("fee", &arg.fee)?,
            gas: parse_u64("gas", &arg.gas)?,
            sequence,
            data: arg.data.clone(),
        })
    }

    /// Whether this payload creates a contract.
    pub fn is_create(&self) -> bool {
        self.address.is_none()
    }
}

fn parse_u64(field: &str, value: &str) -> GatewayResult<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| GatewayError::InvalidField {
            field: field.to_string(),
            value: value.to_string(),
        })
}

/// Receipt fields the job engine reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: B256,
    pub creates_contract: bool,
    pub contract_address: Address,
}

/// Execution result of a call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecResult {
    /// Raw return bytes. Empty when the callee returned nothing.
    pub return_data: Bytes,
}

/// Everything a signed-and-broadcast transaction produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxExecution {
    pub receipt: Receipt,
    pub result: ExecResult,
    /// Set when the transaction was included but execution failed.
    pub exception: Option<String>,
}

/// External chain client.
///
/// Guarantees:
/// - `sign_and_broadcast` is a single round trip: it either returns the
///   execution of the submitted payload or fails, with no partial result.
/// - Retries, timeouts and cancellation are the client's business.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Build a transaction payload from a request.
    fn build_call_tx(&self, arg: &CallArg) -> GatewayResult<TxPayload> {
        TxPayload::from_call_arg(arg)
    }

    /// Sign, broadcast and wait for the execution of a payload.
    async fn sign_and_broadcast(&self, payload: TxPayload) -> GatewayResult<TxExecution>;

    /// Turn a low-level failure into the message shown to the operator.
    fn translate_error(&self, err: &GatewayError, account: &str) -> String {
        format!(
            "There has been an error talking to the chain.\n\n{err}\n\n\
             Things to check:\n  \
             * is the {account} account right?\n  \
             * is that account known to the signing service?\n  \
             * is that account present in the chain genesis?\n  \
             * is the chain producing blocks?\n  \
             * does the account have permission for this operation?"
        )
    }
}
