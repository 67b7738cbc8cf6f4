//! Call jobs.

use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::abi::{decode_return, encode_call, AbiSource, AbiStore};
use crate::classify;
use crate::context::JobContext;
use crate::error::Result;
use crate::job::{return_value, CallJob, ResolvedCallJob, Variable};
use crate::obs::{job_span, Stage};
use crate::preprocess::resolve_call;
use crate::tx;

/// Result of a call job.
#[derive(Debug, Clone, Serialize)]
pub struct CallOutcome {
    /// The job result: decoded return value, or the tx hash for `save = "tx"`
    pub result: String,
    /// Decoded return values, in output order
    pub variables: Vec<Variable>,
    /// Upper-case hex, no prefix
    pub tx_hash: String,
    pub job: ResolvedCallJob,
}

/// Run a call job to completion.
pub async fn run_call_job(job: &CallJob, ctx: &JobContext) -> Result<CallOutcome> {
    let job_id = Uuid::new_v4();
    call(job, ctx).instrument(job_span("call", &job_id)).await
}

async fn call(job: &CallJob, ctx: &JobContext) -> Result<CallOutcome> {
    let obs = ctx.observer();
    let resolved = resolve_call(job, &ctx.config, obs);
    let store = AbiStore::new(ctx.abi_path());
    let source = AbiSource::for_call(&resolved.abi, &resolved.destination);
    let arity = resolved.data.len();

    let data = match encode_call(&store, &source, &resolved.function, &resolved.data) {
        Ok(data) => data,
        Err(_) if resolved.is_fallback() => {
            obs.warn(Stage::Abi, "Calling the fallback function", &[]);
            Vec::new()
        }
        Err(e) => return Err(classify::abi_failure(ctx.chain(), &resolved.source, e)),
    };

    obs.info(
        Stage::Transaction,
        "Calling",
        &[
            ("destination", resolved.destination.clone()),
            ("function", resolved.function.clone()),
            ("data", hex::encode(&data)),
        ],
    );
    let execution = tx::broadcast(ctx.chain(), obs, &tx::call_arg(&resolved, data)).await?;
    let tx_hash = tx::tx_hash_hex(&execution.receipt);

    if resolved.saves_tx() {
        obs.info(Stage::Persist, "Saving tx hash instead of contract return", &[]);
        return Ok(CallOutcome {
            result: tx_hash.clone(),
            variables: Vec::new(),
            tx_hash,
            job: resolved,
        });
    }

    let raw = &execution.result.return_data;
    let variables = if raw.is_empty() {
        obs.debug(Stage::Abi, "No return from contract", &[]);
        Vec::new()
    } else {
        obs.debug(Stage::Abi, "Decoding Raw Result", &[("raw", hex::encode(raw))]);
        decode_return(&store, &source, &resolved.function, arity, raw)
            .map_err(|e| classify::abi_failure(ctx.chain(), &resolved.source, e))?
    };

    let result = return_value(&variables);
    if result.is_empty() {
        obs.debug(Stage::Abi, "No return", &[]);
    } else {
        obs.warn(Stage::Abi, "Return Value", &[("value", result.clone())]);
    }

    Ok(CallOutcome {
        result,
        variables,
        tx_hash,
        job: resolved,
    })
}
