//! Observability tests for job execution.
//!
//! The default observer forwards stage reports to `tracing`; these tests
//! check that the reports operators rely on actually reach the log.

use std::sync::Arc;

use contract_gateway::fakes::{MemoryChain, ScriptedCompiler};
use contract_gateway::CompiledObject;
use contract_jobs::obs::job_span;
use contract_jobs::{
    run_call_job, run_deploy_job, CallJob, ContextConfig, DeployJob, JobContext, JobObserver,
    Stage, TracingObserver,
};
use tracing_test::traced_test;
use uuid::Uuid;

fn context(dir: &std::path::Path, compiler: ScriptedCompiler) -> JobContext {
    let config = ContextConfig::default()
        .with_account("alice")
        .with_paths(dir.join("abi"), dir.join("bin"));
    JobContext::new(config, Arc::new(MemoryChain::new()), Arc::new(compiler))
}

/// Test: TracingObserver emits the message and rendered fields
#[traced_test]
#[test]
fn test_tracing_observer_renders_fields() {
    TracingObserver.warn(
        Stage::Persist,
        "Saving ABI",
        &[("path", "abi/Token".to_string())],
    );

    assert!(logs_contain("Saving ABI"));
    assert!(logs_contain("path=abi/Token"));
}

/// Test: job_span can be entered without a subscriber-specific setup
#[traced_test]
#[test]
fn test_job_span_enter() {
    let span = job_span("deploy", &Uuid::new_v4());
    let _guard = span.enter();
    tracing::info!("inside job span");

    assert!(logs_contain("inside job span"));
}

/// Test: a deploy job logs compilation, the deploy and the ABI saves
#[tokio::test]
#[traced_test]
async fn test_deploy_job_logs_progress() {
    let dir = tempfile::tempdir().unwrap();
    let contract = dir.path().join("Token.sol");
    std::fs::write(&contract, "").unwrap();
    let ctx = context(
        dir.path(),
        ScriptedCompiler::new()
            .with_objects(vec![CompiledObject::new("Token", "[]", "60fe")])
            .with_warning("unused variable"),
    );

    run_deploy_job(
        &DeployJob {
            contract: contract.display().to_string(),
            ..Default::default()
        },
        &ctx,
    )
    .await
    .unwrap();

    assert!(logs_contain("Compiling contract"));
    assert!(logs_contain("Warning during contract compilation"));
    assert!(logs_contain("Deploying Contract"));
    assert!(logs_contain("Saving ABI"));
    assert!(logs_contain("contract_jobs.job"));
}

/// Test: an unresolved placeholder is reported, not fatal to logging
#[tokio::test]
#[traced_test]
async fn test_failed_substitution_is_logged() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path(), ScriptedCompiler::new());

    let outcome = run_call_job(
        &CallJob {
            destination: "0x00000000000000000000000000000000000000aa".to_string(),
            function: "()".to_string(),
            amount: "$nothing".to_string(),
            ..Default::default()
        },
        &ctx,
    )
    .await;

    assert!(outcome.is_err());
    assert!(logs_contain("Could not resolve placeholder"));
    assert!(logs_contain("placeholder=nothing"));
}
