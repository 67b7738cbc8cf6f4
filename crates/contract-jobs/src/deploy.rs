//! Deploy jobs.
//!
//! Preprocess, resolve the contract file, compile or link it, select the
//! objects to deploy, then deploy each one and persist its artifacts.

use alloy_primitives::Address;
use contract_gateway::CompiledObject;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::Instrument;
use uuid::Uuid;

use crate::abi::store::parse_abi;
use crate::abi::{encode_constructor, AbiSource, AbiStore};
use crate::artifacts::ArtifactStore;
use crate::compile;
use crate::context::JobContext;
use crate::error::{CompileErrorKind, JobError, Result};
use crate::job::{DeployJob, ResolvedDeployJob};
use crate::obs::{job_span, Stage};
use crate::preprocess::resolve_deploy;
use crate::resolver::{ArtifactKind, ArtifactResolver};
use crate::select::{select_instances, Selection, SelectionRule};
use crate::tx;

/// One object that made it onto the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployedObject {
    pub object_name: String,
    /// Checksummed address
    pub address: String,
    /// SHA-256 hex of the creation code sent, constructor data included
    pub code_digest: String,
}

/// Result of a deploy job.
#[derive(Debug, Clone, Serialize)]
pub struct DeployOutcome {
    /// The job result: the reported contract address
    pub address: String,
    pub deployed: Vec<DeployedObject>,
    /// Non-fatal conditions, such as compiler warnings
    pub warnings: Vec<String>,
    pub job: ResolvedDeployJob,
}

/// Run a deploy job to completion.
pub async fn run_deploy_job(job: &DeployJob, ctx: &JobContext) -> Result<DeployOutcome> {
    let job_id = Uuid::new_v4();
    deploy(job, ctx).instrument(job_span("deploy", &job_id)).await
}

async fn deploy(job: &DeployJob, ctx: &JobContext) -> Result<DeployOutcome> {
    let obs = ctx.observer();
    let resolved = resolve_deploy(job, &ctx.config, obs);
    check_libraries(&resolved)?;

    let artifact = ArtifactResolver::default().resolve(&resolved.contract, ctx.bin_path())?;
    obs.info(
        Stage::Resolve,
        "Contract path",
        &[
            ("path", artifact.path.display().to_string()),
            ("found_by", artifact.found_by.to_string()),
        ],
    );

    let artifacts = ArtifactStore::new(ctx.abi_path(), ctx.bin_path());
    artifacts.ensure_dirs()?;
    let mut warnings = Vec::new();

    let selection = match artifact.kind {
        ArtifactKind::Binary => {
            let bytecode =
                compile::link(ctx.compiler(), obs, &artifact.path, &resolved.libraries).await?;
            binary_selection(ctx, &resolved, bytecode)?
        }
        ArtifactKind::Source => {
            let output =
                compile::compile(ctx.compiler(), obs, &artifact.path, &resolved.libraries).await?;
            warnings.extend(output.warning);
            let selection = select_instances(&output.objects, &resolved.instance, &resolved.contract)?;
            obs.info(
                Stage::Select,
                match selection.rule {
                    SelectionRule::OnlyObject => "Deploying the only contract in file",
                    SelectionRule::All => "Deploying all contracts",
                    SelectionRule::ByName => "Deploying a single contract",
                },
                &[
                    ("instance", resolved.instance.clone()),
                    ("targets", selection.targets.len().to_string()),
                ],
            );
            selection
        }
    };

    let mut deployed = Vec::with_capacity(selection.targets.len());
    for object in &selection.targets {
        deployed.push(deploy_object(ctx, &artifacts, &resolved, object).await?);
    }

    let address = reported_address(&selection, &deployed, &mut warnings);
    Ok(DeployOutcome {
        address,
        deployed,
        warnings,
        job: resolved,
    })
}

fn check_libraries(job: &ResolvedDeployJob) -> Result<()> {
    for (name, address) in &job.libraries {
        if address.trim().parse::<Address>().is_err() {
            return Err(JobError::InvalidJob(format!(
                "library {} has address {:?}, which is not an address",
                name, address
            )));
        }
    }
    Ok(())
}

/// A linked binary is deployed under the contract name. Its ABI, if one
/// was saved earlier under that name, rides along for constructor data and
/// the address-keyed copy. A missing ABI is not an error here.
fn binary_selection(
    ctx: &JobContext,
    job: &ResolvedDeployJob,
    bytecode: String,
) -> Result<Selection> {
    let path = AbiStore::new(ctx.abi_path()).path_for(&AbiSource::ByName(job.contract_name.clone()));
    let abi = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(JobError::fs(path, e)),
    };
    Ok(Selection {
        rule: SelectionRule::OnlyObject,
        targets: vec![CompiledObject::new(job.contract_name.clone(), abi, bytecode)],
        reported: None,
    })
}

async fn deploy_object(
    ctx: &JobContext,
    artifacts: &ArtifactStore,
    job: &ResolvedDeployJob,
    object: &CompiledObject,
) -> Result<DeployedObject> {
    let obs = ctx.observer();
    let has_abi = !object.abi.trim().is_empty();

    if has_abi {
        match artifacts.save_abi_by_name(&object.name, &object.abi)? {
            Some(path) => obs.warn(
                Stage::Persist,
                "Saving ABI",
                &[("path", path.display().to_string())],
            ),
            None => obs.debug(Stage::Persist, "Object name is blank. Not saving ABI", &[]),
        }
    }

    let mut code = hex::decode(object.bytecode.trim().trim_start_matches("0x")).map_err(|e| {
        JobError::Compile {
            kind: CompileErrorKind::Tooling,
            path: object.name.clone(),
            message: format!("bytecode is not valid hex: {}", e),
        }
    })?;

    if let Some(args) = &job.data {
        let source = AbiSource::ByName(object.name.clone());
        let abi = if has_abi {
            parse_abi(&object.abi).map_err(|message| JobError::AbiMismatch {
                abi_source: source.to_string(),
                function: "constructor".to_string(),
                message,
            })
        } else {
            AbiStore::new(ctx.abi_path()).load(&source)
        }
        .map_err(|e| crate::classify::abi_failure(ctx.chain(), &job.source, e))?;
        let encoded = encode_constructor(&abi, &source, args)
            .map_err(|e| crate::classify::abi_failure(ctx.chain(), &job.source, e))?;
        obs.debug(
            Stage::Abi,
            "Appending constructor data",
            &[("bytes", encoded.len().to_string())],
        );
        code.extend(encoded);
    }

    let code_digest = hex::encode(Sha256::digest(&code));
    obs.warn(
        Stage::Transaction,
        "Deploying Contract",
        &[("name", object.name.clone()), ("source", job.source.clone())],
    );

    let execution = tx::broadcast(ctx.chain(), obs, &tx::deploy_arg(job, code.clone())).await?;
    let address = tx::check_deploy_receipt(&execution.receipt)?;

    if has_abi {
        let path = artifacts.save_abi_by_address(&address, &object.abi)?;
        obs.debug(Stage::Persist, "Saving ABI", &[("path", path.display().to_string())]);
    }
    if job.save_binary {
        let path = artifacts.save_binary(&object.name, &hex::encode(&code))?;
        obs.warn(Stage::Persist, "Saving Binary", &[("path", path.display().to_string())]);
    } else {
        obs.debug(Stage::Persist, "Not saving binary", &[]);
    }

    obs.info(
        Stage::Transaction,
        "Contract deployed",
        &[("name", object.name.clone()), ("address", address.to_string())],
    );
    Ok(DeployedObject {
        object_name: object.name.clone(),
        address: address.to_string(),
        code_digest,
    })
}

/// The address a deploy job reports.
///
/// For `all`, this is the object named after the source file. Without one,
/// the last deployed address is used and a warning says so when that
/// choice was not obvious.
fn reported_address(
    selection: &Selection,
    deployed: &[DeployedObject],
    warnings: &mut Vec<String>,
) -> String {
    if let Some(name) = &selection.reported {
        if let Some(object) = deployed.iter().find(|d| &d.object_name == name) {
            return object.address.clone();
        }
    }
    let last = deployed.last().map(|d| d.address.clone()).unwrap_or_default();
    if selection.rule == SelectionRule::All && deployed.len() > 1 {
        warnings.push(format!(
            "no object is named after the source file; reporting the last deployed address {}",
            last
        ));
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deployed(name: &str, address: &str) -> DeployedObject {
        DeployedObject {
            object_name: name.to_string(),
            address: address.to_string(),
            code_digest: String::new(),
        }
    }

    fn selection(rule: SelectionRule, reported: Option<&str>) -> Selection {
        Selection {
            rule,
            targets: vec![],
            reported: reported.map(str::to_string),
        }
    }

    #[test]
    fn test_reported_address_prefers_base_name() {
        let mut warnings = Vec::new();
        let out = reported_address(
            &selection(SelectionRule::All, Some("B")),
            &[deployed("B", "0xb"), deployed("C", "0xc")],
            &mut warnings,
        );
        assert_eq!(out, "0xb");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_reported_address_falls_back_to_last_with_warning() {
        let mut warnings = Vec::new();
        let out = reported_address(
            &selection(SelectionRule::All, None),
            &[deployed("B", "0xb"), deployed("C", "0xc")],
            &mut warnings,
        );
        assert_eq!(out, "0xc");
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_reported_address_single() {
        let mut warnings = Vec::new();
        let out = reported_address(
            &selection(SelectionRule::OnlyObject, None),
            &[deployed("A", "0xa")],
            &mut warnings,
        );
        assert_eq!(out, "0xa");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_bad_library_address_is_invalid_job() {
        let mut job = crate::preprocess::resolve_deploy(
            &DeployJob {
                contract: "A.sol".to_string(),
                ..Default::default()
            },
            &crate::config::ContextConfig::default(),
            &crate::obs::RecordingObserver::new(),
        );
        job.libraries.insert("Lib".to_string(), "$unset".to_string());
        assert!(matches!(check_libraries(&job), Err(JobError::InvalidJob(_))));
    }
}
