//! Compiler dispatch.
//!
//! Sources go through `compile`, precompiled binaries through `link`.
//! Objects without bytecode (interfaces, abstract contracts) are dropped
//! here so instance selection only ever sees deployable objects.

use std::path::Path;

use contract_gateway::{CompiledObject, CompilerService, Libraries};

use crate::classify;
use crate::error::{CompileErrorKind, JobError, Result};
use crate::obs::{JobObserver, Stage};

/// Deployable output of one compilation.
#[derive(Debug, Clone, Default)]
pub struct CompileOutput {
    pub objects: Vec<CompiledObject>,
    /// Names of objects dropped for having no bytecode
    pub skipped: Vec<String>,
    pub warning: Option<String>,
}

/// Compile a source file.
pub async fn compile(
    compiler: &dyn CompilerService,
    observer: &dyn JobObserver,
    path: &Path,
    libraries: &Libraries,
) -> Result<CompileOutput> {
    let shown = path.display().to_string();
    observer.info(Stage::Compile, "Compiling contract", &[("path", shown.clone())]);

    let response = compiler.compile(path, libraries).await.map_err(|e| {
        observer.error(Stage::Compile, "Compiler service failed", &[("path", shown.clone())]);
        classify::tooling_failure(&shown, e)
    })?;

    let warning = classify::compile_outcome(&shown, &response).map_err(|e| {
        observer.error(Stage::Compile, "Compiler reported an error", &[("path", shown.clone())]);
        e
    })?;
    if let Some(w) = &warning {
        observer.warn(Stage::Compile, "Warning during contract compilation", &[("warning", w.clone())]);
    }

    let (objects, skipped): (Vec<_>, Vec<_>) = response
        .objects
        .into_iter()
        .partition(CompiledObject::is_deployable);
    let skipped: Vec<String> = skipped.into_iter().map(|o| o.name).collect();
    if !skipped.is_empty() {
        observer.debug(
            Stage::Compile,
            "Skipping objects without bytecode",
            &[("objects", skipped.join(","))],
        );
    }

    Ok(CompileOutput {
        objects,
        skipped,
        warning,
    })
}

/// Link a precompiled binary, returning its bytecode hex.
pub async fn link(
    compiler: &dyn CompilerService,
    observer: &dyn JobObserver,
    path: &Path,
    libraries: &Libraries,
) -> Result<String> {
    let shown = path.display().to_string();
    observer.info(
        Stage::Compile,
        "Binary file detected. Using binary deploy sequence",
        &[("path", shown.clone())],
    );

    let response = compiler
        .link_binary(path, libraries)
        .await
        .map_err(|e| classify::tooling_failure(&shown, e))?;

    if !response.error.trim().is_empty() {
        return Err(JobError::Compile {
            kind: CompileErrorKind::Link,
            path: shown,
            message: response.error,
        });
    }
    Ok(response.binary)
}
