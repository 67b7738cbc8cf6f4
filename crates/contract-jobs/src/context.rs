//! Job execution context: configuration plus the collaborators a job needs.

use std::path::Path;
use std::sync::Arc;

use contract_gateway::{ChainClient, CompilerService};

use crate::config::ContextConfig;
use crate::obs::{JobObserver, TracingObserver};

/// Everything a job consumes but does not own.
#[derive(Clone)]
pub struct JobContext {
    pub config: ContextConfig,
    chain: Arc<dyn ChainClient>,
    compiler: Arc<dyn CompilerService>,
    observer: Arc<dyn JobObserver>,
}

impl JobContext {
    /// Create a context reporting through `tracing`.
    pub fn new(
        config: ContextConfig,
        chain: Arc<dyn ChainClient>,
        compiler: Arc<dyn CompilerService>,
    ) -> Self {
        Self {
            config,
            chain,
            compiler,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replace the observer.
    pub fn with_observer(mut self, observer: Arc<dyn JobObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn chain(&self) -> &dyn ChainClient {
        self.chain.as_ref()
    }

    pub fn compiler(&self) -> &dyn CompilerService {
        self.compiler.as_ref()
    }

    pub fn observer(&self) -> &dyn JobObserver {
        self.observer.as_ref()
    }

    pub fn abi_path(&self) -> &Path {
        &self.config.abi_path
    }

    pub fn bin_path(&self) -> &Path {
        &self.config.bin_path
    }
}

impl std::fmt::Debug for JobContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
