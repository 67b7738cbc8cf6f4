//! Contract Jobs: deploy and call smart contracts from declarative jobs
//!
//! Re-exports the job records, the two job entry points and the pieces
//! they are built from.

pub mod abi;
pub mod artifacts;
pub mod call;
pub mod classify;
pub mod compile;
pub mod config;
pub mod context;
pub mod deploy;
pub mod error;
pub mod job;
pub mod obs;
pub mod preprocess;
pub mod resolver;
pub mod select;
pub mod telemetry;
pub mod tx;

pub use abi::{AbiSource, AbiStore};
pub use artifacts::ArtifactStore;
pub use call::{run_call_job, CallOutcome};
pub use config::ContextConfig;
pub use context::JobContext;
pub use deploy::{run_deploy_job, DeployOutcome, DeployedObject};
pub use error::{CompileErrorKind, JobError, Result};
pub use job::{
    return_value, CallJob, DeployJob, ResolvedCallJob, ResolvedDeployJob, SubstitutionFailure,
    Variable,
};
pub use obs::{JobObserver, ObsLevel, RecordingObserver, Stage, TracingObserver};
pub use preprocess::{resolve_call, resolve_deploy};
pub use resolver::{ArtifactKind, ArtifactResolver, ResolvedArtifact};
pub use select::{select_instances, Selection, SelectionRule};
pub use telemetry::init_tracing;

pub use contract_gateway;
