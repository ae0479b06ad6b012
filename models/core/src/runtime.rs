use crate::descriptor::ModelDescriptor;
use crate::tensor::{OutputTensors, TensorMap};
use crate::ModelError;
use std::path::Path;

/// Loader for inference sessions. The runtime is an opaque collaborator:
/// it receives named input tensors and returns named output tensors,
/// nothing more is assumed about it.
pub trait Runtime: Send + Sync {
    /// Load one session for `descriptor` from `cache_dir`.
    ///
    /// `intra_threads` bounds the intra-op parallelism of the session;
    /// workers load with a single thread since many of them run side by
    /// side. Failure is fatal for the owning worker.
    fn load(
        &self,
        descriptor: &ModelDescriptor,
        cache_dir: &Path,
        intra_threads: usize,
    ) -> Result<Box<dyn Session>, ModelError>;
}

/// One loaded model instance. Calls are synchronous and blocking; a
/// session is owned by exactly one worker and never shared.
pub trait Session: Send {
    fn run(&mut self, inputs: TensorMap) -> Result<OutputTensors, ModelError>;
}
