use crate::descriptor::ModelDescriptor;
use crate::tensor::{RawOutput, TensorMap};
use crate::ModelError;
use ndarray::Array2;

/// One model family plugged into the shared inference pipeline.
///
/// The pipeline itself is family agnostic: it tokenizes, calls
/// [`sanitize_input`], runs the session and calls [`reduce_output`].
/// Families override only the steps where they differ.
///
/// [`sanitize_input`]: EmbeddingVariant::sanitize_input
/// [`reduce_output`]: EmbeddingVariant::reduce_output
pub trait EmbeddingVariant: std::fmt::Debug + Send + Sync {
    /// Family name, used in logs.
    fn name(&self) -> &'static str;

    /// The static catalog for this family. Never empty.
    fn supported_models(&self) -> &'static [ModelDescriptor];

    /// Restrict the tokenizer output to the tensors the runtime expects.
    /// Identity by default. Must be idempotent.
    fn sanitize_input(&self, input: TensorMap) -> Result<TensorMap, ModelError> {
        Ok(input)
    }

    /// Turn one runtime output into `[batch, hidden]` embeddings, one row
    /// per input. By default the runtime is assumed to have reduced
    /// already and the pooled output is passed through.
    fn reduce_output(&self, output: &RawOutput) -> Result<Array2<f32>, ModelError> {
        Ok(output.pooled()?.to_owned())
    }

    /// Width of the embeddings produced for `descriptor`.
    fn embedding_dimension(&self, descriptor: &ModelDescriptor) -> usize {
        descriptor.dimension
    }
}
