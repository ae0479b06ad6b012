use crate::EmbeddingsError;
use fast_embeddings_model_core::tensor::{ATTENTION_MASK, INPUT_IDS, TOKEN_TYPE_IDS};
use fast_embeddings_model_core::{
    Embedding, EmbeddingVariant, ModelDescriptor, ModelError, RawOutput, Runtime, Session,
    TensorMap,
};
use ndarray::Array2;
use std::path::Path;
use std::sync::Arc;
use tokenizers::{Encoding, PaddingParams, Tokenizer, TruncationParams};
use tracing::instrument;

/// Maximum sequence length fed to a session.
const MAX_SEQUENCE_LENGTH: usize = 512;

/// One isolated execution unit owning a single model instance: a
/// tokenizer, a variant and an inference session, none of them shared.
pub struct Worker {
    tokenizer: Tokenizer,
    variant: Arc<dyn EmbeddingVariant>,
    descriptor: &'static ModelDescriptor,
    session: Box<dyn Session>,
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

impl Worker {
    /// Load the model named `model_name` from `cache_dir`.
    ///
    /// The session is restricted to one intra-op thread: many workers run
    /// side by side and per-worker oversubscription degrades throughput.
    /// Any failure here is fatal, a worker never degrades to a no-op.
    pub fn new(
        model_name: &str,
        cache_dir: &Path,
        runtime: &dyn Runtime,
    ) -> Result<Self, EmbeddingsError> {
        let (variant, descriptor) = fast_embeddings_models::resolve(model_name)?;

        let tokenizer_path = cache_dir.join("tokenizer.json");
        let mut tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|err| {
            ModelError::Initialization(format!(
                "could not load tokenizer from {tokenizer_path:?}: {err}"
            ))
        })?;
        tokenizer.with_padding(Some(PaddingParams::default()));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LENGTH,
                ..Default::default()
            }))
            .map_err(|err| {
                ModelError::Initialization(format!("invalid truncation parameters: {err}"))
            })?;

        let session = runtime.load(descriptor, cache_dir, 1)?;
        tracing::info!(
            "Loaded {} ({}d, {} family)",
            descriptor.name,
            descriptor.dimension,
            variant.name()
        );

        Ok(Self {
            tokenizer,
            variant,
            descriptor,
            session,
        })
    }

    pub fn descriptor(&self) -> &'static ModelDescriptor {
        self.descriptor
    }

    /// Embed a batch of texts. Output order matches input order.
    #[instrument(skip_all)]
    pub fn embed(&mut self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingsError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self.tokenizer.encode_batch(texts.to_vec(), true)?;
        let input = encodings_to_tensors(&encodings)?;
        let input = self.variant.sanitize_input(input)?;
        // Keep the mask for pooling; the runtime may or may not echo it back
        let attention_mask = input.require2(ATTENTION_MASK)?.to_owned();

        let tensors = self.session.run(input)?;
        let output = RawOutput::new(tensors, attention_mask);
        let reduced = self.variant.reduce_output(&output)?;

        if reduced.nrows() != texts.len() {
            return Err(ModelError::ShapeMismatch(format!(
                "model {} produced {} embeddings for {} inputs",
                self.descriptor.name,
                reduced.nrows(),
                texts.len()
            ))
            .into());
        }
        let expected = self.variant.embedding_dimension(self.descriptor);
        if reduced.ncols() != expected {
            return Err(ModelError::ShapeMismatch(format!(
                "model {} produced {} wide embeddings, descriptor says {}",
                self.descriptor.name,
                reduced.ncols(),
                expected
            ))
            .into());
        }

        Ok(reduced.rows().into_iter().map(|row| row.to_vec()).collect())
    }
}

fn encodings_to_tensors(encodings: &[Encoding]) -> Result<TensorMap, EmbeddingsError> {
    let batch = encodings.len();
    let seq = encodings
        .iter()
        .map(|encoding| encoding.get_ids().len())
        .max()
        .unwrap_or(0);

    let mut input_ids = Vec::with_capacity(batch * seq);
    let mut attention_mask = Vec::with_capacity(batch * seq);
    let mut token_type_ids = Vec::with_capacity(batch * seq);

    for encoding in encodings {
        if encoding.get_ids().len() != seq {
            return Err(ModelError::ShapeMismatch(
                "tokenizer returned an unpadded batch".to_string(),
            )
            .into());
        }
        input_ids.extend(encoding.get_ids().iter().map(|&v| v as i64));
        attention_mask.extend(encoding.get_attention_mask().iter().map(|&v| v as i64));
        token_type_ids.extend(encoding.get_type_ids().iter().map(|&v| v as i64));
    }

    let mut tensors = TensorMap::new();
    tensors.insert(
        INPUT_IDS,
        Array2::from_shape_vec((batch, seq), input_ids)
            .map_err(shape_err)?
            .into_dyn(),
    );
    tensors.insert(
        ATTENTION_MASK,
        Array2::from_shape_vec((batch, seq), attention_mask)
            .map_err(shape_err)?
            .into_dyn(),
    );
    tensors.insert(
        TOKEN_TYPE_IDS,
        Array2::from_shape_vec((batch, seq), token_type_ids)
            .map_err(shape_err)?
            .into_dyn(),
    );
    Ok(tensors)
}

fn shape_err(err: ndarray::ShapeError) -> EmbeddingsError {
    ModelError::ShapeMismatch(err.to_string()).into()
}
