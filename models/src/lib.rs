//! The closed set of model families served by the embedding pipeline.

pub mod base;
pub mod e5;
pub mod jina;
#[cfg(feature = "ort")]
pub mod onnx;

use std::sync::Arc;

use fast_embeddings_model_core::{EmbeddingVariant, ModelDescriptor, ModelError};

pub use base::BaseVariant;
pub use e5::E5Variant;
pub use jina::JinaVariant;
#[cfg(feature = "ort")]
pub use onnx::OrtRuntime;

/// Every registered variant, in catalog order.
pub fn variants() -> Vec<Arc<dyn EmbeddingVariant>> {
    vec![
        Arc::new(BaseVariant),
        Arc::new(E5Variant),
        Arc::new(JinaVariant),
    ]
}

/// All models supported across families.
pub fn list_supported_models() -> Vec<&'static ModelDescriptor> {
    variants()
        .iter()
        .flat_map(|variant| variant.supported_models().iter())
        .collect()
}

/// Resolve a model name to its owning variant and descriptor.
pub fn resolve(
    model_name: &str,
) -> Result<(Arc<dyn EmbeddingVariant>, &'static ModelDescriptor), ModelError> {
    for variant in variants() {
        if let Some(descriptor) = variant
            .supported_models()
            .iter()
            .find(|descriptor| descriptor.name == model_name)
        {
            return Ok((variant, descriptor));
        }
    }
    Err(ModelError::Config(format!(
        "Model {model_name} is not supported"
    )))
}
