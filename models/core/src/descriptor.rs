use serde::Serialize;

/// Static metadata describing one supported model.
///
/// Descriptors are defined at build time and never mutated; variant
/// catalogs are `&'static` slices of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelDescriptor {
    /// Model identifier, unique within its family
    pub name: &'static str,
    /// Width of the embeddings this model produces
    pub dimension: usize,
    /// Approximate weight footprint
    pub size_mb: usize,
    /// Where the weights are published
    pub source: &'static str,
    pub description: &'static str,
}
