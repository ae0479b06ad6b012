//! Pooling and normalization primitives shared by every model family.

use crate::ModelError;
use ndarray::{Array2, ArrayView2, ArrayView3, Axis};
use std::ops::{Div, Mul};

/// Floor applied to mask sums and vector norms before dividing, so that
/// fully masked rows and zero vectors stay finite instead of producing
/// NaN.
pub const DENOMINATOR_FLOOR: f32 = 1e-9;

/// Average token embeddings `[batch, seq, hidden]` over the sequence
/// axis, counting only tokens the attention mask marks as valid.
///
/// A row whose mask is entirely zero yields a near-zero vector; this is
/// defined behavior, not an error.
pub fn masked_mean_pool(
    token_embeddings: ArrayView3<f32>,
    attention_mask: ArrayView2<i64>,
) -> Result<Array2<f32>, ModelError> {
    let (batch, seq, _) = token_embeddings.dim();
    if attention_mask.dim() != (batch, seq) {
        return Err(ModelError::ShapeMismatch(format!(
            "attention mask is {:?} but token embeddings are {:?}",
            attention_mask.dim(),
            token_embeddings.dim()
        )));
    }

    // Cast and reshape to [batch, seq, 1]
    let mask = attention_mask.mapv(|v| v as f32).insert_axis(Axis(2));

    let summed = token_embeddings.to_owned().mul(&mask).sum_axis(Axis(1));
    let counts = mask
        .sum_axis(Axis(1))
        .mapv(|v| v.max(DENOMINATOR_FLOOR));

    Ok(summed.div(&counts))
}

/// Scale each row to unit Euclidean length. Rows with zero or near-zero
/// norm are left near zero rather than becoming NaN/Inf.
pub fn l2_normalize(mut vectors: Array2<f32>) -> Array2<f32> {
    for mut row in vectors.rows_mut() {
        let norm = row
            .iter()
            .map(|v| {
                let v = *v as f64;
                v * v
            })
            .sum::<f64>()
            .sqrt();
        let scale = (1.0 / norm.max(DENOMINATOR_FLOOR as f64)) as f32;
        row.mapv_inplace(|v| v * scale);
    }
    vectors
}
