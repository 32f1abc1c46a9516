//! Distance to similarity conversion

/// Convert a raw Euclidean distance between unit vectors into a similarity in [0, 1]
///
/// For unit vectors `d² = 2 − 2·cos`, so `cos = 1 − d²/2`. Negative cosines
/// are clamped to 0; a distance of 0 scores exactly 1. NaN input scores 0.
pub fn similarity_from_distance(distance: f32) -> f32 {
    let cosine = 1.0 - (distance * distance) / 2.0;
    cosine.max(0.0)
}
