pub mod ssim;

pub use ssim::SsimOracle;

use crate::error::SimilarityError;

/// Scores the structural similarity of two still images.
///
/// Scores are in `[0, 1]` where `1` means identical. Implementations must be
/// symmetric and return the same score for the same pair of inputs.
pub trait SimilarityOracle {
    type Image;

    fn compute_similarity(&self, a: &Self::Image, b: &Self::Image) -> Result<f64, SimilarityError>;
}

impl<O: SimilarityOracle + ?Sized> SimilarityOracle for &O {
    type Image = O::Image;

    fn compute_similarity(&self, a: &Self::Image, b: &Self::Image) -> Result<f64, SimilarityError> {
        (**self).compute_similarity(a, b)
    }
}
