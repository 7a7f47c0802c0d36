use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage};

use super::SimilarityOracle;
use crate::error::SimilarityError;

const WINDOW_SIZE: usize = 11;
const WINDOW_SIGMA: f64 = 1.5;
const K1: f64 = 0.01;
const K2: f64 = 0.03;
const DYNAMIC_RANGE: f64 = 255.0;

/// Grayscale SSIM between image files.
///
/// The first argument is memoised: the detector compares one reference
/// against every frame, so only the most recent reference is kept decoded.
pub struct SsimOracle {
    max_width: Option<u32>,
    reference: Mutex<Option<(PathBuf, Arc<GrayImage>)>>,
}

impl SsimOracle {
    pub fn new() -> Self {
        Self {
            max_width: None,
            reference: Mutex::new(None),
        }
    }

    pub fn with_max_width(mut self, max_width: Option<u32>) -> Self {
        self.max_width = max_width.map(|w| w.max(1));
        self
    }

    fn load(&self, path: &Path) -> Result<GrayImage, SimilarityError> {
        let image = image::open(path).map_err(|source| SimilarityError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        if image.width() == 0 || image.height() == 0 {
            return Err(SimilarityError::EmptyImage(path.to_path_buf()));
        }
        Ok(self.downscale(image).to_luma8())
    }

    fn downscale(&self, image: DynamicImage) -> DynamicImage {
        match self.max_width {
            Some(max_width) if image.width() > max_width => {
                let height = (u64::from(image.height()) * u64::from(max_width)
                    / u64::from(image.width()))
                .max(1) as u32;
                image.resize_exact(max_width, height, FilterType::Triangle)
            }
            _ => image,
        }
    }

    fn reference(&self, path: &Path) -> Result<Arc<GrayImage>, SimilarityError> {
        let mut cached = self
            .reference
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some((cached_path, image)) = cached.as_ref() {
            if cached_path == path {
                return Ok(image.clone());
            }
        }

        let image = Arc::new(self.load(path)?);
        *cached = Some((path.to_path_buf(), image.clone()));
        Ok(image)
    }
}

impl Default for SsimOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl SimilarityOracle for SsimOracle {
    type Image = PathBuf;

    fn compute_similarity(&self, a: &PathBuf, b: &PathBuf) -> Result<f64, SimilarityError> {
        let reference = self.reference(a)?;
        let target = self.load(b)?;
        Ok(structural_similarity(&reference, &target))
    }
}

/// Mean SSIM over an 11x11 Gaussian window, clamped to `[0, 1]`.
///
/// `b` is resized to the dimensions of `a` when they differ.
pub fn structural_similarity(a: &GrayImage, b: &GrayImage) -> f64 {
    let resized;
    let b = if a.dimensions() != b.dimensions() {
        resized = image::imageops::resize(b, a.width(), a.height(), FilterType::Triangle);
        &resized
    } else {
        b
    };

    let width = a.width() as usize;
    let height = a.height() as usize;
    if width == 0 || height == 0 {
        return 0.0;
    }

    let kernel = gaussian_kernel();
    let pa: Vec<f64> = a.as_raw().iter().map(|&v| f64::from(v)).collect();
    let pb: Vec<f64> = b.as_raw().iter().map(|&v| f64::from(v)).collect();
    let product = |x: &[f64], y: &[f64]| -> Vec<f64> { x.iter().zip(y).map(|(p, q)| p * q).collect() };

    let blur = |plane: &[f64]| convolve_separable(plane, width, height, &kernel);
    let mu_a = blur(&pa);
    let mu_b = blur(&pb);
    let aa = blur(&product(&pa, &pa));
    let bb = blur(&product(&pb, &pb));
    let ab = blur(&product(&pa, &pb));

    let c1 = (K1 * DYNAMIC_RANGE).powi(2);
    let c2 = (K2 * DYNAMIC_RANGE).powi(2);

    let total: f64 = (0..width * height)
        .map(|i| {
            let (ma, mb) = (mu_a[i], mu_b[i]);
            let var_a = aa[i] - ma * ma;
            let var_b = bb[i] - mb * mb;
            let cov = ab[i] - ma * mb;
            ((2.0 * ma * mb + c1) * (2.0 * cov + c2))
                / ((ma * ma + mb * mb + c1) * (var_a + var_b + c2))
        })
        .sum();

    (total / (width * height) as f64).clamp(0.0, 1.0)
}

fn gaussian_kernel() -> [f64; WINDOW_SIZE] {
    let center = (WINDOW_SIZE / 2) as f64;
    let mut kernel = [0.0; WINDOW_SIZE];
    for (i, weight) in kernel.iter_mut().enumerate() {
        let offset = i as f64 - center;
        *weight = (-(offset * offset) / (2.0 * WINDOW_SIGMA * WINDOW_SIGMA)).exp();
    }
    let sum: f64 = kernel.iter().sum();
    kernel.iter_mut().for_each(|w| *w /= sum);
    kernel
}

/// Mirrors out-of-range positions back into `0..len` (`d c b a | a b c d | d c b a`).
fn reflect(position: isize, len: usize) -> usize {
    let len = len as isize;
    let period = 2 * len;
    let folded = position.rem_euclid(period);
    if folded >= len {
        (period - folded - 1) as usize
    } else {
        folded as usize
    }
}

fn convolve_separable(plane: &[f64], width: usize, height: usize, kernel: &[f64]) -> Vec<f64> {
    let radius = (kernel.len() / 2) as isize;

    let mut horizontal = vec![0.0; plane.len()];
    for y in 0..height {
        let row = &plane[y * width..(y + 1) * width];
        for x in 0..width {
            horizontal[y * width + x] = kernel
                .iter()
                .enumerate()
                .map(|(k, w)| w * row[reflect(x as isize + k as isize - radius, width)])
                .sum();
        }
    }

    let mut output = vec![0.0; plane.len()];
    for y in 0..height {
        for x in 0..width {
            output[y * width + x] = kernel
                .iter()
                .enumerate()
                .map(|(k, w)| w * horizontal[reflect(y as isize + k as isize - radius, height) * width + x])
                .sum();
        }
    }
    output
}
