//! Tile preprocessing — decode, resize, and scale into a model input tensor.
//!
//! Every failure mode here (unreadable file, corrupt image, unsupported
//! format) is converted into [`PipelineError::Decode`] at this boundary so
//! a single bad tile can never abort the enclosing shard.

use std::path::Path;

use image::imageops::FilterType;
use image::GenericImageView;
use ndarray::Array4;

use crate::error::PipelineError;

/// Decode the image at `path` and normalize it into the CHW tensor the
/// encoder expects: shape `(1, 3, size, size)`, values scaled to `[0, 1]`.
///
/// Resizing is skipped when the source already matches the target
/// dimensions, so pre-tiled inputs avoid a pointless interpolation pass.
pub fn preprocess(path: &Path, size: u32) -> Result<Array4<f32>, PipelineError> {
    let img = image::open(path).map_err(|e| PipelineError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let rgb = if img.width() == size && img.height() == size {
        img.to_rgb8()
    } else {
        img.resize_exact(size, size, FilterType::Triangle).to_rgb8()
    };

    let side = size as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, side, side));
    for (x, y, pixel) in rgb.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        tensor[[0, 0, y, x]] = pixel[0] as f32 / 255.0;
        tensor[[0, 1, y, x]] = pixel[1] as f32 / 255.0;
        tensor[[0, 2, y, x]] = pixel[2] as f32 / 255.0;
    }

    Ok(tensor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn preprocess_missing_file_is_decode_error() {
        let err = preprocess(Path::new("/nonexistent/tile.tif"), 8).unwrap_err();
        assert!(matches!(err, PipelineError::Decode { .. }));
    }

    #[test]
    fn preprocess_scales_to_unit_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("white.png");
        RgbImage::from_pixel(8, 8, Rgb([255, 255, 255]))
            .save(&path)
            .unwrap();

        let tensor = preprocess(&path, 8).unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 8, 8]);
        for &v in tensor.iter() {
            assert!((v - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn preprocess_resizes_mismatched_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.png");
        RgbImage::from_pixel(32, 16, Rgb([128, 0, 0]))
            .save(&path)
            .unwrap();

        let tensor = preprocess(&path, 8).unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 8, 8]);
    }

    #[test]
    fn preprocess_keeps_channel_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("green.png");
        RgbImage::from_pixel(4, 4, Rgb([0, 255, 0])).save(&path).unwrap();

        let tensor = preprocess(&path, 4).unwrap();
        assert_eq!(tensor[[0, 0, 0, 0]], 0.0);
        assert!((tensor[[0, 1, 0, 0]] - 1.0).abs() < 1e-6);
        assert_eq!(tensor[[0, 2, 0, 0]], 0.0);
    }
}
