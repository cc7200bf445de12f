//! Image decoding and normalization into model input tensors

use crate::config::ModelSettings;
use crate::error::{PipelineError, Result};
use image::imageops::FilterType;
use image::{ColorType, DynamicImage};
use ndarray::Array4;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// A `[1, 3, H, W]` f32 tensor matching the model's input signature
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor(Array4<f32>);

impl ImageTensor {
    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }

    pub fn array(&self) -> &Array4<f32> {
        &self.0
    }
}

/// Facts about the source image, captured at decode time and never mutated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub resolution: String,
    pub format: String,
    pub size_bytes: usize,
    pub color_mode: String,
}

/// Decodes uploads into normalized tensors. The resize target and the
/// per-channel mean/std come from configuration and must match the model's
/// training-time preprocessing.
#[derive(Debug, Clone)]
pub struct Normalizer {
    width: u32,
    height: u32,
    mean: [f32; 3],
    std: [f32; 3],
}

impl Normalizer {
    pub fn new(settings: &ModelSettings) -> Self {
        Normalizer {
            width: settings.input_width,
            height: settings.input_height,
            mean: settings.mean,
            std: settings.std,
        }
    }

    /// Decode `raw` and produce the model input tensor plus source metadata.
    /// Palette, grayscale and alpha-bearing images are converted to RGB; the
    /// spatial size is reached by resizing, never cropping.
    pub fn normalize(&self, raw: &[u8], filename: &str) -> Result<(ImageTensor, ImageMetadata)> {
        let reader = image::io::Reader::new(Cursor::new(raw))
            .with_guessed_format()
            .map_err(|e| PipelineError::Decode(e.to_string()))?;
        let format = reader.format();
        let img = reader
            .decode()
            .map_err(|e| PipelineError::Decode(e.to_string()))?;

        let metadata = ImageMetadata {
            width: img.width(),
            height: img.height(),
            resolution: format!("{}×{}", img.width(), img.height()),
            format: format
                .and_then(|f| f.extensions_str().first().copied())
                .map(|ext| ext.to_ascii_uppercase())
                .or_else(|| extension_of(filename))
                .unwrap_or_else(|| "UNKNOWN".to_string()),
            size_bytes: raw.len(),
            color_mode: color_mode(&img),
        };

        // Bilinear, matching torchvision's default Resize interpolation
        let resized = img
            .resize_exact(self.width, self.height, FilterType::Triangle)
            .to_rgb8();

        let (mean, std) = (self.mean, self.std);
        let tensor = Array4::from_shape_fn(
            (1, 3, self.height as usize, self.width as usize),
            |(_, c, y, x)| {
                let value = resized.get_pixel(x as u32, y as u32)[c] as f32 / 255.0;
                (value - mean[c]) / std[c]
            },
        );

        Ok((ImageTensor(tensor), metadata))
    }
}

fn extension_of(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_uppercase())
    }
}

fn color_mode(img: &DynamicImage) -> String {
    match img.color() {
        ColorType::L8 | ColorType::L16 => "L",
        ColorType::La8 | ColorType::La16 => "LA",
        ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => "RGB",
        ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => "RGBA",
        _ => "OTHER",
    }
    .to_string()
}
