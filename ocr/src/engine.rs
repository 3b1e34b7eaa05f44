use crate::OcrResult;
use crate::config::{ModelConfig, OcrOptions};
use crate::recognizer::TextRecognizer;
use anyhow::Context;
use image::{DynamicImage, GrayImage};
use rust_paddle_ocr::Rec;
use tracing::debug;

/// OCR engine wrapping the `rust-paddle-ocr` recognition model.
///
/// Crops handed to the layout scanners are already isolated regions, so the
/// detection stage is skipped and the recognizer runs on the crop directly.
/// The model is loaded once and reused across calls.
pub struct OcrEngine {
    rec: Rec,
}

impl OcrEngine {
    /// Build an engine with default options.
    pub fn new(config: ModelConfig) -> OcrResult<Self> {
        Self::with_options(config, OcrOptions::default())
    }

    /// Build an engine with custom options.
    pub fn with_options(config: ModelConfig, options: OcrOptions) -> OcrResult<Self> {
        let rec = Rec::from_file(config.recognition_model(), config.keys_path())
            .context("failed to load recognition model")?
            .with_min_score(options.min_score)
            .with_punct_min_score(options.punct_min_score);

        Ok(Self { rec })
    }

    /// Run recognition on an already loaded image.
    pub fn recognize_image(&mut self, image: &DynamicImage) -> OcrResult<String> {
        let text = self
            .rec
            .predict_str(image)
            .context("text recognition failed")?;
        debug!(text = %text, "paddle recognition");
        Ok(text)
    }
}

impl TextRecognizer for OcrEngine {
    fn recognize_line(&mut self, gray: &GrayImage) -> OcrResult<String> {
        let image = DynamicImage::ImageRgb8(DynamicImage::ImageLuma8(gray.clone()).to_rgb8());
        self.recognize_image(&image)
    }
}
