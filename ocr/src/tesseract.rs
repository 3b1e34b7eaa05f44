use crate::OcrResult;
use crate::config::TesseractConfig;
use crate::recognizer::TextRecognizer;
use anyhow::anyhow;
use image::{DynamicImage, GrayImage, ImageFormat};
use leptess::{LepTess, Variable};
use std::io::Cursor;
use tracing::debug;

/// Tesseract backend configured for single-block recognition (`--psm 6` by default).
pub struct TesseractEngine {
    tess: LepTess,
}

impl TesseractEngine {
    pub fn new(config: &TesseractConfig) -> OcrResult<Self> {
        let data_path = config
            .data_path
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned());
        let mut tess = LepTess::new(data_path.as_deref(), &config.language).map_err(|e| {
            anyhow!(
                "failed to initialize Tesseract with language '{}': {}",
                config.language,
                e
            )
        })?;
        tess.set_variable(
            Variable::TesseditPagesegMode,
            &config.page_segmentation_mode.to_string(),
        )
        .map_err(|e| anyhow!("failed to set page segmentation mode: {}", e))?;

        Ok(Self { tess })
    }
}

impl TextRecognizer for TesseractEngine {
    fn recognize_line(&mut self, gray: &GrayImage) -> OcrResult<String> {
        // leptess expects encoded image data
        let mut png = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(gray.clone())
            .write_to(&mut png, ImageFormat::Png)
            .map_err(|e| anyhow!("failed to encode crop to PNG: {}", e))?;

        self.tess
            .set_image_from_mem(png.get_ref())
            .map_err(|e| anyhow!("failed to set image from memory: {}", e))?;
        let text = self
            .tess
            .get_utf8_text()
            .map_err(|e| anyhow!("failed to read recognized text: {}", e))?;
        debug!(text = %text.trim(), "tesseract recognition");
        Ok(text)
    }
}
