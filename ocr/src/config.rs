use std::path::{Path, PathBuf};

/// Model paths for the PaddleOCR recognition stage.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    recognition_model: PathBuf,
    keys_path: PathBuf,
}

impl ModelConfig {
    /// Create a new model configuration.
    pub fn new(recognition_model: impl AsRef<Path>, keys_path: impl AsRef<Path>) -> Self {
        Self {
            recognition_model: recognition_model.as_ref().to_path_buf(),
            keys_path: keys_path.as_ref().to_path_buf(),
        }
    }

    /// Path to the recognition model (`PP-OCRv5_mobile_rec.mnn` or similar).
    pub fn recognition_model(&self) -> &Path {
        &self.recognition_model
    }

    /// Path to the keys/charset file (`ppocr_keys_v5.txt` or language specific).
    pub fn keys_path(&self) -> &Path {
        &self.keys_path
    }
}

/// Tunable parameters for the PaddleOCR recognizer.
#[derive(Debug, Clone, Copy)]
pub struct OcrOptions {
    /// Minimum confidence for recognition.
    pub min_score: f32,
    /// Minimum confidence for punctuation recognition.
    pub punct_min_score: f32,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            min_score: 0.6,
            punct_min_score: 0.1,
        }
    }
}

/// Settings for the Tesseract backend.
#[derive(Debug, Clone)]
pub struct TesseractConfig {
    /// Tesseract language codes (e.g. `eng`, `eng+fra`).
    pub language: String,
    /// Page segmentation mode; 6 treats the crop as one uniform block of text.
    pub page_segmentation_mode: u32,
    /// Optional tessdata directory; `None` uses the system default.
    pub data_path: Option<PathBuf>,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            page_segmentation_mode: 6,
            data_path: None,
        }
    }
}
