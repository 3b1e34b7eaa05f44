//! OCR boundary for the layout scanners.
//!
//! The scanners only need one question answered: "what text is in this crop?".
//! [`TextRecognizer`] is that seam. Concrete engines are opt-in so the rest of
//! the workspace builds without native OCR libraries:
//!
//! - `paddle`: PaddleOCR recognition via `rust-paddle-ocr` ([`OcrEngine`]).
//! - `tesseract`: Tesseract via `leptess` ([`TesseractEngine`]).

mod config;
#[cfg(feature = "paddle")]
mod engine;
mod recognizer;
#[cfg(feature = "tesseract")]
mod tesseract;

pub use config::{ModelConfig, OcrOptions, TesseractConfig};
#[cfg(feature = "paddle")]
pub use engine::OcrEngine;
pub use recognizer::TextRecognizer;
#[cfg(feature = "tesseract")]
pub use tesseract::TesseractEngine;

/// Crate-wide result type.
pub type OcrResult<T> = anyhow::Result<T>;
