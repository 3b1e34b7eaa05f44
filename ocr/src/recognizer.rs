use crate::OcrResult;
use image::GrayImage;
use std::{cell::RefCell, rc::Rc};

/// Anything that can read one line (or a sparse block) of text from a grayscale crop.
///
/// Backends return the raw recognized string; callers decide what counts as text.
pub trait TextRecognizer {
    fn recognize_line(&mut self, gray: &GrayImage) -> OcrResult<String>;
}

impl<R: TextRecognizer + ?Sized> TextRecognizer for Box<R> {
    fn recognize_line(&mut self, gray: &GrayImage) -> OcrResult<String> {
        (**self).recognize_line(gray)
    }
}

impl<R: TextRecognizer + ?Sized> TextRecognizer for &mut R {
    fn recognize_line(&mut self, gray: &GrayImage) -> OcrResult<String> {
        (**self).recognize_line(gray)
    }
}

/// Lets several scanners share one loaded engine.
impl<R: TextRecognizer + ?Sized> TextRecognizer for Rc<RefCell<R>> {
    fn recognize_line(&mut self, gray: &GrayImage) -> OcrResult<String> {
        self.borrow_mut().recognize_line(gray)
    }
}
