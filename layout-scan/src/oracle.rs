use image::RgbImage;
use image_proc::to_gray;
use ocr::TextRecognizer;
use tracing::{debug, warn};

/// 判断一块裁剪图里是否有可读文字。
///
/// 检测器只依赖这个问题的答案；OCR 失败由实现自行吞掉并返回 `false`。
pub trait TextOracle {
    fn contains_text(&mut self, crop: &RgbImage) -> bool;
}

impl<T: TextOracle + ?Sized> TextOracle for Box<T> {
    fn contains_text(&mut self, crop: &RgbImage) -> bool {
        (**self).contains_text(crop)
    }
}

impl<T: TextOracle + ?Sized> TextOracle for &mut T {
    fn contains_text(&mut self, crop: &RgbImage) -> bool {
        (**self).contains_text(crop)
    }
}

/// 识别结果何时算“有文字”。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextRules {
    excluded_glyphs: Vec<char>,
}

impl TextRules {
    /// 含任一单词字符（字母、数字、下划线）即为文字。
    pub fn word_characters() -> Self {
        Self::default()
    }

    /// 在单词字符的基础上，出现任一排除字符即判为噪点。
    pub fn legible_glyphs(excluded: impl IntoIterator<Item = char>) -> Self {
        Self {
            excluded_glyphs: excluded.into_iter().collect(),
        }
    }

    pub fn accepts(&self, recognized: &str) -> bool {
        if recognized.chars().any(|c| self.excluded_glyphs.contains(&c)) {
            return false;
        }
        recognized.chars().any(is_word_char)
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// 基于 OCR 引擎的 [`TextOracle`]。
pub struct OcrTextOracle<R> {
    recognizer: R,
    rules: TextRules,
}

impl<R: TextRecognizer> OcrTextOracle<R> {
    pub fn new(recognizer: R, rules: TextRules) -> Self {
        Self { recognizer, rules }
    }
}

impl<R: TextRecognizer> TextOracle for OcrTextOracle<R> {
    fn contains_text(&mut self, crop: &RgbImage) -> bool {
        if crop.width() == 0 || crop.height() == 0 {
            return false;
        }
        match self.recognizer.recognize_line(&to_gray(crop)) {
            Ok(text) => {
                let accepted = self.rules.accepts(&text);
                debug!(text = %text.trim(), accepted, "OCR 结果");
                accepted
            }
            Err(err) => {
                warn!("OCR 识别失败，按无文字处理: {err:#}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};
    use image::GrayImage;

    struct Scripted {
        reply: Option<&'static str>,
        calls: usize,
    }

    impl TextRecognizer for Scripted {
        fn recognize_line(&mut self, _gray: &GrayImage) -> Result<String> {
            self.calls += 1;
            self.reply
                .map(str::to_string)
                .ok_or_else(|| anyhow!("engine down"))
        }
    }

    fn oracle(reply: Option<&'static str>, rules: TextRules) -> OcrTextOracle<Scripted> {
        OcrTextOracle::new(Scripted { reply, calls: 0 }, rules)
    }

    #[test]
    fn word_characters_accept_letters_and_digits() {
        let rules = TextRules::word_characters();
        assert!(rules.accepts("Sign in"));
        assert!(rules.accepts("42"));
        assert!(rules.accepts("_"));
        assert!(rules.accepts("登录"));
        assert!(!rules.accepts(""));
        assert!(!rules.accepts(" -- !"));
    }

    #[test]
    fn excluded_glyphs_veto_the_whole_string() {
        let rules = TextRules::legible_glyphs([',', '.', '\'', 'o', '•', '·', '⋅']);
        assert!(rules.accepts("Terms"));
        assert!(!rules.accepts("Terms."));
        assert!(!rules.accepts("Hello"));
        assert!(!rules.accepts("•"));
    }

    #[test]
    fn ocr_errors_count_as_no_text() {
        let mut o = oracle(None, TextRules::word_characters());
        assert!(!o.contains_text(&RgbImage::new(10, 4)));
        assert_eq!(o.recognizer.calls, 1);
    }

    #[test]
    fn empty_crop_skips_the_engine() {
        let mut o = oracle(Some("A"), TextRules::word_characters());
        assert!(!o.contains_text(&RgbImage::new(0, 4)));
        assert_eq!(o.recognizer.calls, 0);
        assert!(o.contains_text(&RgbImage::new(3, 4)));
        assert_eq!(o.recognizer.calls, 1);
    }
}
