use anyhow::Result;
use image::{GrayImage, Rgb, RgbImage};
use layout_scan::{
    BoundingBox, ContentOverflowDetector, Defect, DetectorConfig, Detector, OcrTextOracle,
    SmallTextDetector, TextOracle, TextRules,
};
use ocr::{OcrResult, TextRecognizer};
use std::fs;
use std::path::Path;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const BLUE: Rgb<u8> = Rgb([0, 0, 255]);

/// 蓝色像素多于黑色像素即视为文字：蓝块代表文字，黑色代表容器边框。
struct BlueInk;

impl TextOracle for BlueInk {
    fn contains_text(&mut self, crop: &RgbImage) -> bool {
        let blue = crop.pixels().filter(|p| **p == BLUE).count();
        let black = crop.pixels().filter(|p| **p == BLACK).count();
        blue > black
    }
}

/// 固定返回同一段识别结果的假引擎。
struct FixedReading(&'static str);

impl TextRecognizer for FixedReading {
    fn recognize_line(&mut self, _gray: &GrayImage) -> OcrResult<String> {
        Ok(self.0.to_string())
    }
}

fn fill(image: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    for yy in y..y + h {
        for xx in x..x + w {
            image.put_pixel(xx, yy, color);
        }
    }
}

/// 480x200 白底；黑色“匚”形容器开口朝左，外接矩形 (230, 60, 150, 72)，边框厚 12。
fn container_page() -> RgbImage {
    let mut image = RgbImage::from_pixel(480, 200, WHITE);
    fill(&mut image, 230, 60, 150, 12, BLACK);
    fill(&mut image, 230, 120, 150, 12, BLACK);
    fill(&mut image, 368, 60, 12, 72, BLACK);
    image
}

/// 容器页上加一个 115x24 的蓝色文字块，左上角位于 `text_x, 84`。
fn overflow_page(text_x: u32) -> RgbImage {
    let mut image = container_page();
    fill(&mut image, text_x, 84, 115, 24, BLUE);
    image
}

fn small_glyph_page() -> RgbImage {
    let mut image = RgbImage::from_pixel(1000, 1000, WHITE);
    fill(&mut image, 500, 500, 2, 3, BLACK);
    image
}

fn save(image: &RgbImage, path: &Path) -> Result<()> {
    image.save(path)?;
    Ok(())
}

#[test]
fn text_spilling_out_of_its_container_is_flagged() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("overflow.png");
    let output = dir.path().join("out/overflow_content-overflow.png");
    save(&overflow_page(190), &input)?;

    let mut detector = ContentOverflowDetector::new(DetectorConfig::default(), BlueInk);
    let saved = detector.detect(&input, &output)?;
    assert_eq!(saved.as_deref(), Some(output.as_path()));

    let annotated = image::open(&output)?.to_rgb8();
    assert_eq!(annotated.get_pixel(230, 60), &Rgb([255, 0, 0]));
    assert_eq!(annotated.get_pixel(190, 84), &Rgb([255, 0, 0]));
    // 框外像素保持原样
    assert_eq!(annotated.get_pixel(10, 10), &WHITE);
    Ok(())
}

#[test]
fn overflow_scan_reports_container_and_content() {
    let mut detector = ContentOverflowDetector::new(DetectorConfig::default(), BlueInk);
    let scan = detector.scan(&overflow_page(190));
    assert_eq!(scan.defects.len(), 1);
    let Defect::ContentOverflow(defect) = scan.defects[0] else {
        panic!("unexpected defect {:?}", scan.defects[0]);
    };
    assert_eq!(defect.container, BoundingBox::new(230, 60, 150, 72));
    assert_eq!(defect.content, BoundingBox::new(190, 84, 115, 24));
    assert!(defect.overlap_ratio > 0.1 && defect.overlap_ratio < 0.2);
}

#[test]
fn single_line_text_seen_by_both_masks_is_reported_once() {
    // 12 像素高的单行文字：粗、细两张掩码都会提取出同一个外接矩形
    let mut page = container_page();
    fill(&mut page, 240, 90, 110, 12, BLUE);

    let mut detector = ContentOverflowDetector::new(DetectorConfig::default(), BlueInk);
    let scan = detector.scan(&page);
    assert_eq!(scan.defects.len(), 1, "{:?}", scan.defects);
    let Defect::ContentOverflow(defect) = scan.defects[0] else {
        panic!("unexpected defect {:?}", scan.defects[0]);
    };
    assert_eq!(defect.container, BoundingBox::new(230, 60, 150, 72));
    assert_eq!(defect.content, BoundingBox::new(240, 90, 110, 12));
    assert!((defect.overlap_ratio - 1320.0 / 10800.0).abs() < 1e-6);
}

#[test]
fn text_beyond_the_proximity_margin_is_not_overflow() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("apart.png");
    let output = dir.path().join("apart_content-overflow.png");
    save(&overflow_page(65), &input)?;

    let mut detector = ContentOverflowDetector::new(DetectorConfig::default(), BlueInk);
    assert!(detector.detect(&input, &output)?.is_none());
    assert!(!output.exists());
    Ok(())
}

#[test]
fn blank_page_has_no_defects() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("blank.png");
    save(&RgbImage::from_pixel(640, 480, WHITE), &input)?;

    let mut overflow = ContentOverflowDetector::new(DetectorConfig::default(), BlueInk);
    assert!(overflow.detect(&input, &dir.path().join("a.png"))?.is_none());

    let oracle = OcrTextOracle::new(FixedReading("A"), TextRules::word_characters());
    let mut small = SmallTextDetector::new(DetectorConfig::default(), oracle);
    assert!(small.detect(&input, &dir.path().join("b.png"))?.is_none());
    Ok(())
}

#[test]
fn tiny_legible_glyph_is_flagged() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("tiny.png");
    let output = dir.path().join("tiny_small-text.png");
    save(&small_glyph_page(), &input)?;

    let config = DetectorConfig::default();
    let rules = TextRules::legible_glyphs(config.small_text.excluded_glyphs.clone());
    let mut detector = SmallTextDetector::new(config, OcrTextOracle::new(FixedReading("A"), rules));
    assert_eq!(detector.detect(&input, &output)?, Some(output.clone()));

    let annotated = image::open(&output)?.to_rgb8();
    assert_eq!(annotated.get_pixel(500, 500), &Rgb([245, 15, 15]));
    assert_eq!(annotated.get_pixel(400, 400), &WHITE);
    Ok(())
}

#[test]
fn punctuation_sized_blob_is_not_text() {
    let config = DetectorConfig::default();
    let rules = TextRules::legible_glyphs(config.small_text.excluded_glyphs.clone());
    let mut detector = SmallTextDetector::new(config, OcrTextOracle::new(FixedReading("."), rules));
    let scan = detector.scan(&small_glyph_page());
    assert!(!scan.found());
    assert!(scan.annotated.is_none());
}

#[test]
fn repeated_runs_are_identical() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("page.png");
    save(&overflow_page(190), &input)?;

    let mut detector = ContentOverflowDetector::new(DetectorConfig::default(), BlueInk);
    let first = dir.path().join("first.png");
    let second = dir.path().join("second.png");
    assert!(detector.detect(&input, &first)?.is_some());
    assert!(detector.detect(&input, &second)?.is_some());
    assert_eq!(fs::read(&first)?, fs::read(&second)?);

    let page = overflow_page(190);
    assert_eq!(detector.scan(&page).defects, detector.scan(&page).defects);
    Ok(())
}
