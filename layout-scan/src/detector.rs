use crate::annotate::{annotate, save_annotated, save_snapshot};
use crate::config::DetectorConfig;
use crate::defect::{Defect, DefectKind};
use crate::oracle::TextOracle;
use crate::overflow::classify_overflow;
use crate::preprocess::{MaskMode, MaskStages, preprocess_stages};
use crate::regions::{RegionCandidate, extract_regions};
use crate::small_text::classify_small_text;
use anyhow::{Context, Result};
use image::RgbImage;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 单张截图的检测结果。
#[derive(Debug, Clone)]
pub struct Scan {
    pub kind: DefectKind,
    pub defects: Vec<Defect>,
    /// 仅在发现缺陷时生成。
    pub annotated: Option<RgbImage>,
}

impl Scan {
    pub fn found(&self) -> bool {
        !self.defects.is_empty()
    }
}

/// 版面缺陷检测器的公共接口。
pub trait Detector {
    fn kind(&self) -> DefectKind;

    /// 检测已解码的截图，不落盘。
    fn scan(&mut self, image: &RgbImage) -> Scan;

    /// 读取 `image_path`，有缺陷时把标注图写到 `save_path` 并返回该路径。
    fn detect(&mut self, image_path: &Path, save_path: &Path) -> Result<Option<PathBuf>> {
        let image = load_image(image_path)?;
        let scan = self.scan(&image);
        let Some(annotated) = scan.annotated else {
            info!("未发现{}: {}", self.kind(), image_path.display());
            return Ok(None);
        };
        save_annotated(&annotated, save_path)?;
        info!(
            "发现{} {} 处: {} -> {}",
            self.kind(),
            scan.defects.len(),
            image_path.display(),
            save_path.display()
        );
        Ok(Some(save_path.to_path_buf()))
    }
}

/// 读取截图并统一转为 RGB。
pub fn load_image(path: &Path) -> Result<RgbImage> {
    let image = image::open(path).with_context(|| format!("读取图片失败: {}", path.display()))?;
    Ok(image.to_rgb8())
}

/// 内容溢出：文字越过所在容器边界。
pub struct ContentOverflowDetector<O> {
    config: DetectorConfig,
    oracle: O,
}

impl<O: TextOracle> ContentOverflowDetector<O> {
    pub fn new(config: DetectorConfig, oracle: O) -> Self {
        Self { config, oracle }
    }
}

impl<O: TextOracle> Detector for ContentOverflowDetector<O> {
    fn kind(&self) -> DefectKind {
        DefectKind::ContentOverflow
    }

    fn scan(&mut self, image: &RgbImage) -> Scan {
        let kind = self.kind();
        let debug_dir = self.config.debug_dir.as_deref();
        let coarse = preprocess_stages(image, MaskMode::Container, &self.config);
        let fine = preprocess_stages(image, MaskMode::Text, &self.config);
        dump_stages(debug_dir, kind, MaskMode::Container, &coarse);
        dump_stages(debug_dir, kind, MaskMode::Text, &fine);

        let mut regions = extract_regions(&coarse.mask);
        let fine_regions = extract_regions(&fine.mask);
        debug!(coarse = regions.len(), fine = fine_regions.len(), "候选区域");
        regions.extend(fine_regions);
        dump_regions(debug_dir, kind, image, &regions);

        let found = classify_overflow(image, &regions, &self.config, &mut self.oracle);
        let style = &self.config.overflow;
        finish_scan(kind, image, found, style.box_color, style.line_thickness)
    }
}

/// 小字：高度低于阈值但仍可识别的文字。
pub struct SmallTextDetector<O> {
    config: DetectorConfig,
    oracle: O,
}

impl<O: TextOracle> SmallTextDetector<O> {
    pub fn new(config: DetectorConfig, oracle: O) -> Self {
        Self { config, oracle }
    }
}

impl<O: TextOracle> Detector for SmallTextDetector<O> {
    fn kind(&self) -> DefectKind {
        DefectKind::SmallText
    }

    fn scan(&mut self, image: &RgbImage) -> Scan {
        let kind = self.kind();
        let stages = preprocess_stages(image, MaskMode::SmallText, &self.config);
        dump_stages(self.config.debug_dir.as_deref(), kind, MaskMode::SmallText, &stages);

        let regions = extract_regions(&stages.mask);
        debug!(regions = regions.len(), "候选区域");
        dump_regions(self.config.debug_dir.as_deref(), kind, image, &regions);

        let found = classify_small_text(image, &regions, &self.config, &mut self.oracle);
        let style = &self.config.small_text;
        finish_scan(kind, image, found, style.box_color, style.line_thickness)
    }
}

/// 汇总缺陷；有缺陷时按 [`Defect::boxes`] 在原图副本上画框。
fn finish_scan<D: Into<Defect>>(
    kind: DefectKind,
    image: &RgbImage,
    found: Vec<D>,
    color: [u8; 3],
    thickness: u32,
) -> Scan {
    let defects: Vec<Defect> = found.into_iter().map(Into::into).collect();
    let annotated = (!defects.is_empty())
        .then(|| annotate(image, defects.iter().flat_map(Defect::boxes), color, thickness));
    Scan {
        kind,
        defects,
        annotated,
    }
}

fn dump_stages(dir: Option<&Path>, kind: DefectKind, mode: MaskMode, stages: &MaskStages) {
    if dir.is_none() {
        return;
    }
    let mode = mode.as_str();
    save_snapshot(dir, kind, &format!("{mode}_gray"), stages.gray.clone());
    save_snapshot(dir, kind, &format!("{mode}_threshold"), stages.threshold.clone());
    save_snapshot(dir, kind, &format!("{mode}_mask"), stages.mask.clone());
}

/// 全部候选区域的外接矩形（绿色细线），用于核对过滤前的轮廓。
fn dump_regions(
    dir: Option<&Path>,
    kind: DefectKind,
    image: &RgbImage,
    regions: &[RegionCandidate],
) {
    if dir.is_none() {
        return;
    }
    let overlay = annotate(image, regions.iter().map(|r| r.bbox), [0, 200, 0], 1);
    save_snapshot(dir, kind, "regions", overlay);
}
