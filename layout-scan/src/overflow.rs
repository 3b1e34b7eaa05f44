use crate::config::DetectorConfig;
use crate::defect::OverflowDefect;
use crate::geometry::{BoundingBox, is_near_by, overlap_ratio};
use crate::oracle::TextOracle;
use crate::regions::{RegionCandidate, is_region_of_interest};
use image::RgbImage;
use image_proc::crop;
use std::collections::HashSet;
use tracing::debug;

/// 对候选区域两两配对，找出“非文字容器 + 与之重叠的文字”。
///
/// `regions` 的顺序即扫描顺序：粗粒度掩码的区域在前，细粒度在后。
/// 外接矩形相同的候选只保留第一个，两张掩码常会提取出同一块文字。
/// 外层遍历全部候选，内层只看排在后面的；一旦某个文字区域命中，
/// 它就不会再与后续容器配对。
pub fn classify_overflow<O: TextOracle + ?Sized>(
    image: &RgbImage,
    regions: &[RegionCandidate],
    config: &DetectorConfig,
    oracle: &mut O,
) -> Vec<OverflowDefect> {
    let mut seen = HashSet::new();
    let candidates: Vec<BoundingBox> = regions
        .iter()
        .filter(|r| seen.insert(r.bbox))
        .filter(|r| is_region_of_interest(r, &config.region))
        .map(|r| r.bbox)
        .collect();
    let mut verdicts = TextVerdicts::new(candidates.len());
    let mut visited: HashSet<BoundingBox> = HashSet::new();
    let mut defects = Vec::new();
    let margin = config.overflow.proximity_margin;

    for (i, &container) in candidates.iter().enumerate() {
        if verdicts.has_text(i, container, image, oracle) {
            continue;
        }
        for (j, &content) in candidates.iter().enumerate().skip(i + 1) {
            if visited.contains(&content) || !is_near_by(container, content, margin) {
                continue;
            }
            if !verdicts.has_text(j, content, image, oracle) {
                continue;
            }
            let ratio = overlap_ratio(container, content);
            if ratio > config.overflow.overflow_threshold {
                debug!(?container, ?content, ratio, "内容溢出");
                visited.insert(content);
                defects.push(OverflowDefect {
                    container,
                    content,
                    overlap_ratio: ratio,
                });
            }
        }
    }
    defects
}

/// 每个候选区域只问一次 OCR。
struct TextVerdicts {
    cache: Vec<Option<bool>>,
}

impl TextVerdicts {
    fn new(len: usize) -> Self {
        Self {
            cache: vec![None; len],
        }
    }

    fn has_text<O: TextOracle + ?Sized>(
        &mut self,
        index: usize,
        bbox: BoundingBox,
        image: &RgbImage,
        oracle: &mut O,
    ) -> bool {
        if let Some(verdict) = self.cache[index] {
            return verdict;
        }
        let region = crop(image, bbox.x, bbox.y, bbox.width, bbox.height);
        let verdict = oracle.contains_text(&region);
        self.cache[index] = Some(verdict);
        verdict
    }
}
