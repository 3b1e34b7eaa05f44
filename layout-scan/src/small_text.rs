use crate::config::{DetectorConfig, SmallTextConfig};
use crate::defect::SmallTextDefect;
use crate::geometry::BoundingBox;
use crate::oracle::TextOracle;
use crate::regions::{RegionCandidate, is_solid};
use image::RgbImage;
use image_proc::{crop, zoom};
use tracing::debug;

/// 逐个候选区域判定是否为过小文字。
///
/// 凸包退化的区域直接跳过；其余依次经过高度、形状与位置、截断三道过滤，
/// 剩下的区域裁掉上下边缘、放大后交给 `oracle` 确认是否可读。
pub fn classify_small_text<O: TextOracle + ?Sized>(
    image: &RgbImage,
    regions: &[RegionCandidate],
    config: &DetectorConfig,
    oracle: &mut O,
) -> Vec<SmallTextDefect> {
    let cfg = &config.small_text;
    let (width, height) = image.dimensions();
    let bounds = cfg.height_bounds(height);
    let mut defects = Vec::new();

    for region in regions {
        if !is_solid(region, &config.region) {
            continue;
        }
        let bbox = region.bbox;
        if !within_height_bounds(bbox.height, bounds) {
            continue;
        }
        if !is_full_text_contour(bbox, height, cfg) || is_cropped_text(bbox, width, cfg) {
            continue;
        }
        let trimmed = trim_box(bbox, cfg.trim_fraction);
        if trimmed.width == 0 || trimmed.height == 0 {
            continue;
        }
        let glyph = crop(image, trimmed.x, trimmed.y, trimmed.width, trimmed.height);
        if oracle.contains_text(&zoom(&glyph, cfg.zoom_factor)) {
            debug!(?bbox, "小字");
            defects.push(SmallTextDefect { bbox, trimmed });
        }
    }
    defects
}

/// 高度是否落在 `[min, max]` 内（含边界）。
pub fn within_height_bounds(height: u32, (min, max): (u32, u32)) -> bool {
    height >= min && height <= max
}

/// 单字形状（窄高）且不在页眉区域。
pub fn is_full_text_contour(bbox: BoundingBox, image_height: u32, cfg: &SmallTextConfig) -> bool {
    let aspect = bbox.aspect_ratio();
    aspect > cfg.min_aspect_ratio
        && aspect < cfg.max_aspect_ratio
        && bbox.y as f64 > cfg.header_fraction * image_height as f64
}

/// 贴近左右两侧的文字多半被截断，不计入。
pub fn is_cropped_text(bbox: BoundingBox, image_width: u32, cfg: &SmallTextConfig) -> bool {
    let width = image_width as f64;
    (bbox.x as f64) < cfg.edge_fraction * width
        || bbox.right() as f64 > (1.0 - cfg.edge_fraction) * width
}

/// 上下各去掉 `floor(height * fraction)` 像素。
pub fn trim_box(bbox: BoundingBox, fraction: f64) -> BoundingBox {
    let margin = (bbox.height as f64 * fraction).floor() as u32;
    BoundingBox::new(
        bbox.x,
        bbox.y + margin,
        bbox.width,
        bbox.height.saturating_sub(margin * 2),
    )
}
