use crate::config::RegionFilterConfig;
use crate::geometry::BoundingBox;
use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};
use imageproc::geometry::convex_hull;
use imageproc::point::Point;

/// 掩码中的一个外轮廓及其几何量。
#[derive(Debug, Clone)]
pub struct RegionCandidate {
    pub contour: Vec<Point<i32>>,
    pub bbox: BoundingBox,
    /// 轮廓多边形面积（鞋带公式）。
    pub area: f64,
    /// 凸包面积。
    pub hull_area: f64,
}

impl RegionCandidate {
    /// 由有序轮廓点构造；点集为空时返回 `None`。
    pub fn from_points(contour: Vec<Point<i32>>) -> Option<Self> {
        let bbox = BoundingBox::from_points(&contour)?;
        let area = polygon_area(&contour);
        let hull_area = if contour.len() < 3 {
            0.0
        } else {
            polygon_area(&convex_hull(contour.as_slice()))
        };
        Some(Self {
            contour,
            bbox,
            area,
            hull_area,
        })
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.bbox.aspect_ratio()
    }

    /// 轮廓面积 / 凸包面积；凸包退化时为 `None`。
    pub fn solidity(&self) -> Option<f64> {
        (self.hull_area > 0.0).then(|| self.area / self.hull_area)
    }
}

/// 提取掩码中的全部最外层轮廓（不含孔洞与嵌套轮廓）。
pub fn extract_regions(mask: &GrayImage) -> Vec<RegionCandidate> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .filter_map(|c| RegionCandidate::from_points(c.points))
        .collect()
}

/// 感兴趣区域判定：面积、宽高比、凸包面积与实心度均需满足阈值。
pub fn is_region_of_interest(region: &RegionCandidate, cfg: &RegionFilterConfig) -> bool {
    if region.bbox.area() < cfg.min_contour_size as u64 {
        return false;
    }
    let aspect = region.aspect_ratio();
    if aspect < cfg.min_aspect_ratio || aspect > cfg.max_aspect_ratio {
        return false;
    }
    is_solid(region, cfg)
}

/// 凸包非退化且实心度不低于 `min_solidity`。
pub fn is_solid(region: &RegionCandidate, cfg: &RegionFilterConfig) -> bool {
    region
        .solidity()
        .is_some_and(|solidity| solidity >= cfg.min_solidity)
}

fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(p, q)| p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64)
        .sum();
    twice.abs() as f64 / 2.0
}

#[cfg(test)]
pub(crate) fn rect_region(x: i32, y: i32, w: i32, h: i32) -> RegionCandidate {
    let points = vec![
        Point::new(x, y),
        Point::new(x, y + h - 1),
        Point::new(x + w - 1, y + h - 1),
        Point::new(x + w - 1, y),
    ];
    RegionCandidate::from_points(points).expect("non-empty")
}
