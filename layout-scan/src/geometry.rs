use imageproc::point::Point;

/// 轴对齐外接矩形，`x`/`y` 为左上角，宽高以像素计。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// 包住全部轮廓点的最小矩形；点集为空时返回 `None`。
    pub fn from_points(points: &[Point<i32>]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self::new(
            min_x.max(0) as u32,
            min_y.max(0) as u32,
            (max_x - min_x + 1) as u32,
            (max_y - min_y + 1) as u32,
        ))
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// 右边界（不含）。
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// 下边界（不含）。
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// 宽高比；高度为 0 时返回 0。
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            0.0
        } else {
            self.width as f64 / self.height as f64
        }
    }
}

/// 两个矩形的交并比（IoU），不相交时为 0。
pub fn overlap_ratio(a: BoundingBox, b: BoundingBox) -> f64 {
    let inter_w = a.right().min(b.right()) as i64 - a.x.max(b.x) as i64;
    let inter_h = a.bottom().min(b.bottom()) as i64 - a.y.max(b.y) as i64;
    if inter_w <= 0 || inter_h <= 0 {
        return 0.0;
    }
    let inter = (inter_w * inter_h) as f64;
    let union = a.area() as f64 + b.area() as f64 - inter;
    if union <= 0.0 { 0.0 } else { inter / union }
}

/// 任一矩形外扩 `margin` 后两者是否相交（含贴边）。
///
/// 判定对称：`is_near_by(a, b, m) == is_near_by(b, a, m)`。
pub fn is_near_by(a: BoundingBox, b: BoundingBox, margin: u32) -> bool {
    let margin = margin as i64;
    let separated = a.right() as i64 + margin < b.x as i64
        || b.right() as i64 + margin < a.x as i64
        || a.bottom() as i64 + margin < b.y as i64
        || b.bottom() as i64 + margin < a.y as i64;
    !separated
}
