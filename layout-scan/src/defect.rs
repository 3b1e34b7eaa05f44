use crate::geometry::BoundingBox;
use std::fmt;

/// 缺陷类别，名称同时用于输出文件名与报告。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefectKind {
    ContentOverflow,
    SmallText,
}

impl DefectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DefectKind::ContentOverflow => "content-overflow",
            DefectKind::SmallText => "small-text",
        }
    }
}

impl fmt::Display for DefectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 文字区域与相邻非文字容器重叠过多。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverflowDefect {
    pub container: BoundingBox,
    pub content: BoundingBox,
    pub overlap_ratio: f64,
}

/// 过小但仍可识别的文字。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmallTextDefect {
    /// 轮廓外接矩形，也是标注框。
    pub bbox: BoundingBox,
    /// 去掉上下边缘后送去识别的区域。
    pub trimmed: BoundingBox,
}

/// 检测器输出的一条缺陷。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Defect {
    ContentOverflow(OverflowDefect),
    SmallText(SmallTextDefect),
}

impl Defect {
    /// 需要在标注图上画出的矩形。
    pub fn boxes(&self) -> Vec<BoundingBox> {
        match self {
            Defect::ContentOverflow(d) => vec![d.container, d.content],
            Defect::SmallText(d) => vec![d.bbox],
        }
    }
}

impl From<OverflowDefect> for Defect {
    fn from(defect: OverflowDefect) -> Self {
        Defect::ContentOverflow(defect)
    }
}

impl From<SmallTextDefect> for Defect {
    fn from(defect: SmallTextDefect) -> Self {
        Defect::SmallText(defect)
    }
}
