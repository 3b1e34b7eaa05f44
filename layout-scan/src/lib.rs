//! 截图版面缺陷检测：内容溢出与过小文字。
//!
//! 流程：阈值化得到二值掩码 -> 提取外轮廓 -> 几何过滤 -> OCR 确认 -> 标注。
//! OCR 通过 [`TextOracle`] 注入，检测逻辑本身不依赖具体引擎。

pub mod annotate;
pub mod config;
pub mod defect;
pub mod detector;
pub mod geometry;
pub mod oracle;
pub mod overflow;
pub mod preprocess;
pub mod regions;
pub mod small_text;

pub use config::{
    DenoiseConfig, DetectorConfig, OverflowConfig, RegionFilterConfig, SmallTextConfig,
    load_config,
};
pub use defect::{Defect, DefectKind, OverflowDefect, SmallTextDefect};
pub use detector::{ContentOverflowDetector, Detector, Scan, SmallTextDetector, load_image};
pub use geometry::{BoundingBox, is_near_by, overlap_ratio};
pub use oracle::{OcrTextOracle, TextOracle, TextRules};
pub use preprocess::{MaskMode, preprocess};
pub use regions::{RegionCandidate, extract_regions, is_region_of_interest, is_solid};
