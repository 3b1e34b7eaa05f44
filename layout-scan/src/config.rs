use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf};

/// 检测器的整体配置，对应 JSON 配置文件的根对象。
///
/// 所有字段均可省略，省略时使用默认阈值。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetectorConfig {
    /// 轮廓候选区域的公共过滤条件。
    #[serde(default)]
    pub region: RegionFilterConfig,
    /// 双边滤波降噪参数。
    #[serde(default)]
    pub denoise: DenoiseConfig,
    /// 内容溢出检测参数。
    #[serde(default)]
    pub overflow: OverflowConfig,
    /// 小字检测参数。
    #[serde(default)]
    pub small_text: SmallTextConfig,
    /// 设置后会把灰度图、阈值图与掩码写入该目录，便于排查。
    #[serde(default)]
    pub debug_dir: Option<PathBuf>,
}

/// 候选区域过滤（“感兴趣区域”判定）。
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegionFilterConfig {
    /// 外接矩形面积下限（像素）。
    #[serde(default = "default_min_contour_size")]
    pub min_contour_size: u32,
    /// 宽高比下限。
    #[serde(default = "default_min_aspect_ratio")]
    pub min_aspect_ratio: f64,
    /// 宽高比上限。
    #[serde(default = "default_max_aspect_ratio")]
    pub max_aspect_ratio: f64,
    /// 轮廓面积与凸包面积之比的下限；默认 0 即不过滤。
    #[serde(default)]
    pub min_solidity: f64,
}

/// 双边滤波参数，作用于灰度图。
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DenoiseConfig {
    #[serde(default = "default_bilateral_diameter")]
    pub diameter: u32,
    #[serde(default = "default_bilateral_sigma")]
    pub sigma_color: f64,
    #[serde(default = "default_bilateral_sigma")]
    pub sigma_space: f64,
}

/// 内容溢出检测参数。
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OverflowConfig {
    /// 自适应阈值的邻域大小（奇数）。
    #[serde(default = "default_adaptive_block_size")]
    pub adaptive_block_size: u32,
    /// 自适应阈值的偏移量。
    #[serde(default = "default_adaptive_c")]
    pub adaptive_c: i32,
    /// 细粒度（文字）掩码的形态学核大小。
    #[serde(default = "default_text_kernel")]
    pub text_kernel: u8,
    /// 粗粒度（容器）掩码的形态学核大小。
    #[serde(default = "default_container_kernel")]
    pub container_kernel: u8,
    /// 文字掩码阈值化前是否先做双边滤波。
    #[serde(default)]
    pub denoise_text: bool,
    /// 邻近判定的外扩边距（像素）。
    #[serde(default = "default_proximity_margin")]
    pub proximity_margin: u32,
    /// IoU 超过该值才算溢出。
    #[serde(default = "default_overflow_threshold")]
    pub overflow_threshold: f64,
    /// 标注框颜色（RGB）。
    #[serde(default = "default_overflow_color")]
    pub box_color: [u8; 3],
    #[serde(default = "default_line_thickness")]
    pub line_thickness: u32,
}

/// 小字检测参数。
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SmallTextConfig {
    /// 文字高度下限（含）。
    #[serde(default = "default_min_height")]
    pub min_height: u32,
    /// 文字高度上限（含）。
    #[serde(default = "default_max_height")]
    pub max_height: u32,
    /// 设置后高度上下限按 `图片高度 / reference_height` 等比缩放。
    #[serde(default)]
    pub reference_height: Option<u32>,
    /// 单字宽高比下限（开区间）。
    #[serde(default = "default_glyph_min_aspect")]
    pub min_aspect_ratio: f64,
    /// 单字宽高比上限（开区间）。
    #[serde(default = "default_glyph_max_aspect")]
    pub max_aspect_ratio: f64,
    /// 顶部该比例的区域视为页眉，不参与检测。
    #[serde(default = "default_header_fraction")]
    pub header_fraction: f64,
    /// 左右两侧该比例内的文字视为被截断。
    #[serde(default = "default_edge_fraction")]
    pub edge_fraction: f64,
    /// 送 OCR 前上下各裁掉的高度比例。
    #[serde(default = "default_trim_fraction")]
    pub trim_fraction: f64,
    /// 送 OCR 前的放大倍数。
    #[serde(default = "default_zoom_factor")]
    pub zoom_factor: u32,
    /// 形态学核大小；1 表示不做开闭运算。
    #[serde(default = "default_small_text_kernel")]
    pub kernel_size: u8,
    /// 阈值化前是否先做双边滤波。
    #[serde(default = "bool_true")]
    pub denoise: bool,
    /// 识别结果中出现这些字符时视为噪点而非文字。
    #[serde(default = "default_excluded_glyphs")]
    pub excluded_glyphs: Vec<char>,
    #[serde(default = "default_small_text_color")]
    pub box_color: [u8; 3],
    #[serde(default = "default_line_thickness")]
    pub line_thickness: u32,
}

impl Default for RegionFilterConfig {
    fn default() -> Self {
        Self {
            min_contour_size: default_min_contour_size(),
            min_aspect_ratio: default_min_aspect_ratio(),
            max_aspect_ratio: default_max_aspect_ratio(),
            min_solidity: 0.0,
        }
    }
}

impl Default for DenoiseConfig {
    fn default() -> Self {
        Self {
            diameter: default_bilateral_diameter(),
            sigma_color: default_bilateral_sigma(),
            sigma_space: default_bilateral_sigma(),
        }
    }
}

impl Default for OverflowConfig {
    fn default() -> Self {
        Self {
            adaptive_block_size: default_adaptive_block_size(),
            adaptive_c: default_adaptive_c(),
            text_kernel: default_text_kernel(),
            container_kernel: default_container_kernel(),
            denoise_text: false,
            proximity_margin: default_proximity_margin(),
            overflow_threshold: default_overflow_threshold(),
            box_color: default_overflow_color(),
            line_thickness: default_line_thickness(),
        }
    }
}

impl Default for SmallTextConfig {
    fn default() -> Self {
        Self {
            min_height: default_min_height(),
            max_height: default_max_height(),
            reference_height: None,
            min_aspect_ratio: default_glyph_min_aspect(),
            max_aspect_ratio: default_glyph_max_aspect(),
            header_fraction: default_header_fraction(),
            edge_fraction: default_edge_fraction(),
            trim_fraction: default_trim_fraction(),
            zoom_factor: default_zoom_factor(),
            kernel_size: default_small_text_kernel(),
            denoise: true,
            excluded_glyphs: default_excluded_glyphs(),
            box_color: default_small_text_color(),
            line_thickness: default_line_thickness(),
        }
    }
}

impl SmallTextConfig {
    /// 按图片高度换算文字高度的上下限（均含边界）。
    pub fn height_bounds(&self, image_height: u32) -> (u32, u32) {
        match self.reference_height {
            Some(reference) if reference > 0 => {
                let ratio = image_height as f64 / reference as f64;
                (
                    (self.min_height as f64 * ratio).floor() as u32,
                    (self.max_height as f64 * ratio).floor() as u32,
                )
            }
            _ => (self.min_height, self.max_height),
        }
    }
}

impl DetectorConfig {
    /// 校验互相矛盾或越界的取值。
    pub fn validate(&self) -> Result<()> {
        let region = &self.region;
        ensure!(
            region.min_aspect_ratio <= region.max_aspect_ratio,
            "region.min_aspect_ratio 不能大于 max_aspect_ratio"
        );
        ensure!(
            (0.0..=1.0).contains(&region.min_solidity),
            "region.min_solidity 必须位于 [0, 1]"
        );

        let overflow = &self.overflow;
        ensure!(
            overflow.adaptive_block_size >= 3 && overflow.adaptive_block_size % 2 == 1,
            "overflow.adaptive_block_size 必须是不小于 3 的奇数"
        );
        ensure!(
            is_odd_kernel(overflow.text_kernel) && is_odd_kernel(overflow.container_kernel),
            "overflow 的形态学核大小必须是正奇数"
        );
        ensure!(
            (0.0..1.0).contains(&overflow.overflow_threshold),
            "overflow.overflow_threshold 必须位于 [0, 1)"
        );

        let small = &self.small_text;
        ensure!(
            small.min_height <= small.max_height,
            "small_text.min_height 不能大于 max_height"
        );
        ensure!(
            small.min_aspect_ratio < small.max_aspect_ratio,
            "small_text.min_aspect_ratio 必须小于 max_aspect_ratio"
        );
        ensure!(
            (0.0..1.0).contains(&small.header_fraction),
            "small_text.header_fraction 必须位于 [0, 1)"
        );
        ensure!(
            (0.0..0.5).contains(&small.edge_fraction),
            "small_text.edge_fraction 必须位于 [0, 0.5)"
        );
        ensure!(
            (0.0..0.5).contains(&small.trim_fraction),
            "small_text.trim_fraction 必须位于 [0, 0.5)"
        );
        ensure!(small.zoom_factor >= 1, "small_text.zoom_factor 至少为 1");
        ensure!(
            is_odd_kernel(small.kernel_size),
            "small_text.kernel_size 必须是正奇数"
        );
        Ok(())
    }
}

/// 读取并校验 JSON 配置文件。
pub fn load_config(path: impl AsRef<Path>) -> Result<DetectorConfig> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
    let cfg: DetectorConfig = serde_json::from_str(&text)
        .with_context(|| format!("解析配置文件失败: {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

fn is_odd_kernel(size: u8) -> bool {
    size % 2 == 1
}

fn default_min_contour_size() -> u32 {
    10
}

fn default_min_aspect_ratio() -> f64 {
    2.0
}

fn default_max_aspect_ratio() -> f64 {
    5000.0
}

fn default_bilateral_diameter() -> u32 {
    9
}

fn default_bilateral_sigma() -> f64 {
    75.0
}

fn default_adaptive_block_size() -> u32 {
    11
}

fn default_adaptive_c() -> i32 {
    2
}

fn default_text_kernel() -> u8 {
    3
}

fn default_container_kernel() -> u8 {
    11
}

fn default_proximity_margin() -> u32 {
    30
}

fn default_overflow_threshold() -> f64 {
    0.1
}

fn default_overflow_color() -> [u8; 3] {
    [255, 0, 0]
}

fn default_small_text_color() -> [u8; 3] {
    [245, 15, 15]
}

fn default_line_thickness() -> u32 {
    2
}

fn default_min_height() -> u32 {
    2
}

fn default_max_height() -> u32 {
    7
}

fn default_glyph_min_aspect() -> f64 {
    0.1
}

fn default_glyph_max_aspect() -> f64 {
    0.9
}

fn default_header_fraction() -> f64 {
    0.1
}

fn default_edge_fraction() -> f64 {
    0.3
}

fn default_trim_fraction() -> f64 {
    0.1
}

fn default_zoom_factor() -> u32 {
    5
}

fn default_small_text_kernel() -> u8 {
    1
}

fn default_excluded_glyphs() -> Vec<char> {
    vec![',', '.', '\'', 'o', '•', '·', '⋅']
}

fn bool_true() -> bool {
    true
}
