use crate::config::DetectorConfig;
use image::{GrayImage, RgbImage};
use image_proc::{
    StructuringElement, adaptive_threshold_inv, bilateral_filter, close, open, otsu_threshold_inv,
    to_gray,
};

/// 掩码类型：决定阈值算法与形态学核。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskMode {
    /// 内容溢出的粗粒度掩码，大核把容器边框连成整体。
    Container,
    /// 内容溢出的细粒度掩码，小核保留单行文字。
    Text,
    /// 小字检测掩码：灰度降噪 + Otsu。
    SmallText,
}

impl MaskMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaskMode::Container => "container",
            MaskMode::Text => "text",
            MaskMode::SmallText => "small-text",
        }
    }
}

/// 预处理的中间结果，`debug_dir` 打开时逐个落盘。
#[derive(Debug, Clone)]
pub struct MaskStages {
    pub gray: GrayImage,
    pub threshold: GrayImage,
    pub mask: GrayImage,
}

/// 生成二值掩码（前景 255），前景对应比背景更暗的像素。
pub fn preprocess(image: &RgbImage, mode: MaskMode, config: &DetectorConfig) -> GrayImage {
    preprocess_stages(image, mode, config).mask
}

/// 同 [`preprocess`]，但保留灰度图与阈值图。
pub fn preprocess_stages(image: &RgbImage, mode: MaskMode, config: &DetectorConfig) -> MaskStages {
    let denoise = match mode {
        MaskMode::Container => false,
        MaskMode::Text => config.overflow.denoise_text,
        MaskMode::SmallText => config.small_text.denoise,
    };
    let mut gray = to_gray(image);
    if denoise {
        let d = &config.denoise;
        gray = bilateral_filter(&gray, d.diameter, d.sigma_color, d.sigma_space);
    }

    let overflow = &config.overflow;
    let (threshold, element) = match mode {
        MaskMode::Container => (
            adaptive_threshold_inv(&gray, overflow.adaptive_block_size, overflow.adaptive_c),
            StructuringElement::rect(overflow.container_kernel),
        ),
        MaskMode::Text => (
            adaptive_threshold_inv(&gray, overflow.adaptive_block_size, overflow.adaptive_c),
            StructuringElement::rect(overflow.text_kernel),
        ),
        MaskMode::SmallText => (
            otsu_threshold_inv(&gray),
            StructuringElement::ellipse(config.small_text.kernel_size),
        ),
    };
    let mask = open(&close(&threshold, element), element);

    MaskStages {
        gray,
        threshold,
        mask,
    }
}
