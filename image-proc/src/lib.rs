use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::contrast::{ThresholdType, otsu_level, threshold};
use imageproc::distance_transform::Norm;
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use imageproc::{filter, morphology};

/// 二值掩膜中前景像素的取值。
pub const FOREGROUND: u8 = 255;

/// 结构元素形状。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KernelShape {
    /// 矩形核，对应 LInf 距离。
    Rect,
    /// 椭圆核，以 L1 距离近似（3x3 时与十字形椭圆核一致）。
    Ellipse,
}

/// 形态学运算使用的结构元素：形状 + 边长（像素，奇数）。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StructuringElement {
    pub shape: KernelShape,
    pub size: u8,
}

impl StructuringElement {
    pub fn rect(size: u8) -> Self {
        Self {
            shape: KernelShape::Rect,
            size,
        }
    }

    pub fn ellipse(size: u8) -> Self {
        Self {
            shape: KernelShape::Ellipse,
            size,
        }
    }

    /// 边长换算为半径：3x3 -> 1，11x11 -> 5，1x1 -> 0。
    fn radius(&self) -> u8 {
        self.size.saturating_sub(1) / 2
    }

    fn norm(&self) -> Norm {
        match self.shape {
            KernelShape::Rect => Norm::LInf,
            KernelShape::Ellipse => Norm::L1,
        }
    }
}

/// 将 RGB 截图转为灰度图（Rec.709 亮度）。
pub fn to_gray(image: &RgbImage) -> GrayImage {
    imageops::grayscale(image)
}

/// 灰度图是否为单一亮度（空白页等），此时阈值化没有意义。
pub fn is_uniform(gray: &GrayImage) -> bool {
    let mut pixels = gray.pixels();
    match pixels.next() {
        Some(first) => pixels.all(|p| p == first),
        None => true,
    }
}

/// 对灰度图执行双边滤波：在平滑噪点的同时保留笔画边缘。
///
/// # 参数
/// - `gray`: 已转为灰度的截图。
/// - `diameter`: 方形邻域的边长（像素）。
/// - `sigma_color`: 灰度差的标准差，越大越容易把不同亮度的像素平均在一起。
/// - `sigma_space`: 空间距离的标准差。
///
/// # 返回
/// - 与输入同尺寸的新灰度图；直径小于 2、sigma 非正或图像亮度单一时原样返回。
pub fn bilateral_filter(
    gray: &GrayImage,
    diameter: u32,
    sigma_color: f64,
    sigma_space: f64,
) -> GrayImage {
    if diameter < 2 || sigma_color <= 0.0 || sigma_space <= 0.0 || is_uniform(gray) {
        return gray.clone();
    }
    filter::bilateral_filter(gray, diameter, sigma_color as f32, sigma_space as f32)
}

/// 自适应高斯阈值（反相）：比邻域高斯均值暗 `c` 以上的像素记为前景。
///
/// 与 OpenCV `ADAPTIVE_THRESH_GAUSSIAN_C + THRESH_BINARY_INV` 一致，
/// 高斯标准差由 `block_size` 推算：`0.3 * ((block_size - 1) * 0.5 - 1) + 0.8`。
///
/// # 参数
/// - `gray`: 灰度图。
/// - `block_size`: 邻域边长（像素），小于 3 时按 3 处理。
/// - `c`: 从邻域均值中减去的常数，越大前景越少。
///
/// # 返回
/// - 同尺寸二值掩膜，前景为 [`FOREGROUND`]，背景为 0。
pub fn adaptive_threshold_inv(gray: &GrayImage, block_size: u32, c: i32) -> GrayImage {
    let sigma = (0.3 * ((block_size.max(3) as f32 - 1.0) * 0.5 - 1.0) + 0.8).max(0.1);
    let mean = filter::gaussian_blur_f32(gray, sigma);
    let mut mask = GrayImage::new(gray.width(), gray.height());
    for (x, y, out) in mask.enumerate_pixels_mut() {
        let src = gray.get_pixel(x, y)[0] as i32;
        let cutoff = mean.get_pixel(x, y)[0] as i32 - c;
        if src <= cutoff {
            *out = Luma([FOREGROUND]);
        }
    }
    mask
}

/// 全局 Otsu 阈值（反相）：不高于 Otsu 分割点的暗像素记为前景。
///
/// 单一亮度的图像直接返回全背景，避免整张图被当成一个前景块。
pub fn otsu_threshold_inv(gray: &GrayImage) -> GrayImage {
    if is_uniform(gray) {
        return GrayImage::new(gray.width(), gray.height());
    }
    threshold(gray, otsu_level(gray), ThresholdType::BinaryInverted)
}

/// 闭运算（先膨胀后腐蚀），把相邻笔画合并成块。
pub fn close(mask: &GrayImage, element: StructuringElement) -> GrayImage {
    if element.radius() == 0 {
        return mask.clone();
    }
    morphology::close(mask, element.norm(), element.radius())
}

/// 开运算（先腐蚀后膨胀），去除孤立噪点。
pub fn open(mask: &GrayImage, element: StructuringElement) -> GrayImage {
    if element.radius() == 0 {
        return mask.clone();
    }
    morphology::open(mask, element.norm(), element.radius())
}

/// 裁剪矩形区域。
///
/// # 参数
/// - `image`: 源截图。
/// - `x`, `y`: 左上角坐标。
/// - `width`, `height`: 期望的裁剪尺寸。
///
/// # 返回
/// - 新的 RGB 图像；超出源图的部分被截断，因此尺寸可能小于期望值，甚至为 0。
pub fn crop(image: &RgbImage, x: u32, y: u32, width: u32, height: u32) -> RgbImage {
    imageops::crop_imm(image, x, y, width, height).to_image()
}

/// 按整数倍线性插值放大，便于 OCR 识别小字。
///
/// # 参数
/// - `image`: 源图像，通常是小字区域的裁剪结果。
/// - `factor`: 放大倍数，0 按 1 处理。
///
/// # 返回
/// - 宽高各乘以 `factor` 的新图像；倍数为 1 或图像为空时返回副本。
pub fn zoom(image: &RgbImage, factor: u32) -> RgbImage {
    let factor = factor.max(1);
    let (width, height) = image.dimensions();
    if factor == 1 || width == 0 || height == 0 {
        return image.clone();
    }
    imageops::resize(image, width * factor, height * factor, FilterType::Triangle)
}

/// 在画布上绘制指定线宽的空心矩形，线宽向矩形内部叠加。
///
/// # 参数
/// - `canvas`: 被就地修改的画布。
/// - `x`, `y`, `width`, `height`: 矩形外边界。
/// - `color`: 线条颜色。
/// - `thickness`: 线宽（像素），0 按 1 处理；内缩到矩形退化时停止。
///
/// 超出画布的部分由 imageproc 裁掉，不会越界。
pub fn draw_box(
    canvas: &mut RgbImage,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    color: Rgb<u8>,
    thickness: u32,
) {
    for inset in 0..thickness.max(1) {
        let (w, h) = match (
            width.checked_sub(inset * 2),
            height.checked_sub(inset * 2),
        ) {
            (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
            _ => break,
        };
        let rect = Rect::at((x + inset) as i32, (y + inset) as i32).of_size(w, h);
        draw_hollow_rect_mut(canvas, rect, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([255, 255, 255]))
    }

    fn fill(image: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
        for yy in y..y + h {
            for xx in x..x + w {
                image.put_pixel(xx, yy, color);
            }
        }
    }

    #[test]
    fn adaptive_threshold_marks_dark_edges_only() {
        let mut image = white(40, 20);
        fill(&mut image, 10, 8, 20, 2, Rgb([0, 0, 0]));
        let mask = adaptive_threshold_inv(&to_gray(&image), 11, 2);

        assert_eq!(mask.get_pixel(15, 8)[0], FOREGROUND);
        assert_eq!(mask.get_pixel(15, 9)[0], FOREGROUND);
        assert_eq!(mask.get_pixel(15, 2)[0], 0);
        assert_eq!(mask.get_pixel(2, 9)[0], 0);
    }

    #[test]
    fn otsu_threshold_on_blank_image_is_empty() {
        let gray = to_gray(&white(30, 30));
        let mask = otsu_threshold_inv(&gray);
        assert!(mask.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn otsu_threshold_separates_dark_glyph() {
        let mut image = white(30, 30);
        fill(&mut image, 10, 10, 2, 3, Rgb([20, 20, 20]));
        let mask = otsu_threshold_inv(&to_gray(&image));
        assert_eq!(mask.get_pixel(10, 10)[0], FOREGROUND);
        assert_eq!(mask.get_pixel(11, 12)[0], FOREGROUND);
        assert_eq!(mask.get_pixel(12, 12)[0], 0);
    }

    #[test]
    fn close_bridges_one_pixel_gap() {
        let mut mask = GrayImage::new(20, 20);
        for y in 5..10 {
            for x in (5..8).chain(9..12) {
                mask.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }
        let closed = close(&mask, StructuringElement::rect(3));
        assert_eq!(closed.get_pixel(8, 7)[0], FOREGROUND);
        assert_eq!(closed.get_pixel(15, 7)[0], 0);
    }

    #[test]
    fn open_removes_isolated_speck() {
        let mut mask = GrayImage::new(20, 20);
        mask.put_pixel(15, 15, Luma([FOREGROUND]));
        for y in 2..8 {
            for x in 2..8 {
                mask.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }
        let opened = open(&mask, StructuringElement::rect(3));
        assert_eq!(opened.get_pixel(15, 15)[0], 0);
        assert_eq!(opened.get_pixel(4, 4)[0], FOREGROUND);
    }

    #[test]
    fn unit_kernel_is_identity() {
        let mut mask = GrayImage::new(5, 5);
        mask.put_pixel(2, 2, Luma([FOREGROUND]));
        assert_eq!(open(&mask, StructuringElement::ellipse(1)), mask);
        assert_eq!(close(&mask, StructuringElement::ellipse(1)), mask);
    }

    #[test]
    fn bilateral_filter_keeps_hard_edges() {
        let mut image = white(20, 20);
        fill(&mut image, 8, 8, 2, 3, Rgb([0, 0, 0]));
        let filtered = bilateral_filter(&to_gray(&image), 9, 75.0, 75.0);
        assert_eq!(filtered.dimensions(), (20, 20));
        assert!(filtered.get_pixel(8, 8)[0] < 32);
        assert_eq!(filtered.get_pixel(2, 2)[0], 255);
        assert!(filtered.get_pixel(7, 8)[0] > 245);
    }

    #[test]
    fn bilateral_filter_skips_flat_and_degenerate_input() {
        let flat = GrayImage::from_pixel(6, 6, Luma([0]));
        assert_eq!(bilateral_filter(&flat, 9, 75.0, 75.0), flat);
        assert_eq!(bilateral_filter(&GrayImage::new(0, 0), 9, 75.0, 75.0).len(), 0);

        let mut speck = GrayImage::from_pixel(6, 6, Luma([255]));
        speck.put_pixel(3, 3, Luma([0]));
        assert_eq!(bilateral_filter(&speck, 1, 75.0, 75.0), speck);
    }

    #[test]
    fn otsu_threshold_splits_at_the_level_inclusively() {
        let mut gray = GrayImage::from_pixel(4, 1, Luma([200]));
        gray.put_pixel(0, 0, Luma([10]));
        gray.put_pixel(1, 0, Luma([10]));
        let level = otsu_level(&gray);
        let mask = otsu_threshold_inv(&gray);
        for (x, _, p) in mask.enumerate_pixels() {
            let src = gray.get_pixel(x, 0)[0];
            assert_eq!(p[0] == FOREGROUND, src <= level, "x={x}");
        }
        assert_eq!(mask.get_pixel(0, 0)[0], FOREGROUND);
        assert_eq!(mask.get_pixel(3, 0)[0], 0);
    }

    #[test]
    fn zoom_scales_dimensions() {
        let image = white(3, 2);
        let zoomed = zoom(&image, 5);
        assert_eq!(zoomed.dimensions(), (15, 10));
    }

    #[test]
    fn draw_box_paints_border_not_interior() {
        let mut canvas = white(20, 20);
        let red = Rgb([255, 0, 0]);
        draw_box(&mut canvas, 2, 3, 10, 8, red, 2);

        assert_eq!(canvas.get_pixel(2, 3), &red);
        assert_eq!(canvas.get_pixel(3, 4), &red);
        assert_eq!(canvas.get_pixel(11, 10), &red);
        assert_eq!(canvas.get_pixel(6, 6), &Rgb([255, 255, 255]));
    }

    #[test]
    fn zero_factor_and_zero_thickness_fall_back_to_one() {
        let mut image = white(4, 3);
        image.put_pixel(1, 1, Rgb([0, 0, 0]));
        assert_eq!(zoom(&image, 0), image);

        let mut canvas = white(10, 10);
        draw_box(&mut canvas, 2, 2, 6, 6, Rgb([0, 0, 255]), 0);
        assert_eq!(canvas.get_pixel(2, 2), &Rgb([0, 0, 255]));
        assert_eq!(canvas.get_pixel(3, 3), &Rgb([255, 255, 255]));
    }

    #[test]
    fn crop_clamps_to_image() {
        let image = white(10, 10);
        let cropped = crop(&image, 8, 8, 5, 5);
        assert_eq!(cropped.dimensions(), (2, 2));
    }
}
