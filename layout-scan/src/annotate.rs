use crate::defect::DefectKind;
use crate::geometry::BoundingBox;
use anyhow::{Context, Result};
use image::{DynamicImage, Rgb, RgbImage};
use image_proc::draw_box;
use std::{fs, path::Path};
use tracing::warn;

/// 在原图副本上画出全部缺陷框。
pub fn annotate(
    image: &RgbImage,
    boxes: impl IntoIterator<Item = BoundingBox>,
    color: [u8; 3],
    thickness: u32,
) -> RgbImage {
    let mut canvas = image.clone();
    for b in boxes {
        draw_box(&mut canvas, b.x, b.y, b.width, b.height, Rgb(color), thickness);
    }
    canvas
}

/// 保存标注图，必要时创建父目录；格式由扩展名决定。
pub fn save_annotated(image: &RgbImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("创建输出目录失败: {}", parent.display()))?;
    }
    image
        .save(path)
        .with_context(|| format!("保存标注图失败: {}", path.display()))
}

/// 调试快照：`<dir>/<kind>_<stage>.png`，写失败只告警。
pub(crate) fn save_snapshot(
    dir: Option<&Path>,
    kind: DefectKind,
    stage: &str,
    image: impl Into<DynamicImage>,
) {
    let Some(dir) = dir else {
        return;
    };
    let path = dir.join(format!("{kind}_{stage}.png"));
    let image: DynamicImage = image.into();
    let result = fs::create_dir_all(dir)
        .map_err(anyhow::Error::from)
        .and_then(|_| image.save(&path).map_err(anyhow::Error::from));
    if let Err(err) = result {
        warn!("写入调试快照失败 {}: {err:#}", path.display());
    }
}
