use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use layout_scan::{
    ContentOverflowDetector, DefectKind, Detector, DetectorConfig, OcrTextOracle,
    SmallTextDetector, TextRules, load_config,
};
use ocr::TextRecognizer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// 要运行的检测器。
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum DefectArg {
    /// 文字溢出容器。
    ContentOverflow,
    /// 过小文字。
    SmallText,
    /// 两者都跑。
    All,
}

/// OCR 后端，需在编译时启用同名特性。
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// PaddleOCR 识别模型（`--features paddle`）。
    Paddle,
    /// 系统安装的 Tesseract（`--features tesseract`）。
    Tesseract,
}

/// 命令行参数：输入输出目录、检测类型与 OCR 后端。
#[derive(Parser, Debug)]
#[command(
    name = "layout-scan",
    version,
    about = "批量检测截图中的内容溢出与过小文字",
    long_about = "批量检测截图中的内容溢出与过小文字。\n\n\
        识别文字依赖 OCR 后端，需以 `--features paddle` 或 `--features tesseract` 编译；\
        未启用所选后端时程序会直接报错退出。",
    after_help = "OCR 后端需在编译时启用：cargo build --features paddle（或 tesseract）"
)]
struct Args {
    /// 输入目录，递归查找 PNG/JPG 截图
    #[arg(long)]
    input: PathBuf,

    /// 输出目录，按输入的子目录结构写出标注图
    #[arg(long)]
    output: PathBuf,

    /// 检测类型
    #[arg(long, value_enum, default_value_t = DefectArg::All)]
    defect: DefectArg,

    /// JSON 配置文件，缺省使用内置阈值
    #[arg(long)]
    config: Option<PathBuf>,

    /// 检测结果清单（CSV，包含 image,defect,annotated）
    #[arg(long)]
    report: Option<PathBuf>,

    /// OCR 后端，对应的编译特性必须已启用
    #[arg(long, value_enum, default_value_t = Backend::Paddle)]
    backend: Backend,

    /// PaddleOCR 识别模型路径
    #[arg(long, default_value = "artifacts/ocr/PP-OCRv5_mobile_rec_fp16.mnn")]
    #[cfg_attr(not(feature = "paddle"), allow(dead_code))]
    rec_model: PathBuf,

    /// PaddleOCR 字典路径
    #[arg(long, default_value = "artifacts/ocr/ppocr_keys_v5.txt")]
    #[cfg_attr(not(feature = "paddle"), allow(dead_code))]
    keys: PathBuf,

    /// Tesseract 语言
    #[arg(long, default_value = "eng")]
    #[cfg_attr(not(feature = "tesseract"), allow(dead_code))]
    tess_lang: String,

    /// tessdata 目录
    #[arg(long)]
    #[cfg_attr(not(feature = "tesseract"), allow(dead_code))]
    tessdata: Option<PathBuf>,
}

/// 一条检测记录，对应报告中的一行。
#[derive(Debug, Clone, PartialEq, Eq)]
struct Finding {
    image: PathBuf,
    kind: DefectKind,
    annotated: PathBuf,
}

#[derive(Debug, Default)]
struct Summary {
    processed: usize,
    flagged: usize,
    failed: usize,
}

type SharedRecognizer = Rc<RefCell<Box<dyn TextRecognizer>>>;

/// 程序入口：初始化日志，解析参数并执行批量检测。
fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    run(args)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// 准备输出目录与检测器，执行批量检测并按需写出清单。
fn run(args: Args) -> Result<()> {
    anyhow::ensure!(
        args.input.is_dir(),
        "输入路径必须是有效目录：{}",
        args.input.display()
    );
    fs::create_dir_all(&args.output)
        .with_context(|| format!("无法创建输出目录 {}", args.output.display()))?;

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => DetectorConfig::default(),
    };
    let recognizer: SharedRecognizer = Rc::new(RefCell::new(build_recognizer(&args)?));
    let detectors = build_detectors(args.defect, &config, &recognizer);

    let (summary, findings) = scan_tree(&args.input, &args.output, detectors)?;

    if let Some(report_path) = &args.report {
        write_report(&findings, report_path)?;
        info!(
            "检测清单已生成：{}（{} 条记录）",
            report_path.display(),
            findings.len()
        );
    }

    info!(
        "完成检测：处理 {} 张截图，{} 张存在缺陷，{} 张失败，输出目录：{}",
        summary.processed,
        summary.flagged,
        summary.failed,
        args.output.display()
    );
    Ok(())
}

/// 遍历输入目录，对每张截图依次运行 `detectors`。
///
/// - 标注图按 `原名_<缺陷类型>.png` 命名，保持原始子目录结构。
/// - 单张图片失败只记录日志并计数，不中断批处理。
/// - 位于输出目录内的文件会被跳过，输出目录可以放在输入目录之下。
fn scan_tree(
    input: &Path,
    output: &Path,
    mut detectors: Vec<Box<dyn Detector>>,
) -> Result<(Summary, Vec<Finding>)> {
    let mut summary = Summary::default();
    let mut findings: Vec<Finding> = Vec::new();

    for entry in WalkDir::new(input)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|res| res.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !is_supported_image(path) || path.starts_with(output) {
            continue;
        }

        let relative_path = path
            .strip_prefix(input)
            .with_context(|| format!("无法计算相对路径：{}", path.display()))?;
        let parent_relative = relative_path.parent().unwrap_or_else(|| Path::new(""));
        let file_stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .context("文件名需为有效的 UTF-8 字符串")?;

        summary.processed += 1;
        let mut flagged = false;
        for detector in detectors.iter_mut() {
            let kind = detector.kind();
            let save_path = output
                .join(parent_relative)
                .join(output_file_name(file_stem, kind));
            match detector.detect(path, &save_path) {
                Ok(Some(annotated)) => {
                    flagged = true;
                    findings.push(Finding {
                        image: relative_path.to_path_buf(),
                        kind,
                        annotated,
                    });
                }
                Ok(None) => {}
                Err(err) => {
                    error!("处理失败 {}: {err:#}", path.display());
                    summary.failed += 1;
                    break;
                }
            }
        }
        if flagged {
            summary.flagged += 1;
        }
    }
    Ok((summary, findings))
}

/// 按参数组装检测器，共用同一个 OCR 引擎。
fn build_detectors(
    defect: DefectArg,
    config: &DetectorConfig,
    recognizer: &SharedRecognizer,
) -> Vec<Box<dyn Detector>> {
    let mut detectors: Vec<Box<dyn Detector>> = Vec::new();
    if matches!(defect, DefectArg::ContentOverflow | DefectArg::All) {
        let oracle = OcrTextOracle::new(recognizer.clone(), TextRules::word_characters());
        detectors.push(Box::new(ContentOverflowDetector::new(config.clone(), oracle)));
    }
    if matches!(defect, DefectArg::SmallText | DefectArg::All) {
        let rules = TextRules::legible_glyphs(config.small_text.excluded_glyphs.iter().copied());
        let oracle = OcrTextOracle::new(recognizer.clone(), rules);
        detectors.push(Box::new(SmallTextDetector::new(config.clone(), oracle)));
    }
    detectors
}

fn build_recognizer(args: &Args) -> Result<Box<dyn TextRecognizer>> {
    match args.backend {
        Backend::Paddle => paddle_recognizer(args),
        Backend::Tesseract => tesseract_recognizer(args),
    }
}

#[cfg(feature = "paddle")]
fn paddle_recognizer(args: &Args) -> Result<Box<dyn TextRecognizer>> {
    let model = ocr::ModelConfig::new(&args.rec_model, &args.keys);
    let engine = ocr::OcrEngine::new(model)
        .with_context(|| format!("加载 PaddleOCR 模型失败：{}", args.rec_model.display()))?;
    Ok(Box::new(engine))
}

#[cfg(not(feature = "paddle"))]
fn paddle_recognizer(_args: &Args) -> Result<Box<dyn TextRecognizer>> {
    anyhow::bail!("未启用 paddle 特性，请使用 `--features paddle` 重新编译")
}

#[cfg(feature = "tesseract")]
fn tesseract_recognizer(args: &Args) -> Result<Box<dyn TextRecognizer>> {
    let config = ocr::TesseractConfig {
        language: args.tess_lang.clone(),
        data_path: args.tessdata.clone(),
        ..ocr::TesseractConfig::default()
    };
    Ok(Box::new(ocr::TesseractEngine::new(&config)?))
}

#[cfg(not(feature = "tesseract"))]
fn tesseract_recognizer(_args: &Args) -> Result<Box<dyn TextRecognizer>> {
    anyhow::bail!("未启用 tesseract 特性，请使用 `--features tesseract` 重新编译")
}

/// 过滤文件扩展名，仅允许 PNG/JPG/JPEG。
fn is_supported_image(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ext) if ext == "png" || ext == "jpg" || ext == "jpeg"
    )
}

/// 标注图文件名：`<原名>_<缺陷类型>.png`。
fn output_file_name(stem: &str, kind: DefectKind) -> String {
    format!("{stem}_{kind}.png")
}

/// 输出 image,defect,annotated CSV，截图路径相对输入目录记录。
fn write_report(findings: &[Finding], report_path: &Path) -> Result<()> {
    if let Some(parent) = report_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("无法创建清单目录 {}", parent.display()))?;
        }
    }
    let mut wtr = csv::Writer::from_path(report_path)
        .with_context(|| format!("打开清单文件失败：{}", report_path.display()))?;
    wtr.write_record(["image", "defect", "annotated"])?;
    for finding in findings {
        let image = finding.image.to_string_lossy().replace('\\', "/");
        let annotated = finding.annotated.to_string_lossy().replace('\\', "/");
        wtr.write_record([image.as_str(), finding.kind.as_str(), annotated.as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}
