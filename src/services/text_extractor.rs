//! 文本提取服务 - 业务能力层
//!
//! 只负责"图片 → 文本"能力：预处理、调用视觉后端、语言检测、质量校验、结构化。
//! 视觉后端未配置或调用失败时返回明确标记的兜底结果，文档处理不会因 OCR 不可用而阻塞。

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use phf::phf_set;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::clients::VisionBackend;
use crate::config::Config;
use crate::error::BackendError;
use crate::models::extraction::{
    ContentSection, ExtractionMethod, ExtractionReport, ExtractionResult, QualityReport,
    StructuredContent,
};

/// 兜底结果的固定置信度
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

const FALLBACK_TEXT: &str =
    "[OCR text unavailable: configure a vision backend to extract homework text]";

/// 少于该字符数视为"几乎没有识别到文本"
const MIN_TEXT_CHARS: usize = 10;

const JPEG_QUALITY: u8 = 95;

static MATH_SYMBOLS: phf::Set<char> = phf_set! {
    '+', '-', '×', '÷', '=', '≠', '<', '>', '≤', '≥', '∑', '∫', '√', 'π',
};

const ENGLISH_KEYWORDS: [&str; 4] = ["read", "write", "story", "passage"];

/// 文本提取服务
pub struct TextExtractor {
    vision: Option<Arc<dyn VisionBackend>>,
    max_dimension: u32,
    confidence_threshold: f64,
}

impl TextExtractor {
    pub fn new(
        vision: Option<Arc<dyn VisionBackend>>,
        max_dimension: u32,
        confidence_threshold: f64,
    ) -> Self {
        Self {
            vision,
            max_dimension,
            confidence_threshold,
        }
    }

    pub fn from_config(vision: Option<Arc<dyn VisionBackend>>, config: &Config) -> Self {
        Self::new(
            vision,
            config.max_image_dimension,
            config.ocr_confidence_threshold,
        )
    }

    /// 完整 OCR 流程：预处理 → 提取 → 校验 → 结构化
    ///
    /// 只有非预期的后端错误会返回 `Err`。
    pub async fn process(&self, image: &[u8]) -> Result<ExtractionReport, BackendError> {
        let processed = self.preprocess(image).await;
        let ocr_data = self.extract(&processed).await?;
        let processing_quality = self.validate(&ocr_data);
        let content = self.structure_content(&ocr_data);

        info!(
            "✓ 文本提取完成: 方式 {:?}, 置信度 {:.2}, 语言 {:?}",
            ocr_data.method, ocr_data.confidence, ocr_data.detected_languages
        );

        Ok(ExtractionReport {
            ocr_data,
            processing_quality,
            content,
        })
    }

    /// 图片预处理：统一为 RGB，超过最大尺寸时等比缩小，重新编码为 JPEG
    ///
    /// 解码与编码在阻塞线程池中执行。失败时记录日志并返回原始字节。
    pub async fn preprocess(&self, image: &[u8]) -> Vec<u8> {
        let owned = image.to_vec();
        let max_dimension = self.max_dimension;
        let outcome =
            tokio::task::spawn_blocking(move || reencode(&owned, max_dimension)).await;

        match outcome {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => {
                warn!("⚠️ 图片预处理失败，使用原始图片: {}", e);
                image.to_vec()
            }
            Err(e) => {
                warn!("⚠️ 图片预处理任务异常，使用原始图片: {}", e);
                image.to_vec()
            }
        }
    }

    /// 提取文本，视觉后端不可用时使用兜底结果
    pub async fn extract(&self, image: &[u8]) -> Result<ExtractionResult, BackendError> {
        let Some(vision) = &self.vision else {
            warn!("⚠️ 视觉后端未配置，使用兜底 OCR 结果");
            return Ok(Self::fallback_result());
        };

        match vision.detect_text(image).await {
            Ok(detection) => {
                let confidences: Vec<f64> = detection
                    .pages
                    .iter()
                    .flat_map(|p| p.blocks.iter().map(|b| b.confidence))
                    .collect();
                let confidence = average(&confidences);

                Ok(ExtractionResult {
                    detected_languages: detect_languages(&detection.full_text),
                    raw_text: detection.full_text,
                    confidence,
                    method: ExtractionMethod::GoogleVision,
                    pages: detection.pages,
                })
            }
            Err(e) if e.is_recoverable() => {
                warn!("⚠️ 视觉 OCR 失败，使用兜底结果: {}", e);
                Ok(Self::fallback_result())
            }
            Err(e) => Err(e),
        }
    }

    /// 兜底结果（确定性，不依赖任何后端）
    pub fn fallback_result() -> ExtractionResult {
        ExtractionResult {
            raw_text: FALLBACK_TEXT.to_string(),
            confidence: FALLBACK_CONFIDENCE,
            method: ExtractionMethod::Fallback,
            pages: Vec::new(),
            detected_languages: detect_languages(FALLBACK_TEXT),
        }
    }

    /// 质量校验：低置信度只是警告，文本过短是问题但不阻断后续流程
    pub fn validate(&self, result: &ExtractionResult) -> QualityReport {
        let mut issues = Vec::new();
        let mut warnings = Vec::new();

        if result.confidence < self.confidence_threshold {
            warnings.push(format!("Low OCR confidence: {:.2}", result.confidence));
        }
        if result.raw_text.trim().chars().count() < MIN_TEXT_CHARS {
            issues.push("Very little text detected".to_string());
        }

        QualityReport {
            overall_confidence: result.confidence,
            validated: issues.is_empty(),
            issues_detected: issues,
            warnings,
        }
    }

    /// 把识别结果整理成文档结构
    pub fn structure_content(&self, result: &ExtractionResult) -> StructuredContent {
        let sections = result
            .pages
            .iter()
            .flat_map(|page| page.blocks.iter())
            .map(|block| ContentSection {
                section_type: "text".to_string(),
                text: block.text.clone(),
                confidence: block.confidence,
            })
            .collect();

        let languages = &result.detected_languages;
        let lower = result.raw_text.to_lowercase();
        let subject = if languages.iter().any(|l| l == "mathematics") {
            "mathematics"
        } else if ENGLISH_KEYWORDS.iter().any(|k| lower.contains(k)) {
            "english"
        } else if languages.iter().any(|l| l == "hebrew") {
            "hebrew"
        } else {
            "unknown"
        };

        StructuredContent {
            title: "Homework Document".to_string(),
            sections,
            subject: subject.to_string(),
            languages: languages.clone(),
            total_pages: result.pages.len(),
        }
    }
}

fn reencode(image: &[u8], max_dimension: u32) -> image::ImageResult<Vec<u8>> {
    let img = image::load_from_memory(image)?;
    let (width, height) = (img.width(), img.height());

    let mut rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    if width.max(height) > max_dimension {
        rgb = rgb.resize(max_dimension, max_dimension, FilterType::Lanczos3);
        debug!(
            "图片缩放: {}x{} -> {}x{}",
            width,
            height,
            rgb.width(),
            rgb.height()
        );
    }

    let mut buffer = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY))?;
    Ok(buffer)
}

/// 语言检测：希伯来字母 / 英文字母 / 数学符号，可同时命中多个
pub fn detect_languages(text: &str) -> Vec<String> {
    let mut languages = Vec::new();

    if text.chars().any(|c| ('\u{0590}'..='\u{05FF}').contains(&c)) {
        languages.push("hebrew".to_string());
    }
    if text.chars().any(|c| c.is_ascii_alphabetic()) {
        languages.push("english".to_string());
    }
    if text.chars().any(|c| MATH_SYMBOLS.contains(&c)) {
        languages.push("mathematics".to_string());
    }

    if languages.is_empty() {
        languages.push("unknown".to_string());
    }
    languages
}

fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    (values.iter().sum::<f64>() / values.len() as f64).clamp(0.0, 1.0)
}
