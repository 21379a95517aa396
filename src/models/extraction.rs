//! OCR 提取结果
//!
//! 字段名与前端约定的 `ocr_data` 结构保持一致

use serde::{Deserialize, Serialize};

/// 提取方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    GoogleVision,
    Fallback,
}

/// 单个文本块
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
    pub confidence: f64,
}

/// 单页识别结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageText {
    pub width: u32,
    pub height: u32,
    pub blocks: Vec<TextBlock>,
}

/// 文本提取结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub raw_text: String,
    #[serde(rename = "confidence_score")]
    pub confidence: f64,
    #[serde(rename = "extraction_method")]
    pub method: ExtractionMethod,
    #[serde(default)]
    pub pages: Vec<PageText>,
    #[serde(rename = "language_hints")]
    pub detected_languages: Vec<String>,
}

impl ExtractionResult {
    /// 每个文本块的置信度（按页、块顺序）
    pub fn per_region_confidences(&self) -> Vec<f64> {
        self.pages
            .iter()
            .flat_map(|page| page.blocks.iter().map(|block| block.confidence))
            .collect()
    }
}

/// 提取质量校验结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub overall_confidence: f64,
    pub issues_detected: Vec<String>,
    pub warnings: Vec<String>,
    pub validated: bool,
}

/// 结构化后的段落
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSection {
    #[serde(rename = "type")]
    pub section_type: String,
    pub text: String,
    pub confidence: f64,
}

/// 结构化文档内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredContent {
    pub title: String,
    pub sections: Vec<ContentSection>,
    pub subject: String,
    pub languages: Vec<String>,
    pub total_pages: usize,
}

/// 完整的 OCR 处理报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub ocr_data: ExtractionResult,
    pub processing_quality: QualityReport,
    pub content: StructuredContent,
}
