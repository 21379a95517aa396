//! 视觉 OCR 客户端
//!
//! 封装 Google Cloud Vision `images:annotate` 的 DOCUMENT_TEXT_DETECTION 调用

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::BackendError;
use crate::models::extraction::{PageText, TextBlock};

const BACKEND: &str = "vision";

/// 没有给出置信度的文本块按 0.9 处理
const DEFAULT_BLOCK_CONFIDENCE: f64 = 0.9;

/// 文本检测结果
#[derive(Debug, Clone, PartialEq)]
pub struct TextDetection {
    pub full_text: String,
    pub pages: Vec<PageText>,
}

/// 视觉后端能力
#[async_trait]
pub trait VisionBackend: Send + Sync {
    async fn detect_text(&self, image: &[u8]) -> Result<TextDetection, BackendError>;
}

/// 视觉 API 客户端
pub struct VisionClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl VisionClient {
    /// 根据配置创建客户端，未配置 api_key 时返回 None
    pub fn from_config(config: &Config) -> Option<Self> {
        if config.vision_api_key.trim().is_empty() {
            return None;
        }
        Some(Self {
            http: reqwest::Client::new(),
            api_key: config.vision_api_key.clone(),
            base_url: config.vision_api_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl VisionBackend for VisionClient {
    async fn detect_text(&self, image: &[u8]) -> Result<TextDetection, BackendError> {
        debug!("调用视觉 API，图片大小: {} 字节", image.len());

        let body = json!({
            "requests": [{
                "image": { "content": STANDARD.encode(image) },
                "features": [{ "type": "DOCUMENT_TEXT_DETECTION" }]
            }]
        });

        let response = self
            .http
            .post(format!("{}/v1/images:annotate", self.base_url))
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!("视觉 API 请求失败: {}", e);
                BackendError::request_failed(BACKEND, e)
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(BackendError::RateLimited {
                backend: BACKEND,
                retry_after,
            });
        }
        if !status.is_success() {
            return Err(BackendError::malformed(
                BACKEND,
                format!("HTTP 状态码 {}", status),
            ));
        }

        let payload: AnnotateResponse = response
            .json()
            .await
            .map_err(|e| BackendError::malformed(BACKEND, e.to_string()))?;

        parse_annotation(payload)
    }
}

// ========== 响应结构 ==========

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    full_text_annotation: Option<FullTextAnnotation>,
    error: Option<ApiStatus>,
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct FullTextAnnotation {
    #[serde(default)]
    text: String,
    #[serde(default)]
    pages: Vec<ApiPage>,
}

#[derive(Debug, Deserialize)]
struct ApiPage {
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    #[serde(default)]
    blocks: Vec<ApiBlock>,
}

#[derive(Debug, Deserialize)]
struct ApiBlock {
    confidence: Option<f64>,
    #[serde(default)]
    paragraphs: Vec<ApiParagraph>,
}

#[derive(Debug, Deserialize)]
struct ApiParagraph {
    #[serde(default)]
    words: Vec<ApiWord>,
}

#[derive(Debug, Deserialize)]
struct ApiWord {
    #[serde(default)]
    symbols: Vec<ApiSymbol>,
}

#[derive(Debug, Deserialize)]
struct ApiSymbol {
    #[serde(default)]
    text: String,
}

fn parse_annotation(payload: AnnotateResponse) -> Result<TextDetection, BackendError> {
    let first = payload
        .responses
        .into_iter()
        .next()
        .ok_or(BackendError::EmptyResponse { backend: BACKEND })?;

    if let Some(error) = first.error.filter(|e| !e.message.is_empty()) {
        return Err(BackendError::malformed(BACKEND, error.message));
    }

    let Some(annotation) = first.full_text_annotation else {
        return Ok(TextDetection {
            full_text: String::new(),
            pages: Vec::new(),
        });
    };

    let pages = annotation
        .pages
        .into_iter()
        .map(|page| PageText {
            width: page.width,
            height: page.height,
            blocks: page.blocks.into_iter().map(block_text).collect(),
        })
        .collect();

    Ok(TextDetection {
        full_text: annotation.text,
        pages,
    })
}

fn block_text(block: ApiBlock) -> TextBlock {
    let words: Vec<String> = block
        .paragraphs
        .iter()
        .flat_map(|p| p.words.iter())
        .map(|w| w.symbols.iter().map(|s| s.text.as_str()).collect())
        .collect();

    TextBlock {
        text: words.join(" "),
        confidence: block.confidence.unwrap_or(DEFAULT_BLOCK_CONFIDENCE),
    }
}
