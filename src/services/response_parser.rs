//! LLM 返回内容解析
//!
//! 模型经常把 JSON 包在 Markdown 代码块里，或者在前后加说明文字，这里统一剥离。

use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::OnceLock;

use crate::error::BackendError;

fn fenced_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("静态正则"))
}

/// 取出响应中的 JSON 片段
pub fn extract_json(response: &str) -> &str {
    let response = response.trim();

    if let Some(inner) = fenced_block()
        .captures(response)
        .and_then(|caps| caps.get(1))
    {
        return inner.as_str();
    }

    let start = response.find(['{', '[']);
    let end = response.rfind(['}', ']']);
    match (start, end) {
        (Some(start), Some(end)) if start < end => &response[start..=end],
        _ => response,
    }
}

/// 解析为指定结构，失败记为格式错误
pub fn parse_json_response<T: DeserializeOwned>(response: &str) -> Result<T, BackendError> {
    serde_json::from_str(extract_json(response))
        .map_err(|e| BackendError::malformed("llm", e.to_string()))
}
