//! 推理后端客户端
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 兼容 OpenAI Chat Completions 协议的服务都可替换使用

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::BackendError;

const BACKEND: &str = "llm";

/// 推理后端能力
///
/// 只要求 `complete(system, user, max_tokens) -> text`，返回内容应能解析为 JSON。
/// 网络失败、格式错误、限流都是正常情况，由调用方决定兜底。
#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
    ) -> Result<String, BackendError>;
}

/// LLM 客户端
pub struct LlmClient {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmClient {
    /// 根据配置创建客户端，未配置 api_key 时返回 None
    pub fn from_config(config: &Config) -> Option<Self> {
        if config.llm_api_key.trim().is_empty() {
            return None;
        }

        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Some(Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[async_trait]
impl ReasoningBackend for LlmClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
    ) -> Result<String, BackendError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_prompt.len());

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(system_prompt)
            .build()
            .map_err(build_error)?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_prompt)
            .build()
            .map_err(build_error)?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_msg),
                ChatCompletionRequestMessage::User(user_msg),
            ])
            .temperature(0.3)
            .max_tokens(max_tokens)
            .build()
            .map_err(build_error)?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            classify_api_error(e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or(BackendError::EmptyResponse { backend: BACKEND })?;

        let content = content.trim();
        if content.is_empty() {
            return Err(BackendError::EmptyResponse { backend: BACKEND });
        }
        Ok(content.to_string())
    }
}

/// 请求构建失败属于程序错误，不走兜底
fn build_error(e: OpenAIError) -> BackendError {
    BackendError::Internal {
        backend: BACKEND,
        message: e.to_string(),
    }
}

fn classify_api_error(e: OpenAIError) -> BackendError {
    let text = e.to_string().to_lowercase();
    if text.contains("rate limit") || text.contains("429") {
        return BackendError::RateLimited {
            backend: BACKEND,
            retry_after: None,
        };
    }
    match e {
        OpenAIError::InvalidArgument(message) => BackendError::Internal {
            backend: BACKEND,
            message,
        },
        other => BackendError::request_failed(BACKEND, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_is_disabled_without_api_key() {
        let config = Config::default();
        assert!(LlmClient::from_config(&config).is_none());
    }

    #[test]
    fn client_uses_configured_model() {
        let config = Config {
            llm_api_key: "test-key".to_string(),
            llm_model_name: "local-model".to_string(),
            ..Config::default()
        };
        let client = LlmClient::from_config(&config).unwrap();
        assert_eq!(client.model_name(), "local-model");
    }

    /// 测试真实 API 连通性
    ///
    /// 运行方式：
    /// ```bash
    /// LLM_API_KEY=... cargo test test_llm_complete_live -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_llm_complete_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let config = Config::from_env();
        let client = LlmClient::from_config(&config).expect("需要设置 LLM_API_KEY");

        let response = client
            .complete("Reply with JSON only.", "Return {\"ok\": true}", 64)
            .await
            .expect("LLM 调用失败");
        println!("LLM 响应: {}", response);
        assert!(!response.is_empty());
    }
}
