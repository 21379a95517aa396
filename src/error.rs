use thiserror::Error;
use uuid::Uuid;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 外部后端错误（只有不可恢复的才会走到这里）
    #[error("后端错误: {0}")]
    Backend(#[from] BackendError),
    /// 校验错误，直接返回给调用方
    #[error("校验错误: {0}")]
    Validation(#[from] ValidationError),
    /// 流程状态错误
    #[error("流程错误: {0}")]
    Pipeline(#[from] PipelineError),
    /// 存储错误
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 外部后端（推理 / 视觉）错误
///
/// 除 `Internal` 外都属于"可建模的后端不可用"，调用点会切换到本地兜底结果。
#[derive(Debug, Error)]
pub enum BackendError {
    /// 后端未配置
    #[error("{backend} 未配置")]
    Unavailable { backend: &'static str },
    /// 网络请求失败
    #[error("{backend} 请求失败: {source}")]
    RequestFailed {
        backend: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 请求频率限制
    #[error("{backend} 请求频率限制, 建议等待: {retry_after:?}秒")]
    RateLimited {
        backend: &'static str,
        retry_after: Option<u64>,
    },
    /// 返回内容为空
    #[error("{backend} 返回内容为空")]
    EmptyResponse { backend: &'static str },
    /// 返回内容无法按预期结构解析
    #[error("{backend} 返回内容格式错误: {reason}")]
    MalformedResponse {
        backend: &'static str,
        reason: String,
    },
    /// 非预期的内部错误（不会被兜底吞掉）
    #[error("{backend} 内部错误: {message}")]
    Internal {
        backend: &'static str,
        message: String,
    },
}

impl BackendError {
    /// 是否可以用兜底结果替代
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, BackendError::Internal { .. })
    }
}

/// 校验错误
#[derive(Debug, Error)]
pub enum ValidationError {
    /// 内容没有可评分的题目
    #[error("内容没有题目: {content_id}")]
    EmptyQuestionSet { content_id: Uuid },
    /// 不支持的科目
    #[error("不支持的科目: {subject}")]
    UnsupportedSubject { subject: String },
    /// 不支持的游戏类型
    #[error("不支持的游戏类型: {game_type}")]
    UnsupportedGameType { game_type: String },
    /// 不支持的难度
    #[error("不支持的难度: {difficulty}")]
    UnsupportedDifficulty { difficulty: String },
    /// 上传文件为空
    #[error("上传文件为空")]
    EmptyUpload,
    /// 上传文件不是图片
    #[error("文件必须是图片: {content_type}")]
    NotAnImage { content_type: String },
    /// 上传文件过大
    #[error("文件大小 {size} 超过上限 {max} 字节")]
    UploadTooLarge { size: usize, max: usize },
    /// 文档尚未处理完成
    #[error("文档 {document_id} 尚未处理完成 (当前状态: {status})")]
    DocumentNotReady { document_id: Uuid, status: String },
}

/// 流程错误
#[derive(Debug, Error)]
pub enum PipelineError {
    /// 非法的状态迁移
    #[error("非法的状态迁移: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
    /// 阶段中出现的非预期错误
    #[error("{stage} 阶段失败: {message}")]
    StageFailed { stage: &'static str, message: String },
}

/// 存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 记录不存在
    #[error("{kind} 不存在: {id}")]
    NotFound { kind: &'static str, id: Uuid },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ========== 便捷构造函数 ==========

impl BackendError {
    /// 创建请求失败错误
    pub fn request_failed(
        backend: &'static str,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        BackendError::RequestFailed {
            backend,
            source: Box::new(source),
        }
    }

    /// 创建格式错误
    pub fn malformed(backend: &'static str, reason: impl Into<String>) -> Self {
        BackendError::MalformedResponse {
            backend,
            reason: reason.into(),
        }
    }
}

impl StoreError {
    pub fn not_found(kind: &'static str, id: Uuid) -> Self {
        StoreError::NotFound { kind, id }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
