//! # Homework Pipeline
//!
//! 把拍照上传的作业转换成个性化学习内容的 Rust 应用程序
//!
//! ## 架构设计
//!
//! ### ① 客户端与基础设施（Clients / Infrastructure）
//! - `clients/` - 推理后端（`LlmClient`）和视觉后端（`VisionClient`），都是可替换的能力对象
//! - `infrastructure/` - `Store` 持久化能力，`MemoryStore` 为内存实现
//!
//! ### ② 业务能力层（Services）
//! - `TextExtractor` - 图片 → 文本
//! - `ContentAnalyzer` - 文本 → 学习画像
//! - `ContentGenerator` - 画像 → 游戏 / 测验 / 复习资料
//! - `ScoringEngine` - 答案 → 分数与反馈
//!
//! ### ③ 流程层（Workflow）
//! - `ProcessingPipeline` - 文档状态机（pending → processing → completed | error）及按需生成
//! - `SubmissionFlow` - 答题提交与参与度统计
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator::App` - 批量处理上传目录，控制并发
//!
//! 每个外部调用点都有本地兜底，后端不可用只会降低内容质量，不会让文档失败。

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, BackendError, ValidationError};
pub use infrastructure::{MemoryStore, Store};
pub use orchestrator::App;
pub use workflow::{ProcessingPipeline, SubmissionFlow, Upload};
