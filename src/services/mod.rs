//! 业务能力层（Services）
//!
//! 每个服务只描述"我能做什么"，不关心流程顺序，也不直接读写存储。

pub mod content_analyzer;
pub mod content_generator;
pub mod dashboard;
pub mod prompts;
pub mod response_parser;
pub mod scoring_engine;
pub mod text_extractor;

pub use content_analyzer::ContentAnalyzer;
pub use content_generator::ContentGenerator;
pub use scoring_engine::ScoringEngine;
pub use text_extractor::TextExtractor;
