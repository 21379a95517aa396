//! 流程层（Workflow）
//!
//! - `ProcessingPipeline`：一份作业从上传到终态，以及按需生成内容
//! - `SubmissionFlow`：一次答题提交（评分 + 参与度统计）

pub mod document_ctx;
pub mod processing_pipeline;
pub mod submission_flow;

pub use document_ctx::DocumentCtx;
pub use processing_pipeline::{ProcessingPipeline, Upload};
pub use submission_flow::SubmissionFlow;
