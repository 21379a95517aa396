//! 编排层（Orchestration Layer）
//!
//! 本层负责批量处理和并发调度，不做具体业务判断。
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::App (处理上传目录中的所有作业)
//!     ↓
//! workflow::ProcessingPipeline (处理单份作业)
//!     ↓
//! services (能力层：extract / analyze / generate / score)
//!     ↓
//! clients + infrastructure (推理后端、视觉后端、存储)
//! ```

pub mod app;

pub use app::{App, ProcessingStats};
