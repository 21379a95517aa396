pub mod llm_client;
pub mod vision_client;

pub use llm_client::{LlmClient, ReasoningBackend};
pub use vision_client::{TextDetection, VisionBackend, VisionClient};
