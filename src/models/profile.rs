//! 学习画像（`analysis_results`）

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    Critical,
    Important,
    Reinforcement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// 推荐的干预方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterventionType {
    Game,
    Quiz,
    Review,
    Practice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningObjective {
    pub objective: String,
    /// 课程标准对齐编码
    #[serde(default)]
    pub alignment: String,
    pub importance: Importance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeGap {
    pub gap: String,
    #[serde(default)]
    pub evidence: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intervention {
    #[serde(rename = "type")]
    pub intervention_type: InterventionType,
    #[serde(default)]
    pub focus: String,
    #[serde(default)]
    pub rationale: String,
}

/// 学习画像
///
/// 写入后不可修改，重新分析时整体替换。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningProfile {
    pub learning_objectives: Vec<LearningObjective>,
    #[serde(default)]
    pub key_concepts: Vec<String>,
    /// 难度估计，范围 [0, 1]
    pub estimated_difficulty: f64,
    #[serde(default)]
    pub knowledge_gaps: Vec<KnowledgeGap>,
    #[serde(default)]
    pub recommended_interventions: Vec<Intervention>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

fn default_content_type() -> String {
    "practice_problems".to_string()
}

impl LearningProfile {
    /// 推荐的干预类型（按顺序）
    pub fn intervention_types(&self) -> Vec<InterventionType> {
        self.recommended_interventions
            .iter()
            .map(|i| i.intervention_type)
            .collect()
    }
}
