//! 学生提交答案及评分结果

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 单题提交
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerSubmission {
    pub question_id: String,
    pub user_answer: String,
    #[serde(default)]
    pub time_spent_seconds: u32,
}

/// 一次完整提交
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSubmit {
    pub content_id: Uuid,
    pub answers: Vec<AnswerSubmission>,
    pub total_time_spent: u32,
}

/// 单题反馈
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub message: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encouragement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_steps: Option<String>,
}

/// 单题评分结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerOutcome {
    pub question_id: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub time_spent_seconds: u32,
    pub feedback: Feedback,
}

/// 总体反馈
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionSummary {
    pub overall_score: f64,
    pub correct_answers: usize,
    pub total_questions: usize,
    pub message: String,
}

impl SubmissionSummary {
    pub fn message_for(score: f64) -> &'static str {
        if score >= 90.0 {
            "Excellent work!"
        } else if score >= 70.0 {
            "Great job!"
        } else {
            "Keep practicing!"
        }
    }
}

/// 提交结果，创建后不可修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content_id: Uuid,
    pub status: String,
    /// 0–100
    pub score: f64,
    pub time_spent_seconds: u32,
    pub answers: Vec<AnswerOutcome>,
    pub feedback_provided: SubmissionSummary,
    pub completed_at: DateTime<Utc>,
}
