//! 学习者概览

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::artifact::ContentKind;

/// 最近一次学习活动
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentActivity {
    pub content_title: String,
    pub content_type: ContentKind,
    pub score: f64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub total_documents: usize,
    pub total_games_played: usize,
    pub total_quizzes_completed: usize,
    pub average_score: f64,
    pub total_study_time_minutes: u64,
    /// 最近 10 条，按完成时间倒序
    pub recent_activities: Vec<RecentActivity>,
    /// 科目 → 提交次数
    pub subject_breakdown: BTreeMap<String, usize>,
}
