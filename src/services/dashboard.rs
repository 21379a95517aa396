//! 学习概览汇总
//!
//! 纯计算，不访问存储；由 workflow 查好数据后传入。

use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use crate::models::artifact::{ContentKind, GeneratedArtifact};
use crate::models::dashboard::{DashboardReport, RecentActivity};
use crate::models::submission::SubmissionResult;

const RECENT_ACTIVITY_LIMIT: usize = 10;

/// 汇总学习者的提交记录
///
/// 找不到对应内容的提交只计入平均分和学习时长。
pub fn summarize(
    total_documents: usize,
    submissions: &[SubmissionResult],
    artifacts: &HashMap<Uuid, GeneratedArtifact>,
) -> DashboardReport {
    let count_kind = |kind: ContentKind| {
        submissions
            .iter()
            .filter_map(|s| artifacts.get(&s.content_id))
            .filter(|a| a.kind() == kind)
            .count()
    };

    let average_score = if submissions.is_empty() {
        0.0
    } else {
        submissions.iter().map(|s| s.score).sum::<f64>() / submissions.len() as f64
    };

    let total_seconds: u64 = submissions
        .iter()
        .map(|s| u64::from(s.time_spent_seconds))
        .sum();

    let mut recent: Vec<&SubmissionResult> = submissions.iter().collect();
    recent.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    let recent_activities = recent
        .into_iter()
        .filter_map(|s| {
            artifacts.get(&s.content_id).map(|a| RecentActivity {
                content_title: a.title.clone(),
                content_type: a.kind(),
                score: s.score,
                completed_at: s.completed_at,
            })
        })
        .take(RECENT_ACTIVITY_LIMIT)
        .collect();

    let mut subject_breakdown = BTreeMap::new();
    for artifact in submissions
        .iter()
        .filter_map(|s| artifacts.get(&s.content_id))
    {
        *subject_breakdown
            .entry(artifact.subject.name().to_string())
            .or_insert(0) += 1;
    }

    DashboardReport {
        total_documents,
        total_games_played: count_kind(ContentKind::Game),
        total_quizzes_completed: count_kind(ContentKind::Quiz),
        average_score,
        total_study_time_minutes: total_seconds / 60,
        recent_activities,
        subject_breakdown,
    }
}
