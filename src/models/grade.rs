//! 教师评分与管理统计

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// 雅思总分：各项平均后取最近的 0.5
pub fn band_score(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let avg = scores.iter().sum::<f64>() / scores.len() as f64;
    (avg * 2.0).round() / 2.0
}

/// 听力/阅读正确率（百分比）下限与对应分数，自高到低
const PERCENT_BANDS: [(f64, f64); 14] = [
    (97.5, 9.0),
    (92.5, 8.5),
    (87.5, 8.0),
    (82.5, 7.5),
    (75.0, 7.0),
    (67.5, 6.5),
    (60.0, 6.0),
    (52.5, 5.5),
    (45.0, 5.0),
    (37.5, 4.5),
    (30.0, 4.0),
    (22.5, 3.5),
    (15.0, 3.0),
    (0.0, 2.5),
];

/// 听力/阅读答对题数换算成分数（按正确率的近似换算）
pub fn correct_answers_to_band(correct: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let percentage = correct.min(total) as f64 / total as f64 * 100.0;
    PERCENT_BANDS
        .iter()
        .find(|(floor, _)| percentage >= *floor)
        .map(|&(_, band)| band)
        .unwrap_or(2.5)
}

fn check_range(criterion: &'static str, score: f64) -> Result<(), ValidationError> {
    if (0.0..=9.0).contains(&score) {
        Ok(())
    } else {
        Err(ValidationError::ScoreOutOfRange { criterion, score })
    }
}

/// 写作评分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WritingGrade {
    pub task_achievement_score: f64,
    pub coherence_cohesion_score: f64,
    pub lexical_resource_score: f64,
    pub grammatical_range_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_text: Option<String>,
}

impl WritingGrade {
    fn criteria(&self) -> [(&'static str, f64); 4] {
        [
            ("task_achievement", self.task_achievement_score),
            ("coherence_cohesion", self.coherence_cohesion_score),
            ("lexical_resource", self.lexical_resource_score),
            ("grammatical_range", self.grammatical_range_score),
        ]
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.criteria().iter().try_for_each(|&(name, s)| check_range(name, s))
    }

    pub fn overall(&self) -> f64 {
        band_score(&self.criteria().map(|(_, s)| s))
    }
}

/// 口语评分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakingGrade {
    pub fluency_coherence_score: f64,
    pub lexical_resource_score: f64,
    pub grammatical_range_score: f64,
    pub pronunciation_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_text: Option<String>,
}

impl SpeakingGrade {
    fn criteria(&self) -> [(&'static str, f64); 4] {
        [
            ("fluency_coherence", self.fluency_coherence_score),
            ("lexical_resource", self.lexical_resource_score),
            ("grammatical_range", self.grammatical_range_score),
            ("pronunciation", self.pronunciation_score),
        ]
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.criteria().iter().try_for_each(|&(name, s)| check_range(name, s))
    }

    pub fn overall(&self) -> f64 {
        band_score(&self.criteria().map(|(_, s)| s))
    }
}

/// 服务端返回的评分记录
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GradeRecord {
    pub id: i64,
    pub submission_id: i64,
    #[serde(default)]
    pub teacher_id: Option<i64>,
    pub overall_band_score: f64,
    #[serde(default)]
    pub feedback_text: Option<String>,
    #[serde(default)]
    pub graded_at: Option<String>,
}

/// 待评分的写作提交
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PendingWriting {
    pub id: i64,
    pub test_attempt_id: i64,
    pub task_id: i64,
    #[serde(default)]
    pub response_text: String,
    #[serde(default)]
    pub word_count: u32,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub submitted_at: Option<String>,
}

/// 待评分的口语提交
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PendingSpeaking {
    pub id: i64,
    pub test_attempt_id: i64,
    pub task_id: i64,
    #[serde(default)]
    pub audio_url: String,
    #[serde(default)]
    pub duration_seconds: Option<u32>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub submitted_at: Option<String>,
}

/// 评分历史
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GradingHistoryEntry {
    pub id: i64,
    pub submission_id: i64,
    pub student: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub task: String,
    pub score: f64,
    #[serde(default)]
    pub graded_at: Option<String>,
    #[serde(default)]
    pub feedback: Option<String>,
}

/// 管理端统计
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AdminStats {
    pub total_users: u64,
    pub total_students: u64,
    pub total_teachers: u64,
    pub total_tests: u64,
    pub active_tests: u64,
    pub completed_attempts: u64,
}
